//! Mock provider configuration.
//!
//! Built from environment variables at startup and shared with the Axum
//! handlers through [`crate::state::ProviderState`].

/// Settings of the mock provider.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Port to listen on (default `4100`).
    pub listen_port: u16,
    /// Application id accepted by `POST /sessions` and `/apps/{app}/…`.
    pub app_id: String,
    /// PEM public key identity tokens are verified with.
    pub public_key_pem: String,
    /// Bearer token accepted on the Platform API.
    pub platform_token: String,
}

impl MockConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                | Default               | Description                          |
    /// |-------------------------|-----------------------|--------------------------------------|
    /// | `MOCK_LAYER_PORT`       | `4100`                | HTTP listen port                     |
    /// | `LAYER_APP_ID`          | `mock-app`            | Accepted application id              |
    /// | `LAYER_PUBLIC_KEY_PATH` | (required)            | PEM public key of the identity signer|
    /// | `LAYER_PLATFORM_TOKEN`  | `mock-platform-token` | Accepted Platform API bearer token   |
    pub fn from_env() -> Result<Self, String> {
        let listen_port: u16 = std::env::var("MOCK_LAYER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4100);

        let key_path = std::env::var("LAYER_PUBLIC_KEY_PATH")
            .map_err(|_| "LAYER_PUBLIC_KEY_PATH must be set".to_string())?;
        let public_key_pem = std::fs::read_to_string(&key_path)
            .map_err(|e| format!("cannot read {key_path}: {e}"))?;

        Ok(Self {
            listen_port,
            app_id: std::env::var("LAYER_APP_ID").unwrap_or_else(|_| "mock-app".to_string()),
            public_key_pem,
            platform_token: std::env::var("LAYER_PLATFORM_TOKEN")
                .unwrap_or_else(|_| "mock-platform-token".to_string()),
        })
    }
}
