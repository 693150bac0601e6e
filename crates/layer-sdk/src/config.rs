//! Client configuration.
//!
//! [`LayerConfig`] carries the application identity (app id, provider id,
//! key id, private key) and the endpoints the client talks to.  It can be
//! built in code or read from environment variables.

use std::fmt;

use reqwest::Url;

use crate::error::SdkError;

/// Default REST endpoint of the Layer platform.
pub const DEFAULT_API_URL: &str = "https://api.layer.com";
/// Default websocket endpoint of the Layer platform.
pub const DEFAULT_SOCKET_URL: &str = "wss://api.layer.com";
/// Default API version sent in `Accept` and the websocket subprotocol.
pub const DEFAULT_API_VERSION: &str = "1.0";

/// Configuration of a [`LayerClient`](crate::LayerClient).
#[derive(Clone)]
pub struct LayerConfig {
    /// Application id (`app_id` in `POST /sessions`).
    pub app_id: String,
    /// Provider id, used as the identity token issuer (`iss`).
    pub provider_id: String,
    /// Id of the key the identity token is signed with (`kid`).
    pub key_id: String,
    /// PEM-encoded RSA private key (PKCS#1 or PKCS#8).
    pub private_key: String,
    /// API version (default `1.0`).
    pub api_version: String,
    /// REST base URL.
    pub api_url: String,
    /// Websocket base URL.
    pub socket_url: String,
    /// Bearer token for the server-side Platform API, if used.
    pub platform_token: Option<String>,
}

impl LayerConfig {
    /// Configuration with default endpoints and API version.
    pub fn new(
        app_id: impl Into<String>,
        provider_id: impl Into<String>,
        key_id: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            provider_id: provider_id.into(),
            key_id: key_id.into(),
            private_key: private_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            platform_token: None,
        }
    }

    /// Override the API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Override the REST base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Override the websocket base URL.
    #[must_use]
    pub fn with_socket_url(mut self, url: impl Into<String>) -> Self {
        self.socket_url = url.into();
        self
    }

    /// Set the Platform API bearer token.
    #[must_use]
    pub fn with_platform_token(mut self, token: impl Into<String>) -> Self {
        self.platform_token = Some(token.into());
        self
    }

    /// Build the configuration from environment variables.
    ///
    /// | Variable                 | Default                 | Description                        |
    /// |--------------------------|-------------------------|------------------------------------|
    /// | `LAYER_APP_ID`           | (required)              | Application id                     |
    /// | `LAYER_PROVIDER_ID`      | (required)              | Identity token issuer              |
    /// | `LAYER_KEY_ID`           | (required)              | Signing key id                     |
    /// | `LAYER_PRIVATE_KEY`      | —                       | PEM private key, inline            |
    /// | `LAYER_PRIVATE_KEY_PATH` | —                       | PEM private key, read from a file  |
    /// | `LAYER_API_VERSION`      | `1.0`                   | API version                        |
    /// | `LAYER_API_URL`          | `https://api.layer.com` | REST base URL                      |
    /// | `LAYER_SOCKET_URL`       | `wss://api.layer.com`   | Websocket base URL                 |
    /// | `LAYER_PLATFORM_TOKEN`   | unset                   | Platform API bearer token          |
    ///
    /// `LAYER_PRIVATE_KEY` wins when both key variables are set.
    pub fn from_env() -> Result<Self, SdkError> {
        let private_key = match (
            std::env::var("LAYER_PRIVATE_KEY").ok(),
            std::env::var("LAYER_PRIVATE_KEY_PATH").ok(),
        ) {
            (Some(pem), _) => pem,
            (None, Some(path)) => std::fs::read_to_string(&path)
                .map_err(|e| SdkError::Config(format!("cannot read private key {path}: {e}")))?,
            (None, None) => {
                return Err(SdkError::Config(
                    "LAYER_PRIVATE_KEY or LAYER_PRIVATE_KEY_PATH must be set".into(),
                ))
            }
        };

        let mut config = Self::new(
            required_env("LAYER_APP_ID")?,
            required_env("LAYER_PROVIDER_ID")?,
            required_env("LAYER_KEY_ID")?,
            private_key,
        );
        if let Ok(version) = std::env::var("LAYER_API_VERSION") {
            config.api_version = version;
        }
        if let Ok(url) = std::env::var("LAYER_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var("LAYER_SOCKET_URL") {
            config.socket_url = url;
        }
        config.platform_token = std::env::var("LAYER_PLATFORM_TOKEN").ok();

        config.validate()?;
        Ok(config)
    }

    /// Check that every identifier is present and the endpoints parse.
    pub fn validate(&self) -> Result<(), SdkError> {
        for (name, value) in [
            ("app_id", &self.app_id),
            ("provider_id", &self.provider_id),
            ("key_id", &self.key_id),
            ("private_key", &self.private_key),
            ("api_version", &self.api_version),
        ] {
            if value.trim().is_empty() {
                return Err(SdkError::Validation(format!("{name} isn't defined")));
            }
        }
        base_url("api_url", &self.api_url)?;
        base_url("socket_url", &self.socket_url)?;
        Ok(())
    }
}

// The private key and platform token stay out of debug output.
impl fmt::Debug for LayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerConfig")
            .field("app_id", &self.app_id)
            .field("provider_id", &self.provider_id)
            .field("key_id", &self.key_id)
            .field("private_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("api_url", &self.api_url)
            .field("socket_url", &self.socket_url)
            .field(
                "platform_token",
                &self.platform_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Parse `value` as a URL that paths can be appended to.
fn base_url(name: &str, value: &str) -> Result<Url, SdkError> {
    let url =
        Url::parse(value).map_err(|e| SdkError::Config(format!("invalid {name} {value}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(SdkError::Config(format!("{name} {value} cannot be a base URL")));
    }
    Ok(url)
}

fn required_env(name: &str) -> Result<String, SdkError> {
    std::env::var(name).map_err(|_| SdkError::Config(format!("{name} must be set")))
}
