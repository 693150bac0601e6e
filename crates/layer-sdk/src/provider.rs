//! HTTP calls of the authentication handshake.

use layer_models::{NonceResponse, SessionRequest, SessionResponse};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::config::LayerConfig;
use crate::error::SdkError;
use crate::headers;

/// Thin client for `POST /nonces` and `POST /sessions`.
#[derive(Debug, Clone)]
pub struct ProviderApi {
    http: reqwest::Client,
    base_url: Url,
    app_id: String,
    api_version: String,
}

impl ProviderApi {
    /// Build from a configuration, sharing `http` with the rest of the client.
    pub fn new(http: reqwest::Client, config: &LayerConfig) -> Result<Self, SdkError> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| SdkError::Config(format!("invalid api_url {}: {e}", config.api_url)))?;
        Ok(Self {
            http,
            base_url,
            app_id: config.app_id.clone(),
            api_version: config.api_version.clone(),
        })
    }

    /// Fetch a fresh single-use nonce.
    pub async fn request_nonce(&self) -> Result<String, SdkError> {
        let res = self
            .http
            .post(self.endpoint("nonces")?)
            .headers(headers::base(&self.api_version)?)
            .send()
            .await?;
        let body: NonceResponse = json_or_api_error(res).await?;
        Ok(body.nonce)
    }

    /// Exchange a signed identity token for a session token.
    pub async fn create_session(&self, identity_token: &str) -> Result<String, SdkError> {
        let res = self
            .http
            .post(self.endpoint("sessions")?)
            .headers(headers::base(&self.api_version)?)
            .json(&SessionRequest {
                app_id: self.app_id.clone(),
                identity_token: identity_token.to_string(),
            })
            .send()
            .await?;
        let body: SessionResponse = json_or_api_error(res).await?;
        Ok(body.session_token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, SdkError> {
        join(&self.base_url, [path])
    }
}

/// Append path segments to `base`, keeping any path prefix `base` already has.
///
/// Each segment is percent-encoded on its own, so a `/` inside a user id
/// stays part of that segment.
pub(crate) fn join<I, S>(base: &Url, segments: I) -> Result<Url, SdkError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| SdkError::Config(format!("{base} cannot be a base URL")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Map a non-success status to [`SdkError::Api`], otherwise decode JSON.
pub(crate) async fn json_or_api_error<T: DeserializeOwned>(res: Response) -> Result<T, SdkError> {
    let res = success_or_api_error(res).await?;
    Ok(res.json().await?)
}

pub(crate) async fn success_or_api_error(res: Response) -> Result<Response, SdkError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(SdkError::Api {
        status: status.as_u16(),
        body,
    })
}
