//! Platform API plumbing (`/apps/{app_id}/…`, bearer-token authorized).

use reqwest::header::{HeaderValue, IF_NONE_MATCH};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::LayerConfig;
use crate::error::SdkError;
use crate::headers;
use crate::provider::{join, json_or_api_error};

/// Request builder for the server-side Platform API.
#[derive(Debug, Clone)]
pub struct PlatformApi {
    http: reqwest::Client,
    app_url: Url,
    api_version: String,
    token: Option<String>,
}

impl PlatformApi {
    /// Build from a configuration.  The token is only checked when a call is made.
    pub fn new(http: reqwest::Client, config: &LayerConfig) -> Result<Self, SdkError> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| SdkError::Config(format!("invalid api_url {}: {e}", config.api_url)))?;
        Ok(Self {
            http,
            app_url: join(&base, ["apps", config.app_id.as_str()])?,
            api_version: config.api_version.clone(),
            token: config.platform_token.clone(),
        })
    }

    /// `GET /apps/{app}/{path…}?{query}`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, SdkError> {
        let mut url = join(&self.app_url, path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        debug!(%url, "platform GET");
        let res = self.request(Method::GET, url)?.send().await?;
        json_or_api_error(res).await
    }

    /// `POST /apps/{app}/{path…}` with a JSON body and optional dedupe id.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &[&str],
        body: &B,
        dedupe: Option<&str>,
    ) -> Result<T, SdkError> {
        let url = join(&self.app_url, path)?;
        debug!(%url, "platform POST");
        let mut req = self.request(Method::POST, url)?.json(body);
        if let Some(dedupe) = dedupe {
            let value = HeaderValue::from_str(dedupe)
                .map_err(|_| SdkError::Validation(format!("invalid dedupe id {dedupe:?}")))?;
            req = req.header(IF_NONE_MATCH, value);
        }
        json_or_api_error(req.send().await?).await
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, SdkError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| SdkError::Config("platform token isn't configured".into()))?;
        Ok(self
            .http
            .request(method, url)
            .headers(headers::platform(&self.api_version, token)?))
    }
}
