//! Backend seam and its reqwest implementation.
//!
//! Response classification lives in plain functions so that status/body
//! handling can be tested without a server.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{LookupError, REQUEST_FAILED};
use crate::protocol::{
    DetailResult, DetailsRequest, ErrorBody, FinalResult, MetadataResult, SelectRequest,
    SelectionResult, UrlsRequest,
};

pub const LEGACY_PATH: &str = "api";
pub const METADATA_PATH: &str = "api/metadata";
pub const SELECT_PATH: &str = "api/select";
pub const DETAILS_PATH: &str = "api/details";

/// The remote picker service.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Legacy combined endpoint.
    async fn randomize(&self, urls: &[String]) -> Result<FinalResult, LookupError>;

    async fn metadata(&self, urls: &[String]) -> Result<MetadataResult, LookupError>;

    async fn select(&self, lists: &[Value], total: u64) -> Result<SelectionResult, LookupError>;

    async fn details(&self, slug: &str) -> Result<DetailResult, LookupError>;
}

/// How a non-success or non-JSON response is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Status < 500 with a JSON body is user-facing; everything else transient.
    Legacy,
    /// Any received response that is not a usable success is user-facing.
    Step,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = reqwest::Url::parse(&base)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B, mode: Classification) -> Result<T, LookupError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| LookupError::user_facing(format!("Invalid backend URL: {}", e)))?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        debug!(
            "POST /{} → {} ({} bytes, {:?})",
            path,
            status,
            bytes.len(),
            content_type
        );

        classify_response(mode, status, content_type.as_deref(), &bytes)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn randomize(&self, urls: &[String]) -> Result<FinalResult, LookupError> {
        self.post(LEGACY_PATH, &UrlsRequest { urls }, Classification::Legacy)
            .await
    }

    async fn metadata(&self, urls: &[String]) -> Result<MetadataResult, LookupError> {
        self.post(METADATA_PATH, &UrlsRequest { urls }, Classification::Step)
            .await
    }

    async fn select(&self, lists: &[Value], total: u64) -> Result<SelectionResult, LookupError> {
        self.post(SELECT_PATH, &SelectRequest { lists, total }, Classification::Step)
            .await
    }

    async fn details(&self, slug: &str) -> Result<DetailResult, LookupError> {
        self.post(DETAILS_PATH, &DetailsRequest { slug }, Classification::Step)
            .await
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
}

fn server_error_reason(status: u16) -> String {
    if status == 504 {
        "Server error: Gateway Timeout".to_string()
    } else {
        format!("Server error: HTTP {}", status)
    }
}

fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| REQUEST_FAILED.to_string())
}

/// Turn a received response into a payload or a classified error.
pub fn classify_response<T: DeserializeOwned>(
    mode: Classification,
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<T, LookupError> {
    let success = (200..300).contains(&status);

    if !is_json(content_type) {
        let reason = server_error_reason(status);
        return Err(match mode {
            Classification::Legacy => LookupError::transient(reason),
            Classification::Step => LookupError::user_facing(reason),
        });
    }

    if !success {
        let message = error_message(body);
        return Err(match mode {
            Classification::Legacy if status >= 500 => LookupError::transient(message),
            _ => LookupError::user_facing(message),
        });
    }

    serde_json::from_slice(body).map_err(|e| {
        let message = format!("Unexpected response from server: {}", e);
        match mode {
            Classification::Legacy => LookupError::transient(message),
            Classification::Step => LookupError::user_facing(message),
        }
    })
}

fn map_reqwest_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::transient("request timed out")
    } else {
        LookupError::transient(format!("connection failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const JSON: Option<&str> = Some("application/json; charset=utf-8");

    #[test]
    fn legacy_4xx_is_user_facing_with_body_message() {
        let err = classify_response::<FinalResult>(
            Classification::Legacy,
            404,
            JSON,
            br#"{"error":"No valid movies found in provided lists"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UserFacing);
        assert_eq!(err.message, "No valid movies found in provided lists");
    }

    #[test]
    fn legacy_5xx_json_is_transient() {
        let err = classify_response::<FinalResult>(
            Classification::Legacy,
            500,
            JSON,
            br#"{"error":"Failed to extract movie"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transient);
    }

    #[test]
    fn legacy_non_json_is_transient_and_names_gateway_timeout() {
        let err = classify_response::<FinalResult>(
            Classification::Legacy,
            504,
            Some("text/html"),
            b"<html>504</html>",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transient);
        assert_eq!(err.message, "Server error: Gateway Timeout");

        let err = classify_response::<FinalResult>(Classification::Legacy, 502, None, b"")
            .unwrap_err();
        assert_eq!(err.message, "Server error: HTTP 502");
    }

    #[test]
    fn missing_error_field_falls_back() {
        let err = classify_response::<MetadataResult>(Classification::Step, 400, JSON, b"{}")
            .unwrap_err();
        assert_eq!(err.message, REQUEST_FAILED);
    }

    #[test]
    fn step_failures_are_always_user_facing() {
        let err = classify_response::<MetadataResult>(
            Classification::Step,
            503,
            JSON,
            br#"{"error":"letterboxd is down"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UserFacing);
        assert_eq!(err.message, "letterboxd is down");
    }

    #[test]
    fn success_body_is_parsed() {
        let meta: MetadataResult = classify_response(
            Classification::Step,
            200,
            JSON,
            br#"{"lists":[{"title":"A"}],"total":42}"#,
        )
        .unwrap();
        assert_eq!(meta.total, 42);
        assert_eq!(meta.lists.len(), 1);
    }
}
