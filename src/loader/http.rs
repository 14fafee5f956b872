//! HTTP result source.

use serde_json::Value;

use super::SourceError;

/// Fetch a JSON document over HTTP.
///
/// Any non-2xx status is a failure, as is a body that is not valid JSON.
pub async fn fetch_http(client: &reqwest::Client, url: &str) -> Result<Value, SourceError> {
    let response = client.get(url).send().await.map_err(map_request_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }

    let body = response.bytes().await.map_err(map_request_error)?;
    serde_json::from_slice(&body).map_err(|e| SourceError::Malformed(e.to_string()))
}

fn map_request_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Network(e.to_string())
    }
}
