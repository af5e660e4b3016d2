//! services/client/src/adapters/http.rs
//!
//! The shared HTTP plumbing used by every classroom adapter: base URL,
//! API-key and bearer headers, timeouts, and translation of failures into
//! `PortError`.

use std::time::Duration;

use classroom_core::ports::{PortError, PortResult};
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Header carrying the application's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Every backend payload is wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Pulls a human-readable `message` out of an error body, if it has one.
pub fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

pub fn map_reqwest_error(err: reqwest::Error) -> PortError {
    if err.is_timeout() {
        PortError::TimedOut
    } else if err.is_decode() {
        PortError::Unexpected(format!("Malformed response: {err}"))
    } else {
        PortError::Transport(err.to_string())
    }
}

//=========================================================================================
// ApiClient
//=========================================================================================

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            token: None,
        })
    }

    /// A copy of this client that authenticates as the session's user.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json")
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Sends the request; non-2xx answers become `PortError::Rejected`, using
    /// `fallback` when the body carries no message.
    pub async fn execute(&self, builder: RequestBuilder, fallback: &str) -> PortResult<Response> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body).unwrap_or_else(|| fallback.to_string());
        debug!(status = status.as_u16(), %message, "Request rejected");
        Err(PortError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    /// Sends the request and decodes the `data` of the response envelope.
    pub async fn fetch_data<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> PortResult<T> {
        let response = self.execute(builder, fallback).await?;
        let envelope: Envelope<T> = response.json().await.map_err(map_reqwest_error)?;
        Ok(envelope.data)
    }
}
