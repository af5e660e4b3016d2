//! services/client/src/adapters/auth.rs
//!
//! The HTTP adapter implementing the `AuthTransport` port against the
//! classroom backend's `/signin` endpoint.

use async_trait::async_trait;
use classroom_core::domain::SignInResponse;
use classroom_core::error::AUTH_FAILED_FALLBACK;
use classroom_core::ports::{AuthTransport, PortResult};
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::adapters::http::ApiClient;

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone, Debug)]
pub struct HttpAuthTransport {
    api: ApiClient,
    signout_path: Option<String>,
}

impl HttpAuthTransport {
    /// Creates a new `HttpAuthTransport`. Without a `signout_path` the remote
    /// sign-out notification is a no-op.
    pub fn new(api: ApiClient, signout_path: Option<String>) -> Self {
        Self { api, signout_path }
    }
}

//=========================================================================================
// `AuthTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<SignInResponse> {
        let request = self
            .api
            .request(Method::POST, "/signin")
            .json(&SignInRequest { email, password });
        self.api.fetch_data(request, AUTH_FAILED_FALLBACK).await
    }

    async fn sign_out(&self, token: &str) -> PortResult<()> {
        let Some(path) = &self.signout_path else {
            debug!("No sign-out endpoint configured");
            return Ok(());
        };
        let api = self.api.with_token(token);
        api.execute(api.request(Method::POST, path), "Sign-out failed")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::ports::PortError;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{bearer_token, body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer, signout: Option<&str>) -> HttpAuthTransport {
        let api = ApiClient::new(&server.uri(), "key", Duration::from_secs(5)).unwrap();
        HttpAuthTransport::new(api, signout.map(str::to_string))
    }

    #[tokio::test]
    async fn sign_in_posts_credentials_and_decodes_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .and(header("x-api-key", "key"))
            .and(body_json(json!({ "email": "a@b.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "_id": "u1",
                    "firstname": "A",
                    "lastname": "B",
                    "email": "a@b.com",
                    "role": "student",
                    "type": "student",
                    "confirmed": true,
                    "job": [],
                    "__v": 0,
                    "token": "abc123"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server, None).sign_in("a@b.com", "pw").await.unwrap();
        assert_eq!(response.token, "abc123");
        assert_eq!(response.profile.id, "u1");
    }

    #[tokio::test]
    async fn rejected_sign_in_carries_body_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "invalid credentials" })),
            )
            .mount(&server)
            .await;

        let err = transport(&server, None).sign_in("a@b.com", "pw").await.unwrap_err();
        assert_eq!(
            err,
            PortError::Rejected {
                status: 401,
                message: "invalid credentials".into()
            }
        );
    }

    #[tokio::test]
    async fn rejected_sign_in_without_body_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = transport(&server, None).sign_in("a@b.com", "pw").await.unwrap_err();
        assert_eq!(
            err,
            PortError::Rejected {
                status: 500,
                message: AUTH_FAILED_FALLBACK.into()
            }
        );
    }

    #[tokio::test]
    async fn sign_out_is_skipped_without_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        transport(&server, None).sign_out("abc123").await.unwrap();
    }

    #[tokio::test]
    async fn sign_out_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signout"))
            .and(bearer_token("abc123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        transport(&server, Some("/signout"))
            .sign_out("abc123")
            .await
            .unwrap();
    }
}
