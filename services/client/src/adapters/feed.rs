//! services/client/src/adapters/feed.rs
//!
//! The HTTP adapter implementing the `FeedService` port: status posts,
//! comments and likes.

use async_trait::async_trait;
use classroom_core::domain::Post;
use classroom_core::ports::{FeedService, PortResult};
use reqwest::Method;
use serde::Serialize;

use crate::adapters::http::ApiClient;

const FEED_FAILED: &str = "Feed request failed";

#[derive(Serialize)]
struct ContentBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody<'a> {
    content: &'a str,
    status_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentRef<'a> {
    status_id: &'a str,
    comment_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusRef<'a> {
    status_id: &'a str,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Expects an `ApiClient` carrying the session's bearer token.
#[derive(Clone, Debug)]
pub struct HttpFeedService {
    api: ApiClient,
}

impl HttpFeedService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn send<B: Serialize + Sync>(&self, method: Method, path: &str, body: &B) -> PortResult<()> {
        let request = self.api.request(method, path).json(body);
        self.api.execute(request, FEED_FAILED).await?;
        Ok(())
    }
}

//=========================================================================================
// `FeedService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FeedService for HttpFeedService {
    async fn list_posts(&self) -> PortResult<Vec<Post>> {
        let request = self.api.request(Method::GET, "/status");
        self.api.fetch_data(request, FEED_FAILED).await
    }

    async fn create_post(&self, content: &str) -> PortResult<()> {
        self.send(Method::POST, "/status", &ContentBody { content }).await
    }

    async fn delete_post(&self, post_id: &str) -> PortResult<()> {
        let request = self.api.request(Method::DELETE, &format!("/status/{post_id}"));
        self.api.execute(request, FEED_FAILED).await?;
        Ok(())
    }

    async fn create_comment(&self, post_id: &str, content: &str) -> PortResult<()> {
        let body = CommentBody {
            content,
            status_id: post_id,
        };
        self.send(Method::POST, "/comment", &body).await
    }

    async fn delete_comment(&self, post_id: &str, comment_id: &str) -> PortResult<()> {
        let body = CommentRef {
            status_id: post_id,
            comment_id,
        };
        self.send(Method::DELETE, &format!("/comment/{comment_id}"), &body)
            .await
    }

    async fn like(&self, post_id: &str) -> PortResult<()> {
        self.send(Method::POST, "/like", &StatusRef { status_id: post_id })
            .await
    }

    async fn unlike(&self, post_id: &str) -> PortResult<()> {
        self.send(Method::DELETE, "/like", &StatusRef { status_id: post_id })
            .await
    }
}
