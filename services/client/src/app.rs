//! services/client/src/app.rs
//!
//! Wires configuration, adapters and the session core together and executes
//! one command at a time behind the route guard.

use std::sync::Arc;

use chrono::Utc;
use classroom_core::feed::{CommentExpansion, FeedController, LikeAction};
use classroom_core::guard::RouteGuard;
use classroom_core::ports::RosterService;
use classroom_core::session::SessionStore;
use classroom_core::domain::UserProfile;
use tracing::{info, warn};

use crate::adapters::{ApiClient, FileStore, HttpAuthTransport, HttpFeedService, HttpRosterService};
use crate::cli::Command;
use crate::config::Config;
use crate::error::ClientError;
use crate::render;

//=========================================================================================
// App (created once per process)
//=========================================================================================

pub struct App {
    api: ApiClient,
    session: Arc<SessionStore>,
    guard: RouteGuard,
}

impl App {
    /// Builds the adapters and restores the persisted session.
    pub async fn start(config: &Config) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config.api_url, &config.api_key, config.request_timeout)?;

        let storage = Arc::new(FileStore::new(&config.session_path));
        info!(path = %storage.path().display(), "Using session file");
        let transport = Arc::new(HttpAuthTransport::new(
            api.clone(),
            config.signout_path.clone(),
        ));

        let session = Arc::new(SessionStore::new(storage, transport));
        session.initialize().await;

        Ok(Self {
            api,
            session,
            guard: RouteGuard::default(),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Runs one command and returns what should be printed.
    pub async fn run(&self, command: Command) -> Result<String, ClientError> {
        let here = command.location();
        if let Some(target) = self.guard.evaluate(self.session.status(), &here) {
            info!(from = %here, to = %target, "Redirecting");
            if &target == self.guard.policy().sign_in_entry() {
                return match command {
                    Command::Signout => Ok("Not signed in.\n".to_string()),
                    _ => Err(ClientError::SignInRequired),
                };
            }
            // The landing location is the feed.
            let user = self.current_user()?;
            let mut out = format!("Already signed in as {}.\n\n", user.display_name());
            out.push_str(&self.show_feed(&[], false).await?);
            return Ok(out);
        }

        match command {
            Command::Signin { email, password } => {
                let user = self.session.sign_in(&email, &password).await?;
                Ok(format!("Signed in as {} <{}>.\n", user.display_name(), user.email))
            }
            Command::Signout => {
                let remote = self.session.sign_out().await;
                if let Err(e) = remote.await {
                    warn!(error = %e, "Remote sign-out task did not finish");
                }
                Ok("Signed out.\n".to_string())
            }
            Command::Whoami => Ok(render::profile(&self.current_user()?)),
            Command::Posts {
                expand,
                all_comments,
            } => self.show_feed(&expand, all_comments).await,
            Command::Post { content } => {
                let mut feed = self.feed()?;
                feed.create_post(&content).await?;
                self.render_feed(&feed, "Posted.")
            }
            Command::DeletePost { post_id } => {
                let user = self.current_user()?;
                let mut feed = self.feed()?;
                feed.refresh().await?;
                feed.delete_post(&post_id, &user).await?;
                Ok(format!("Deleted post {post_id}.\n"))
            }
            Command::Comment { post_id, content } => {
                let mut feed = self.feed()?;
                feed.refresh().await?;
                feed.add_comment(&post_id, &content).await?;
                Ok(format!("Commented on post {post_id}.\n"))
            }
            Command::DeleteComment {
                post_id,
                comment_id,
            } => {
                let user = self.current_user()?;
                let mut feed = self.feed()?;
                feed.refresh().await?;
                feed.delete_comment(&post_id, &comment_id, &user).await?;
                Ok(format!("Deleted comment {comment_id}.\n"))
            }
            Command::Like { post_id } => {
                let user = self.current_user()?;
                let mut feed = self.feed()?;
                feed.refresh().await?;
                let verb = match feed.toggle_like(&post_id, &user).await? {
                    LikeAction::Like => "Liked",
                    LikeAction::Unlike => "Unliked",
                };
                Ok(format!("{verb} post {post_id}.\n"))
            }
            Command::Students { year } => {
                let roster = HttpRosterService::new(self.authorized_api()?);
                let students = roster.students_by_year(&year).await?;
                Ok(render::students(&year, &students))
            }
        }
    }

    // --- Helpers ---

    fn current_user(&self) -> Result<UserProfile, ClientError> {
        self.session.user().ok_or(ClientError::SignInRequired)
    }

    fn authorized_api(&self) -> Result<ApiClient, ClientError> {
        let token = self.session.token().ok_or(ClientError::SignInRequired)?;
        Ok(self.api.with_token(token))
    }

    fn feed(&self) -> Result<FeedController, ClientError> {
        let service = HttpFeedService::new(self.authorized_api()?);
        Ok(FeedController::new(Arc::new(service)))
    }

    async fn show_feed(&self, expand: &[String], all_comments: bool) -> Result<String, ClientError> {
        let mut feed = self.feed()?;
        let posts = feed.refresh().await?;

        let mut expansion = CommentExpansion::new();
        let ids: Vec<&str> = if all_comments {
            posts.iter().map(|p| p.id.as_str()).collect()
        } else {
            expand.iter().map(String::as_str).collect()
        };
        for id in ids {
            if !expansion.is_expanded(id) {
                expansion.toggle(id);
            }
        }

        let user = self.current_user()?;
        Ok(render::feed(feed.posts(), &user, &expansion, Utc::now()))
    }

    fn render_feed(&self, feed: &FeedController, headline: &str) -> Result<String, ClientError> {
        let user = self.current_user()?;
        let body = render::feed(feed.posts(), &user, &CommentExpansion::new(), Utc::now());
        Ok(format!("{headline}\n\n{body}"))
    }
}
