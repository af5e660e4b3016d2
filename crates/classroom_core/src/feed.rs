//! crates/classroom_core/src/feed.rs
//!
//! Feed bookkeeping: ownership checks, like toggling, comment expansion and
//! relative timestamps, plus a controller that re-fetches the post list after
//! every mutation.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::{Comment, Post, UserProfile};
use crate::ports::{FeedService, PortError};

/// Comments shown under a post while it is collapsed.
pub const COLLAPSED_COMMENT_COUNT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("Content must not be empty")]
    EmptyContent,
    #[error("Post {0} is not in the feed")]
    UnknownPost(String),
    #[error("Comment {0} is not on this post")]
    UnknownComment(String),
    #[error("Only the author can delete this")]
    NotOwner,
    #[error(transparent)]
    Port(#[from] PortError),
}

//=========================================================================================
// Ownership
//=========================================================================================

pub fn is_own_post(post: &Post, user: &UserProfile) -> bool {
    post.created_by.id == user.id
}

pub fn is_own_comment(comment: &Comment, user: &UserProfile) -> bool {
    comment.created_by.id == user.id
}

pub fn is_liked_by(post: &Post, user: &UserProfile) -> bool {
    post.likes.iter().any(|like| like.id == user.id)
}

/// Which call flips the current user's like on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

impl LikeAction {
    pub fn for_post(post: &Post, user: &UserProfile) -> Self {
        if is_liked_by(post, user) {
            Self::Unlike
        } else {
            Self::Like
        }
    }
}

//=========================================================================================
// Comment expansion
//=========================================================================================

/// Posts whose full comment list is shown.
#[derive(Debug, Clone, Default)]
pub struct CommentExpansion {
    expanded: HashSet<String>,
}

impl CommentExpansion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the post's state and returns whether it is now expanded.
    pub fn toggle(&mut self, post_id: &str) -> bool {
        if self.expanded.remove(post_id) {
            false
        } else {
            self.expanded.insert(post_id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, post_id: &str) -> bool {
        self.expanded.contains(post_id)
    }

    pub fn visible_comments<'a>(&self, post: &'a Post) -> &'a [Comment] {
        if self.is_expanded(&post.id) {
            &post.comments
        } else {
            let shown = post.comments.len().min(COLLAPSED_COMMENT_COUNT);
            &post.comments[..shown]
        }
    }

    pub fn hidden_count(&self, post: &Post) -> usize {
        post.comments.len() - self.visible_comments(post).len()
    }
}

//=========================================================================================
// Timestamps
//=========================================================================================

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// "5 minutes ago", "3 hours ago", "2 days ago", then a calendar date from a
/// week onwards. Timestamps in the future read as "0 minutes ago".
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let hours = elapsed.num_hours();
    let days = hours / 24;

    if hours < 1 {
        plural(elapsed.num_minutes().max(0), "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        then.format("%b %-d, %Y").to_string()
    }
}

//=========================================================================================
// FeedController
//=========================================================================================

/// Holds the current post list and keeps it in step with the backend.
pub struct FeedController {
    service: Arc<dyn FeedService>,
    posts: Vec<Post>,
}

impl FeedController {
    pub fn new(service: Arc<dyn FeedService>) -> Self {
        Self {
            service,
            posts: Vec::new(),
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, post_id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    pub async fn refresh(&mut self) -> Result<&[Post], FeedError> {
        self.posts = self.service.list_posts().await?;
        debug!(count = self.posts.len(), "Feed refreshed");
        Ok(&self.posts)
    }

    pub async fn create_post(&mut self, content: &str) -> Result<(), FeedError> {
        let content = non_empty(content)?;
        self.service.create_post(content).await?;
        info!("Post created");
        self.refresh().await?;
        Ok(())
    }

    pub async fn delete_post(&mut self, post_id: &str, user: &UserProfile) -> Result<(), FeedError> {
        let post = self.known_post(post_id)?;
        if !is_own_post(post, user) {
            return Err(FeedError::NotOwner);
        }
        self.service.delete_post(post_id).await?;
        info!(post_id, "Post deleted");
        self.refresh().await?;
        Ok(())
    }

    pub async fn add_comment(&mut self, post_id: &str, content: &str) -> Result<(), FeedError> {
        let content = non_empty(content)?;
        self.known_post(post_id)?;
        self.service.create_comment(post_id, content).await?;
        info!(post_id, "Comment added");
        self.refresh().await?;
        Ok(())
    }

    pub async fn delete_comment(
        &mut self,
        post_id: &str,
        comment_id: &str,
        user: &UserProfile,
    ) -> Result<(), FeedError> {
        let comment = self
            .known_post(post_id)?
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| FeedError::UnknownComment(comment_id.to_string()))?;
        if !is_own_comment(comment, user) {
            return Err(FeedError::NotOwner);
        }
        self.service.delete_comment(post_id, comment_id).await?;
        info!(post_id, comment_id, "Comment deleted");
        self.refresh().await?;
        Ok(())
    }

    /// Likes the post if `user` has not yet, otherwise unlikes it.
    pub async fn toggle_like(
        &mut self,
        post_id: &str,
        user: &UserProfile,
    ) -> Result<LikeAction, FeedError> {
        let action = LikeAction::for_post(self.known_post(post_id)?, user);
        match action {
            LikeAction::Like => self.service.like(post_id).await?,
            LikeAction::Unlike => self.service.unlike(post_id).await?,
        }
        info!(post_id, ?action, "Like toggled");
        self.refresh().await?;
        Ok(action)
    }

    fn known_post(&self, post_id: &str) -> Result<&Post, FeedError> {
        self.post(post_id)
            .ok_or_else(|| FeedError::UnknownPost(post_id.to_string()))
    }
}

fn non_empty(content: &str) -> Result<&str, FeedError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(FeedError::EmptyContent)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Author;
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    fn author(id: &str) -> Author {
        Author {
            id: id.into(),
            firstname: id.to_uppercase(),
            lastname: "Test".into(),
            email: format!("{id}@kkumail.com"),
            image: None,
        }
    }

    fn user(id: &str) -> UserProfile {
        UserProfile {
            id: id.into(),
            firstname: String::new(),
            lastname: String::new(),
            email: format!("{id}@kkumail.com"),
            role: "student".into(),
            account_type: "student".into(),
            confirmed: true,
            education: None,
            image: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn comment(id: &str, by: &str) -> Comment {
        Comment {
            id: id.into(),
            content: format!("comment {id}"),
            created_by: author(by),
            created_at: at(10),
        }
    }

    fn post(id: &str, by: &str) -> Post {
        Post {
            id: id.into(),
            content: format!("post {id}"),
            created_by: author(by),
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: at(9),
            updated_at: None,
        }
    }

    //=====================================================================================
    // Pure helpers
    //=====================================================================================

    #[test]
    fn ownership_compares_ids() {
        let mine = post("p1", "u1");
        assert!(is_own_post(&mine, &user("u1")));
        assert!(!is_own_post(&mine, &user("u2")));
        assert!(is_own_comment(&comment("c1", "u2"), &user("u2")));
    }

    #[test]
    fn like_action_follows_current_likes() {
        let mut p = post("p1", "u1");
        assert_eq!(LikeAction::for_post(&p, &user("u2")), LikeAction::Like);
        p.likes.push(author("u2"));
        assert_eq!(LikeAction::for_post(&p, &user("u2")), LikeAction::Unlike);
        assert_eq!(LikeAction::for_post(&p, &user("u3")), LikeAction::Like);
    }

    #[test]
    fn collapsed_posts_show_two_comments() {
        let mut p = post("p1", "u1");
        p.comments = (0..5).map(|i| comment(&format!("c{i}"), "u2")).collect();
        let mut expansion = CommentExpansion::new();

        assert_eq!(expansion.visible_comments(&p).len(), 2);
        assert_eq!(expansion.hidden_count(&p), 3);

        assert!(expansion.toggle("p1"));
        assert_eq!(expansion.visible_comments(&p).len(), 5);
        assert_eq!(expansion.hidden_count(&p), 0);

        assert!(!expansion.toggle("p1"));
        assert!(!expansion.is_expanded("p1"));

        let short = post("p2", "u1");
        assert!(expansion.visible_comments(&short).is_empty());
    }

    #[test]
    fn relative_times() {
        let now = at(12);
        assert_eq!(format_relative(now - Duration::seconds(30), now), "0 minutes ago");
        assert_eq!(format_relative(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_relative(now - Duration::minutes(59), now), "59 minutes ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(format_relative(now - Duration::hours(30), now), "1 day ago");
        assert_eq!(format_relative(now - Duration::days(6), now), "6 days ago");
        assert_eq!(format_relative(now - Duration::days(7), now), "Apr 24, 2024");
        assert_eq!(format_relative(now + Duration::minutes(5), now), "0 minutes ago");
    }

    //=====================================================================================
    // Controller
    //=====================================================================================

    #[derive(Default)]
    struct FakeFeed {
        posts: Mutex<Vec<Post>>,
        calls: Mutex<Vec<String>>,
        list_calls: Mutex<usize>,
    }

    impl FakeFeed {
        fn seeded(posts: Vec<Post>) -> Self {
            Self {
                posts: Mutex::new(posts),
                ..Default::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl FeedService for FakeFeed {
        async fn list_posts(&self) -> PortResult<Vec<Post>> {
            *self.list_calls.lock().unwrap() += 1;
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn create_post(&self, content: &str) -> PortResult<()> {
            self.record(format!("create_post:{content}"));
            let mut created = post("new", "u1");
            created.content = content.to_string();
            self.posts.lock().unwrap().insert(0, created);
            Ok(())
        }

        async fn delete_post(&self, post_id: &str) -> PortResult<()> {
            self.record(format!("delete_post:{post_id}"));
            self.posts.lock().unwrap().retain(|p| p.id != post_id);
            Ok(())
        }

        async fn create_comment(&self, post_id: &str, content: &str) -> PortResult<()> {
            self.record(format!("create_comment:{post_id}:{content}"));
            Ok(())
        }

        async fn delete_comment(&self, post_id: &str, comment_id: &str) -> PortResult<()> {
            self.record(format!("delete_comment:{post_id}:{comment_id}"));
            Ok(())
        }

        async fn like(&self, post_id: &str) -> PortResult<()> {
            self.record(format!("like:{post_id}"));
            if let Some(p) = self.posts.lock().unwrap().iter_mut().find(|p| p.id == post_id) {
                p.likes.push(author("u1"));
            }
            Ok(())
        }

        async fn unlike(&self, post_id: &str) -> PortResult<()> {
            self.record(format!("unlike:{post_id}"));
            if let Some(p) = self.posts.lock().unwrap().iter_mut().find(|p| p.id == post_id) {
                p.likes.retain(|a| a.id != "u1");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn mutations_refetch_the_list() {
        let service = Arc::new(FakeFeed::seeded(vec![post("p1", "u1")]));
        let mut feed = FeedController::new(service.clone());
        feed.refresh().await.unwrap();

        feed.create_post("  hello class  ").await.unwrap();
        assert_eq!(feed.posts().len(), 2);
        assert_eq!(feed.posts()[0].content, "hello class");
        assert_eq!(*service.list_calls.lock().unwrap(), 2);

        feed.delete_post("p1", &user("u1")).await.unwrap();
        assert!(feed.post("p1").is_none());
        assert_eq!(*service.list_calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn toggle_like_flips_between_calls() {
        let service = Arc::new(FakeFeed::seeded(vec![post("p1", "u2")]));
        let mut feed = FeedController::new(service.clone());
        feed.refresh().await.unwrap();
        let me = user("u1");

        assert_eq!(feed.toggle_like("p1", &me).await.unwrap(), LikeAction::Like);
        assert!(is_liked_by(feed.post("p1").unwrap(), &me));
        assert_eq!(feed.toggle_like("p1", &me).await.unwrap(), LikeAction::Unlike);
        assert!(!is_liked_by(feed.post("p1").unwrap(), &me));

        assert_eq!(*service.calls.lock().unwrap(), vec!["like:p1", "unlike:p1"]);
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_any_call() {
        let service = Arc::new(FakeFeed::seeded(vec![post("p1", "u1")]));
        let mut feed = FeedController::new(service.clone());
        feed.refresh().await.unwrap();

        assert_eq!(feed.create_post("   ").await, Err(FeedError::EmptyContent));
        assert_eq!(feed.add_comment("p1", "\n").await, Err(FeedError::EmptyContent));
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_others_content_is_refused() {
        let mut p = post("p1", "u2");
        p.comments.push(comment("c1", "u2"));
        let service = Arc::new(FakeFeed::seeded(vec![p]));
        let mut feed = FeedController::new(service.clone());
        feed.refresh().await.unwrap();
        let me = user("u1");

        assert_eq!(feed.delete_post("p1", &me).await, Err(FeedError::NotOwner));
        assert_eq!(feed.delete_comment("p1", "c1", &me).await, Err(FeedError::NotOwner));
        assert_eq!(
            feed.delete_comment("p1", "c9", &me).await,
            Err(FeedError::UnknownComment("c9".into()))
        );
        assert_eq!(
            feed.toggle_like("missing", &me).await,
            Err(FeedError::UnknownPost("missing".into()))
        );
        assert!(service.calls.lock().unwrap().is_empty());

        feed.delete_comment("p1", "c1", &user("u2")).await.unwrap();
        assert_eq!(*service.calls.lock().unwrap(), vec!["delete_comment:p1:c1"]);
    }
}
