//! crates/classroom_core/src/domain.rs
//!
//! Defines the core data structures for the classroom client.
//! Field names follow the backend's JSON so the same structs serve as the
//! persisted profile record and as the decoded API payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

//=========================================================================================
// Identity
//=========================================================================================

/// The authenticated identity held by the running client.
///
/// A `Session` always carries both halves; "no session" is expressed as
/// `Option<Session>::None`, never as a session with a missing token or user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

/// Profile data returned by sign-in and by the class roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "type", default)]
    pub account_type: String,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Education>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// "Firstname Lastname", trimmed when either half is blank.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }
}

/// Optional education sub-record of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub major: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub enrollment_year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub school_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub school_province: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub advisor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<School>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub logo: String,
}

/// The `data` object of a successful sign-in: the token plus the remaining
/// profile fields at the same level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInResponse {
    pub token: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

//=========================================================================================
// Feed
//=========================================================================================

/// The short author record embedded in posts, comments and likes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Author {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }
}

/// A status post in the class feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub created_by: Author,
    #[serde(rename = "like", default)]
    pub likes: Vec<Author>,
    #[serde(rename = "comment", default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub created_by: Author,
    pub created_at: DateTime<Utc>,
}

/// Accepts a string, a number, or null where the backend is inconsistent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
