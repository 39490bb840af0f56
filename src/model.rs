//! Records exchanged with the X API v2.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account as returned by the `author_id` expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

/// A liked post, enriched with its author when the response included one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedPost {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    /// Remaining fields (`public_metrics`, `entities`, ...) kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LikedPost {
    /// Creation time, when present and RFC 3339 formatted.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn author_username(&self) -> Option<&str> {
        self.author
            .as_ref()
            .map(|a| a.username.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Body of `GET /users/by/username/{handle}`.
#[derive(Debug, Deserialize)]
pub(crate) struct UserLookup {
    pub data: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserId {
    pub id: String,
}

/// One page of `GET /users/{id}/liked_tweets`.
#[derive(Debug, Deserialize)]
pub(crate) struct LikedPostsPage {
    pub data: Option<Vec<LikedPost>>,
    #[serde(default)]
    pub includes: Includes,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Includes {
    #[serde(default)]
    pub users: Vec<User>,
}

impl Includes {
    pub fn users_by_id(self) -> HashMap<String, User> {
        self.users.into_iter().map(|u| (u.id.clone(), u)).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Meta {
    pub next_token: Option<String>,
}
