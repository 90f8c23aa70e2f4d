// src/source/types.rs
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Canonical social post, independent of the provider it came from.
///
/// Field names on the wire match the fixture format (`numOfShares`,
/// `isShareOrRetweet`, ...), so fixtures written by one provider can be
/// replayed by another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialMessage {
    pub text: String,
    /// Epoch milliseconds.
    #[serde(default = "now_millis")]
    pub timestamp: i64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub num_of_shares: u32,
    #[serde(default)]
    pub num_of_likes: u32,
    #[serde(default)]
    pub is_share_or_retweet: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Provider-scoped; not unique across providers.
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<HashMap<String, u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub sentiment: f64,
}

impl SocialMessage {
    /// Message stamped with the ingestion time.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_timestamp(text, now_millis())
    }

    pub fn with_timestamp(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            timestamp,
            source: String::new(),
            num_of_shares: 0,
            num_of_likes: 0,
            is_share_or_retweet: false,
            lang: None,
            id: 0,
            reactions: None,
            topics: None,
            sentiment: 0.0,
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Sentinel for "no upper id bound applied yet".
pub const NO_MAX_ID: i64 = -1;

/// Canonical search request. `count == 0` means "provider default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialQuery {
    pub query: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub count: u32,
    #[serde(default = "no_max_id")]
    pub max_id: i64,
}

fn no_max_id() -> i64 {
    NO_MAX_ID
}

impl Default for SocialQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            lang: None,
            count: 0,
            max_id: NO_MAX_ID,
        }
    }
}

impl SocialQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_max_id(mut self, max_id: i64) -> Self {
        self.max_id = max_id;
        self
    }

    /// True once a cursor has been applied by pagination.
    pub fn has_cursor(&self) -> bool {
        self.max_id != NO_MAX_ID
    }
}
