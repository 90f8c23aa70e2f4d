// src/source/twitter/wire.rs
//! Provider-native records of the Twitter v1.1 search API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::source::types::NO_MAX_ID;

/// `created_at` format used by the v1.1 API, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub id: i64,
    pub text: String,
    #[serde(deserialize_with = "de_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub retweet_count: u32,
    #[serde(default)]
    pub favorite_count: u32,
    #[serde(default)]
    pub lang: Option<String>,
    /// Present only on retweets.
    #[serde(default)]
    pub retweeted_status: Option<serde_json::Value>,
}

impl Status {
    pub fn is_retweet(&self) -> bool {
        self.retweeted_status.is_some()
    }
}

fn de_created_at<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(d)?;
    parse_created_at(&s).map_err(serde::de::Error::custom)
}

pub fn parse_created_at(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(s, CREATED_AT_FORMAT).map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchMetadata {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    /// e.g. `?max_id=1049808366046031871&q=rust&count=100&include_entities=1`
    #[serde(default)]
    pub next_results: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub statuses: Option<Vec<Status>>,
    #[serde(default)]
    pub search_metadata: SearchMetadata,
}

impl SearchResponse {
    pub fn has_next(&self) -> bool {
        self.search_metadata.next_results.is_some()
    }

    /// Continuation query: the cursor from `next_results` when it carries one,
    /// otherwise the lowest id of this page minus one.
    pub fn next_query(&self, previous: &TwitterQuery) -> Option<TwitterQuery> {
        let next_results = self.search_metadata.next_results.as_deref()?;
        let max_id = max_id_from_next_results(next_results).or_else(|| {
            self.statuses
                .as_ref()
                .and_then(|s| s.iter().map(|st| st.id).min())
                .map(|min| min - 1)
        })?;
        Some(TwitterQuery {
            max_id,
            ..previous.clone()
        })
    }
}

fn max_id_from_next_results(next_results: &str) -> Option<i64> {
    let url = reqwest::Url::parse(&format!("https://api.twitter.com/{next_results}")).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "max_id")
        .and_then(|(_, v)| v.parse().ok())
}

/// The provider's own query object; `LiveSource` applies lang/count/cursor to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwitterQuery {
    pub query: String,
    pub lang: Option<String>,
    pub count: u32,
    pub max_id: i64,
}

impl TwitterQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            lang: None,
            count: 0,
            max_id: NO_MAX_ID,
        }
    }

    /// Request parameters; unset values are omitted so the API applies its defaults.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.query.clone())];
        if self.count > 0 {
            params.push(("count", self.count.to_string()));
        }
        if let Some(lang) = &self.lang {
            params.push(("lang", lang.clone()));
        }
        if self.max_id >= 0 {
            params.push(("max_id", self.max_id.to_string()));
        }
        params
    }
}
