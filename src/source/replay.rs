// src/source/replay.rs
use std::path::Path;

use async_trait::async_trait;
use metrics::counter;

use crate::error::{PipelineError, Result};
use crate::source::result::QueryResult;
use crate::source::types::{SocialMessage, SocialQuery};
use crate::source::SocialSource;
use crate::telemetry::ensure_metrics_described;

pub const SOURCE_NAME: &str = "Replay";

const BUNDLED_MESSAGES: &str = include_str!("../../fixtures/messages.json");

/// `ReplaySource`: returns a fixed list of messages for every query.
/// The query text is ignored and there is never a next page.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    messages: Vec<SocialMessage>,
}

impl ReplaySource {
    pub fn from_messages(messages: Vec<SocialMessage>) -> Self {
        Self { messages }
    }

    /// The fixture compiled into the crate.
    pub fn bundled() -> Result<Self> {
        Ok(Self::from_messages(parse_messages(BUNDLED_MESSAGES)?))
    }

    /// One-time load of a JSON array of messages.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("reading messages from {}: {e}", path.display()))
        })?;
        let messages = parse_messages(&content)?;
        tracing::info!(path = %path.display(), messages = messages.len(), "replay fixture loaded");
        Ok(Self::from_messages(messages))
    }

    pub fn set_messages(&mut self, messages: Vec<SocialMessage>) {
        self.messages = messages;
    }

    pub fn messages(&self) -> &[SocialMessage] {
        &self.messages
    }
}

pub(crate) fn parse_messages(json: &str) -> Result<Vec<SocialMessage>> {
    serde_json::from_str(json)
        .map_err(|e| PipelineError::Config(format!("invalid messages fixture: {e}")))
}

#[async_trait]
impl SocialSource for ReplaySource {
    async fn search(&self, _query: &SocialQuery) -> Result<QueryResult> {
        ensure_metrics_described();
        counter!("source_search_total", "source" => SOURCE_NAME).increment(1);
        counter!("source_messages_total", "source" => SOURCE_NAME)
            .increment(self.messages.len() as u64);
        Ok(QueryResult::last_page(self.messages.clone()))
    }

    fn set_credential(&mut self, _key: &str, _secret: &str) {}

    fn set_access_token(&mut self, _token: &str, _token_secret: &str) {}

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_fixture_parses() {
        let src = ReplaySource::bundled().unwrap();
        assert!(!src.messages().is_empty());
        assert!(src.messages().iter().all(|m| !m.text.is_empty()));
    }

    #[test]
    fn malformed_fixture_is_a_config_error() {
        let err = parse_messages("{not json").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
