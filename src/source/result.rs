// src/source/result.rs
use crate::source::types::{SocialMessage, SocialQuery};

/// One page of messages plus the pagination contract shared by every source.
///
/// `has_next()` is true only when a continuation query exists that strictly
/// advances the cursor, so `while result.has_next()` loops always terminate.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    messages: Vec<SocialMessage>,
    query: Option<String>,
    next: Option<SocialQuery>,
}

impl QueryResult {
    /// A final page: no continuation. Used by replay sources.
    pub fn last_page(messages: Vec<SocialMessage>) -> Self {
        Self {
            messages,
            query: None,
            next: None,
        }
    }

    /// A page that may continue. The continuation is dropped unless it moves
    /// the cursor strictly below `current`.
    pub fn page(
        messages: Vec<SocialMessage>,
        query: Option<String>,
        current: &SocialQuery,
        next: Option<SocialQuery>,
    ) -> Self {
        let next = next.filter(|n| {
            let advances = n.max_id >= 0 && (!current.has_cursor() || n.max_id < current.max_id);
            if !advances {
                tracing::warn!(
                    current_max_id = current.max_id,
                    next_max_id = n.max_id,
                    "continuation does not advance the cursor; ending pagination"
                );
            }
            advances
        });
        Self {
            messages,
            query,
            next,
        }
    }

    /// Messages in provider order.
    pub fn messages(&self) -> &[SocialMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<SocialMessage> {
        self.messages
    }

    /// Echo of the query text the provider answered, if it reports one.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// `None` when `has_next()` is false; that is the loop-termination sentinel.
    pub fn next_query(&self) -> Option<SocialQuery> {
        self.next.clone()
    }
}
