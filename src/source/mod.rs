// src/source/mod.rs
pub mod dataset;
pub mod replay;
pub mod result;
pub mod twitter;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
pub use replay::ReplaySource;
pub use result::QueryResult;
pub use twitter::TwitterSource;
pub use types::{SocialMessage, SocialQuery};

/// Capability every message provider exposes.
#[async_trait]
pub trait SocialSource: Send + Sync {
    /// One provider round trip. Provider failures surface as
    /// `PipelineError::Provider`, never as an empty page.
    async fn search(&self, query: &SocialQuery) -> Result<QueryResult>;
    fn set_credential(&mut self, key: &str, secret: &str);
    fn set_access_token(&mut self, token: &str, token_secret: &str);
    fn name(&self) -> &'static str;
}

/// The closed set of sources shipped with the crate.
pub enum Source {
    Live(TwitterSource),
    Replay(ReplaySource),
}

#[async_trait]
impl SocialSource for Source {
    async fn search(&self, query: &SocialQuery) -> Result<QueryResult> {
        match self {
            Source::Live(s) => s.search(query).await,
            Source::Replay(s) => s.search(query).await,
        }
    }

    fn set_credential(&mut self, key: &str, secret: &str) {
        match self {
            Source::Live(s) => s.set_credential(key, secret),
            Source::Replay(s) => s.set_credential(key, secret),
        }
    }

    fn set_access_token(&mut self, token: &str, token_secret: &str) {
        match self {
            Source::Live(s) => s.set_access_token(token, token_secret),
            Source::Replay(s) => s.set_access_token(token, token_secret),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Source::Live(s) => s.name(),
            Source::Replay(s) => s.name(),
        }
    }
}
