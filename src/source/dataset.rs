// src/source/dataset.rs
//! Collecting messages into fixture files for replay.

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::source::replay::parse_messages;
use crate::source::types::{SocialMessage, SocialQuery};
use crate::source::SocialSource;

/// Page through `source` until `limit` messages are collected or the
/// provider has no further pages.
pub async fn collect<S: SocialSource + ?Sized>(
    source: &S,
    query: SocialQuery,
    limit: usize,
) -> Result<Vec<SocialMessage>> {
    let mut out = Vec::new();
    let mut next = Some(query);
    let mut pages = 0usize;

    while let Some(q) = next.take() {
        let result = source.search(&q).await?;
        pages += 1;
        let continuation = result.next_query();
        out.extend(result.into_messages());
        if out.len() >= limit {
            out.truncate(limit);
            break;
        }
        next = continuation;
    }

    tracing::info!(source = source.name(), pages, messages = out.len(), "collected dataset");
    Ok(out)
}

pub fn write_messages(path: &Path, messages: &[SocialMessage]) -> Result<()> {
    let json = serde_json::to_string(messages)
        .map_err(|e| PipelineError::Config(format!("serializing messages: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| PipelineError::Config(format!("writing {}: {e}", path.display())))
}

pub fn read_messages(path: &Path) -> Result<Vec<SocialMessage>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::Config(format!("reading {}: {e}", path.display())))?;
    parse_messages(&content)
}
