// src/verify/capture.rs
//! File-backed stream transport: `<dir>/<partition>.jsonl`, one captured
//! event per line. Used for offline runs and local dry runs of the CLI.
//!
//! Line shape:
//! `{"sequenceNumber":3,"offset":"384","enqueuedTime":"2024-01-01T10:05:02Z","body":{...}}`

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::verify::stream::{EventPosition, EventStreamClient, PartitionReceiver, StreamRecord};

const EXTENSION: &str = "jsonl";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapturedEvent {
    #[serde(default)]
    sequence_number: Option<i64>,
    #[serde(default)]
    offset: Option<String>,
    #[serde(default)]
    enqueued_time: Option<DateTime<Utc>>,
    #[serde(default)]
    body: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct CaptureStream {
    dir: PathBuf,
}

impl CaptureStream {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn partition_path(&self, partition_id: &str) -> PathBuf {
        self.dir.join(format!("{partition_id}.{EXTENSION}"))
    }
}

#[async_trait]
impl EventStreamClient for CaptureStream {
    async fn partition_ids(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            PipelineError::Connection(format!("opening capture dir {}: {e}", self.dir.display()))
        })?;
        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::Connection(format!("listing capture dir: {e}")))?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn open_receiver(
        &self,
        partition_id: &str,
        position: EventPosition,
    ) -> Result<Box<dyn PartitionReceiver>> {
        let path = self.partition_path(partition_id);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            PipelineError::Connection(format!("opening partition {}: {e}", path.display()))
        })?;

        let all: Vec<StreamRecord> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| decode_line(partition_id, idx as i64, line))
            .collect();
        let pending = apply_position(partition_id, all, &position)?;
        tracing::debug!(partition = partition_id, pending = pending.len(), "capture receiver opened");

        Ok(Box::new(CaptureReceiver {
            pending,
            closed: false,
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A line is a capture envelope only when it is a JSON object with a `body`
/// key. Anything else (bare alerts, garbage) is delivered with the raw line
/// as payload, so the verifier evaluates it like any other event.
fn decode_line(partition_id: &str, idx: i64, line: &str) -> StreamRecord {
    let envelope = serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .filter(|v| v.as_object().is_some_and(|o| o.contains_key("body")))
        .and_then(|v| serde_json::from_value::<CapturedEvent>(v).ok());

    match envelope {
        Some(ev) => {
            let sequence_number = ev.sequence_number.unwrap_or(idx);
            StreamRecord {
                payload: ev.body.map(|body| match body {
                    serde_json::Value::String(s) => s.into_bytes(),
                    other => other.to_string().into_bytes(),
                }),
                partition_id: partition_id.to_string(),
                sequence_number,
                offset: ev.offset.unwrap_or_else(|| sequence_number.to_string()),
                enqueued_time: ev.enqueued_time.unwrap_or_default(),
            }
        }
        None => StreamRecord {
            payload: Some(line.as_bytes().to_vec()),
            partition_id: partition_id.to_string(),
            sequence_number: idx,
            offset: idx.to_string(),
            enqueued_time: DateTime::<Utc>::default(),
        },
    }
}

/// An `Offset` position that is not present in the partition is an error,
/// not an empty stream.
fn apply_position(
    partition_id: &str,
    records: Vec<StreamRecord>,
    position: &EventPosition,
) -> Result<VecDeque<StreamRecord>> {
    match position {
        EventPosition::Start => Ok(records.into()),
        EventPosition::EnqueuedAfter(t) => Ok(records
            .into_iter()
            .filter(|r| r.enqueued_time > *t)
            .collect()),
        EventPosition::Offset(offset) => match records.iter().position(|r| &r.offset == offset) {
            Some(i) => Ok(records.into_iter().skip(i + 1).collect()),
            None => Err(PipelineError::Connection(format!(
                "offset {offset:?} not found in partition {partition_id}"
            ))),
        },
    }
}

struct CaptureReceiver {
    pending: VecDeque<StreamRecord>,
    closed: bool,
}

#[async_trait]
impl PartitionReceiver for CaptureReceiver {
    async fn receive(&mut self, max: usize) -> Result<Option<Vec<StreamRecord>>> {
        if self.closed {
            return Err(PipelineError::Connection("receiver is closed".into()));
        }
        if self.pending.is_empty() {
            return Ok(None);
        }
        let n = max.min(self.pending.len());
        Ok(Some(self.pending.drain(..n).collect()))
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
