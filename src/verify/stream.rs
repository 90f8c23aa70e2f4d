// src/verify/stream.rs
//! Boundary to the partitioned event stream the verifier reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// One event as delivered by a partition receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    /// Raw body; `None` when the event carried no payload.
    pub payload: Option<Vec<u8>>,
    pub partition_id: String,
    pub sequence_number: i64,
    pub offset: String,
    pub enqueued_time: DateTime<Utc>,
}

impl StreamRecord {
    pub fn new(partition_id: impl Into<String>, sequence_number: i64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            partition_id: partition_id.into(),
            sequence_number,
            offset: sequence_number.to_string(),
            enqueued_time: Utc::now(),
        }
    }
}

/// Where a receiver starts reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPosition {
    /// Beginning of the retained stream.
    Start,
    /// Only events enqueued strictly after this instant.
    EnqueuedAfter(DateTime<Utc>),
    /// Only events after this offset.
    Offset(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PartitionSelector {
    #[default]
    FirstAvailable,
    Id(String),
}

impl PartitionSelector {
    /// `None` when the selection cannot be satisfied by `available`.
    pub fn resolve(&self, available: &[String]) -> Option<String> {
        match self {
            PartitionSelector::FirstAvailable => available.first().cloned(),
            PartitionSelector::Id(id) => available.iter().find(|p| *p == id).cloned(),
        }
    }
}

/// A connection to the stream service.
#[async_trait]
pub trait EventStreamClient: Send + Sync {
    async fn partition_ids(&self) -> Result<Vec<String>>;
    async fn open_receiver(
        &self,
        partition_id: &str,
        position: EventPosition,
    ) -> Result<Box<dyn PartitionReceiver>>;
    async fn close(&self) -> Result<()>;
}

/// An exclusive subscription to one partition.
#[async_trait]
pub trait PartitionReceiver: Send {
    /// Up to `max` records in stream order. An empty batch means nothing
    /// arrived yet; `None` means the stream has ended.
    async fn receive(&mut self, max: usize) -> Result<Option<Vec<StreamRecord>>>;
    async fn close(&mut self) -> Result<()>;
}
