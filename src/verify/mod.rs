// src/verify/mod.rs
//! Time-boxed verification that a downstream pipeline emitted an expected
//! record on a partitioned event stream.
//!
//! A background task pulls batches from one partition receiver and pushes
//! records onto a bounded channel. The caller evaluates each record against
//! a [`RecordMatcher`] and stops at the first match, at the deadline, or when
//! the stream ends. The receiver and the connection are released exactly once
//! afterwards, whatever the outcome.

pub mod capture;
pub mod matcher;
pub mod stream;

use std::time::Duration;

use metrics::{counter, histogram};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::telemetry::ensure_metrics_described;
pub use matcher::{RecordMatcher, WindowStartMatcher};
pub use stream::{EventPosition, EventStreamClient, PartitionReceiver, PartitionSelector, StreamRecord};

/// Pause between polls when a receiver reports an empty batch.
const EMPTY_BATCH_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundRecord {
    /// Payload decoded as UTF-8 (lossy).
    pub payload: String,
    pub partition_id: String,
    pub sequence_number: i64,
    pub records_seen: u64,
}

/// Terminal result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Found(FoundRecord),
    TimedOut { records_seen: u64 },
    Exhausted,
}

impl VerificationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::Found(_) => "found",
            VerificationOutcome::TimedOut { .. } => "timed_out",
            VerificationOutcome::Exhausted => "exhausted",
        }
    }

    /// Process exit status for the CLI: only a match is success.
    pub fn exit_code(&self) -> i32 {
        match self {
            VerificationOutcome::Found(_) => 0,
            _ => 1,
        }
    }

    /// Human-readable line the CLI prints for this outcome.
    pub fn describe(&self, deadline: Duration) -> String {
        match self {
            VerificationOutcome::Found(found) => {
                format!("Found a processed alert: {}", found.payload)
            }
            VerificationOutcome::TimedOut { records_seen } => format!(
                "Could not find a contemporary alert for {} ({records_seen} events examined).",
                describe_deadline(deadline)
            ),
            VerificationOutcome::Exhausted => {
                "The alerts stream ended without a contemporary alert.".to_string()
            }
        }
    }
}

/// Whole minutes when the deadline is at least one minute, seconds otherwise.
pub fn describe_deadline(deadline: Duration) -> String {
    let secs = deadline.as_secs();
    match secs {
        0..=59 => format!("{secs} second{}", if secs == 1 { "" } else { "s" }),
        _ => {
            let mins = secs / 60;
            format!("{mins} minute{}", if mins == 1 { "" } else { "s" })
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub partition: PartitionSelector,
    pub position: EventPosition,
    /// Upper bound on time spent listening.
    pub deadline: Duration,
    pub batch_size: usize,
    pub channel_capacity: usize,
    /// How long the receive task gets to hand back its receiver once cancelled.
    pub cleanup_grace: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            partition: PartitionSelector::FirstAvailable,
            position: EventPosition::Start,
            deadline: Duration::from_secs(crate::config::stream::DEFAULT_DEADLINE_SECS),
            batch_size: crate::config::stream::DEFAULT_BATCH_SIZE,
            channel_capacity: 256,
            cleanup_grace: Duration::from_secs(2),
        }
    }
}

impl VerifierConfig {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_partition(mut self, partition: PartitionSelector) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_position(mut self, position: EventPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

enum Delivery {
    Record(StreamRecord),
    End,
    Failed(PipelineError),
}

/// Owns the connection for the duration of one run; a second release is a no-op.
struct ConnectionGuard<C: EventStreamClient> {
    client: C,
    released: bool,
}

impl<C: EventStreamClient> ConnectionGuard<C> {
    fn new(client: C) -> Self {
        Self {
            client,
            released: false,
        }
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.client.close().await {
            warn!(error = %e, "closing stream connection failed");
            counter!("verify_cleanup_errors_total").increment(1);
        }
    }
}

impl<C: EventStreamClient> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        if !self.released {
            warn!("stream connection dropped without release");
        }
    }
}

pub struct StreamVerifier {
    config: VerifierConfig,
}

impl StreamVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Run one verification. `Err` only for connection failures; malformed
    /// records never abort the scan.
    pub async fn run<C, M>(&self, client: C, matcher: &M) -> Result<VerificationOutcome>
    where
        C: EventStreamClient,
        M: RecordMatcher + ?Sized,
    {
        ensure_metrics_described();
        let started = std::time::Instant::now();
        let mut conn = ConnectionGuard::new(client);

        debug!(state = "subscribing", partition = ?self.config.partition);
        let (partition, receiver) = match self.subscribe(&conn.client).await {
            Ok(sub) => sub,
            Err(e) => {
                warn!(error = %e, "subscription failed");
                conn.release().await;
                return Err(e);
            }
        };

        let outcome = self.listen(&partition, receiver, matcher).await;
        conn.release().await;

        let label = match &outcome {
            Ok(o) => o.label(),
            Err(_) => "connection_error",
        };
        counter!("verify_outcome_total", "outcome" => label).increment(1);
        histogram!("verify_run_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
        info!(partition = %partition, outcome = label, "verification finished");
        outcome
    }

    async fn subscribe<C: EventStreamClient>(
        &self,
        client: &C,
    ) -> Result<(String, Box<dyn PartitionReceiver>)> {
        let ids = client.partition_ids().await.map_err(as_connection)?;
        let partition = self.config.partition.resolve(&ids).ok_or_else(|| {
            PipelineError::Connection(format!(
                "no partition matching {:?} among {:?}",
                self.config.partition, ids
            ))
        })?;
        let receiver = client
            .open_receiver(&partition, self.config.position.clone())
            .await
            .map_err(as_connection)?;
        info!(partition = %partition, position = ?self.config.position, "receiver created");
        Ok((partition, receiver))
    }

    async fn listen<M>(
        &self,
        partition: &str,
        receiver: Box<dyn PartitionReceiver>,
        matcher: &M,
    ) -> Result<VerificationOutcome>
    where
        M: RecordMatcher + ?Sized,
    {
        let (tx, mut rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut pump = spawn_pump(receiver, self.config.batch_size.max(1), tx, cancel_rx);

        debug!(state = "listening", partition, deadline = ?self.config.deadline);
        let sleep = tokio::time::sleep(self.config.deadline);
        tokio::pin!(sleep);

        let mut seen = 0u64;
        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut sleep => break Ok(VerificationOutcome::TimedOut { records_seen: seen }),
                delivery = rx.recv() => match delivery {
                    Some(Delivery::Record(record)) => {
                        seen += 1;
                        counter!("verify_records_seen_total").increment(1);
                        if let Some(found) = evaluate(&record, matcher, seen) {
                            break Ok(VerificationOutcome::Found(found));
                        }
                    }
                    Some(Delivery::End) => break Ok(VerificationOutcome::Exhausted),
                    Some(Delivery::Failed(e)) => break Err(as_connection(e)),
                    None => break Err(PipelineError::Connection(
                        "receive task stopped unexpectedly".into(),
                    )),
                },
            }
        };

        // Stop delivery now; anything already buffered is discarded unread.
        let _ = cancel_tx.send(true);
        drop(rx);
        self.release_receiver(&mut pump).await;

        match &outcome {
            Ok(VerificationOutcome::TimedOut { records_seen }) => {
                info!(partition, records_seen, "no matching record before deadline")
            }
            Ok(VerificationOutcome::Exhausted) => {
                info!(partition, records_seen = seen, "stream ended without a match")
            }
            _ => {}
        }
        outcome
    }

    async fn release_receiver(&self, pump: &mut JoinHandle<Box<dyn PartitionReceiver>>) {
        match tokio::time::timeout(self.config.cleanup_grace, &mut *pump).await {
            Ok(Ok(mut receiver)) => {
                if let Err(e) = receiver.close().await {
                    warn!(error = %e, "closing receiver failed");
                    counter!("verify_cleanup_errors_total").increment(1);
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "receive task failed; receiver dropped");
                counter!("verify_cleanup_errors_total").increment(1);
            }
            Err(_) => {
                pump.abort();
                warn!(grace = ?self.config.cleanup_grace, "receive task did not stop in time; aborted");
                counter!("verify_cleanup_errors_total").increment(1);
            }
        }
    }
}

/// `Some` when the record is the awaited one; malformed payloads are logged and skipped.
fn evaluate<M>(record: &StreamRecord, matcher: &M, seen: u64) -> Option<FoundRecord>
where
    M: RecordMatcher + ?Sized,
{
    let Some(payload) = record.payload.as_deref() else {
        skip(record, &crate::error::RecordParseError::EmptyBody);
        return None;
    };
    match matcher.matches(payload) {
        Ok(true) => {
            let payload = String::from_utf8_lossy(payload).into_owned();
            info!(
                partition = %record.partition_id,
                sequence_number = record.sequence_number,
                "found a processed record"
            );
            Some(FoundRecord {
                payload,
                partition_id: record.partition_id.clone(),
                sequence_number: record.sequence_number,
                records_seen: seen,
            })
        }
        Ok(false) => {
            debug!(sequence_number = record.sequence_number, "record does not match");
            None
        }
        Err(e) => {
            skip(record, &e);
            None
        }
    }
}

fn skip(record: &StreamRecord, reason: &crate::error::RecordParseError) {
    counter!("verify_records_skipped_total").increment(1);
    warn!(
        partition = %record.partition_id,
        sequence_number = record.sequence_number,
        offset = %record.offset,
        reason = %reason,
        "skipping malformed record"
    );
}

fn as_connection(e: PipelineError) -> PipelineError {
    match e {
        PipelineError::Connection(_) => e,
        other => PipelineError::Connection(other.to_string()),
    }
}

fn spawn_pump(
    mut receiver: Box<dyn PartitionReceiver>,
    batch_size: usize,
    tx: mpsc::Sender<Delivery>,
    mut cancel: watch::Receiver<bool>,
) -> JoinHandle<Box<dyn PartitionReceiver>> {
    tokio::spawn(async move {
        'pump: loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.changed() => break 'pump,
                batch = receiver.receive(batch_size) => batch,
            };
            match batch {
                Ok(Some(records)) if records.is_empty() => {
                    tokio::select! {
                        biased;
                        _ = cancel.changed() => break 'pump,
                        _ = tokio::time::sleep(EMPTY_BATCH_BACKOFF) => {}
                    }
                }
                Ok(Some(records)) => {
                    for record in records {
                        tokio::select! {
                            biased;
                            _ = cancel.changed() => break 'pump,
                            sent = tx.send(Delivery::Record(record)) => {
                                if sent.is_err() {
                                    break 'pump;
                                }
                            }
                        }
                    }
                }
                Ok(None) => {
                    let _ = tx.send(Delivery::End).await;
                    break 'pump;
                }
                Err(e) => {
                    let _ = tx.send(Delivery::Failed(e)).await;
                    break 'pump;
                }
            }
        }
        receiver
    })
}
