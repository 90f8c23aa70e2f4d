// src/config/stream.rs
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{env_or, required_env};
use crate::error::Result;

pub const ENV_NAMESPACE: &str = "EVENTHUB_NAMESPACE";
pub const ENV_ENTITY: &str = "EVENTHUB_ALERTS";
pub const ENV_KEY_NAME: &str = "EVENTHUB_KEY_NAME";
pub const ENV_KEY: &str = "EVENTHUB_KEY";

/// Default bound of one verification run: 15 minutes.
pub const DEFAULT_DEADLINE_SECS: u64 = 15 * 60;
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Connection parameters of the alerts stream plus verification knobs.
#[derive(Clone)]
pub struct StreamConfig {
    pub namespace: String,
    pub entity_name: String,
    pub access_key_name: String,
    pub access_key: String,
    pub deadline: Duration,
    pub batch_size: usize,
    /// Explicit partition id; `None` selects the first available partition.
    pub partition: Option<String>,
    /// Root of the file-backed transport.
    pub capture_dir: PathBuf,
}

impl std::fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConfig")
            .field("namespace", &self.namespace)
            .field("entity_name", &self.entity_name)
            .field("access_key_name", &self.access_key_name)
            .field("access_key_len", &self.access_key.len())
            .field("deadline", &self.deadline)
            .field("batch_size", &self.batch_size)
            .field("partition", &self.partition)
            .field("capture_dir", &self.capture_dir)
            .finish()
    }
}

impl StreamConfig {
    /// Fails on the first missing required variable, naming it.
    pub fn from_env() -> Result<Self> {
        let namespace = required_env(ENV_NAMESPACE)?;
        let entity_name = required_env(ENV_ENTITY)?;
        let access_key_name = required_env(ENV_KEY_NAME)?;
        let access_key = required_env(ENV_KEY)?;

        let deadline_secs: u64 = env_or("VERIFY_DEADLINE_SECS", DEFAULT_DEADLINE_SECS)?;
        let batch_size: usize = env_or("VERIFY_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        let partition = std::env::var("VERIFY_PARTITION")
            .ok()
            .filter(|p| !p.trim().is_empty());
        let capture_dir = std::env::var("EVENTHUB_CAPTURE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("capture"));

        Ok(Self {
            namespace,
            entity_name,
            access_key_name,
            access_key,
            deadline: Duration::from_secs(deadline_secs),
            batch_size: batch_size.max(1),
            partition,
            capture_dir,
        })
    }

    /// Service connection string for the alerts entity.
    pub fn connection_string(&self) -> String {
        format!(
            "Endpoint=sb://{}.servicebus.windows.net/;SharedAccessKeyName={};SharedAccessKey={};EntityPath={}",
            self.namespace, self.access_key_name, self.access_key, self.entity_name
        )
    }

    pub fn endpoint(&self) -> String {
        format!("sb://{}.servicebus.windows.net/{}", self.namespace, self.entity_name)
    }
}
