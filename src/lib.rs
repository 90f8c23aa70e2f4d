// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod error;
pub mod source;
pub mod telemetry;
pub mod verify;

// ---- Re-exports for stable public API ----
pub use crate::error::{PipelineError, RecordParseError, Result};
pub use crate::source::{QueryResult, SocialMessage, SocialQuery, SocialSource, Source};
pub use crate::verify::{StreamVerifier, VerificationOutcome, VerifierConfig};
