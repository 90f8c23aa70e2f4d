// src/verify/matcher.rs
use chrono::NaiveDateTime;

use crate::error::RecordParseError;

/// `yyyy-MM-dd HH:mm:ss`, local time without zone.
pub const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const WINDOW_START_FIELD: &str = "windowStart";

pub fn parse_window_time(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), WINDOW_FORMAT)
}

/// Decides whether a record payload is the awaited result.
///
/// `Err` marks the payload as malformed; the verifier counts and skips it.
pub trait RecordMatcher: Send + Sync {
    fn matches(&self, payload: &[u8]) -> Result<bool, RecordParseError>;
}

impl<F> RecordMatcher for F
where
    F: Fn(&[u8]) -> Result<bool, RecordParseError> + Send + Sync,
{
    fn matches(&self, payload: &[u8]) -> Result<bool, RecordParseError> {
        self(payload)
    }
}

/// Matches JSON objects whose time field is strictly after `reference`.
#[derive(Debug, Clone)]
pub struct WindowStartMatcher {
    reference: NaiveDateTime,
    field: String,
}

impl WindowStartMatcher {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self {
            reference,
            field: WINDOW_START_FIELD.to_string(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    /// Extract the comparison timestamp from a payload.
    pub fn extract(&self, payload: &[u8]) -> Result<NaiveDateTime, RecordParseError> {
        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| RecordParseError::InvalidJson(e.to_string()))?;
        let raw = value
            .get(&self.field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| RecordParseError::MissingField(self.field.clone()))?;
        parse_window_time(raw).map_err(|_| RecordParseError::BadValue {
            field: self.field.clone(),
            value: raw.to_string(),
        })
    }
}

impl RecordMatcher for WindowStartMatcher {
    fn matches(&self, payload: &[u8]) -> Result<bool, RecordParseError> {
        let at = self.extract(payload)?;
        Ok(at > self.reference)
    }
}
