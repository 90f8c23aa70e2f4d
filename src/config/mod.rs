// src/config/mod.rs
pub mod credentials;
pub mod stream;

pub use credentials::OAuthCredentials;
pub use stream::StreamConfig;

/// Read a required env var; empty counts as missing.
pub(crate) fn required_env(name: &str) -> crate::error::Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(crate::error::PipelineError::Config(format!(
            "Please make sure to set {name}"
        ))),
    }
}

/// Read an optional numeric env var, falling back to `default` when unset.
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> crate::error::Result<T> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().map_err(|_| {
            crate::error::PipelineError::Config(format!("{name} has an invalid value: {v:?}"))
        }),
        _ => Ok(default),
    }
}
