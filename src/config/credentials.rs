// src/config/credentials.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::required_env;
use crate::error::{PipelineError, Result};

const ENV_PATH: &str = "SOCIAL_KEYS_PATH";

/// OAuth material for the live source. Passed explicitly at construction.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub access_token_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Safe diagnostics: lengths only
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret_len", &self.consumer_secret.len())
            .field("access_token_len", &self.access_token.len())
            .field("access_token_secret_len", &self.access_token_secret.len())
            .finish()
    }
}

impl OAuthCredentials {
    pub fn has_consumer(&self) -> bool {
        !self.consumer_key.is_empty() && !self.consumer_secret.is_empty()
    }

    /// `TWITTER_CONSUMER_KEY` / `TWITTER_CONSUMER_SECRET` are required,
    /// the access token pair is optional.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            consumer_key: required_env("TWITTER_CONSUMER_KEY")?,
            consumer_secret: required_env("TWITTER_CONSUMER_SECRET")?,
            access_token: std::env::var("TWITTER_ACCESS_TOKEN").unwrap_or_default(),
            access_token_secret: std::env::var("TWITTER_ACCESS_TOKEN_SECRET").unwrap_or_default(),
        })
    }

    /// Load from an explicit path. Supports TOML, JSON or `key=value` properties.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("reading credentials from {}: {e}", path.display()))
        })?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let creds = parse_credentials(&content, ext.as_str())?;
        if !creds.has_consumer() {
            return Err(PipelineError::Config(format!(
                "{} is missing consumer_key/consumer_secret",
                path.display()
            )));
        }
        Ok(creds)
    }

    /// Load using env var + fallbacks:
    /// 1) $SOCIAL_KEYS_PATH
    /// 2) config/keys.toml
    /// 3) config/keys.properties
    /// 4) TWITTER_* environment variables
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(PipelineError::Config(
                "SOCIAL_KEYS_PATH points to non-existent path".into(),
            ));
        }
        for candidate in ["config/keys.toml", "config/keys.properties"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Self::from_env()
    }
}

fn parse_credentials(s: &str, hint_ext: &str) -> Result<OAuthCredentials> {
    match hint_ext {
        "toml" => toml::from_str(s).map_err(|e| PipelineError::Config(e.to_string())),
        "json" => serde_json::from_str(s).map_err(|e| PipelineError::Config(e.to_string())),
        _ => Ok(parse_properties(s)),
    }
}

/// Java-style properties: `key=value` or `key: value`, `#`/`!` comments.
fn parse_properties(s: &str) -> OAuthCredentials {
    let mut creds = OAuthCredentials::default();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some((k, v)) = line.split_once(['=', ':']) else {
            continue;
        };
        let v = v.trim().to_string();
        match k.trim() {
            "consumer_key" => creds.consumer_key = v,
            "consumer_secret" => creds.consumer_secret = v,
            "access_token" => creds.access_token = v,
            "access_token_secret" => creds.access_token_secret = v,
            _ => {}
        }
    }
    creds
}
