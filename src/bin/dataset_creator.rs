//! Creates a dataset of messages to be used by replay sources in tests.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use social_pipeline::config::OAuthCredentials;
use social_pipeline::source::dataset::{collect, write_messages};
use social_pipeline::source::{SocialQuery, TwitterSource};

#[derive(Debug, Parser)]
#[command(name = "dataset-creator", about = "Fetch messages from the live source into a fixture file")]
struct Cli {
    /// Search topic.
    #[arg(long, default_value = "tel_aviv")]
    topic: String,
    /// Number of messages to collect (across pages).
    #[arg(long, default_value_t = 2000)]
    count: usize,
    /// Output file (JSON array of messages).
    #[arg(long, default_value = "messages.json")]
    out: PathBuf,
    /// Credentials file (TOML, JSON or key=value properties).
    #[arg(long)]
    keys: Option<PathBuf>,
    /// Optional language filter.
    #[arg(long)]
    lang: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    social_pipeline::telemetry::init_tracing();
    let cli = Cli::parse();

    let creds = match &cli.keys {
        Some(path) => OAuthCredentials::load_from(path),
        None => OAuthCredentials::load_default(),
    }
    .context("loading credentials")?;

    let source = TwitterSource::from_credentials(creds).context("building live source")?;

    // The API caps a page at 100 results; pagination covers the rest.
    let page = u32::try_from(cli.count.min(100)).unwrap_or(100);
    let mut query = SocialQuery::new(cli.topic.clone()).with_count(page);
    if let Some(lang) = &cli.lang {
        query = query.with_lang(lang.clone());
    }

    let messages = collect(&source, query, cli.count)
        .await
        .with_context(|| format!("searching for {:?}", cli.topic))?;
    write_messages(&cli.out, &messages)
        .with_context(|| format!("writing {}", cli.out.display()))?;

    println!("wrote {} messages to {}", messages.len(), cli.out.display());
    Ok(())
}
