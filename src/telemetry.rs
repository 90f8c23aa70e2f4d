// src/telemetry.rs
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// One-time metrics registration (so series carry descriptions once a recorder is installed).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("source_search_total", "Search calls dispatched to a source.");
        describe_counter!(
            "source_provider_errors_total",
            "Provider transport/auth failures."
        );
        describe_counter!("source_messages_total", "Messages returned by sources.");
        describe_counter!(
            "verify_records_seen_total",
            "Stream records examined by the verifier."
        );
        describe_counter!(
            "verify_records_skipped_total",
            "Malformed stream records skipped by the verifier."
        );
        describe_counter!("verify_outcome_total", "Terminal verification outcomes.");
        describe_counter!(
            "verify_cleanup_errors_total",
            "Failures while releasing the receiver or connection."
        );
        describe_histogram!("verify_run_ms", "Verification run time in milliseconds.");
    });
}

/// Install the global subscriber for the binaries.
///
/// `RUST_LOG` overrides the default filter; `SOCIAL_PIPELINE_LOG_JSON=1`
/// switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("social_pipeline=info,check_status=info,warn"));

    let json = std::env::var("SOCIAL_PIPELINE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
