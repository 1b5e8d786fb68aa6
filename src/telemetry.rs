use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::cli::Verbosity;
use crate::config::ObservabilityConfig;

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` wins over everything; otherwise the verbosity flags pick the
/// level and fall back to the configured one. Progress output for users is
/// printed separately on stdout.
pub fn init_telemetry(verbosity: Option<Verbosity>, config: &ObservabilityConfig) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_directive(verbosity, &config.log_level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!("cargo-liquid telemetry initialized");
    Ok(())
}

fn default_directive(verbosity: Option<Verbosity>, configured: &str) -> String {
    match verbosity {
        Some(Verbosity::Verbose) => "cargo_liquid=debug,info".to_string(),
        Some(Verbosity::Quiet) => "error".to_string(),
        None => configured.to_string(),
    }
}

/// Generate an id linking every event of one build
pub fn generate_build_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create the span wrapping a contract build
pub fn create_build_span(package: &str, build_id: &str) -> tracing::Span {
    tracing::info_span!(
        "liquid_build",
        package = package,
        build.id = build_id,
    )
}
