//! Optional size optimization through binaryen's `wasm-opt`.
//!
//! A missing `wasm-opt` never fails the build; the user only gets a hint.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;

use crate::external::{CommandError, CommandExecutor, Invocation};

const WASM_OPT: &str = "wasm-opt";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationReport {
    pub original_size: u64,
    pub optimized_size: u64,
}

impl OptimizationReport {
    pub fn summary(&self) -> String {
        format!(
            " Original wasm size: {:.1}K, Optimized: {:.1}K",
            self.original_size as f64 / 1000.0,
            self.optimized_size as f64 / 1000.0
        )
    }
}

/// Runs `wasm-opt -O<level>` on `dest_wasm` and replaces it with the result.
///
/// Returns `None` when `wasm-opt` is not installed.
pub async fn optimize_wasm(
    executor: &dyn CommandExecutor,
    dest_wasm: &Path,
    package_name: &str,
    level: &str,
) -> Result<Option<OptimizationReport>> {
    match executor
        .execute(&Invocation::new(WASM_OPT).arg("--version"))
        .await
    {
        Ok(output) if output.success() => {
            tracing::debug!(version = %output.stdout.trim(), "found wasm-opt");
        }
        Ok(_) | Err(CommandError::CommandNotFound { .. }) => {
            println!(
                "{}",
                "wasm-opt is not installed. Install this tool on your system in order to \n\
                 reduce the size of your contract's Wasm binary. \n\
                 See https://github.com/WebAssembly/binaryen#tools"
                    .bright_yellow()
            );
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }

    let optimized = dest_wasm.with_file_name(format!("{package_name}-opt.wasm"));
    let invocation = Invocation::new(WASM_OPT)
        .arg(dest_wasm.display().to_string())
        .arg(format!("-O{level}"))
        .arg("-o")
        .arg(optimized.display().to_string());

    let output = executor.execute(&invocation).await?;
    if !output.success() {
        // Relay whatever wasm-opt had to say before failing.
        io::stdout().write_all(output.stdout.as_bytes())?;
        io::stderr().write_all(output.stderr.as_bytes())?;
        anyhow::bail!("wasm-opt optimization failed");
    }

    let original_size = tokio::fs::metadata(dest_wasm)
        .await
        .with_context(|| format!("Reading size of '{}'", dest_wasm.display()))?
        .len();
    let optimized_size = tokio::fs::metadata(&optimized)
        .await
        .with_context(|| format!("Reading size of '{}'", optimized.display()))?
        .len();

    tokio::fs::rename(&optimized, dest_wasm)
        .await
        .with_context(|| format!("Replacing '{}' with the optimized artifact", dest_wasm.display()))?;

    let report = OptimizationReport {
        original_size,
        optimized_size,
    };
    tracing::info!(original_size, optimized_size, level, "wasm-opt finished");
    Ok(Some(report))
}
