//! The four-stage contract build: metadata, cargo build, post-processing
//! and optional `wasm-opt`.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

use crate::cli::Verbosity;
use crate::config::BuildConfig;
use crate::error::LiquidError;
use crate::external::{self, CargoClient, CommandExecutor, Invocation, Metadata, Package};
use crate::optimizer::{self, OptimizationReport};
use crate::telemetry;
use crate::toolchain;
use crate::wasm::{self, PostProcessReport};
use crate::workspace::{ManifestPath, Workspace};

/// Everything the later stages need to know about the contract crate.
#[derive(Debug, Clone)]
pub struct CrateMetadata {
    pub manifest_path: ManifestPath,
    pub metadata: Metadata,
    pub root_package: Package,
    /// Package name with `-` replaced by `_`, as rustc names the artifact.
    pub package_name: String,
    pub original_wasm: PathBuf,
    pub dest_wasm: PathBuf,
}

impl CrateMetadata {
    pub fn target_dir(&self) -> &Path {
        self.metadata.target_directory.as_std_path()
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub manifest_path: ManifestPath,
    pub verbosity: Option<Verbosity>,
    pub skip_optimization: bool,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub dest_wasm: PathBuf,
    pub post_process: PostProcessReport,
    pub optimization: Option<OptimizationReport>,
}

impl BuildResult {
    pub fn message(&self) -> String {
        format!(
            "\nYour contract is ready. You can find it here:\n{}",
            self.dest_wasm.display().to_string().bold()
        )
    }
}

pub struct ContractBuilder {
    executor: Arc<dyn CommandExecutor>,
    cargo: CargoClient,
    config: BuildConfig,
}

const STAGES: usize = 4;

impl ContractBuilder {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: BuildConfig) -> Self {
        Self {
            cargo: CargoClient::new(executor.clone()),
            executor,
            config,
        }
    }

    /// Parses the contract manifest and returns relevant metadata.
    pub async fn collect_crate_metadata(&self, manifest_path: &ManifestPath) -> Result<CrateMetadata> {
        let metadata = self.cargo.metadata(manifest_path.as_path()).await?;

        let root_package = external::root_package(&metadata)
            .cloned()
            .ok_or_else(|| LiquidError::RootPackageNotFound {
                manifest: manifest_path.as_path().to_path_buf(),
            })?;
        let package_name = root_package.name.replace('-', "_");

        let target_dir = metadata.target_directory.as_std_path();
        let original_wasm = target_dir
            .join(&self.config.target)
            .join("release")
            .join(&package_name)
            .with_extension("wasm");
        let dest_wasm = target_dir.join(&package_name).with_extension("wasm");

        Ok(CrateMetadata {
            manifest_path: manifest_path.clone(),
            metadata,
            root_package,
            package_name,
            original_wasm,
            dest_wasm,
        })
    }

    /// Builds the contract for Wasm from a temporary copy of its workspace.
    pub async fn build_cargo_project(
        &self,
        crate_metadata: &CrateMetadata,
        verbosity: Option<Verbosity>,
    ) -> Result<()> {
        if self.config.require_nightly {
            toolchain::check_channel(&self.cargo).await?;
        }

        let workspace = Workspace::new(&crate_metadata.metadata, &crate_metadata.root_package.id)?
            .with_root_package_manifest(|manifest| {
                manifest
                    .with_removed_crate_type("rlib")?
                    .with_profile_release_lto(true)?;
                Ok(())
            })?;

        let target_dir = crate_metadata.target_dir().to_path_buf();
        workspace
            .using_temp(|manifest_path| async move {
                let invocation =
                    cargo_build_invocation(&manifest_path, &target_dir, verbosity, &self.config);
                tracing::info!(command = %invocation.display(), "building contract");
                self.cargo.run_streaming(invocation).await
            })
            .await
            .context("Building the cargo project")?;
        Ok(())
    }

    pub async fn post_process_wasm(&self, crate_metadata: &CrateMetadata) -> Result<PostProcessReport> {
        wasm::post_process_wasm(
            &crate_metadata.original_wasm,
            &crate_metadata.dest_wasm,
            &self.config.entrypoints,
        )
        .await
    }

    pub async fn optimize_wasm(
        &self,
        crate_metadata: &CrateMetadata,
        level: &str,
    ) -> Result<Option<OptimizationReport>> {
        optimizer::optimize_wasm(
            self.executor.as_ref(),
            &crate_metadata.dest_wasm,
            &crate_metadata.package_name,
            level,
        )
        .await
    }

    /// Runs all stages and returns where the contract was written.
    pub async fn execute(&self, options: &BuildOptions) -> Result<BuildResult> {
        let quiet = options.verbosity == Some(Verbosity::Quiet);
        let stage = |n: usize, title: &str| {
            if !quiet {
                println!(
                    " {} {}",
                    format!("[{n}/{STAGES}]").bold(),
                    title.bright_green().bold()
                );
            }
        };

        stage(1, "Collecting crate metadata");
        let crate_metadata = self.collect_crate_metadata(&options.manifest_path).await?;

        let build_id = telemetry::generate_build_id();
        let span = telemetry::create_build_span(&crate_metadata.package_name, &build_id);

        async {
            stage(2, "Building cargo project");
            self.build_cargo_project(&crate_metadata, options.verbosity)
                .await?;

            stage(3, "Post processing wasm file");
            let post_process = self.post_process_wasm(&crate_metadata).await?;

            stage(4, "Optimizing wasm file");
            let optimization = if options.skip_optimization {
                tracing::info!("wasm-opt skipped on request");
                None
            } else {
                let report = self
                    .optimize_wasm(&crate_metadata, &self.config.wasm_opt_level)
                    .await?;
                match &report {
                    Some(report) if !quiet => println!("{}", report.summary()),
                    _ => {}
                }
                report
            };

            Ok::<_, anyhow::Error>(BuildResult {
                dest_wasm: crate_metadata.dest_wasm.clone(),
                post_process,
                optimization,
            })
        }
        .instrument(span)
        .await
    }
}

/// The `cargo build` command line for a contract.
pub fn cargo_build_invocation(
    manifest_path: &ManifestPath,
    target_dir: &Path,
    verbosity: Option<Verbosity>,
    config: &BuildConfig,
) -> Invocation {
    let mut invocation = Invocation::new("cargo")
        .arg("build")
        .arg("--manifest-path")
        .arg(manifest_path.as_path().display().to_string())
        .arg("--target")
        .arg(config.target.clone())
        .args([
            "-Z",
            "build-std=core,alloc",
            "-Z",
            "build-std-features=panic_immediate_abort",
            "--no-default-features",
            "--release",
        ])
        .arg(format!("--target-dir={}", target_dir.display()))
        .env("RUSTFLAGS", config.rustflags());

    match verbosity {
        Some(Verbosity::Verbose) => invocation = invocation.arg("--verbose"),
        Some(Verbosity::Quiet) => invocation = invocation.arg("--quiet"),
        None => {}
    }
    invocation
}
