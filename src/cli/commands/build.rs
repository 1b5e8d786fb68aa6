use anyhow::Result;
use std::sync::Arc;

use super::Command;
use crate::build::{BuildOptions, ContractBuilder};
use crate::cli::{BuildArgs, Verbosity};
use crate::config::LiquidConfig;
use crate::external::{CommandExecutor, ProcessCommandExecutor};
use crate::workspace::ManifestPath;

pub struct BuildCommand {
    pub manifest_path: ManifestPath,
    pub verbosity: Option<Verbosity>,
    pub skip_optimization: bool,
    pub config: LiquidConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl BuildCommand {
    pub fn new(args: &BuildArgs, mut config: LiquidConfig) -> Result<Self> {
        if let Some(level) = &args.optimization_level {
            config.build.wasm_opt_level = level.clone();
        }
        Ok(Self {
            manifest_path: ManifestPath::new(&args.manifest_path)?,
            verbosity: args.verbosity.verbosity(),
            skip_optimization: args.skip_optimization,
            config,
            executor: Arc::new(ProcessCommandExecutor),
        })
    }

    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }
}

impl Command for BuildCommand {
    async fn execute(&self) -> Result<()> {
        let builder = ContractBuilder::new(self.executor.clone(), self.config.build.clone());
        let result = builder
            .execute(&BuildOptions {
                manifest_path: self.manifest_path.clone(),
                verbosity: self.verbosity,
                skip_optimization: self.skip_optimization,
            })
            .await?;

        if self.verbosity != Some(Verbosity::Quiet) {
            println!("{}", result.message());
        }
        Ok(())
    }
}
