use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Entry point as seen from cargo: `cargo liquid <command>`.
#[derive(Parser, Debug)]
#[command(name = "cargo", bin_name = "cargo")]
pub enum Cli {
    /// Utilities to develop Liquid smart contracts
    #[command(name = "liquid")]
    Liquid(LiquidCli),
}

#[derive(Args, Debug)]
#[command(version)]
#[command(about = "Build Rust smart contracts into lean WebAssembly artifacts")]
#[command(long_about = "cargo-liquid compiles a contract crate for wasm32-unknown-unknown from a \
                       temporary copy of its workspace, keeps only the contract entrypoints, strips \
                       custom sections and shrinks the result with wasm-opt when it is installed.")]
pub struct LiquidCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile the contract in the current directory into a Wasm artifact
    Build(BuildArgs),
    /// Create a new contract crate from a template
    New(NewArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the contract's Cargo.toml
    #[arg(long, value_name = "PATH", default_value = "Cargo.toml")]
    pub manifest_path: PathBuf,
    #[command(flatten)]
    pub verbosity: VerbosityFlags,
    /// Skip the wasm-opt pass even if wasm-opt is installed
    #[arg(long, help = "Do not run wasm-opt on the post-processed artifact")]
    pub skip_optimization: bool,
    /// wasm-opt optimization level (0-4, s, z)
    #[arg(long, value_name = "LEVEL", value_parser = clap::builder::PossibleValuesParser::new(crate::config::WASM_OPT_LEVELS))]
    pub optimization_level: Option<String>,
    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Name of the contract crate
    pub name: String,
    /// Directory in which the contract directory is created
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,
    /// Overwrite an existing directory with the same name
    #[arg(long, help = "Replace an existing directory with the same name")]
    pub force: bool,
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub struct VerbosityFlags {
    /// Use verbose output
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,
    /// No output printed to stdout
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Verbose,
}

impl VerbosityFlags {
    pub fn verbosity(&self) -> Option<Verbosity> {
        match (self.quiet, self.verbose) {
            (true, _) => Some(Verbosity::Quiet),
            (_, true) => Some(Verbosity::Verbose),
            _ => None,
        }
    }
}
