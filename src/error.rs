use std::path::PathBuf;
use thiserror::Error;

use crate::external::CommandError;
use crate::wasm::WasmError;

/// Errors produced while building or scaffolding a contract.
#[derive(Debug, Error)]
pub enum LiquidError {
    #[error("Invalid manifest path '{}': expected a file named Cargo.toml", path.display())]
    InvalidManifestPath { path: PathBuf },
    #[error("Manifest '{}' has no `{section}` section", path.display())]
    MissingSection { path: PathBuf, section: String },
    #[error("Malformed manifest '{}': {message}", path.display())]
    MalformedManifest { path: PathBuf, message: String },
    #[error("Package with manifest '{}' is not in the `cargo metadata` output", manifest.display())]
    RootPackageNotFound { manifest: PathBuf },
    #[error(
        "Unsupported toolchain release '{release}': building contracts needs a nightly toolchain.\n\
         Run `rustup default nightly` or set CARGO_LIQUID_BUILD__REQUIRE_NIGHTLY=false"
    )]
    UnsupportedChannel { release: String },
    #[error("Could not determine the toolchain release from `rustc -vV` output")]
    UnknownToolchain,
    #[error("`{tool}` failed with status {status}")]
    ToolFailed { tool: String, status: i32 },
    #[error("Invalid contract name '{name}': {reason}")]
    InvalidContractName { name: String, reason: String },
    #[error("Destination '{}' already exists, use --force to overwrite", path.display())]
    AlreadyExists { path: PathBuf },
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Wasm(#[from] WasmError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type LiquidResult<T> = Result<T, LiquidError>;
