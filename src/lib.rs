// cargo-liquid library - contract build pipeline
// This exposes the core components for testing and integration

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod external;
pub mod fs;
pub mod optimizer;
pub mod telemetry;
pub mod toolchain;
pub mod wasm;
pub mod workspace;

// Re-export key types for easy access
pub use build::{BuildOptions, BuildResult, ContractBuilder, CrateMetadata};
pub use cli::Verbosity;
pub use config::{BuildConfig, LiquidConfig};
pub use error::{LiquidError, LiquidResult};
pub use external::{CommandExecutor, Invocation, ProcessCommandExecutor};
pub use telemetry::init_telemetry;
pub use wasm::{post_process_wasm, PostProcessReport};
pub use workspace::{Manifest, ManifestPath, Workspace};
