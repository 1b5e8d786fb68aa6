//! External tool abstractions
//!
//! This module provides trait-based abstractions for the external binaries a
//! contract build shells out to (`cargo`, `rustc`, `wasm-opt`), enabling
//! testable code through dependency injection and mock implementations.

pub mod cargo;
pub mod command;

pub use cargo::{root_package, CargoClient, Metadata, Package};
pub use command::{CommandError, CommandExecutor, CommandOutput, Invocation, ProcessCommandExecutor};
