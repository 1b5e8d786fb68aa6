//! File system operations abstraction for testing
//!
//! Scaffolding writes go through this trait so the `new` command can be
//! exercised against a mocked file system.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cargo_liquid::fs::{FileSystemOperations, StandardFileSystem};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fs_ops: Arc<dyn FileSystemOperations> = Arc::new(StandardFileSystem);
//!
//!     fs_ops.create_dir_all(Path::new("hello_world/src")).await?;
//!     fs_ops
//!         .write(Path::new("hello_world/.gitignore"), b"/target\n")
//!         .await?;
//!
//!     if fs_ops.exists(Path::new("hello_world/.gitignore")) {
//!         println!("Contract directory created");
//!     }
//!
//!     Ok(())
//! }
//! ```
use anyhow::Result;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Trait for file system operations that can be mocked in tests
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait FileSystemOperations: Send + Sync {
    /// Create a directory and all its parent directories
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Write data to a file, creating the file if it doesn't exist
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Remove a directory and everything below it
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;
}

/// Standard implementation that uses actual file system operations
pub struct StandardFileSystem;

#[async_trait::async_trait]
impl FileSystemOperations for StandardFileSystem {
    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path).await.map_err(Into::into)
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        tokio::fs::write(path, contents).await.map_err(Into::into)
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_dir_all(path).await.map_err(Into::into)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_standard_file_system_writes_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let fs_ops = StandardFileSystem;
        let nested = dir.path().join("contract/src");

        fs_ops.create_dir_all(&nested).await.unwrap();
        fs_ops.write(&nested.join("lib.rs"), b"#![no_std]\n").await.unwrap();

        assert!(fs_ops.exists(&nested.join("lib.rs")));
        fs_ops.remove_dir_all(&dir.path().join("contract")).await.unwrap();
        assert!(!fs_ops.exists(&nested));
    }
}
