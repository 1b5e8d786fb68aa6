use anyhow::Result;
use colored::Colorize;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use super::Command;
use crate::error::LiquidError;
use crate::fs::{FileSystemOperations, StandardFileSystem};

const CARGO_TOML_TEMPLATE: &str = r#"[package]
name = "{{name}}"
version = "0.1.0"
edition = "2021"

[lib]
name = "{{crate_name}}"
crate-type = ["cdylib", "rlib"]

[features]
default = ["std"]
std = []

[profile.release]
panic = "abort"
opt-level = "z"
overflow-checks = true

[workspace]
"#;

const LIB_RS_TEMPLATE: &str = r#"#![cfg_attr(not(feature = "std"), no_std)]

use core::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Runs once when the contract is deployed.
#[no_mangle]
pub extern "C" fn deploy() {
    COUNTER.store(0, Ordering::Relaxed);
}

/// Entry for every transaction sent to the contract.
#[no_mangle]
pub extern "C" fn call() {
    COUNTER.fetch_add(1, Ordering::Relaxed);
}

pub fn counter() -> u32 {
    COUNTER.load(Ordering::Relaxed)
}

#[cfg(all(not(feature = "std"), target_arch = "wasm32"))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    core::arch::wasm32::unreachable()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_increments_counter() {
        deploy();
        call();
        call();
        assert_eq!(counter(), 2);
    }
}
"#;

const GITIGNORE_TEMPLATE: &str = "/target\nCargo.lock\n";

const RESERVED_NAMES: [&str; 5] = ["alloc", "core", "std", "test", "proc_macro"];

static NAME_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$"));

pub struct NewCommand {
    pub name: String,
    pub parent_dir: PathBuf,
    pub force: bool,
    fs_ops: Arc<dyn FileSystemOperations>,
}

impl NewCommand {
    pub fn new(name: String, parent_dir: Option<PathBuf>) -> Self {
        Self {
            name,
            parent_dir: parent_dir.unwrap_or_else(|| PathBuf::from(".")),
            force: false,
            fs_ops: Arc::new(StandardFileSystem),
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_fs_ops(mut self, fs_ops: Arc<dyn FileSystemOperations>) -> Self {
        self.fs_ops = fs_ops;
        self
    }

    pub fn contract_dir(&self) -> PathBuf {
        self.parent_dir.join(&self.name)
    }

    /// Files of the scaffolded crate, relative to its directory.
    pub fn render(&self) -> Vec<(PathBuf, String)> {
        let crate_name = self.name.replace('-', "_");
        let manifest = CARGO_TOML_TEMPLATE
            .replace("{{name}}", &self.name)
            .replace("{{crate_name}}", &crate_name);
        vec![
            (PathBuf::from("Cargo.toml"), manifest),
            (Path::new("src").join("lib.rs"), LIB_RS_TEMPLATE.to_string()),
            (PathBuf::from(".gitignore"), GITIGNORE_TEMPLATE.to_string()),
        ]
    }
}

pub fn validate_contract_name(name: &str) -> Result<(), LiquidError> {
    let invalid = |reason: &str| LiquidError::InvalidContractName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let pattern = NAME_PATTERN
        .as_ref()
        .map_err(|e| invalid(&e.to_string()))?;
    if !pattern.is_match(name) {
        return Err(invalid(
            "must start with a letter and contain only letters, digits, `_` or `-`",
        ));
    }
    if RESERVED_NAMES.contains(&name.replace('-', "_").as_str()) {
        return Err(invalid("name is reserved by the Rust toolchain"));
    }
    Ok(())
}

impl Command for NewCommand {
    async fn execute(&self) -> Result<()> {
        validate_contract_name(&self.name)?;

        let contract_dir = self.contract_dir();
        if self.fs_ops.exists(&contract_dir) {
            if !self.force {
                return Err(LiquidError::AlreadyExists { path: contract_dir }.into());
            }
            tracing::warn!(path = %contract_dir.display(), "replacing existing directory");
            self.fs_ops.remove_dir_all(&contract_dir).await?;
        }

        for (relative, content) in self.render() {
            let path = contract_dir.join(relative);
            if let Some(parent) = path.parent() {
                self.fs_ops.create_dir_all(parent).await?;
            }
            self.fs_ops.write(&path, content.as_bytes()).await?;
            tracing::debug!(path = %path.display(), "wrote template file");
        }

        println!(
            "{} contract `{}` in {}",
            "Created".bright_green().bold(),
            self.name,
            contract_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystemOperations;
    use mockall::predicate::*;

    #[test]
    fn test_validate_contract_name() {
        assert!(validate_contract_name("hello_world").is_ok());
        assert!(validate_contract_name("Ballot-2").is_ok());
        assert!(validate_contract_name("2fast").is_err());
        assert!(validate_contract_name("with space").is_err());
        assert!(validate_contract_name("").is_err());
        assert!(matches!(
            validate_contract_name("std"),
            Err(LiquidError::InvalidContractName { .. })
        ));
        assert!(validate_contract_name("proc-macro").is_err());
    }

    #[test]
    fn test_render_uses_crate_name() {
        let command = NewCommand::new("hello-world".to_string(), None);
        let files = command.render();
        let manifest = &files[0].1;

        assert!(manifest.contains("name = \"hello-world\""));
        assert!(manifest.contains("name = \"hello_world\""));
        assert!(manifest.contains("crate-type = [\"cdylib\", \"rlib\"]"));
        assert!(manifest.parse::<toml::Table>().is_ok());
        assert!(files[1].1.contains("pub extern \"C\" fn deploy()"));
        assert!(files[1].1.contains("pub extern \"C\" fn call()"));
    }

    #[tokio::test]
    async fn test_new_writes_template_files() {
        let mut mock_fs = MockFileSystemOperations::new();
        mock_fs
            .expect_exists()
            .with(eq(PathBuf::from("contracts/ballot")))
            .return_const(false);
        mock_fs
            .expect_create_dir_all()
            .times(3)
            .returning(|_| Ok(()));
        mock_fs
            .expect_write()
            .withf(|path, contents| {
                path == Path::new("contracts/ballot/Cargo.toml")
                    && String::from_utf8_lossy(contents).contains("name = \"ballot\"")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        mock_fs
            .expect_write()
            .with(eq(PathBuf::from("contracts/ballot/src/lib.rs")), always())
            .times(1)
            .returning(|_, _| Ok(()));
        mock_fs
            .expect_write()
            .with(eq(PathBuf::from("contracts/ballot/.gitignore")), always())
            .times(1)
            .returning(|_, _| Ok(()));

        let command = NewCommand::new("ballot".to_string(), Some(PathBuf::from("contracts")))
            .with_fs_ops(Arc::new(mock_fs));

        assert!(command.execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_new_refuses_existing_directory() {
        let mut mock_fs = MockFileSystemOperations::new();
        mock_fs.expect_exists().return_const(true);
        mock_fs.expect_write().never();
        mock_fs.expect_remove_dir_all().never();

        let command = NewCommand::new("ballot".to_string(), None).with_fs_ops(Arc::new(mock_fs));

        let err = command.execute().await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_new_with_force_replaces_directory() {
        let mut mock_fs = MockFileSystemOperations::new();
        mock_fs.expect_exists().return_const(true);
        mock_fs
            .expect_remove_dir_all()
            .with(eq(PathBuf::from("./ballot")))
            .times(1)
            .returning(|_| Ok(()));
        mock_fs.expect_create_dir_all().returning(|_| Ok(()));
        mock_fs.expect_write().times(3).returning(|_, _| Ok(()));

        let command = NewCommand::new("ballot".to_string(), None)
            .with_force(true)
            .with_fs_ops(Arc::new(mock_fs));

        assert!(command.execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_new_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let command = NewCommand::new("token".to_string(), Some(dir.path().to_path_buf()));

        command.execute().await.unwrap();

        let contract = dir.path().join("token");
        assert!(contract.join("Cargo.toml").exists());
        assert!(contract.join("src/lib.rs").exists());
        assert!(contract.join(".gitignore").exists());
    }
}
