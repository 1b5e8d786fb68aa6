//! Thin client over the `cargo` and `rustc` binaries.

use cargo_metadata::PackageId;
use std::path::Path;
use std::sync::Arc;

use super::command::{CommandExecutor, CommandOutput, Invocation};
use crate::error::{LiquidError, LiquidResult};

pub use cargo_metadata::{Metadata, Package};

/// The package `cargo metadata` was asked about, as recorded in the resolve
/// graph. Lookup goes by id so path spelling never matters.
pub fn root_package(metadata: &Metadata) -> Option<&Package> {
    let root = metadata.resolve.as_ref().and_then(|r| r.root.as_ref())?;
    package_by_id(metadata, root)
}

pub fn package_by_id<'a>(metadata: &'a Metadata, id: &PackageId) -> Option<&'a Package> {
    metadata.packages.iter().find(|p| &p.id == id)
}

pub struct CargoClient {
    executor: Arc<dyn CommandExecutor>,
}

impl CargoClient {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    pub async fn metadata(&self, manifest_path: &Path) -> LiquidResult<Metadata> {
        let invocation = Invocation::new("cargo").args([
            "metadata".to_string(),
            "--format-version".to_string(),
            "1".to_string(),
            "--manifest-path".to_string(),
            manifest_path.display().to_string(),
        ]);
        let output = self.run_checked(&invocation).await?;
        serde_json::from_str(&output.stdout).map_err(|e| LiquidError::MalformedManifest {
            path: manifest_path.to_path_buf(),
            message: format!("unreadable `cargo metadata` output: {e}"),
        })
    }

    /// Runs `rustc -vV` and returns the `release:` value.
    pub async fn rustc_release(&self) -> LiquidResult<String> {
        let output = self
            .run_checked(&Invocation::new("rustc").arg("-vV"))
            .await?;
        parse_release(&output.stdout).ok_or(LiquidError::UnknownToolchain)
    }

    /// Runs the invocation with output streamed to the terminal.
    pub async fn run_streaming(&self, invocation: Invocation) -> LiquidResult<()> {
        let output = self.executor.execute(&invocation.inherit_output()).await?;
        if !output.success() {
            return Err(LiquidError::ToolFailed {
                tool: "cargo build".to_string(),
                status: output.status_code,
            });
        }
        Ok(())
    }

    async fn run_checked(&self, invocation: &Invocation) -> LiquidResult<CommandOutput> {
        let output = self.executor.execute(invocation).await?;
        if !output.success() {
            tracing::error!(
                command = %invocation.display(),
                stderr = %output.stderr.trim(),
                "external command failed"
            );
            return Err(LiquidError::ToolFailed {
                tool: invocation.display(),
                status: output.status_code,
            });
        }
        Ok(output)
    }
}

fn parse_release(verbose_version: &str) -> Option<String> {
    verbose_version
        .lines()
        .find_map(|line| line.strip_prefix("release:"))
        .map(|release| release.trim().to_string())
        .filter(|release| !release.is_empty())
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::external::command::mock::*;

    fn hello_world_metadata() -> String {
        fixtures::metadata(
            "/work/hello-world",
            "/work/hello-world/target",
            vec![
                fixtures::package("hello-world", "/work/hello-world/Cargo.toml"),
                fixtures::package("helpers", "/work/hello-world/helpers/Cargo.toml"),
            ],
            Some("hello-world"),
        )
    }

    #[tokio::test]
    async fn test_metadata_is_parsed() {
        let executor = MockCommandExecutor::new().expect_command(
            "cargo metadata --format-version 1 --manifest-path /work/hello-world/Cargo.toml",
            ok(&hello_world_metadata()),
        );
        let client = CargoClient::new(Arc::new(executor));

        let metadata = client
            .metadata(Path::new("/work/hello-world/Cargo.toml"))
            .await
            .unwrap();

        assert_eq!(metadata.target_directory.as_str(), "/work/hello-world/target");
        assert_eq!(metadata.workspace_packages().len(), 2);
        assert_eq!(root_package(&metadata).unwrap().name, "hello-world");
    }

    #[test]
    fn test_root_package_follows_resolve_root() {
        let metadata: Metadata = serde_json::from_str(&fixtures::metadata(
            "/work",
            "/work/target",
            vec![
                fixtures::package("lang", "/work/lang/Cargo.toml"),
                fixtures::package("token", "/work/contracts/token/Cargo.toml"),
            ],
            Some("token"),
        ))
        .unwrap();

        assert_eq!(root_package(&metadata).unwrap().name, "token");
    }

    #[test]
    fn test_virtual_manifest_has_no_root_package() {
        let metadata: Metadata = serde_json::from_str(&fixtures::metadata(
            "/work",
            "/work/target",
            vec![fixtures::package("lang", "/work/lang/Cargo.toml")],
            None,
        ))
        .unwrap();

        assert!(root_package(&metadata).is_none());
    }

    #[tokio::test]
    async fn test_unreadable_metadata_is_reported() {
        let executor = MockCommandExecutor::new().expect_command(
            "cargo metadata --format-version 1 --manifest-path Cargo.toml",
            ok("warning: not json"),
        );
        let client = CargoClient::new(Arc::new(executor));

        let err = client.metadata(Path::new("Cargo.toml")).await.unwrap_err();
        assert!(err.to_string().contains("unreadable `cargo metadata` output"));
    }

    #[tokio::test]
    async fn test_metadata_failure_is_reported() {
        let executor = MockCommandExecutor::new().expect_command(
            "cargo metadata --format-version 1 --manifest-path Cargo.toml",
            failed(101, "error: could not find `Cargo.toml`"),
        );
        let client = CargoClient::new(Arc::new(executor));

        let err = client.metadata(Path::new("Cargo.toml")).await.unwrap_err();
        assert!(matches!(err, LiquidError::ToolFailed { status: 101, .. }));
    }

    #[test]
    fn test_parse_release() {
        let output = "rustc 1.83.0-nightly (1bc403daa 2024-10-11)\n\
                      binary: rustc\n\
                      host: x86_64-unknown-linux-gnu\n\
                      release: 1.83.0-nightly\n\
                      LLVM version: 19.1.1\n";
        assert_eq!(parse_release(output).as_deref(), Some("1.83.0-nightly"));
        assert_eq!(parse_release("binary: rustc\n"), None);
    }
}
