//! Temporary copies of a cargo workspace with rewritten manifests.
//!
//! The contract build must not touch the user's `Cargo.toml`, yet it needs
//! a manifest without the `rlib` crate type and with LTO enabled. The
//! workspace is therefore mirrored into a temporary directory: every member
//! manifest is written at the same relative location, with relative paths
//! made absolute so sources are still read from the original tree.

mod manifest;

pub use manifest::{Manifest, ManifestPath};

use cargo_metadata::PackageId;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::{LiquidError, LiquidResult};
use crate::external::{cargo::package_by_id, Metadata};

pub struct Workspace {
    workspace_root: PathBuf,
    root_package: PathBuf,
    members: BTreeMap<PathBuf, Manifest>,
}

impl Workspace {
    /// Loads the manifests of every workspace member, plus the workspace
    /// root manifest when it is not a package of its own.
    ///
    /// All paths are taken from `cargo metadata`, so they compare equal
    /// whatever spelling the user passed on the command line.
    pub fn new(metadata: &Metadata, root_package: &PackageId) -> LiquidResult<Self> {
        let root_package = package_by_id(metadata, root_package)
            .map(|package| package.manifest_path.clone().into_std_path_buf())
            .ok_or_else(|| LiquidError::RootPackageNotFound {
                manifest: metadata.workspace_root.join("Cargo.toml").into_std_path_buf(),
            })?;

        let mut members = BTreeMap::new();
        for package in metadata.workspace_packages() {
            let path = package.manifest_path.clone().into_std_path_buf();
            let mut manifest = Manifest::new(ManifestPath::new(&path)?)?;
            manifest.rewrite_relative_paths()?;
            members.insert(path, manifest);
        }

        let workspace_root = metadata.workspace_root.clone().into_std_path_buf();
        let root_workspace_manifest = workspace_root.join("Cargo.toml");
        if !members.contains_key(&root_workspace_manifest) && root_workspace_manifest.exists() {
            let mut manifest = Manifest::new(ManifestPath::new(&root_workspace_manifest)?)?;
            manifest.rewrite_relative_paths()?;
            members.insert(root_workspace_manifest, manifest);
        }

        if !members.contains_key(&root_package) {
            return Err(LiquidError::RootPackageNotFound {
                manifest: root_package,
            });
        }

        Ok(Self {
            workspace_root,
            root_package,
            members,
        })
    }

    /// Applies `f` to the manifest of the package being built.
    pub fn with_root_package_manifest<F>(mut self, f: F) -> LiquidResult<Self>
    where
        F: FnOnce(&mut Manifest) -> LiquidResult<()>,
    {
        let manifest = self.members.get_mut(&self.root_package).ok_or_else(|| {
            LiquidError::RootPackageNotFound {
                manifest: self.root_package.clone(),
            }
        })?;
        f(manifest)?;
        Ok(self)
    }

    /// Writes the workspace into a fresh temporary directory and runs `f`
    /// with the temporary manifest of the root package. The directory is
    /// removed once `f` completes; failing to remove it is only logged.
    pub async fn using_temp<F, Fut, T>(&self, f: F) -> LiquidResult<T>
    where
        F: FnOnce(ManifestPath) -> Fut,
        Fut: Future<Output = LiquidResult<T>>,
    {
        let tmp_dir = tempfile::Builder::new()
            .prefix("cargo-liquid_")
            .tempdir()?;
        tracing::debug!(path = %tmp_dir.path().display(), "writing temporary workspace");

        let tmp_root_manifest = self.write_to(tmp_dir.path())?;
        let result = f(tmp_root_manifest).await;

        let tmp_path = tmp_dir.path().to_path_buf();
        if let Err(error) = tmp_dir.close() {
            tracing::warn!(
                path = %tmp_path.display(),
                %error,
                "failed to remove temporary workspace"
            );
        }
        result
    }

    /// Mirrors the manifests (and `Cargo.lock`) under `dir`, returning the
    /// location of the root package manifest.
    fn write_to(&self, dir: &Path) -> LiquidResult<ManifestPath> {
        let mut root_manifest = None;
        for (original, manifest) in &self.members {
            let relative = original.strip_prefix(&self.workspace_root).map_err(|_| {
                LiquidError::MalformedManifest {
                    path: original.clone(),
                    message: format!(
                        "member lies outside the workspace root '{}'",
                        self.workspace_root.display()
                    ),
                }
            })?;
            let target = ManifestPath::new(dir.join(relative))?;
            manifest.write(&target)?;
            if original == &self.root_package {
                root_manifest = Some(target);
            }
        }

        let lock_file = self.workspace_root.join("Cargo.lock");
        if lock_file.exists() {
            std::fs::copy(&lock_file, dir.join("Cargo.lock"))?;
        }

        root_manifest.ok_or_else(|| LiquidError::RootPackageNotFound {
            manifest: self.root_package.clone(),
        })
    }
}
