use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

use crate::error::{LiquidError, LiquidResult};

const MANIFEST_FILE: &str = "Cargo.toml";

const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Path to a `Cargo.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ManifestPath {
    path: PathBuf,
}

impl ManifestPath {
    pub fn new<P: AsRef<Path>>(path: P) -> LiquidResult<Self> {
        let path = path.as_ref();
        match path.file_name() {
            Some(name) if name == MANIFEST_FILE => Ok(Self {
                path: path.to_path_buf(),
            }),
            _ => Err(LiquidError::InvalidManifestPath {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Directory containing the manifest.
    pub fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

impl Default for ManifestPath {
    fn default() -> Self {
        Self {
            path: PathBuf::from(MANIFEST_FILE),
        }
    }
}

impl TryFrom<&str> for ManifestPath {
    type Error = LiquidError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ManifestPath::new(value)
    }
}

impl AsRef<Path> for ManifestPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

/// A parsed `Cargo.toml` that can be edited and written elsewhere.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: ManifestPath,
    toml: Table,
}

impl Manifest {
    pub fn new(path: ManifestPath) -> LiquidResult<Self> {
        let content = fs::read_to_string(path.as_path())?;
        Self::from_str(path, &content)
    }

    pub fn from_str(path: ManifestPath, content: &str) -> LiquidResult<Self> {
        let toml = content
            .parse::<Table>()
            .map_err(|e| LiquidError::MalformedManifest {
                path: path.as_path().to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self { path, toml })
    }

    pub fn package_name(&self) -> Option<&str> {
        self.toml
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
    }

    pub fn is_virtual(&self) -> bool {
        !self.toml.contains_key("package")
    }

    /// Removes `crate_type` from `[lib] crate-type`.
    pub fn with_removed_crate_type(&mut self, crate_type: &str) -> LiquidResult<&mut Self> {
        let crate_types = self
            .toml
            .get_mut("lib")
            .and_then(Value::as_table_mut)
            .and_then(|lib| lib.get_mut("crate-type"))
            .and_then(Value::as_array_mut)
            .ok_or_else(|| LiquidError::MissingSection {
                path: self.path.as_path().to_path_buf(),
                section: "lib.crate-type".to_string(),
            })?;
        crate_types.retain(|v| v.as_str() != Some(crate_type));
        Ok(self)
    }

    /// Sets `[profile.release] lto`, creating the tables when absent.
    pub fn with_profile_release_lto(&mut self, enabled: bool) -> LiquidResult<&mut Self> {
        let release = self.table_mut(&["profile", "release"])?;
        release.insert("lto".to_string(), Value::Boolean(enabled));
        Ok(self)
    }

    /// Makes every relative path in the manifest absolute, so the manifest
    /// keeps working after being written to another directory.
    pub fn rewrite_relative_paths(&mut self) -> LiquidResult<&mut Self> {
        let base = std::path::absolute(self.path.directory())?;

        if !self.is_virtual() {
            self.rewrite_target_paths(&base)?;
        }

        for name in DEPENDENCY_TABLES {
            if let Some(deps) = self.toml.get_mut(name).and_then(Value::as_table_mut) {
                absolutize_dependency_paths(deps, &base);
            }
        }

        if let Some(targets) = self.toml.get_mut("target").and_then(Value::as_table_mut) {
            for cfg in targets.iter_mut().map(|(_, v)| v).filter_map(Value::as_table_mut) {
                for name in DEPENDENCY_TABLES {
                    if let Some(deps) = cfg.get_mut(name).and_then(Value::as_table_mut) {
                        absolutize_dependency_paths(deps, &base);
                    }
                }
            }
        }

        if let Some(deps) = self
            .toml
            .get_mut("workspace")
            .and_then(|w| w.get_mut("dependencies"))
            .and_then(Value::as_table_mut)
        {
            absolutize_dependency_paths(deps, &base);
        }

        if let Some(patches) = self.toml.get_mut("patch").and_then(Value::as_table_mut) {
            for registry in patches.iter_mut().map(|(_, v)| v).filter_map(Value::as_table_mut) {
                absolutize_dependency_paths(registry, &base);
            }
        }

        if let Some(replace) = self.toml.get_mut("replace").and_then(Value::as_table_mut) {
            absolutize_dependency_paths(replace, &base);
        }

        Ok(self)
    }

    fn rewrite_target_paths(&mut self, base: &Path) -> LiquidResult<()> {
        let default_lib = base.join("src").join("lib.rs");
        let has_lib_table = self.toml.contains_key("lib");
        if has_lib_table || default_lib.exists() {
            let lib = self.table_mut(&["lib"])?;
            match lib.get("path").and_then(Value::as_str) {
                Some(path) => {
                    let absolute = absolutize(base, path);
                    lib.insert("path".to_string(), absolute);
                }
                None if default_lib.exists() => {
                    lib.insert(
                        "path".to_string(),
                        Value::String(default_lib.display().to_string()),
                    );
                }
                None => {}
            }
        }

        let default_main = base.join("src").join("main.rs");
        match self.toml.get_mut("bin").and_then(Value::as_array_mut) {
            Some(bins) => {
                for bin in bins.iter_mut().filter_map(Value::as_table_mut) {
                    if let Some(path) = bin.get("path").and_then(Value::as_str) {
                        let absolute = absolutize(base, path);
                        bin.insert("path".to_string(), absolute);
                    }
                }
            }
            None if default_main.exists() => {
                let mut bin = Table::new();
                if let Some(name) = self.package_name() {
                    bin.insert("name".to_string(), Value::String(name.to_string()));
                }
                bin.insert(
                    "path".to_string(),
                    Value::String(default_main.display().to_string()),
                );
                self.toml
                    .insert("bin".to_string(), Value::Array(vec![Value::Table(bin)]));
            }
            None => {}
        }

        let default_build = base.join("build.rs");
        let package = self.table_mut(&["package"])?;
        match package.get("build") {
            Some(Value::String(path)) => {
                let absolute = absolutize(base, path);
                package.insert("build".to_string(), absolute);
            }
            Some(_) => {}
            None if default_build.exists() => {
                package.insert(
                    "build".to_string(),
                    Value::String(default_build.display().to_string()),
                );
            }
            None => {}
        }
        Ok(())
    }

    /// Walks (and creates) nested tables along `keys`.
    fn table_mut(&mut self, keys: &[&str]) -> LiquidResult<&mut Table> {
        let mut table = &mut self.toml;
        for key in keys {
            let value = table
                .entry(key.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            table = value
                .as_table_mut()
                .ok_or_else(|| LiquidError::MalformedManifest {
                    path: self.path.as_path().to_path_buf(),
                    message: format!("`{key}` is not a table"),
                })?;
        }
        Ok(table)
    }

    pub fn write(&self, path: &ManifestPath) -> LiquidResult<()> {
        if let Some(dir) = path.as_path().parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path.as_path(), self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> LiquidResult<String> {
        toml::to_string(&self.toml).map_err(|e| LiquidError::MalformedManifest {
            path: self.path.as_path().to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn absolutize(base: &Path, path: &str) -> Value {
    let path = Path::new(path);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    Value::String(absolute.display().to_string())
}

fn absolutize_dependency_paths(deps: &mut Table, base: &Path) {
    for dep in deps.iter_mut().map(|(_, v)| v).filter_map(Value::as_table_mut) {
        if let Some(path) = dep.get("path").and_then(Value::as_str) {
            let absolute = absolutize(base, path);
            dep.insert("path".to_string(), absolute);
        }
    }
}
