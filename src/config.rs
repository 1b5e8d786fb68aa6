use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for cargo-liquid
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LiquidConfig {
    /// Contract build settings
    pub build: BuildConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    /// Compilation target triple
    pub target: String,
    /// Stack size handed to the linker, in bytes
    pub stack_size: u32,
    /// Import linear memory from the host instead of defining it
    pub import_memory: bool,
    /// Function exports kept in the final artifact
    pub entrypoints: Vec<String>,
    /// `wasm-opt` optimization level: 0-4, s or z
    pub wasm_opt_level: String,
    /// Refuse to build on stable or beta toolchains
    pub require_nightly: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when neither RUST_LOG nor a verbosity flag is given
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            target: "wasm32-unknown-unknown".to_string(),
            stack_size: 65536,
            import_memory: true,
            entrypoints: vec!["call".to_string(), "deploy".to_string()],
            wasm_opt_level: "3".to_string(),
            require_nightly: true,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl BuildConfig {
    /// Linker flags passed to rustc through RUSTFLAGS.
    pub fn rustflags(&self) -> String {
        let mut flags = format!(
            "-C link-arg=-z -C link-arg=stack-size={}",
            self.stack_size
        );
        if self.import_memory {
            flags.push_str(" -C link-arg=--import-memory");
        }
        flags
    }
}

/// Valid `wasm-opt` levels, as accepted after `-O`.
pub const WASM_OPT_LEVELS: [&str; 7] = ["0", "1", "2", "3", "4", "s", "z"];

impl LiquidConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files in `dir` (liquid.toml, .liquid-rc)
    /// 3. Environment variables (prefixed with CARGO_LIQUID_)
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with_env(dir, None)
    }

    /// Like [`LiquidConfig::load`], reading variables from `env` instead of
    /// the process environment when given.
    pub fn load_with_env(dir: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        let liquid_toml = dir.join("liquid.toml");
        if liquid_toml.exists() {
            builder = builder.add_source(File::from(liquid_toml));
        }

        let rc = dir.join(".liquid-rc");
        if rc.exists() {
            builder = builder.add_source(File::from(rc).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("CARGO_LIQUID")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("build.entrypoints")
                .try_parsing(true)
                .source(env),
        );

        let config: LiquidConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !WASM_OPT_LEVELS.contains(&self.build.wasm_opt_level.as_str()) {
            anyhow::bail!(
                "Invalid wasm-opt level '{}', expected one of {}",
                self.build.wasm_opt_level,
                WASM_OPT_LEVELS.join(", ")
            );
        }
        if self.build.entrypoints.is_empty() {
            anyhow::bail!("At least one contract entrypoint must be configured");
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
