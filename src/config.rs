//! Configuration for a merge run.
//!
//! Layered sources, later ones winning:
//! - built-in defaults
//! - `loom.toml` in the working directory (or the `--config` file)
//! - environment variables prefixed with `LOOM_`, `__` separating nesting
//!   levels (`LOOM_LOGGING__DEFAULT=debug` sets `logging.default`)
//! - command-line flags, applied by the CLI after extraction

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::output::{OutputFormat, file_uri};

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "loom.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Project root as an absolute path or URI. Unset means the current
    /// working directory, expressed as a `file://` URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<String>,

    /// Output protocol to emit
    #[serde(default)]
    pub format: OutputFormat,

    /// Emit extra diagnostic fields in the output graph
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Number of parallel shard-loading workers
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Output file; unset means standard output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level filter (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `merge = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_threads() -> usize {
    num_cpus::get()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            project_root: None,
            format: OutputFormat::default(),
            debug: false,
            threads: default_threads(),
            output: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration with a specific file as the TOML layer.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("LOOM_").split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// The project root the output graph declares, as a `file://` URI.
    pub fn project_root_uri(&self) -> std::io::Result<String> {
        match &self.project_root {
            Some(root) if root.starts_with("file://") => Ok(root.clone()),
            Some(root) => Ok(file_uri(Path::new(root))),
            None => Ok(file_uri(&std::env::current_dir()?)),
        }
    }
}
