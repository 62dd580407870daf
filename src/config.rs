//! Configuration for the docpipe agent.
//!
//! Layered with figment:
//! - Default values
//! - TOML configuration file (`.docpipe/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOCPIPE_` and use double
//! underscores to separate nested levels:
//! - `DOCPIPE_BRIDGE__TRANSPORT=none` sets `bridge.transport`
//! - `DOCPIPE_CHUNKING__MAX_CHUNK_CHARS=6000` sets `chunking.max_chunk_chars`
//! - `DOCPIPE_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = ".docpipe";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "DOCPIPE_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Host bridge transport
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Document conversion collaborator
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Markdown chunking collaborator
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Local watch mode
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Log level configuration.
///
/// `RUST_LOG` takes precedence when set.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all targets
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `"docpipe::pipeline" = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// JSON frames on stdout
    #[default]
    Stdio,
    /// JSON frames on a unix socket at `socket_path`
    Unix,
    /// No host; run host-blind
    None,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BridgeConfig {
    #[serde(default)]
    pub transport: Transport,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,

    /// Upper bound for a single host call
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversionConfig {
    /// File extensions handed to the converter (case-insensitive, no dot)
    #[serde(default = "default_convertible_extensions")]
    pub extensions: Vec<String>,

    /// Converter executable
    #[serde(default = "default_converter_program")]
    pub program: String,

    /// Argument template; `{input}` and `{output}` are substituted
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChunkingConfig {
    /// Files at or below this size are not split
    #[serde(default = "default_threshold_chars")]
    pub threshold_chars: usize,

    /// Maximum chunk size in characters
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// How long a new file must be quiet before it is reported as added
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

// Default value functions
fn default_version() -> u32 { 1 }
fn default_log_level() -> String { "info".to_string() }
fn default_write_timeout_ms() -> u64 { 2000 }
fn default_convertible_extensions() -> Vec<String> {
    ["pdf", "docx", "xlsx", "pptx"].iter().map(|s| s.to_string()).collect()
}
fn default_converter_program() -> String { "markitdown".to_string() }
fn default_converter_args() -> Vec<String> {
    ["{input}", "-o", "{output}"].iter().map(|s| s.to_string()).collect()
}
fn default_threshold_chars() -> usize { 12_000 }
fn default_max_chunk_chars() -> usize { 8_000 }
fn default_debounce_ms() -> u64 { 500 }

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            logging: LoggingConfig::default(),
            bridge: BridgeConfig::default(),
            conversion: ConversionConfig::default(),
            chunking: ChunkingConfig::default(),
            watch: WatchConfig::default(),
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

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            socket_path: None,
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            extensions: default_convertible_extensions(),
            program: default_converter_program(),
            args: default_converter_args(),
        }
    }
}

impl ConversionConfig {
    /// Whether the path's extension names a convertible document format.
    pub fn is_convertible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            threshold_chars: default_threshold_chars(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

impl ChunkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_chars == 0 {
            return Err("max_chunk_chars must be greater than zero".to_string());
        }

        // Chunks must not themselves qualify for splitting.
        if self.max_chunk_chars > self.threshold_chars {
            return Err(format!(
                "max_chunk_chars ({}) must not exceed threshold_chars ({})",
                self.max_chunk_chars, self.threshold_chars
            ));
        }

        Ok(())
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels; single underscores stay
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)?;

        Ok(settings)
    }

    /// Find `.docpipe/settings.toml` by searching from the current directory up
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `root`
    pub fn init_config_file(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }

    /// Render as TOML for display
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
