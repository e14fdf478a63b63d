//! Configuration Vault – reads/writes `~/.memlane/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use zeroize::Zeroize;

use memlane_kernel::{ImmersiveSignal, InteractionTiming};
use memlane_runtime::{ComposerConfig, SessionConfig};

/// Environment variable carrying the host's immersive-support flag.
pub const IMMERSIVE_ENV: &str = "MEMLANE_IMMERSIVE";

/// Persisted user configuration stored in `~/.memlane/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the MemoryBridge backend.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Memory document to display.
    #[serde(default)]
    pub memory_id: String,

    /// Endpoint that receives `memory_selected` notifications.  Empty means
    /// selections are only published in-process.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub narration_url: String,

    /// Sent as the `xi-api-key` header (stored as plain text – keep the
    /// config file owner-only).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub narration_api_key: String,

    /// Whether the host can present an immersive scene.  Absent means
    /// unknown, which selects the flat mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immersive: Option<bool>,

    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,

    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Items per page in flat mode.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Session timer resolution.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("feed_url", &self.feed_url)
            .field("memory_id", &self.memory_id)
            .field("narration_url", &self.narration_url)
            .field(
                "narration_api_key",
                if self.narration_api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("immersive", &self.immersive)
            .field("dwell_ms", &self.dwell_ms)
            .field("cooldown_ms", &self.cooldown_ms)
            .field("page_size", &self.page_size)
            .field("tick_ms", &self.tick_ms)
            .finish()
    }
}

impl Drop for Config {
    fn drop(&mut self) {
        self.narration_api_key.zeroize();
    }
}

fn default_feed_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_dwell_ms() -> u64 {
    1500
}
fn default_cooldown_ms() -> u64 {
    3000
}
fn default_page_size() -> usize {
    12
}
fn default_tick_ms() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            memory_id: String::new(),
            narration_url: String::new(),
            narration_api_key: String::new(),
            immersive: None,
            dwell_ms: default_dwell_ms(),
            cooldown_ms: default_cooldown_ms(),
            page_size: default_page_size(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl Config {
    /// The host's capability signal: `MEMLANE_IMMERSIVE` wins over the
    /// `immersive` field.
    pub fn immersive_signal(&self) -> ImmersiveSignal {
        match std::env::var(IMMERSIVE_ENV) {
            Ok(raw) => ImmersiveSignal::parse(&raw),
            Err(_) => ImmersiveSignal::from_flag(self.immersive),
        }
    }

    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            flat_page_size: self.page_size.max(1),
            timing: InteractionTiming {
                dwell: Duration::from_millis(self.dwell_ms),
                cooldown: Duration::from_millis(self.cooldown_ms),
            },
            ..ComposerConfig::default()
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tick: Duration::from_millis(self.tick_ms.max(1)),
        }
    }

    pub fn narration_api_key(&self) -> Option<String> {
        Some(self.narration_api_key.clone()).filter(|k| !k.is_empty())
    }
}

/// Return the path to `~/.memlane/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".memlane").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `MEMLANE_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `MEMLANE_FEED_URL` | `feed_url` |
/// | `MEMLANE_MEMORY_ID` | `memory_id` |
/// | `MEMLANE_NARRATION_URL` | `narration_url` |
/// | `MEMLANE_DWELL_MS` | `dwell_ms` |
/// | `MEMLANE_COOLDOWN_MS` | `cooldown_ms` |
/// | `MEMLANE_PAGE_SIZE` | `page_size` |
///
/// Unparsable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MEMLANE_FEED_URL") {
        cfg.feed_url = v;
    }
    if let Ok(v) = std::env::var("MEMLANE_MEMORY_ID") {
        cfg.memory_id = v;
    }
    if let Ok(v) = std::env::var("MEMLANE_NARRATION_URL") {
        cfg.narration_url = v;
    }
    if let Ok(v) = std::env::var("MEMLANE_DWELL_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.dwell_ms = ms;
    }
    if let Ok(v) = std::env::var("MEMLANE_COOLDOWN_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.cooldown_ms = ms;
    }
    if let Ok(v) = std::env::var("MEMLANE_PAGE_SIZE")
        && let Ok(size) = v.trim().parse::<usize>()
        && size > 0
    {
        cfg.page_size = size;
    }
}

/// Save the config to disk, creating `~/.memlane/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let mut raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Owner-only file (rw-------) on Unix.
    #[cfg(unix)]
    let written = {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
    };
    #[cfg(not(unix))]
    let written = fs::write(path, raw.as_bytes());
    // The serialized text may hold the API key.
    raw.zeroize();
    written.map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
