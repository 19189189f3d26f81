//! TOML configuration for the viewer.
//!
//! The file lives at the platform config location unless a path is given on
//! the command line:
//! - Windows:  `%APPDATA%\EmuViewer\viewer.toml`
//! - Linux:    `~/.config/emu-viewer/viewer.toml`
//! - macOS:    `~/Library/Application Support/EmuViewer/viewer.toml`
//!
//! Example:
//!
//! ```toml
//! [console]
//! host = "127.0.0.1"
//! port = 5554
//! reconnect_delay_ms = 1000
//!
//! [video]
//! fps = 30
//!
//! [view]
//! width = 360
//! height = 640
//!
//! [viewer]
//! log_level = "debug"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section and
//! a missing key all fall back to the values shown by `ViewerConfig::default()`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use emu_core::protocol::{AUTH_MARKER, DEFAULT_CONSOLE_PORT, VIDEO_HANDLE_PREFIX};
use emu_core::view::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `console.host` is not an IP address.
    #[error("invalid console host '{0}'")]
    InvalidHost(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewerConfig {
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub viewer: GeneralConfig,
}

/// Where the emulator console is and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsoleConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Console port; 5554 for the first emulator, then 5556, 5558, ...
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Text that introduces the token path in the auth banner.
    #[serde(default = "default_token_marker")]
    pub token_marker: String,
}

/// Shared-memory video feed settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoConfig {
    /// Frame rate requested from the emulator.  Absent means the emulator's
    /// own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(default = "default_handle_prefix")]
    pub handle_prefix: String,
}

/// Size of the local surface the feed is drawn into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewConfig {
    #[serde(default = "default_view_width")]
    pub width: u32,
    #[serde(default = "default_view_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DEFAULT_CONSOLE_PORT
}
fn default_reconnect_delay_ms() -> u64 {
    1000
}
fn default_token_marker() -> String {
    AUTH_MARKER.to_string()
}
fn default_handle_prefix() -> String {
    VIDEO_HANDLE_PREFIX.to_string()
}
fn default_view_width() -> u32 {
    360
}
fn default_view_height() -> u32 {
    640
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            token_marker: default_token_marker(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: None,
            handle_prefix: default_handle_prefix(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: default_view_width(),
            height: default_view_height(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ConsoleConfig {
    /// Socket address of the console.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidHost`] if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl ViewConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default config file path for this platform.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory cannot
/// be determined from the environment.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("viewer.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads a `ViewerConfig` from `path`, returning `ViewerConfig::default()` if
/// the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ViewerConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ViewerConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &ViewerConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("EmuViewer"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("emu-viewer"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("EmuViewer")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
