//! Shell configuration
//!
//! Tunable constants plus the on-disk configuration, loaded from
//! `/etc/dosmodern.toml` (or `--config <path>`). Every field has a default,
//! so a missing or partial file still yields a usable shell.
//!
//! The persisted screen color lives in its own one-byte file so `COLOR`
//! can rewrite it without touching the main configuration.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Version reported by `VER`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Product name shown in the banner and by `VER`
pub const PRODUCT_NAME: &str = "DOS-modern";

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dosmodern.toml";

/// Default persisted color file
pub const DEFAULT_COLOR_FILE: &str = "/etc/dosmodern.color";

/// Default fixed root (the emulated `C:\`)
pub const DEFAULT_ROOT: &str = "/";

/// Longest command line accepted by the prompt loop, in bytes
pub const MAX_LINE: usize = 1024;

/// Longest translated path, in bytes (matches Linux `PATH_MAX`)
pub const PATH_MAX: usize = libc::PATH_MAX as usize;

/// Width of one column in `DIR /W`
pub const WIDE_COLUMN_WIDTH: usize = 16;

/// Columns per row in `DIR /W`
pub const WIDE_COLUMNS: usize = 5;

/// Light grey on black
pub const DEFAULT_COLOR: u8 = 0x07;

// ============================================================================
// Errors
// ============================================================================

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ============================================================================
// Command Line
// ============================================================================

/// Command line of the init shell.
///
/// The kernel hands init whatever words it did not understand, so stray
/// positional arguments are accepted and ignored, and unknown flags are
/// dropped without discarding the recognised ones.
#[derive(Debug, Default, Parser)]
#[command(name = "dosmodern", version, about = "DOS-style init shell")]
pub struct Cli {
    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory that stands in for C:\
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    #[arg(hide = true)]
    pub extra: Vec<String>,
}

impl Cli {
    /// Parse the process arguments, falling back to defaults on error
    pub fn parse_lenient() -> Self {
        Self::parse_lenient_from(std::env::args_os())
    }

    /// Parse `args`, removing each argument clap reports as unknown and
    /// retrying. Any other parse error yields the defaults.
    pub fn parse_lenient_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        loop {
            let err = match Self::try_parse_from(args.clone()) {
                Ok(cli) => return cli,
                Err(err) => err,
            };
            if err.kind() != ErrorKind::UnknownArgument {
                return Self::default();
            }
            let Some(ContextValue::String(unknown)) = err.get(ContextKind::InvalidArg) else {
                return Self::default();
            };
            let Some(pos) = args.iter().skip(1).position(|a| spells(a, unknown)) else {
                return Self::default();
            };
            args.remove(pos + 1);
        }
    }

    /// Configuration file to load
    pub fn config_path(&self) -> &Path {
        self.config
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH))
    }
}

/// True if `arg` is `flag` itself or `flag=value`
fn spells(arg: &OsStr, flag: &str) -> bool {
    arg.to_str().is_some_and(|arg| {
        arg == flag || arg.strip_prefix(flag).is_some_and(|rest| rest.starts_with('='))
    })
}

// ============================================================================
// Configuration File
// ============================================================================

/// Shell configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory that stands in for `C:\`
    pub root: PathBuf,
    /// Where `COLOR` persists its attribute byte
    pub color_file: PathBuf,
    /// Log level name
    pub log_level: String,
    /// Mount /proc, /sys, /dev and /run when running as PID 1
    pub mount: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: PathBuf::from(DEFAULT_ROOT),
            color_file: PathBuf::from(DEFAULT_COLOR_FILE),
            log_level: String::from("warn"),
            mount: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration, using defaults if the file is absent or broken.
    ///
    /// Runs before the logger exists, so a broken file is reported on the
    /// returned warning instead of being logged here.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                (Self::default(), None)
            }
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Command line flags win over the file
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(root) = &cli.root {
            self.root = root.clone();
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
    }

    /// Parsed log level; unknown names mean `warn`
    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }
}

// ============================================================================
// Persisted Color
// ============================================================================

/// Read the persisted color attribute, if any
pub fn load_color(path: &Path) -> Option<u8> {
    match fs::read(path) {
        Ok(bytes) => bytes.first().copied(),
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("cannot read color file {}: {}", path.display(), e);
            }
            None
        }
    }
}

/// Persist the color attribute
pub fn save_color(path: &Path, attr: u8) -> io::Result<()> {
    fs::write(path, [attr])
}

// ============================================================================
// Unit Tests
// ============================================================================
