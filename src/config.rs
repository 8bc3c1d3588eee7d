//! Layered configuration: built-in defaults, an optional TOML file, then
//! command line flags.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVERS: &str = "localhost:2181";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_DIR_MODE: u32 = 0o744;
pub const DEFAULT_FILE_MODE: u32 = 0o644;
const MAX_MODE: u32 = 0o7777;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid {name} {value:#o} (must be at most 0o7777)")]
    InvalidMode { name: &'static str, value: u32 },
    #[error("No servers configured")]
    NoServers,
}

/// ACL attached to every node the tool creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AclPolicy {
    /// Full permissions for the authenticated identity that created the node.
    CreatorAll,
    /// Full permissions for everyone.
    Open,
}

/// Uniform policy for everything a run creates, on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePolicy {
    pub acl: AclPolicy,
    /// Permission bits for local directories created by download.
    pub dir_mode: u32,
    /// Permission bits for local files created by download.
    pub file_mode: u32,
}

impl Default for NodePolicy {
    fn default() -> Self {
        NodePolicy {
            acl: AclPolicy::Open,
            dir_mode: DEFAULT_DIR_MODE,
            file_mode: DEFAULT_FILE_MODE,
        }
    }
}

/// On-disk configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub servers: Option<Vec<String>>,
    pub auth: Option<String>,
    pub timeout_secs: Option<u64>,
    pub acl: Option<AclPolicy>,
    pub dir_mode: Option<u32>,
    pub file_mode: Option<u32>,
}

impl ConfigFile {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line, which win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub servers: Option<Vec<String>>,
    pub auth: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub servers: Vec<String>,
    pub auth: Option<String>,
    pub timeout: Duration,
    pub policy: NodePolicy,
}

impl Settings {
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Self, ConfigError> {
        let servers: Vec<String> = overrides
            .servers
            .or(file.servers)
            .unwrap_or_else(|| vec![DEFAULT_SERVERS.to_string()])
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if servers.is_empty() {
            return Err(ConfigError::NoServers);
        }

        let auth = overrides.auth.or(file.auth).filter(|a| !a.is_empty());

        let timeout = Duration::from_secs(
            overrides
                .timeout_secs
                .or(file.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        // A creator-only ACL needs an authenticated identity to refer to.
        let acl = file.acl.unwrap_or(if auth.is_some() {
            AclPolicy::CreatorAll
        } else {
            AclPolicy::Open
        });

        let policy = NodePolicy {
            acl,
            dir_mode: check_mode("dir-mode", file.dir_mode.unwrap_or(DEFAULT_DIR_MODE))?,
            file_mode: check_mode("file-mode", file.file_mode.unwrap_or(DEFAULT_FILE_MODE))?,
        };

        Ok(Settings {
            servers,
            auth,
            timeout,
            policy,
        })
    }
}

fn check_mode(name: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value > MAX_MODE {
        return Err(ConfigError::InvalidMode { name, value });
    }
    Ok(value)
}
