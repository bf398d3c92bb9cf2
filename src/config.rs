//! # Configuration
//!
//! This module defines the `Settings` structure that mirrors the
//! `batch-tool.yaml` configuration file, the logic for locating and parsing
//! that file, and the up-front validation that runs before any repository
//! work starts.
//!
//! ## File format
//!
//! ```yaml
//! workspace: /home/me/go/src
//! git:
//!   host: git.example.com
//!   project: PLAT
//!   default-branch: develop
//! repos:
//!   sort: true
//!   skip-unwanted: true
//!   unwanted-labels: [deprecated, poc]
//!   aliases:
//!     core: [api, worker]
//!   reviewers:
//!     api: [alice]
//!   cache:
//!     filename: .catalog
//!     ttl: 24h
//! channels:
//!   buffer-size: 100
//! auth-token: "..."
//! ```
//!
//! Every key is optional; missing keys take the values in [`crate::defaults`].
//! Settings that only some commands need (the git host, the API token) are
//! checked with [`Settings::require`] by those commands before they launch
//! any workers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Complete tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Root directory that repositories are cloned under.
    pub workspace: PathBuf,
    /// Git server settings.
    pub git: GitSettings,
    /// Repository selection and catalog settings.
    pub repos: RepoSettings,
    /// Output buffer settings.
    pub channels: ChannelSettings,
    /// Bearer credential for the REST API.
    pub auth_token: String,
    /// Run one repository at a time instead of in parallel.
    #[serde(skip)]
    pub sync: bool,
}

/// Git server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GitSettings {
    pub user: String,
    pub host: String,
    pub project: String,
    pub default_branch: String,
}

/// Repository selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RepoSettings {
    /// Sort resolved repositories alphabetically.
    pub sort: bool,
    /// Exclude `unwanted_labels` when resolving filters.
    pub skip_unwanted: bool,
    pub unwanted_labels: Vec<String>,
    /// Alias name to the repositories it stands for.
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Default pull request reviewers per repository.
    pub reviewers: BTreeMap<String, Vec<String>>,
    pub cache: CacheSettings,
}

/// Catalog cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheSettings {
    pub filename: String,
    /// Time-to-live, e.g. `24h`, `30m`, `7d`.
    pub ttl: String,
}

/// Output buffer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChannelSettings {
    pub buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: defaults::default_workspace(),
            git: GitSettings::default(),
            repos: RepoSettings::default(),
            channels: ChannelSettings::default(),
            auth_token: String::new(),
            sync: false,
        }
    }
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            user: defaults::GIT_USER.to_string(),
            host: String::new(),
            project: String::new(),
            default_branch: defaults::SOURCE_BRANCH.to_string(),
        }
    }
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            sort: true,
            skip_unwanted: true,
            unwanted_labels: defaults::UNWANTED_LABELS
                .iter()
                .map(|l| l.to_string())
                .collect(),
            aliases: BTreeMap::new(),
            reviewers: BTreeMap::new(),
            cache: CacheSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            filename: defaults::CATALOG_CACHE_FILE.to_string(),
            ttl: defaults::CATALOG_CACHE_TTL.to_string(),
        }
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            buffer_size: defaults::BUFFER_SIZE,
        }
    }
}

/// Settings that individual commands may insist on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    GitHost,
    GitProject,
    AuthToken,
}

impl Setting {
    /// The configuration key as written in the YAML file.
    pub fn key(self) -> &'static str {
        match self {
            Setting::GitHost => "git.host",
            Setting::GitProject => "git.project",
            Setting::AuthToken => "auth-token",
        }
    }
}

/// Parse a configuration document.
pub fn parse(yaml: &str) -> Result<Settings> {
    if yaml.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: Some(
            "Top-level keys are workspace, git, repos, channels and auth-token".to_string(),
        ),
    })
}

/// Read and parse a configuration file.
pub fn from_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

impl Settings {
    /// Load settings from an explicit file, or from the first
    /// `batch-tool.yaml` found on the search path.
    ///
    /// Returns the settings together with the file they came from. When no
    /// explicit file is given and none is found, defaults are returned.
    pub fn discover(explicit: Option<&Path>) -> Result<(Settings, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((from_file(path)?, Some(path.to_path_buf())));
        }

        let file_name = format!("{}.yaml", defaults::CONFIG_NAME);
        for dir in defaults::config_search_paths() {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                return Ok((from_file(&candidate)?, Some(candidate)));
            }
        }

        Ok((Settings::default(), None))
    }

    /// Check settings that every command depends on.
    pub fn validate(&self) -> Result<()> {
        if self.channels.buffer_size == 0 {
            return Err(Error::InvalidSetting {
                key: "channels.buffer-size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        self.cache_ttl()?;
        Ok(())
    }

    /// Fail with [`Error::MissingSetting`] for the first empty setting.
    pub fn require(&self, settings: &[Setting]) -> Result<()> {
        for setting in settings {
            let value = match setting {
                Setting::GitHost => &self.git.host,
                Setting::GitProject => &self.git.project,
                Setting::AuthToken => &self.auth_token,
            };

            if value.trim().is_empty() {
                return Err(Error::MissingSetting {
                    key: setting.key().to_string(),
                });
            }
        }

        Ok(())
    }

    /// The parsed catalog cache time-to-live.
    pub fn cache_ttl(&self) -> Result<Duration> {
        parse_duration(&self.repos.cache.ttl).map_err(|message| Error::InvalidSetting {
            key: "repos.cache.ttl".to_string(),
            message,
        })
    }

    /// Location of the catalog cache file for the configured host and project.
    pub fn catalog_cache_path(&self) -> PathBuf {
        self.workspace
            .join(&self.git.host)
            .join(&self.git.project)
            .join(&self.repos.cache.filename)
    }
}

/// Parse a duration such as `30s`, `15m`, `24h`, `7d` or `2w`.
pub fn parse_duration(duration_str: &str) -> std::result::Result<Duration, String> {
    let duration_str = duration_str.trim().to_lowercase();

    if duration_str.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    let split_idx = duration_str
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(duration_str.len());

    if split_idx == 0 {
        return Err(format!("'{}' must start with a number", duration_str));
    }

    let (number_str, unit_str) = duration_str.split_at(split_idx);
    let number: f64 = number_str
        .parse()
        .map_err(|_| format!("invalid number '{}'", number_str))?;

    let seconds = match unit_str {
        "s" | "sec" | "second" | "seconds" => number,
        "m" | "min" | "minute" | "minutes" => number * 60.0,
        "h" | "hr" | "hour" | "hours" => number * 3600.0,
        "d" | "day" | "days" => number * 86400.0,
        "w" | "week" | "weeks" => number * 604800.0,
        "" => return Err(format!("'{}' is missing a unit (s, m, h, d, w)", duration_str)),
        _ => {
            return Err(format!(
                "invalid unit '{}'; valid units: s, m, h, d, w",
                unit_str
            ))
        }
    };

    Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("'{}' is out of range", duration_str))
}
