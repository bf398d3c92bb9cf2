//! Default values for batch-tool configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Base name of the configuration file (searched as `batch-tool.yaml`).
pub const CONFIG_NAME: &str = "batch-tool";

/// Environment variable that points at an explicit configuration file.
pub const CONFIG_ENV: &str = "BATCH_TOOL_CONFIG";

/// Default SSH user for cloning.
pub const GIT_USER: &str = "git";

/// Default branch that pull requests target and `git update` checks out.
pub const SOURCE_BRANCH: &str = "develop";

/// Default file name of the catalog cache.
pub const CATALOG_CACHE_FILE: &str = ".catalog";

/// Default catalog cache time-to-live.
pub const CATALOG_CACHE_TTL: &str = "24h";

/// Default number of lines each repository's output buffer holds.
pub const BUFFER_SIZE: usize = 100;

/// Labels skipped by default when resolving filters.
pub const UNWANTED_LABELS: [&str; 2] = ["deprecated", "poc"];

/// Synthetic label that matches every repository in the catalog.
pub const SUPERSET_LABEL: &str = "all";

/// Returns the default workspace root that repositories are cloned into.
///
/// Uses `$GOPATH/src` when `GOPATH` is set, otherwise `~/go/src`, falling
/// back to `go/src` in the current directory when no home directory can be
/// determined.
pub fn default_workspace() -> PathBuf {
    if let Some(gopath) = std::env::var_os("GOPATH").filter(|v| !v.is_empty()) {
        return PathBuf::from(gopath).join("src");
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("go")
        .join("src")
}

/// Directories searched, in order, for `batch-tool.yaml`.
///
/// The working directory is searched first, then the system configuration
/// directory, then the directory holding the executable.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("."), PathBuf::from("/usr/local/etc")];

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
    {
        paths.push(dir);
    }

    paths
}
