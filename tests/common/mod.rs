//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_config(configs::LOCAL)
//!         .with_catalog(&[("api", &["go"])]);
//!     fixture.command_with_config().arg("labels").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::should_skip_network_tests;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
///
/// `{workspace}` is replaced with the fixture's workspace directory by
/// [`TestFixture::with_config`].
#[allow(dead_code)]
pub mod configs {
    /// Host and project set, no token, aliases and reviewers configured.
    pub const LOCAL: &str = r#"
workspace: "{workspace}"
git:
  host: git.example.com
  project: PLAT
repos:
  aliases:
    core: [api, worker]
  reviewers:
    api: [alice]
"#;

    /// Like [`LOCAL`] but with an API token.
    pub const WITH_TOKEN: &str = r#"
workspace: "{workspace}"
git:
  host: git.example.com
  project: PLAT
auth-token: secret
"#;

    /// Keeps command-line order instead of sorting.
    pub const UNSORTED: &str = r#"
workspace: "{workspace}"
git:
  host: git.example.com
  project: PLAT
repos:
  sort: false
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "workspace: [unclosed";
}

/// Check if network tests should be skipped.
///
/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// A temporary directory holding a `batch-tool.yaml` and a workspace.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_config(configs::LOCAL)
///     .with_catalog(&[("api", &["go"]), ("web", &[])]);
///
/// fixture
///     .command_with_config()
///     .args(["labels", "~go"])
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `batch-tool.yaml`, substituting `{workspace}`.
    pub fn with_config(self, content: &str) -> Self {
        let workspace = self.workspace();
        let content = content.replace("{workspace}", &workspace.display().to_string());
        self.temp_dir
            .child("batch-tool.yaml")
            .write_str(&content)
            .expect("Failed to write config file");
        self
    }

    /// Write a fresh catalog cache for `git.example.com/PLAT`.
    pub fn with_catalog(self, repos: &[(&str, &[&str])]) -> Self {
        let repositories: serde_json::Map<String, serde_json::Value> = repos
            .iter()
            .map(|(name, labels)| {
                (
                    name.to_string(),
                    serde_json::json!({
                        "name": name,
                        "description": format!("The {} service", name),
                        "public": false,
                        "project_name": "PLAT",
                        "labels": labels,
                    }),
                )
            })
            .collect();

        let catalog = serde_json::json!({
            "updated_at": chrono::Utc::now().to_rfc3339(),
            "repositories": repositories,
        });

        self.temp_dir
            .child("workspace/git.example.com/PLAT/.catalog")
            .write_str(&catalog.to_string())
            .expect("Failed to write catalog cache");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Root directory that repositories are cloned under.
    pub fn workspace(&self) -> PathBuf {
        self.temp_dir.path().join("workspace")
    }

    /// Directory a repository of the test project lives in.
    #[allow(dead_code)]
    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.workspace().join("git.example.com/PLAT").join(name)
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("batch-tool.yaml")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command configured to run in this fixture's directory.
    ///
    /// Credentials and config overrides from the caller's environment are
    /// cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("batch-tool");
        cmd.current_dir(self.path())
            .env_remove("AUTH_TOKEN")
            .env_remove("BATCH_TOOL_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// Create a command with the config file path argument.
    #[allow(dead_code)]
    pub fn command_with_config(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("--config").arg(self.config_path());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_config_with_workspace() {
        let fixture = TestFixture::new().with_config(configs::LOCAL);
        let content = std::fs::read_to_string(fixture.config_path()).unwrap();
        assert!(content.contains(&fixture.workspace().display().to_string()));
        assert!(!content.contains("{workspace}"));
    }

    #[test]
    fn test_fixture_writes_catalog() {
        let fixture = TestFixture::new().with_catalog(&[("api", &["go"])]);
        let cache = fixture.workspace().join("git.example.com/PLAT/.catalog");
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(cache).unwrap()).unwrap();
        assert_eq!(value["repositories"]["api"]["labels"][0], "go");
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(configs::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
