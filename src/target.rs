//! Repository locations.
//!
//! A target is named on the command line either by its bare name (`api`) or
//! by a longer `project/name` or `host/project/name` form. Missing parts are
//! filled in from the configured git host and project. From those parts the
//! local checkout path, the clone URL and the REST API base are derived.

use std::fmt;
use std::path::PathBuf;

use crate::config::Settings;

/// A fully located repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// The identifier exactly as the user supplied it.
    pub raw: String,
    pub host: String,
    pub project: String,
    pub name: String,
    /// Local checkout directory.
    pub path: PathBuf,
    /// SSH clone URL.
    pub clone_url: String,
}

impl Target {
    /// Locate `raw` using the defaults from `settings`.
    pub fn parse(raw: &str, settings: &Settings) -> Self {
        let parts: Vec<&str> = raw.trim_matches(|c| c == '/' || c == ' ').split('/').collect();

        // split always yields at least one element
        let name = parts[parts.len() - 1].to_string();
        let project = if parts.len() > 1 {
            parts[parts.len() - 2].to_string()
        } else {
            settings.git.project.clone()
        };
        let host = if parts.len() > 2 {
            parts[..parts.len() - 2].join("/")
        } else {
            settings.git.host.clone()
        };

        let path = settings.workspace.join(&host).join(&project).join(&name);
        let clone_url = format!(
            "ssh://{}@{}/{}/{}.git",
            settings.git.user, host, project, name
        );

        Self {
            raw: raw.to_string(),
            host,
            project,
            name,
            path,
            clone_url,
        }
    }

    /// Base URL of this repository in the Bitbucket v1 REST API.
    pub fn api_base(&self) -> String {
        format!(
            "https://{}/rest/api/1.0/projects/{}/repos/{}",
            self.host, self.project, self.name
        )
    }

    /// Whether a local checkout exists.
    pub fn is_present(&self) -> bool {
        self.path.exists()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
