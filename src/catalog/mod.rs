//! # Repository Catalog
//!
//! The catalog is the tool's knowledge of which repositories exist in the
//! configured project and which labels each one carries. It is built once per
//! process and is read-only afterwards.
//!
//! ## Loading
//!
//! [`CatalogStore::load`] first tries the local cache file. The cache is used
//! when it exists, parses, and is younger than the configured time-to-live.
//! Otherwise the catalog is rebuilt from a [`CatalogSource`]: every
//! repository of the project is listed, then the labels of each repository
//! are fetched (one request per repository, run on the rayon pool). A
//! successful fetch is written back to the cache file.
//!
//! A failed fetch leaves the store empty. No partially fetched catalog is
//! ever exposed.
//!
//! ## Design
//!
//! The remote side is behind the `CatalogSource` trait so that tests can
//! count remote calls and simulate failures without a server. The production
//! implementation is [`remote::BitbucketSource`].

pub mod remote;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::{Error, Result};

/// The catalog's knowledge of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub public: bool,
    #[serde(rename = "project_name", default)]
    pub project: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
}

impl Repository {
    /// A repository record with no labels.
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            public: false,
            project: project.into(),
            labels: BTreeSet::new(),
        }
    }

    /// Builder-style helper to attach labels.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }
}

/// Every known repository, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub updated_at: DateTime<Utc>,
    pub repositories: BTreeMap<String, Repository>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            updated_at: DateTime::<Utc>::MIN_UTC,
            repositories: BTreeMap::new(),
        }
    }
}

impl Catalog {
    /// Build a catalog stamped with the current time.
    pub fn from_repositories(repositories: impl IntoIterator<Item = Repository>) -> Self {
        Self {
            updated_at: Utc::now(),
            repositories: repositories
                .into_iter()
                .map(|repo| (repo.name.clone(), repo))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn get(&self, name: &str) -> Option<&Repository> {
        self.repositories.get(name)
    }

    /// Names of every repository, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }

    /// Whether this catalog is older than `ttl` at `now`.
    ///
    /// A timestamp in the future counts as fresh.
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = now
            .signed_duration_since(self.updated_at)
            .to_std()
            .unwrap_or_default();
        age > ttl
    }
}

/// Remote provider of catalog data.
pub trait CatalogSource: Send + Sync {
    /// List every repository of `project`. Labels are filled in separately.
    fn list_repositories(&self, project: &str) -> Result<Vec<Repository>>;

    /// List the labels attached to one repository.
    fn list_labels(&self, project: &str, repository: &str) -> Result<Vec<String>>;
}

/// Loads the catalog from the cache file or the remote source.
pub struct CatalogStore {
    cache_path: PathBuf,
    ttl: Duration,
    project: String,
    source: Box<dyn CatalogSource>,
    loaded: Option<Catalog>,
}

impl CatalogStore {
    /// Creates a store over an explicit cache file and source.
    pub fn new(
        cache_path: PathBuf,
        ttl: Duration,
        project: impl Into<String>,
        source: Box<dyn CatalogSource>,
    ) -> Self {
        Self {
            cache_path,
            ttl,
            project: project.into(),
            source,
            loaded: None,
        }
    }

    /// Creates a store backed by the Bitbucket REST API described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let source = remote::BitbucketSource::new(&settings.git.host, &settings.auth_token)?;

        Ok(Self::new(
            settings.catalog_cache_path(),
            settings.cache_ttl()?,
            &settings.git.project,
            Box::new(source),
        ))
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// The loaded catalog, if any.
    pub fn catalog(&self) -> Option<&Catalog> {
        self.loaded.as_ref()
    }

    /// Load the catalog, preferring a fresh cache file.
    ///
    /// Calling this again after a successful load returns the same catalog
    /// without touching the cache file or the remote source.
    pub fn load(&mut self) -> Result<&Catalog> {
        if self.loaded.is_none() {
            let catalog = match read_cache(&self.cache_path, self.ttl, Utc::now()) {
                Ok(catalog) => {
                    debug!(
                        "Loaded {} repositories from {}",
                        catalog.len(),
                        self.cache_path.display()
                    );
                    catalog
                }
                Err(reason) => {
                    info!("{} - fetching remote info", reason);
                    self.fetch_and_persist()?
                }
            };
            self.loaded = Some(catalog);
        }

        Ok(self.loaded.get_or_insert_with(Catalog::default))
    }

    /// Discard any loaded catalog, fetch it from the remote source and
    /// rewrite the cache file.
    pub fn refresh(&mut self) -> Result<&Catalog> {
        self.loaded = None;
        let catalog = self.fetch_and_persist()?;
        Ok(self.loaded.insert(catalog))
    }

    fn fetch_and_persist(&self) -> Result<Catalog> {
        let catalog = fetch(self.source.as_ref(), &self.project)?;

        if let Err(e) = write_cache(&self.cache_path, &catalog) {
            warn!(
                "Could not write catalog cache {}: {}",
                self.cache_path.display(),
                e
            );
        }

        Ok(catalog)
    }
}

/// Read the cache file, rejecting it when missing, malformed or stale.
pub fn read_cache(path: &Path, ttl: Duration, now: DateTime<Utc>) -> Result<Catalog> {
    let content = fs::read(path).map_err(|_| Error::Catalog {
        message: "local cache of repository catalog is missing or invalid".to_string(),
    })?;

    let catalog: Catalog = serde_json::from_slice(&content).map_err(|e| Error::Catalog {
        message: format!("local cache of repository catalog is malformed ({})", e),
    })?;

    if catalog.is_stale(ttl, now) {
        return Err(Error::Catalog {
            message: "local cache of repository catalog is too old".to_string(),
        });
    }

    Ok(catalog)
}

/// Write the catalog to the cache file, creating parent directories.
pub fn write_cache(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, serde_json::to_vec(catalog)?)?;
    Ok(())
}

/// Build a fresh catalog from `source`.
pub fn fetch(source: &dyn CatalogSource, project: &str) -> Result<Catalog> {
    let listed = source.list_repositories(project)?;

    let progress = ProgressBar::new(listed.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} fetching labels {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let repositories = listed
        .into_par_iter()
        .map(|mut repo| {
            let labels = source.list_labels(project, &repo.name)?;
            repo.project = project.to_string();
            repo.labels = labels.into_iter().collect();
            progress.inc(1);
            Ok(repo)
        })
        .collect::<Result<Vec<_>>>();

    progress.finish_and_clear();

    let catalog = Catalog::from_repositories(repositories?);
    info!("Fetched {} repositories for {}", catalog.len(), project);
    Ok(catalog)
}
