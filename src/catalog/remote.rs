//! Bitbucket-backed [`CatalogSource`].

use serde::Deserialize;

use super::{CatalogSource, Repository};
use crate::api::ApiClient;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct RemoteRepository {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    public: bool,
}

#[derive(Debug, Deserialize)]
struct RemoteLabel {
    name: String,
}

/// Reads repositories and labels from a Bitbucket Server instance.
pub struct BitbucketSource {
    host: String,
    token: String,
    client: ApiClient,
}

impl BitbucketSource {
    pub fn new(host: &str, token: &str) -> Result<Self> {
        Ok(Self {
            host: host.to_string(),
            token: token.to_string(),
            client: ApiClient::new(token)?,
        })
    }

    fn projects_url(&self, project: &str) -> Result<String> {
        if self.host.is_empty() {
            return Err(Error::MissingSetting {
                key: "git.host".to_string(),
            });
        }
        if self.token.is_empty() {
            return Err(Error::MissingSetting {
                key: "auth-token".to_string(),
            });
        }

        Ok(format!(
            "https://{}/rest/api/1.0/projects/{}/repos",
            self.host, project
        ))
    }
}

impl CatalogSource for BitbucketSource {
    fn list_repositories(&self, project: &str) -> Result<Vec<Repository>> {
        let listed: Vec<RemoteRepository> = self.client.get_paged(&self.projects_url(project)?)?;

        Ok(listed
            .into_iter()
            .map(|remote| Repository {
                description: remote.description,
                public: remote.public,
                ..Repository::new(remote.name, project)
            })
            .collect())
    }

    fn list_labels(&self, project: &str, repository: &str) -> Result<Vec<String>> {
        let url = format!("{}/{}/labels", self.projects_url(project)?, repository);
        let labels: Vec<RemoteLabel> = self.client.get_paged(&url)?;

        Ok(labels.into_iter().map(|label| label.name).collect())
    }
}
