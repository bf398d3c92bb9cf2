//! # Pull Requests
//!
//! Pull-request tasks over the Bitbucket v1 REST API.
//!
//! ## Key Components
//!
//! - **[`PullRequest`]**: the typed record. Fields the tool works with are
//!   named; everything else the server sends is kept in `extra` so that an
//!   edit writes it back untouched.
//! - **[`PullRequestService`]**: the remote operations, implemented by
//!   [`BitbucketPullRequests`] and by in-memory fakes in tests.
//! - **Tasks**: [`ShowPullRequest`], [`CreatePullRequest`],
//!   [`EditPullRequest`] and [`MergePullRequest`], each acting on the pull
//!   request whose source is the repository's current branch.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::api::{ApiClient, Page};
use crate::batch::{Sink, Task};
use crate::error::{Error, Result};
use crate::git;
use crate::target::Target;

const RECORD: &str = "pull request";

/// Server-managed fields that must not be sent back on update.
const READ_ONLY_FIELDS: [&str; 2] = ["author", "participants"];

/// A user reference inside a reviewer entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One reviewer of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reviewer {
    pub user: User,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reviewer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            user: User {
                name: name.into(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectKey {
    pub key: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefRepository {
    pub slug: String,
    pub project: ProjectKey,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A branch reference (`fromRef` / `toRef`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchRef {
    pub id: String,
    pub repository: RefRepository,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BranchRef {
    /// A reference to `branch` of `target`.
    pub fn branch(target: &Target, branch: &str) -> Self {
        Self {
            id: format!("refs/heads/{}", branch),
            repository: RefRepository {
                slug: target.name.clone(),
                project: ProjectKey {
                    key: target.project.clone(),
                    extra: Map::new(),
                },
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }
}

/// A pull request as exchanged with the REST API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_ref: Option<BranchRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_ref: Option<BranchRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn missing(field: &str) -> Error {
    Error::Record {
        record: RECORD.to_string(),
        field: field.to_string(),
        message: "is missing".to_string(),
    }
}

impl PullRequest {
    pub fn id(&self) -> Result<u64> {
        self.id.ok_or_else(|| missing("id"))
    }

    pub fn version(&self) -> Result<u64> {
        self.version.ok_or_else(|| missing("version"))
    }

    pub fn title(&self) -> Result<&str> {
        self.title.as_deref().ok_or_else(|| missing("title"))
    }

    /// The description, empty when the server sent none.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn reviewer_names(&self) -> Vec<String> {
        self.reviewers.iter().map(|r| r.user.name.clone()).collect()
    }

    /// Append reviewers that are not already present.
    pub fn add_reviewers(&mut self, names: &[String]) {
        for name in names {
            if !self.reviewers.iter().any(|r| &r.user.name == name) {
                self.reviewers.push(Reviewer::named(name.clone()));
            }
        }
    }

    /// Replace the reviewer list.
    pub fn set_reviewers(&mut self, names: &[String]) {
        self.reviewers = names.iter().cloned().map(Reviewer::named).collect();
    }

    /// Drop the fields the server refuses on update.
    pub fn strip_read_only(&mut self) {
        for field in READ_ONLY_FIELDS {
            self.extra.remove(field);
        }
    }
}

/// Render names the way the tool prints reviewer lists: `[a b]`.
pub fn format_names(names: &[String]) -> String {
    format!("[{}]", names.join(" "))
}

/// Remote pull-request operations for one repository.
pub trait PullRequestService: Send + Sync {
    /// The most recent outgoing pull request from `branch`, if any.
    fn find(&self, target: &Target, branch: &str) -> Result<Option<PullRequest>>;

    fn create(&self, target: &Target, pr: &PullRequest) -> Result<PullRequest>;

    fn update(&self, target: &Target, pr: &PullRequest) -> Result<PullRequest>;

    fn merge(&self, target: &Target, id: u64, version: u64) -> Result<()>;
}

/// [`PullRequestService`] backed by Bitbucket Server.
#[derive(Debug, Clone)]
pub struct BitbucketPullRequests {
    client: ApiClient,
}

impl BitbucketPullRequests {
    pub fn new(token: &str) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(token)?,
        })
    }

    fn collection_url(target: &Target) -> String {
        format!("{}/pull-requests", target.api_base())
    }

    fn item_url(target: &Target, id: u64) -> String {
        format!("{}/{}", Self::collection_url(target), id)
    }
}

impl PullRequestService for BitbucketPullRequests {
    fn find(&self, target: &Target, branch: &str) -> Result<Option<PullRequest>> {
        let mut url = Url::parse(&Self::collection_url(target))?;
        url.query_pairs_mut()
            .append_pair("direction", "outgoing")
            .append_pair("at", &format!("refs/heads/{}", branch));

        let page: Page<PullRequest> = self.client.get(url.as_str())?;
        Ok(page.values.into_iter().next())
    }

    fn create(&self, target: &Target, pr: &PullRequest) -> Result<PullRequest> {
        self.client
            .send(Method::POST, &Self::collection_url(target), Some(pr))
    }

    fn update(&self, target: &Target, pr: &PullRequest) -> Result<PullRequest> {
        self.client
            .send(Method::PUT, &Self::item_url(target, pr.id()?), Some(pr))
    }

    fn merge(&self, target: &Target, id: u64, version: u64) -> Result<()> {
        let url = format!("{}/merge?version={}", Self::item_url(target, id), version);
        let _: Value = self.client.send::<Value, _>(Method::POST, &url, None)?;
        Ok(())
    }
}

/// Options shared by every pull-request task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestOptions {
    /// Source branch of the pull request; the checked-out branch when unset.
    pub branch: Option<String>,
    /// Branch the pull request merges into.
    pub target_branch: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Reviewers given on the command line.
    pub reviewers: Vec<String>,
    /// Configured reviewers per repository name.
    pub default_reviewers: BTreeMap<String, Vec<String>>,
}

impl PullRequestOptions {
    /// Command-line reviewers, or the configured ones for `target`.
    pub fn reviewers_for(&self, target: &Target) -> Vec<String> {
        if !self.reviewers.is_empty() {
            return self.reviewers.clone();
        }
        self.default_reviewers
            .get(&target.name)
            .or_else(|| self.default_reviewers.get(&target.raw))
            .cloned()
            .unwrap_or_default()
    }

    /// The pull request's source branch for `target`.
    pub fn branch_for(&self, target: &Target) -> Result<String> {
        match self.branch.as_deref().filter(|b| !b.is_empty()) {
            Some(branch) => Ok(branch.to_string()),
            None => git::current_branch(target),
        }
    }

    fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }
}

fn lookup(
    service: &dyn PullRequestService,
    options: &PullRequestOptions,
    target: &Target,
) -> Result<PullRequest> {
    let branch = options.branch_for(target)?;
    service.find(target, &branch)?.ok_or_else(|| Error::NotFound {
        what: format!("No pull requests found for {}", branch),
    })
}

/// Print the pull request for the current branch.
pub struct ShowPullRequest {
    pub service: Arc<dyn PullRequestService>,
    pub options: PullRequestOptions,
}

impl Task for ShowPullRequest {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        let pr = lookup(self.service.as_ref(), &self.options, target)?;

        sink.push(format!(
            "(PR #{}) {} {}",
            pr.id()?,
            pr.title()?,
            format_names(&pr.reviewer_names())
        ))?;
        if !pr.description().is_empty() {
            sink.push_text(pr.description())?;
        }
        Ok(())
    }
}

/// Open a pull request from the current branch.
pub struct CreatePullRequest {
    pub service: Arc<dyn PullRequestService>,
    pub options: PullRequestOptions,
    /// Request every reviewer instead of only the first.
    pub all_reviewers: bool,
}

impl CreatePullRequest {
    /// The record sent to the server for `target`.
    pub fn payload(&self, target: &Target, branch: &str) -> PullRequest {
        let mut reviewers = self.options.reviewers_for(target);
        if !self.all_reviewers {
            reviewers.truncate(1);
        }

        let mut pr = PullRequest {
            title: Some(
                PullRequestOptions::non_empty(&self.options.title)
                    .unwrap_or(branch)
                    .to_string(),
            ),
            description: Some(
                PullRequestOptions::non_empty(&self.options.description)
                    .unwrap_or_default()
                    .to_string(),
            ),
            from_ref: Some(BranchRef::branch(target, branch)),
            to_ref: Some(BranchRef::branch(target, &self.options.target_branch)),
            ..PullRequest::default()
        };
        pr.set_reviewers(&reviewers);
        pr
    }
}

impl Task for CreatePullRequest {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        let branch = self.options.branch_for(target)?;
        let payload = self.payload(target, &branch);
        let created = self.service.create(target, &payload)?;

        sink.push(format!(
            "New pull request (#{}) {} {}",
            created.id()?,
            branch,
            format_names(&payload.reviewer_names())
        ))
    }
}

/// Change title, description or reviewers of the existing pull request.
pub struct EditPullRequest {
    pub service: Arc<dyn PullRequestService>,
    pub options: PullRequestOptions,
    /// Replace the reviewer list instead of appending to it.
    pub no_append: bool,
}

impl EditPullRequest {
    /// Apply the requested changes to `pr`.
    pub fn apply(&self, target: &Target, pr: &mut PullRequest) {
        if let Some(title) = PullRequestOptions::non_empty(&self.options.title) {
            pr.title = Some(title.to_string());
        }
        if let Some(description) = PullRequestOptions::non_empty(&self.options.description) {
            pr.description = Some(description.to_string());
        }

        if self.no_append {
            // without explicit reviewers the list is left alone
            if !self.options.reviewers.is_empty() {
                pr.set_reviewers(&self.options.reviewers);
            }
        } else {
            pr.add_reviewers(&self.options.reviewers_for(target));
        }

        pr.strip_read_only();
    }
}

impl Task for EditPullRequest {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        let mut pr = lookup(self.service.as_ref(), &self.options, target)?;
        self.apply(target, &mut pr);
        self.service.update(target, &pr)?;

        sink.push(format!(
            "Updated pull request (#{}) {} {}",
            pr.id()?,
            pr.title()?,
            format_names(&pr.reviewer_names())
        ))
    }
}

/// Merge the pull request for the current branch.
pub struct MergePullRequest {
    pub service: Arc<dyn PullRequestService>,
    pub options: PullRequestOptions,
}

impl Task for MergePullRequest {
    fn run(&self, target: &Target, sink: &Sink) -> Result<()> {
        let pr = lookup(self.service.as_ref(), &self.options, target)?;
        self.service.merge(target, pr.id()?, pr.version()?)?;

        sink.push(format!("Merged pull request (#{}) {}", pr.id()?, pr.title()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::bounded;
    use crate::config::Settings;
    use std::sync::Mutex;

    const SERVER_RECORD: &str = r#"{
        "id": 42,
        "version": 3,
        "title": "feature",
        "description": "adds things",
        "state": "OPEN",
        "author": {"user": {"name": "alice"}, "role": "AUTHOR"},
        "participants": [],
        "reviewers": [{"user": {"name": "bob", "slug": "bob"}, "approved": false}],
        "fromRef": {"id": "refs/heads/feature", "displayId": "feature",
                    "repository": {"slug": "api", "project": {"key": "PLAT"}}},
        "toRef": {"id": "refs/heads/develop",
                  "repository": {"slug": "api", "project": {"key": "PLAT"}}}
    }"#;

    #[derive(Default)]
    struct FakeService {
        existing: Option<PullRequest>,
        created: Mutex<Vec<PullRequest>>,
        updated: Mutex<Vec<PullRequest>>,
        merged: Mutex<Vec<(u64, u64)>>,
    }

    impl PullRequestService for FakeService {
        fn find(&self, _target: &Target, branch: &str) -> Result<Option<PullRequest>> {
            Ok(self.existing.clone().filter(|pr| {
                pr.from_ref
                    .as_ref()
                    .is_some_and(|r| r.id == format!("refs/heads/{}", branch))
            }))
        }

        fn create(&self, _target: &Target, pr: &PullRequest) -> Result<PullRequest> {
            self.created.lock().unwrap().push(pr.clone());
            Ok(PullRequest {
                id: Some(7),
                ..pr.clone()
            })
        }

        fn update(&self, _target: &Target, pr: &PullRequest) -> Result<PullRequest> {
            self.updated.lock().unwrap().push(pr.clone());
            Ok(pr.clone())
        }

        fn merge(&self, _target: &Target, id: u64, version: u64) -> Result<()> {
            self.merged.lock().unwrap().push((id, version));
            Ok(())
        }
    }

    fn target() -> Target {
        let mut settings = Settings::default();
        settings.git.host = "git.example.com".to_string();
        settings.git.project = "PLAT".to_string();
        Target::parse("api", &settings)
    }

    fn options() -> PullRequestOptions {
        PullRequestOptions {
            branch: Some("feature".to_string()),
            target_branch: "develop".to_string(),
            default_reviewers: BTreeMap::from([(
                "api".to_string(),
                vec!["carol".to_string(), "dave".to_string()],
            )]),
            ..PullRequestOptions::default()
        }
    }

    fn existing() -> Arc<FakeService> {
        Arc::new(FakeService {
            existing: Some(serde_json::from_str(SERVER_RECORD).unwrap()),
            ..FakeService::default()
        })
    }

    fn output(task: &dyn Task) -> (Result<()>, Vec<String>) {
        let (sink, drain) = bounded("api", 100);
        let result = task.run(&target(), &sink);
        drop(sink);
        (result, drain.collect())
    }

    #[test]
    fn test_record_keeps_unknown_fields() {
        let pr: PullRequest = serde_json::from_str(SERVER_RECORD).unwrap();
        assert_eq!(pr.id().unwrap(), 42);
        assert_eq!(pr.reviewer_names(), vec!["bob"]);
        assert_eq!(pr.extra["state"], "OPEN");

        let from = pr.from_ref.as_ref().unwrap();
        assert_eq!(from.extra["displayId"], "feature");

        let json = serde_json::to_value(&pr).unwrap();
        assert_eq!(json["reviewers"][0]["user"]["slug"], "bob");
        assert_eq!(json["fromRef"]["displayId"], "feature");
    }

    #[test]
    fn test_missing_field_is_a_record_error() {
        let pr: PullRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        let err = pr.id().unwrap_err();
        assert_eq!(err.to_string(), "pull request record: field 'id' is missing");
        assert!(pr.version().is_err());
        assert_eq!(pr.description(), "");
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let result = serde_json::from_str::<PullRequest>(r#"{"id": "forty-two"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_strip_read_only() {
        let mut pr: PullRequest = serde_json::from_str(SERVER_RECORD).unwrap();
        pr.strip_read_only();
        let json = serde_json::to_value(&pr).unwrap();
        assert!(json.get("author").is_none());
        assert!(json.get("participants").is_none());
        assert_eq!(json["state"], "OPEN");
    }

    #[test]
    fn test_show() {
        let task = ShowPullRequest {
            service: existing(),
            options: options(),
        };
        let (result, lines) = output(&task);
        result.unwrap();
        assert_eq!(lines, vec!["(PR #42) feature [bob]", "adds things"]);
    }

    #[test]
    fn test_show_without_pull_request() {
        let task = ShowPullRequest {
            service: Arc::new(FakeService::default()),
            options: options(),
        };
        let (result, lines) = output(&task);
        assert_eq!(
            result.unwrap_err().to_string(),
            "No pull requests found for feature"
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn test_create_uses_first_configured_reviewer() {
        let service = Arc::new(FakeService::default());
        let task = CreatePullRequest {
            service: service.clone(),
            options: options(),
            all_reviewers: false,
        };

        let (result, lines) = output(&task);
        result.unwrap();
        assert_eq!(lines, vec!["New pull request (#7) feature [carol]"]);

        let created = service.created.lock().unwrap();
        let payload = serde_json::to_value(&created[0]).unwrap();
        assert_eq!(payload["title"], "feature");
        assert_eq!(payload["fromRef"]["id"], "refs/heads/feature");
        assert_eq!(payload["toRef"]["id"], "refs/heads/develop");
        assert_eq!(payload["toRef"]["repository"]["slug"], "api");
        assert_eq!(payload["toRef"]["repository"]["project"]["key"], "PLAT");
        assert!(payload.get("id").is_none());
    }

    #[test]
    fn test_create_with_all_reviewers_and_title() {
        let mut options = options();
        options.title = Some("Better title".to_string());
        let task = CreatePullRequest {
            service: Arc::new(FakeService::default()),
            options,
            all_reviewers: true,
        };

        let payload = task.payload(&target(), "feature");
        assert_eq!(payload.title().unwrap(), "Better title");
        assert_eq!(payload.reviewer_names(), vec!["carol", "dave"]);
    }

    #[test]
    fn test_command_line_reviewers_win() {
        let mut options = options();
        options.reviewers = vec!["erin".to_string()];
        assert_eq!(options.reviewers_for(&target()), vec!["erin"]);
    }

    #[test]
    fn test_edit_appends_reviewers() {
        let service = existing();
        let mut options = options();
        options.description = Some("new text".to_string());
        let task = EditPullRequest {
            service: service.clone(),
            options,
            no_append: false,
        };

        let (result, lines) = output(&task);
        result.unwrap();
        assert_eq!(
            lines,
            vec!["Updated pull request (#42) feature [bob carol dave]"]
        );

        let updated = service.updated.lock().unwrap();
        assert_eq!(updated[0].description(), "new text");
        assert!(!updated[0].extra.contains_key("author"));
    }

    #[test]
    fn test_edit_no_append_replaces_only_with_explicit_reviewers() {
        let task = EditPullRequest {
            service: existing(),
            options: options(),
            no_append: true,
        };
        let mut pr: PullRequest = serde_json::from_str(SERVER_RECORD).unwrap();
        task.apply(&target(), &mut pr);
        assert_eq!(pr.reviewer_names(), vec!["bob"]);

        let mut options = options();
        options.reviewers = vec!["erin".to_string()];
        let task = EditPullRequest {
            service: existing(),
            options,
            no_append: true,
        };
        task.apply(&target(), &mut pr);
        assert_eq!(pr.reviewer_names(), vec!["erin"]);
    }

    #[test]
    fn test_merge_sends_version() {
        let service = existing();
        let task = MergePullRequest {
            service: service.clone(),
            options: options(),
        };

        let (result, lines) = output(&task);
        result.unwrap();
        assert_eq!(lines, vec!["Merged pull request (#42) feature"]);
        assert_eq!(*service.merged.lock().unwrap(), vec![(42, 3)]);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(format_names(&[]), "[]");
        assert_eq!(
            format_names(&["a".to_string(), "b".to_string()]),
            "[a b]"
        );
    }
}
