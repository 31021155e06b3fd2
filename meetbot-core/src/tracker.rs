//! The issue-tracker capability consumed by the scheduling core.
//!
//! Backends (e.g. `meetbot-github`) implement [`IssueTracker`]; the core
//! only ever talks to the trait, which keeps the meeting-due decision and
//! the agenda aggregation testable against in-memory fakes.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MeetbotResult;

/// A repository coordinate (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoRef {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse an `owner/name` string.
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, repo) = s.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(RepoRef::new(owner, repo))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// An issue as the tracker reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// What kind of tracker object an agenda item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaKind {
    Issue,
    PullRequest,
    Discussion,
}

/// A labelled item surfaced for a meeting agenda.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaItem {
    pub title: String,
    /// API identity URL; the de-duplication key.
    pub url: String,
    /// Browser-facing URL used in rendered bodies.
    pub html_url: String,
    pub number: u64,
    #[serde(default)]
    pub labels: Vec<String>,
    pub kind: AgendaKind,
}

/// Issues and pull requests returned by one agenda listing.
///
/// The two sets may overlap: tracker pagination sometimes reports issues
/// from the pull-request listing, so callers de-duplicate by URL.
#[derive(Debug, Default)]
pub struct AgendaPage {
    pub issues: Vec<AgendaItem>,
    pub pull_requests: Vec<AgendaItem>,
}

/// Issue-tracker operations the meeting automation needs.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create an issue and return it as the tracker now sees it.
    async fn create_issue(
        &self,
        repo: &RepoRef,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> MeetbotResult<Issue>;

    /// Update an issue; `body: None` leaves the body untouched.
    async fn update_issue(
        &self,
        repo: &RepoRef,
        number: u64,
        body: Option<&str>,
    ) -> MeetbotResult<Issue>;

    async fn close_issue(&self, repo: &RepoRef, number: u64) -> MeetbotResult<Issue>;

    /// Open issues carrying all of `labels`.
    async fn list_open_issues(
        &self,
        repo: &RepoRef,
        labels: &[String],
    ) -> MeetbotResult<Vec<Issue>>;

    /// Raw file content at `path` on `git_ref`. Fails with the distinct
    /// not-found error when the path does not exist, so callers can tell a
    /// missing template apart from an API outage.
    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: &str,
    ) -> MeetbotResult<Vec<u8>>;

    /// Open issues and pull requests carrying `label`. Implementations
    /// filter pull requests to those that actually carry the label.
    async fn list_agenda_items(&self, repo: &RepoRef, label: &str) -> MeetbotResult<AgendaPage>;

    /// All discussions in the repository; label filtering happens client
    /// side because the discussion listing cannot filter server side.
    async fn list_discussions(&self, repo: &RepoRef) -> MeetbotResult<Vec<AgendaItem>>;

    /// Repositories of an organization, for org-wide agenda discovery.
    async fn list_org_repos(&self, org: &str) -> MeetbotResult<Vec<RepoRef>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_slash_repo() {
        let repo = RepoRef::parse("nodejs/node").unwrap();
        assert_eq!(repo.owner, "nodejs");
        assert_eq!(repo.repo, "node");
        assert_eq!(repo.to_string(), "nodejs/node");
    }

    #[test]
    fn rejects_malformed_repo_refs() {
        assert!(RepoRef::parse("nodejs").is_none());
        assert!(RepoRef::parse("/node").is_none());
        assert!(RepoRef::parse("nodejs/").is_none());
        assert!(RepoRef::parse("a/b/c").is_none());
    }
}
