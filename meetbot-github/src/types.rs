//! Wire types for the GitHub REST v3 API.

use meetbot_core::tracker::{AgendaItem, AgendaKind, Issue, RepoRef};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct LabelRaw {
    pub name: String,
}

/// An entry from the issues listing. The issues endpoint also returns pull
/// requests; those carry a `pull_request` key.
#[derive(Debug, Deserialize)]
pub(crate) struct IssueRaw {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: String,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<LabelRaw>,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueRaw {
    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }

    pub fn into_issue(self) -> Issue {
        let labels = self.label_names();
        Issue {
            number: self.number,
            title: self.title,
            state: self.state,
            html_url: self.html_url,
            labels,
        }
    }

    pub fn into_agenda_item(self) -> AgendaItem {
        let kind = if self.pull_request.is_some() {
            AgendaKind::PullRequest
        } else {
            AgendaKind::Issue
        };
        let labels = self.label_names();
        AgendaItem {
            title: self.title,
            url: self.url,
            html_url: self.html_url,
            number: self.number,
            labels,
            kind,
        }
    }
}

/// An entry from the pulls listing.
#[derive(Debug, Deserialize)]
pub(crate) struct PullRaw {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<LabelRaw>,
}

impl PullRaw {
    pub fn carries_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.name == label)
    }

    pub fn into_agenda_item(self) -> AgendaItem {
        let labels = self.labels.iter().map(|l| l.name.clone()).collect();
        AgendaItem {
            title: self.title,
            url: self.url,
            html_url: self.html_url,
            number: self.number,
            labels,
            kind: AgendaKind::PullRequest,
        }
    }
}

/// A file from the contents API.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentRaw {
    pub content: String,
    pub encoding: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoRaw {
    pub name: String,
    pub owner: OwnerRaw,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerRaw {
    pub login: String,
}

impl RepoRaw {
    pub fn into_repo_ref(self) -> RepoRef {
        RepoRef::new(self.owner.login, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_endpoint_entries_with_a_pull_request_key_are_pull_requests() {
        let raw: IssueRaw = serde_json::from_value(serde_json::json!({
            "number": 7,
            "title": "Add retries",
            "state": "open",
            "url": "https://api.github.com/repos/o/r/issues/7",
            "html_url": "https://github.com/o/r/pull/7",
            "labels": [{"name": "meeting-agenda"}],
            "pull_request": {"url": "https://api.github.com/repos/o/r/pulls/7"}
        }))
        .unwrap();

        let item = raw.into_agenda_item();
        assert_eq!(item.kind, AgendaKind::PullRequest);
        assert_eq!(item.labels, vec!["meeting-agenda".to_string()]);
    }

    #[test]
    fn pull_label_filter_matches_exactly() {
        let raw: PullRaw = serde_json::from_value(serde_json::json!({
            "number": 3,
            "title": "A pull request",
            "url": "https://api.github.com/repos/o/r/issues/3",
            "html_url": "https://github.com/o/r/pull/3",
            "labels": [{"name": "meeting-agenda-archive"}]
        }))
        .unwrap();

        assert!(!raw.carries_label("meeting-agenda"));
        assert!(raw.carries_label("meeting-agenda-archive"));
    }
}
