//! Discussion listing over the GraphQL v4 API.
//!
//! The REST API has no discussion listing, so this is the one GraphQL
//! query in the backend. Pagination is cursor-based; labels come from the
//! node's label connection and are filtered by the caller.

use meetbot_core::tracker::{AgendaItem, AgendaKind};
use serde::Deserialize;

pub(crate) const DISCUSSIONS_QUERY: &str = "\
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    discussions(first: 100, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        number
        title
        url
        labels(first: 20) { nodes { name } }
      }
    }
  }
}";

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse {
    pub data: Option<GraphqlData>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryNode {
    pub discussions: DiscussionConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DiscussionConnection {
    pub page_info: PageInfo,
    #[serde(default)]
    pub nodes: Vec<DiscussionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiscussionNode {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub labels: Option<LabelConnection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelConnection {
    #[serde(default)]
    pub nodes: Vec<LabelNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelNode {
    pub name: String,
}

impl DiscussionNode {
    pub fn into_agenda_item(self) -> AgendaItem {
        let labels = self
            .labels
            .map(|c| c.nodes.into_iter().map(|l| l.name).collect())
            .unwrap_or_default();
        AgendaItem {
            title: self.title,
            // Discussions have no separate API identity URL.
            url: self.url.clone(),
            html_url: self.url,
            number: self.number,
            labels,
            kind: AgendaKind::Discussion,
        }
    }
}
