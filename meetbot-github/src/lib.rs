//! GitHub issue-tracker backend for meetbot.
//!
//! Implements the [`IssueTracker`] capability over the REST v3 API (issues,
//! pulls, contents, org repositories) and the GraphQL v4 API (discussions).

mod graphql;
mod types;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use meetbot_core::error::{MeetbotError, MeetbotResult};
use meetbot_core::tracker::{AgendaItem, AgendaPage, Issue, IssueTracker, RepoRef};

use graphql::{GraphqlResponse, DISCUSSIONS_QUERY};
use types::{ContentRaw, IssueRaw, PullRaw, RepoRaw};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

/// A GitHub client carrying the token and API base URL.
pub struct GithubTracker {
    http: reqwest::Client,
    base_url: String,
}

impl GithubTracker {
    /// Build a client for api.github.com authenticated with `token`.
    pub fn new(token: &str) -> MeetbotResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    /// Build a client against a different API base (GitHub Enterprise, or
    /// a local stub in tests).
    pub fn with_base_url(base_url: &str, token: &str) -> MeetbotResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| MeetbotError::TrackerTransport(format!("invalid token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("meetbot/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| MeetbotError::TrackerTransport(e.to_string()))?;

        Ok(GithubTracker {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send a request and decode the JSON response, mapping 404 to the
    /// distinct not-found error.
    async fn execute<T: DeserializeOwned>(
        &self,
        what: &str,
        request: reqwest::RequestBuilder,
    ) -> MeetbotResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| MeetbotError::TrackerTransport(format!("{what}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MeetbotError::TrackerNotFound(what.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MeetbotError::Tracker {
                status: status.as_u16(),
                message: format!("{what}: {message}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| MeetbotError::TrackerTransport(format!("{what}: invalid response: {e}")))
    }

    /// Fetch every page of a listing endpoint.
    async fn paginate<T: DeserializeOwned>(
        &self,
        what: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> MeetbotResult<Vec<T>> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self
                .http
                .get(url)
                .query(query)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
            let batch: Vec<T> = self.execute(what, request).await?;
            let full_page = batch.len() == PER_PAGE;
            all.extend(batch);
            if !full_page {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    async fn graphql(&self, what: &str, variables: serde_json::Value) -> MeetbotResult<GraphqlResponse> {
        let request = self.http.post(format!("{}/graphql", self.base_url)).json(
            &serde_json::json!({
                "query": DISCUSSIONS_QUERY,
                "variables": variables,
            }),
        );
        let response: GraphqlResponse = self.execute(what, request).await?;

        if let Some(error) = response.errors.first() {
            return Err(MeetbotError::Tracker {
                status: 200,
                message: format!("{what}: {}", error.message),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl IssueTracker for GithubTracker {
    async fn create_issue(
        &self,
        repo: &RepoRef,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> MeetbotResult<Issue> {
        debug!(%repo, title, "creating issue");
        let url = format!("{}/repos/{}/{}/issues", self.base_url, repo.owner, repo.repo);
        let request = self.http.post(&url).json(&serde_json::json!({
            "title": title,
            "body": body,
            "labels": labels,
        }));
        let raw: IssueRaw = self.execute(&format!("create issue in {repo}"), request).await?;
        Ok(raw.into_issue())
    }

    async fn update_issue(
        &self,
        repo: &RepoRef,
        number: u64,
        body: Option<&str>,
    ) -> MeetbotResult<Issue> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            self.base_url, repo.owner, repo.repo, number
        );
        let mut payload = serde_json::Map::new();
        if let Some(body) = body {
            payload.insert("body".to_string(), serde_json::Value::from(body));
        }
        let request = self.http.patch(&url).json(&serde_json::Value::Object(payload));
        let raw: IssueRaw = self
            .execute(&format!("update issue {repo}#{number}"), request)
            .await?;
        Ok(raw.into_issue())
    }

    async fn close_issue(&self, repo: &RepoRef, number: u64) -> MeetbotResult<Issue> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            self.base_url, repo.owner, repo.repo, number
        );
        let request = self
            .http
            .patch(&url)
            .json(&serde_json::json!({ "state": "closed" }));
        let raw: IssueRaw = self
            .execute(&format!("close issue {repo}#{number}"), request)
            .await?;
        Ok(raw.into_issue())
    }

    async fn list_open_issues(
        &self,
        repo: &RepoRef,
        labels: &[String],
    ) -> MeetbotResult<Vec<Issue>> {
        let url = format!("{}/repos/{}/{}/issues", self.base_url, repo.owner, repo.repo);
        let labels = labels.join(",");
        let raw: Vec<IssueRaw> = self
            .paginate(
                &format!("list open issues in {repo}"),
                &url,
                &[("state", "open"), ("labels", labels.as_str())],
            )
            .await?;
        Ok(raw.into_iter().map(IssueRaw::into_issue).collect())
    }

    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: &str,
    ) -> MeetbotResult<Vec<u8>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, repo.owner, repo.repo, path
        );
        let what = format!("fetch {repo}:{path}");
        let request = self.http.get(&url).query(&[("ref", git_ref)]);
        let raw: ContentRaw = self.execute(&what, request).await?;
        decode_content(&raw, &what)
    }

    async fn list_agenda_items(&self, repo: &RepoRef, label: &str) -> MeetbotResult<AgendaPage> {
        let issues_url = format!("{}/repos/{}/{}/issues", self.base_url, repo.owner, repo.repo);
        let raw_issues: Vec<IssueRaw> = self
            .paginate(
                &format!("list agenda issues in {repo}"),
                &issues_url,
                &[("state", "open"), ("labels", label)],
            )
            .await?;

        // The pulls listing cannot filter by label server side.
        let pulls_url = format!("{}/repos/{}/{}/pulls", self.base_url, repo.owner, repo.repo);
        let raw_pulls: Vec<PullRaw> = self
            .paginate(
                &format!("list agenda pull requests in {repo}"),
                &pulls_url,
                &[("state", "open")],
            )
            .await?;

        Ok(AgendaPage {
            issues: raw_issues.into_iter().map(IssueRaw::into_agenda_item).collect(),
            pull_requests: raw_pulls
                .into_iter()
                .filter(|pr| pr.carries_label(label))
                .map(PullRaw::into_agenda_item)
                .collect(),
        })
    }

    async fn list_discussions(&self, repo: &RepoRef) -> MeetbotResult<Vec<AgendaItem>> {
        let what = format!("list discussions in {repo}");
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let response = self
                .graphql(
                    &what,
                    serde_json::json!({
                        "owner": repo.owner,
                        "repo": repo.repo,
                        "cursor": cursor,
                    }),
                )
                .await?;

            let Some(repository) = response.data.and_then(|d| d.repository) else {
                // Repository without discussions enabled.
                return Ok(items);
            };

            let connection = repository.discussions;
            items.extend(
                connection
                    .nodes
                    .into_iter()
                    .map(graphql::DiscussionNode::into_agenda_item),
            );

            if !connection.page_info.has_next_page {
                break;
            }
            cursor = connection.page_info.end_cursor;
        }

        Ok(items)
    }

    async fn list_org_repos(&self, org: &str) -> MeetbotResult<Vec<RepoRef>> {
        let url = format!("{}/orgs/{}/repos", self.base_url, org);
        let raw: Vec<RepoRaw> = self
            .paginate(&format!("list repositories of {org}"), &url, &[])
            .await?;
        Ok(raw.into_iter().map(RepoRaw::into_repo_ref).collect())
    }
}

/// Decode a contents-API payload. GitHub base64-encodes file content with
/// embedded newlines.
fn decode_content(raw: &ContentRaw, what: &str) -> MeetbotResult<Vec<u8>> {
    match raw.encoding.as_str() {
        "base64" => {
            let cleaned: String = raw.content.split_whitespace().collect();
            BASE64.decode(cleaned.as_bytes()).map_err(|e| {
                MeetbotError::TrackerTransport(format!("{what}: invalid base64 content: {e}"))
            })
        }
        _ => Ok(raw.content.clone().into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_content_with_newlines() {
        let raw = ContentRaw {
            // "## Meeting\n" split across base64 lines the way the API
            // returns it
            content: "IyMgTWVl\ndGluZwo=".to_string(),
            encoding: "base64".to_string(),
        };
        let bytes = decode_content(&raw, "fetch o/r:x").unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "## Meeting\n");
    }

    #[test]
    fn passes_through_plain_content() {
        let raw = ContentRaw {
            content: "plain text".to_string(),
            encoding: "none".to_string(),
        };
        assert_eq!(decode_content(&raw, "fetch o/r:x").unwrap(), b"plain text");
    }

    #[test]
    fn invalid_base64_is_a_transport_error() {
        let raw = ContentRaw {
            content: "!!not base64!!".to_string(),
            encoding: "base64".to_string(),
        };
        assert!(matches!(
            decode_content(&raw, "fetch o/r:x").unwrap_err(),
            MeetbotError::TrackerTransport(_)
        ));
    }
}
