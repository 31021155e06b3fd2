//! Agenda aggregation across source repositories.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::MeetbotResult;
use crate::tracker::{AgendaItem, IssueTracker, RepoRef};

/// Expand the explicit repository list plus org-wide discovery into one
/// ordered source list. Explicit repositories come first, then each org's
/// repositories in the order the tracker reports them.
pub async fn resolve_source_repos(
    tracker: &dyn IssueTracker,
    repos: &[RepoRef],
    orgs: &[String],
) -> MeetbotResult<Vec<RepoRef>> {
    let mut sources = repos.to_vec();
    for org in orgs {
        let discovered = tracker.list_org_repos(org).await?;
        info!(org, repos = discovered.len(), "discovered organization repositories");
        sources.extend(discovered);
    }
    Ok(sources)
}

/// Fetch every agenda item carrying `label` across `repos`.
///
/// Repositories are de-duplicated first (first occurrence wins), then items
/// are de-duplicated by URL across issues, pull requests and discussions:
/// tracker pagination sometimes reports issues from the pull-request
/// listing, and the same URL must not appear on the agenda twice. Item
/// order is first-repository-first, then the tracker's own pagination
/// order.
pub async fn fetch_agenda_items(
    tracker: &dyn IssueTracker,
    repos: &[RepoRef],
    label: &str,
) -> MeetbotResult<Vec<AgendaItem>> {
    let mut seen_repos = HashSet::new();
    let mut seen_urls = HashSet::new();
    let mut items = Vec::new();

    for repo in repos {
        if !seen_repos.insert(repo.clone()) {
            continue;
        }

        let page = tracker.list_agenda_items(repo, label).await?;
        info!(
            %repo,
            issues = page.issues.len(),
            pull_requests = page.pull_requests.len(),
            "fetched agenda items"
        );

        for item in page.issues.into_iter().chain(page.pull_requests) {
            if seen_urls.insert(item.url.clone()) {
                debug!(url = %item.url, "adding agenda item");
                items.push(item);
            }
        }

        let discussions = tracker.list_discussions(repo).await?;
        for item in discussions {
            if !item.labels.iter().any(|l| l == label) {
                continue;
            }
            if seen_urls.insert(item.url.clone()) {
                debug!(url = %item.url, "adding agenda discussion");
                items.push(item);
            }
        }
    }

    info!(total = items.len(), "agenda assembled");
    Ok(items)
}
