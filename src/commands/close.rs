//! Close a meeting issue by number.

use anyhow::Result;

use meetbot_core::tracker::IssueTracker;

use crate::config::Config;

pub async fn close(cfg: &Config, number: u64) -> Result<()> {
    let tracker = super::tracker()?;
    let home = cfg.home_repo()?;

    let issue = tracker.close_issue(&home, number).await?;
    println!("Closed issue #{} ({})", issue.number, issue.title);

    Ok(())
}
