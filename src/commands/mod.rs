mod close;
mod next;
mod run;
mod status;

pub use close::close;
pub use next::next;
pub use run::run;
pub use status::status;

use anyhow::Result;
use meetbot_github::GithubTracker;

use crate::config;

/// Build the authenticated tracker client every command shares.
fn tracker() -> Result<GithubTracker> {
    let token = config::github_token()?;
    Ok(GithubTracker::new(&token)?)
}
