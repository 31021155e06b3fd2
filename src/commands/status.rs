//! Dry-run of the meeting-due decision. Reads only; never writes.

use anyhow::Result;
use chrono::Utc;

use meetbot_core::meeting::{self, MeetingDue};

use crate::config::Config;

pub async fn status(cfg: &Config) -> Result<()> {
    let tracker = super::tracker()?;
    let now = Utc::now();
    let zone = cfg.display_zone()?;

    // The agenda only affects the rendered body, not the decision.
    let opts = cfg.meeting_options(Vec::new())?;

    match meeting::should_create_next_meeting(&tracker, &opts, now).await? {
        MeetingDue::NotDue { next } => {
            println!(
                "Not due: next meeting is {} ({}), beyond the {} window",
                next.format("%Y-%m-%dT%H:%M:%SZ"),
                next.with_timezone(&zone).format("%a, %b %d, %Y, %I:%M %p %Z"),
                cfg.create_within
            );
        }
        MeetingDue::Exists { next, number } => {
            println!(
                "Nothing to do: issue #{} already tracks the meeting at {}",
                number,
                next.format("%Y-%m-%dT%H:%M:%SZ")
            );
        }
        MeetingDue::Due(draft) => {
            println!(
                "Would create \"{}\" for {}",
                draft.title,
                draft.date.format("%Y-%m-%dT%H:%M:%SZ")
            );
        }
    }

    Ok(())
}
