//! Print the next scheduled occurrence without touching the tracker.

use anyhow::Result;
use chrono::Utc;

use meetbot_core::occurrence::next_occurrence;
use meetbot_core::schedule::{next_scheduled_meeting, Schedule};

use crate::config::Config;

pub fn next(cfg: &Config, all: bool) -> Result<()> {
    let now = Utc::now();
    let zone = cfg.display_zone()?;

    if all {
        for entry in &cfg.schedules {
            let schedule = Schedule::parse(entry)?;
            let occurrence = next_occurrence(&schedule, now)?;
            println!(
                "{}\n  next: {} ({})",
                entry,
                occurrence.format("%Y-%m-%dT%H:%M:%SZ"),
                occurrence
                    .with_timezone(&zone)
                    .format("%a, %b %d, %Y, %I:%M %p %Z")
            );
        }
    }

    let earliest = next_scheduled_meeting(&cfg.schedules, now)?;
    println!(
        "Next meeting: {} ({})",
        earliest.format("%Y-%m-%dT%H:%M:%SZ"),
        earliest
            .with_timezone(&zone)
            .format("%a, %b %d, %Y, %I:%M %p %Z")
    );

    Ok(())
}
