//! The full orchestration: agenda → decision → issue → notes → final body.

use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use meetbot_core::template::{
    load_template, Template, ISSUE_TEMPLATE_DIR, NOTES_TEMPLATE_DIR,
};
use meetbot_core::{agenda, meeting, notes};
use meetbot_hackmd::HackmdNotes;

use crate::config::Config;

pub async fn run(cfg: &Config) -> Result<()> {
    let tracker = super::tracker()?;
    let home = cfg.home_repo()?;
    let now = Utc::now();

    // Agenda first: the rendered body needs it whether or not a new issue
    // gets created this run.
    let sources = agenda::resolve_source_repos(&tracker, &cfg.source_repos()?, &cfg.orgs).await?;
    let items = agenda::fetch_agenda_items(&tracker, &sources, &cfg.agenda_label).await?;

    let opts = cfg.meeting_options(items)?;
    let template = load_template(
        &tracker,
        &home,
        ISSUE_TEMPLATE_DIR,
        cfg.issue_template.as_deref(),
        Template::default_issue(),
    )
    .await;

    let Some(issue) = meeting::create_next_meeting(&tracker, &opts, &template, now).await? else {
        println!("No issue to create");
        return Ok(());
    };

    // Final body pass: the issue number (and optionally the notes document)
    // exist now, so render the complete body and write it back.
    let draft = meeting::next_issue_draft(&opts, now)?;

    let mut notes_url = String::new();
    if cfg.create_notes {
        let notes_template = load_template(
            &tracker,
            &home,
            NOTES_TEMPLATE_DIR,
            cfg.notes_template.as_deref(),
            Template::default_notes(),
        )
        .await;
        let content = notes_template.render(&draft.context(Some(issue.number), ""));

        match HackmdNotes::new() {
            Ok(service) => {
                if let Some(url) = notes::create_notes_document(&service, &content).await {
                    notes_url = url;
                }
            }
            Err(err) => warn!(error = %err, "notes service unavailable"),
        }
    }

    meeting::set_meeting_issue_body(&tracker, &draft, &template, issue.number, &notes_url).await?;

    println!("Issue created: (#{}) {}", issue.number, issue.title);
    Ok(())
}
