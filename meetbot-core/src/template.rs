//! Issue and notes body rendering.
//!
//! A [`Template`] is either literal markdown with `<!-- marker -->`
//! placeholders (user-supplied files fetched from the tracker) or a
//! function of the render context (the built-in bodies).

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{MeetbotError, MeetbotResult};
use crate::tracker::{AgendaItem, IssueTracker, RepoRef};

/// Where user issue templates live in the home repository.
pub const ISSUE_TEMPLATE_DIR: &str = ".github/ISSUE_TEMPLATE";

/// Where user notes templates live in the home repository.
pub const NOTES_TEMPLATE_DIR: &str = ".github/meet";

/// Zones shown in the date/time table of the default issue body.
const DISPLAY_ZONES: [Tz; 11] = [
    chrono_tz::America::Los_Angeles,
    chrono_tz::America::Denver,
    chrono_tz::America::Chicago,
    chrono_tz::America::New_York,
    chrono_tz::Europe::London,
    chrono_tz::Europe::Amsterdam,
    chrono_tz::Europe::Moscow,
    chrono_tz::Asia::Kolkata,
    chrono_tz::Asia::Shanghai,
    chrono_tz::Asia::Tokyo,
    chrono_tz::Australia::Sydney,
];

/// Everything a template can interpolate.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub title: String,
    pub date: DateTime<Utc>,
    pub repo: RepoRef,
    pub agenda_label: String,
    pub agenda: Vec<AgendaItem>,
    pub meeting_link: String,
    /// URL of the collaborative notes document, when one was created.
    pub meeting_notes: String,
    /// Number of the meeting issue, once it exists.
    pub issue_number: Option<u64>,
}

/// A body template: literal text with markers, or a function of the
/// context. The two cases are matched explicitly; there is no duck typing
/// between strings and functions.
pub enum Template {
    Static(String),
    Dynamic(fn(&TemplateContext) -> String),
}

impl Template {
    pub fn render(&self, ctx: &TemplateContext) -> String {
        match self {
            Template::Static(text) => substitute_markers(text, ctx),
            Template::Dynamic(body) => body(ctx),
        }
    }

    /// The built-in meeting issue body.
    pub fn default_issue() -> Self {
        Template::Dynamic(default_issue_body)
    }

    /// The built-in collaborative notes document.
    pub fn default_notes() -> Self {
        Template::Dynamic(default_notes_body)
    }

    /// The built-in issue title: "Meeting YYYY-MM-DD".
    pub fn default_title() -> Self {
        Template::Dynamic(default_issue_title)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Static(text) => f.debug_tuple("Static").field(&text.len()).finish(),
            Template::Dynamic(_) => f.debug_tuple("Dynamic").finish(),
        }
    }
}

/// Load a user-supplied template from the tracker, falling back to
/// `default` when the file is missing or unusable (logged, non-fatal).
pub async fn load_template(
    tracker: &dyn IssueTracker,
    repo: &RepoRef,
    dir: &str,
    name: Option<&str>,
    default: Template,
) -> Template {
    let Some(name) = name else {
        return default;
    };
    let path = format!("{dir}/{name}");

    match fetch_template(tracker, repo, &path).await {
        Ok(template) => template,
        Err(err) if err.is_not_found() => {
            warn!(%path, "template not found, using the built-in default");
            default
        }
        Err(err) => {
            warn!(%path, error = %err, "failed to load template, using the built-in default");
            default
        }
    }
}

async fn fetch_template(
    tracker: &dyn IssueTracker,
    repo: &RepoRef,
    path: &str,
) -> MeetbotResult<Template> {
    let bytes = tracker.get_file_content(repo, path, "main").await?;
    let text = String::from_utf8(bytes)
        .map_err(|e| MeetbotError::Template(format!("{path} is not valid UTF-8: {e}")))?;
    Ok(Template::Static(text))
}

/// Replace every occurrence of each known marker. Unset values substitute
/// empty strings; unknown markers are left alone.
fn substitute_markers(text: &str, ctx: &TemplateContext) -> String {
    let substitutions = [
        ("<!-- title -->", ctx.title.clone()),
        ("<!-- date -->", ctx.date.format("%Y-%m-%d").to_string()),
        ("<!-- agenda label -->", ctx.agenda_label.clone()),
        ("<!-- agenda -->", agenda_bullets(&ctx.agenda)),
        ("<!-- meeting link -->", ctx.meeting_link.clone()),
        ("<!-- meeting notes -->", ctx.meeting_notes.clone()),
    ];

    let mut out = text.to_string();
    for (marker, value) in substitutions {
        out = out.replace(marker, &value);
    }
    out
}

fn agenda_bullets(agenda: &[AgendaItem]) -> String {
    agenda
        .iter()
        .map(|item| format!("* {}", item.html_url))
        .collect::<Vec<_>>()
        .join("\n")
}

fn default_issue_title(ctx: &TemplateContext) -> String {
    format!("Meeting {}", ctx.date.format("%Y-%m-%d"))
}

fn default_issue_body(ctx: &TemplateContext) -> String {
    let rows = DISPLAY_ZONES
        .iter()
        .map(|tz| {
            let local = ctx.date.with_timezone(tz);
            format!(
                "| {} | {} |",
                tz.name(),
                local.format("%a, %b %d, %Y, %I:%M %p")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\n## Date/Time\n\n\
        | Timezone | Date/Time |\n\
        |----------|-----------|\n\
        {rows}\n\n\
        Or in your local time:\n\n\
        * https://www.timeanddate.com/worldclock/?iso={iso}\n\n\
        ## Agenda\n\n\
        Extracted from **{label}** labelled issues and pull requests from **{repo}** prior to the meeting.\n\n\
        {agenda}\n\n\
        ## Links\n\n\
        * Minutes: {notes}\n\n\
        ## Joining the meeting\n\n\
        * link for participants: {link}\n\n\
        ---\n\n\
        Please use the following emoji reactions in this post to indicate your\n\
        availability.\n\n\
        * 👍 - Attending\n\
        * 👎 - Not attending\n\
        * 😕 - Not sure yet",
        iso = ctx.date.format("%Y-%m-%dT%H:%M:%S"),
        label = ctx.agenda_label,
        repo = ctx.repo,
        agenda = agenda_bullets(&ctx.agenda),
        notes = ctx.meeting_notes,
        link = ctx.meeting_link,
    )
}

fn default_notes_body(ctx: &TemplateContext) -> String {
    let issue_link = match ctx.issue_number {
        Some(number) => format!("https://github.com/{}/issues/{}", ctx.repo, number),
        None => String::new(),
    };
    let agenda = ctx
        .agenda
        .iter()
        .map(|item| format!("* {} [#{}]({})", item.title, item.number, item.html_url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\n# {title}\n\n\
        ## Links\n\n\
        * **Recording**:\n\
        * **GitHub Issue**: {issue_link}\n\n\
        ## Present\n\n\
        *\n\n\
        ## Agenda\n\n\
        ## Announcements\n\n\
        *Extracted from **{label}** labelled issues and pull requests from **{repo}** prior to the meeting.\n\n\
        {agenda}\n\n\
        ## Q&A, Other\n",
        title = ctx.title,
        label = ctx.agenda_label,
        repo = ctx.repo,
    )
}
