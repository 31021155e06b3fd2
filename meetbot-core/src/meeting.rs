//! Meeting-due decision and issue orchestration.
//!
//! The decision itself ([`should_create_next_meeting`]) only reads from the
//! tracker; creating the issue and setting its final body are separate,
//! explicit steps so dry-run callers can inspect the outcome without
//! writing anything.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::error::MeetbotResult;
use crate::occurrence::add_period;
use crate::schedule::{next_scheduled_meeting, Period};
use crate::template::{Template, TemplateContext};
use crate::tracker::{AgendaItem, Issue, IssueTracker, RepoRef};

/// Inputs to the meeting-due decision.
pub struct MeetingOptions {
    /// Repository the meeting issue is created in.
    pub repo: RepoRef,
    pub schedules: Vec<String>,
    /// How far ahead of the occurrence the issue may be created.
    pub create_within: Period,
    /// Title template, rendered against the resolved date.
    pub title: Template,
    /// Labels applied to (and used to find) meeting issues.
    pub meeting_labels: Vec<String>,
    pub agenda_label: String,
    pub agenda: Vec<AgendaItem>,
    pub meeting_link: String,
}

/// A fully populated issue ready for creation.
#[derive(Debug, Clone)]
pub struct IssueDraft {
    pub repo: RepoRef,
    pub title: String,
    pub date: DateTime<Utc>,
    pub labels: Vec<String>,
    pub agenda_label: String,
    pub agenda: Vec<AgendaItem>,
    pub meeting_link: String,
    pub body: String,
}

impl IssueDraft {
    /// Render context for this draft, with whatever is known by now.
    pub fn context(&self, issue_number: Option<u64>, meeting_notes: &str) -> TemplateContext {
        TemplateContext {
            title: self.title.clone(),
            date: self.date,
            repo: self.repo.clone(),
            agenda_label: self.agenda_label.clone(),
            agenda: self.agenda.clone(),
            meeting_link: self.meeting_link.clone(),
            meeting_notes: meeting_notes.to_string(),
            issue_number,
        }
    }
}

/// Outcome of the meeting-due decision.
#[derive(Debug)]
pub enum MeetingDue {
    /// The next occurrence is still beyond the creation window.
    NotDue { next: DateTime<Utc> },
    /// An open issue with the computed title already exists.
    Exists { next: DateTime<Utc>, number: u64 },
    /// A new meeting issue should be created.
    Due(Box<IssueDraft>),
}

/// Build the draft for the next meeting: resolved date, rendered title,
/// empty body.
pub fn next_issue_draft(opts: &MeetingOptions, now: DateTime<Utc>) -> MeetbotResult<IssueDraft> {
    let date = next_scheduled_meeting(&opts.schedules, now)?;

    let mut draft = IssueDraft {
        repo: opts.repo.clone(),
        title: String::new(),
        date,
        labels: opts.meeting_labels.clone(),
        agenda_label: opts.agenda_label.clone(),
        agenda: opts.agenda.clone(),
        meeting_link: opts.meeting_link.clone(),
        body: String::new(),
    };
    draft.title = opts.title.render(&draft.context(None, ""));
    Ok(draft)
}

/// Decide whether a new meeting issue is due.
///
/// Listing open issues is the only tracker access; nothing is written. The
/// sole duplicate-prevention signal is an exact title match against the
/// open issues carrying the meeting labels.
pub async fn should_create_next_meeting(
    tracker: &dyn IssueTracker,
    opts: &MeetingOptions,
    now: DateTime<Utc>,
) -> MeetbotResult<MeetingDue> {
    let draft = next_issue_draft(opts, now)?;

    let deadline = add_period(now, Tz::UTC, &opts.create_within);
    if draft.date > deadline {
        debug!(next = %draft.date, %deadline, "next meeting is beyond the creation window");
        return Ok(MeetingDue::NotDue { next: draft.date });
    }

    let meetings = tracker
        .list_open_issues(&opts.repo, &opts.meeting_labels)
        .await?;
    info!(
        title = %draft.title,
        candidates = meetings.len(),
        "checking for an existing meeting issue"
    );

    if let Some(existing) = meetings.iter().find(|issue| issue.title == draft.title) {
        info!(number = existing.number, "found existing meeting issue");
        return Ok(MeetingDue::Exists {
            next: draft.date,
            number: existing.number,
        });
    }

    debug!("no existing meeting issue found");
    Ok(MeetingDue::Due(Box::new(draft)))
}

/// Create the next meeting issue when one is due.
///
/// Returns `None` when there is nothing to do: the next occurrence is too
/// far out, or an issue already tracks it.
pub async fn create_next_meeting(
    tracker: &dyn IssueTracker,
    opts: &MeetingOptions,
    template: &Template,
    now: DateTime<Utc>,
) -> MeetbotResult<Option<Issue>> {
    let draft = match should_create_next_meeting(tracker, opts, now).await? {
        MeetingDue::Due(draft) => draft,
        MeetingDue::NotDue { next } => {
            info!(%next, "no meeting issue to create yet");
            return Ok(None);
        }
        MeetingDue::Exists { number, .. } => {
            info!(number, "meeting issue already exists");
            return Ok(None);
        }
    };

    let body = template.render(&draft.context(None, ""));
    let issue = tracker
        .create_issue(&draft.repo, &draft.title, &body, &draft.labels)
        .await?;
    info!(number = issue.number, title = %issue.title, "created meeting issue");
    Ok(Some(issue))
}

/// Render the final body (agenda plus the notes link, now that the issue
/// number is known) and write it back. This is the run's one follow-up
/// update.
pub async fn set_meeting_issue_body(
    tracker: &dyn IssueTracker,
    draft: &IssueDraft,
    template: &Template,
    number: u64,
    meeting_notes: &str,
) -> MeetbotResult<Issue> {
    let body = template.render(&draft.context(Some(number), meeting_notes));
    tracker.update_issue(&draft.repo, number, Some(&body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeetbotError;
    use crate::tracker::{AgendaPage, IssueTracker};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    struct FakeTracker {
        open_issues: Vec<Issue>,
        created: Mutex<Vec<Issue>>,
        updated: Mutex<Vec<(u64, String)>>,
    }

    impl FakeTracker {
        fn new(open_issues: Vec<Issue>) -> Self {
            FakeTracker {
                open_issues,
                created: Mutex::new(Vec::new()),
                updated: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IssueTracker for FakeTracker {
        async fn create_issue(
            &self,
            _repo: &RepoRef,
            title: &str,
            _body: &str,
            labels: &[String],
        ) -> MeetbotResult<Issue> {
            let issue = Issue {
                number: 42,
                title: title.to_string(),
                state: "open".to_string(),
                html_url: "https://github.com/acme/widgets/issues/42".to_string(),
                labels: labels.to_vec(),
            };
            self.created.lock().unwrap().push(issue.clone());
            Ok(issue)
        }

        async fn update_issue(
            &self,
            _repo: &RepoRef,
            number: u64,
            body: Option<&str>,
        ) -> MeetbotResult<Issue> {
            self.updated
                .lock()
                .unwrap()
                .push((number, body.unwrap_or_default().to_string()));
            Ok(Issue {
                number,
                title: "updated".to_string(),
                state: "open".to_string(),
                html_url: String::new(),
                labels: Vec::new(),
            })
        }

        async fn close_issue(&self, _repo: &RepoRef, _number: u64) -> MeetbotResult<Issue> {
            Err(MeetbotError::TrackerTransport("not implemented".into()))
        }

        async fn list_open_issues(
            &self,
            _repo: &RepoRef,
            _labels: &[String],
        ) -> MeetbotResult<Vec<Issue>> {
            Ok(self.open_issues.clone())
        }

        async fn get_file_content(
            &self,
            _repo: &RepoRef,
            path: &str,
            _git_ref: &str,
        ) -> MeetbotResult<Vec<u8>> {
            Err(MeetbotError::TrackerNotFound(path.to_string()))
        }

        async fn list_agenda_items(
            &self,
            _repo: &RepoRef,
            _label: &str,
        ) -> MeetbotResult<AgendaPage> {
            Ok(AgendaPage::default())
        }

        async fn list_discussions(&self, _repo: &RepoRef) -> MeetbotResult<Vec<AgendaItem>> {
            Ok(Vec::new())
        }

        async fn list_org_repos(&self, _org: &str) -> MeetbotResult<Vec<RepoRef>> {
            Ok(Vec::new())
        }
    }

    fn options(schedules: &[&str], create_within: &str) -> MeetingOptions {
        MeetingOptions {
            repo: RepoRef::new("acme", "widgets"),
            schedules: schedules.iter().map(|s| s.to_string()).collect(),
            create_within: Period::parse(create_within).unwrap(),
            title: Template::default_title(),
            meeting_labels: vec!["meeting".to_string()],
            agenda_label: "meeting-agenda".to_string(),
            agenda: Vec::new(),
            meeting_link: String::new(),
        }
    }

    #[tokio::test]
    async fn not_due_when_occurrence_is_beyond_the_window() {
        let tracker = FakeTracker::new(Vec::new());
        let opts = options(&["2020-04-16T13:00:00Z/P28D"], "P1D");
        let now = utc("2020-04-03T13:00:00Z");

        match should_create_next_meeting(&tracker, &opts, now).await.unwrap() {
            MeetingDue::NotDue { next } => assert_eq!(next, utc("2020-04-16T13:00:00Z")),
            other => panic!("expected NotDue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn existing_title_means_nothing_to_do() {
        // The schedule says a meeting is due, but an open issue with the
        // exact computed title already tracks it.
        let tracker = FakeTracker::new(vec![Issue {
            number: 7,
            title: "Meeting 2020-04-16".to_string(),
            state: "open".to_string(),
            html_url: String::new(),
            labels: vec!["meeting".to_string()],
        }]);
        let opts = options(&["2020-04-16T13:00:00Z/P28D"], "P1D");
        let now = utc("2020-04-16T00:00:00Z");

        match should_create_next_meeting(&tracker, &opts, now).await.unwrap() {
            MeetingDue::Exists { number, .. } => assert_eq!(number, 7),
            other => panic!("expected Exists, got {other:?}"),
        }

        let created = create_next_meeting(&tracker, &opts, &Template::default_issue(), now)
            .await
            .unwrap();
        assert!(created.is_none());
        assert!(tracker.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn due_meeting_produces_a_populated_draft() {
        let tracker = FakeTracker::new(vec![Issue {
            number: 6,
            title: "Meeting 2020-03-19".to_string(),
            state: "open".to_string(),
            html_url: String::new(),
            labels: vec!["meeting".to_string()],
        }]);
        let opts = options(&["2020-04-16T13:00:00Z/P28D"], "P1D");
        let now = utc("2020-04-16T00:00:00Z");

        match should_create_next_meeting(&tracker, &opts, now).await.unwrap() {
            MeetingDue::Due(draft) => {
                assert_eq!(draft.title, "Meeting 2020-04-16");
                assert_eq!(draft.date, utc("2020-04-16T13:00:00Z"));
                assert_eq!(draft.labels, vec!["meeting".to_string()]);
            }
            other => panic!("expected Due, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_and_final_body_update() {
        let tracker = FakeTracker::new(Vec::new());
        let opts = options(&["2020-04-16T13:00:00Z/P28D"], "P1D");
        let now = utc("2020-04-16T00:00:00Z");
        let template = Template::default_issue();

        let issue = create_next_meeting(&tracker, &opts, &template, now)
            .await
            .unwrap()
            .expect("issue should be created");
        assert_eq!(issue.number, 42);
        assert_eq!(issue.title, "Meeting 2020-04-16");

        let draft = next_issue_draft(&opts, now).unwrap();
        set_meeting_issue_body(&tracker, &draft, &template, issue.number, "https://hackmd.io/abc")
            .await
            .unwrap();

        let updated = tracker.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, 42);
        assert!(updated[0].1.contains("https://hackmd.io/abc"));
    }

    #[tokio::test]
    async fn static_title_template_uses_the_date_marker() {
        let tracker = FakeTracker::new(Vec::new());
        let mut opts = options(&["2020-04-16T13:00:00Z/P28D"], "P1D");
        opts.title = Template::Static("TSC meeting <!-- date -->".to_string());
        let now = utc("2020-04-16T00:00:00Z");

        match should_create_next_meeting(&tracker, &opts, now).await.unwrap() {
            MeetingDue::Due(draft) => assert_eq!(draft.title, "TSC meeting 2020-04-16"),
            other => panic!("expected Due, got {other:?}"),
        }
    }
}
