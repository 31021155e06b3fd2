use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use meetbot_core::meeting::MeetingOptions;
use meetbot_core::schedule::Period;
use meetbot_core::template::Template;
use meetbot_core::tracker::{AgendaItem, RepoRef};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Repository the meeting issue is created in (`owner/name`)
    pub repo: String,

    /// Recurrence schedules, e.g. "2020-04-02T17:00:00[America/Chicago]/P28D"
    #[serde(default)]
    pub schedules: Vec<String>,

    /// How far ahead of the occurrence the issue may be created (ISO-8601 duration)
    #[serde(default = "default_create_within")]
    pub create_within: String,

    /// Label that marks issues/PRs/discussions for the agenda
    #[serde(default = "default_agenda_label")]
    pub agenda_label: String,

    /// Labels applied to (and used to find) meeting issues
    #[serde(default = "default_meeting_labels")]
    pub meeting_labels: Vec<String>,

    /// Issue title template; `<!-- date -->` is replaced with the meeting date
    #[serde(default)]
    pub issue_title: Option<String>,

    /// Issue body template filename under .github/ISSUE_TEMPLATE/ in the home repo
    #[serde(default)]
    pub issue_template: Option<String>,

    /// Notes template filename under .github/meet/ in the home repo
    #[serde(default)]
    pub notes_template: Option<String>,

    /// Whether to create a collaborative notes document
    #[serde(default)]
    pub create_notes: bool,

    /// Link participants use to join the meeting
    #[serde(default)]
    pub meeting_link: String,

    /// Additional repositories to source agenda items from (`owner/name`)
    #[serde(default)]
    pub repos: Vec<String>,

    /// Organizations whose repositories are all sourced for agenda items
    #[serde(default)]
    pub orgs: Vec<String>,

    /// Display timezone (IANA id); UTC when unset
    #[serde(default)]
    pub timezone: Option<String>,
}

fn default_create_within() -> String {
    "P1D".to_string()
}

fn default_agenda_label() -> String {
    "meeting-agenda".to_string()
}

fn default_meeting_labels() -> Vec<String> {
    vec!["meeting".to_string()]
}

impl Config {
    /// The repository the meeting issue is created in.
    pub fn home_repo(&self) -> Result<RepoRef> {
        RepoRef::parse(&self.repo)
            .with_context(|| format!("Invalid repo '{}': expected owner/name", self.repo))
    }

    /// Every repository agenda items are sourced from: the home repo first,
    /// then the configured extras (orgs expand later, via the tracker).
    pub fn source_repos(&self) -> Result<Vec<RepoRef>> {
        let mut sources = vec![self.home_repo()?];
        for entry in &self.repos {
            let repo = RepoRef::parse(entry)
                .with_context(|| format!("Invalid repo '{entry}': expected owner/name"))?;
            sources.push(repo);
        }
        Ok(sources)
    }

    /// The zone used when printing occurrences for humans.
    pub fn display_zone(&self) -> Result<Tz> {
        match &self.timezone {
            Some(zone) => zone
                .parse()
                .map_err(|_| anyhow::anyhow!("Unknown timezone '{zone}' in config")),
            None => Ok(Tz::UTC),
        }
    }

    /// Assemble the meeting-due decision inputs from the config plus the
    /// fetched agenda.
    pub fn meeting_options(&self, agenda: Vec<AgendaItem>) -> Result<MeetingOptions> {
        let create_within = Period::parse(&self.create_within)
            .with_context(|| format!("Invalid create_within '{}'", self.create_within))?;

        let title = match &self.issue_title {
            Some(template) => Template::Static(template.clone()),
            None => Template::default_title(),
        };

        Ok(MeetingOptions {
            repo: self.home_repo()?,
            schedules: self.schedules.clone(),
            create_within,
            title,
            meeting_labels: self.meeting_labels.clone(),
            agenda_label: self.agenda_label.clone(),
            agenda,
            meeting_link: self.meeting_link.clone(),
        })
    }
}

/// Load config from the explicit path, `./meetbot.toml`, or
/// `~/.config/meetbot/config.toml`, whichever exists first.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => default_config_path()?,
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

fn default_config_path() -> Result<PathBuf> {
    let local = PathBuf::from("meetbot.toml");
    if local.exists() {
        return Ok(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("meetbot").join("config.toml");
        if user.exists() {
            return Ok(user);
        }
    }

    anyhow::bail!(
        "No config file found.\n\n\
        Create meetbot.toml in the working directory (or ~/.config/meetbot/config.toml):\n\n\
        repo = \"your-org/your-repo\"\n\
        schedules = [\"2020-04-02T17:00:00[America/Chicago]/P28D\"]\n\
        create_within = \"P1D\"\n"
    );
}

/// The tracker token comes from the environment, never from the config
/// file.
pub fn github_token() -> Result<String> {
    std::env::var("GITHUB_TOKEN").context(
        "GITHUB_TOKEN is not set.\n\
        Export a token with repo scope, e.g. GITHUB_TOKEN=ghp_... meetbot run",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str("repo = \"acme/widgets\"").unwrap();
        assert_eq!(config.create_within, "P1D");
        assert_eq!(config.agenda_label, "meeting-agenda");
        assert_eq!(config.meeting_labels, vec!["meeting".to_string()]);
        assert!(!config.create_notes);
        assert!(config.schedules.is_empty());
        assert_eq!(config.home_repo().unwrap(), RepoRef::new("acme", "widgets"));
    }

    #[test]
    fn source_repos_start_with_the_home_repo() {
        let config: Config = toml::from_str(
            "repo = \"acme/widgets\"\nrepos = [\"acme/gadgets\", \"other/tools\"]",
        )
        .unwrap();
        assert_eq!(
            config.source_repos().unwrap(),
            vec![
                RepoRef::new("acme", "widgets"),
                RepoRef::new("acme", "gadgets"),
                RepoRef::new("other", "tools"),
            ]
        );
    }

    #[test]
    fn bad_create_within_is_rejected() {
        let config: Config =
            toml::from_str("repo = \"acme/widgets\"\ncreate_within = \"tomorrow\"").unwrap();
        assert!(config.meeting_options(Vec::new()).is_err());
    }

    #[test]
    fn display_zone_parses_iana_ids() {
        let config: Config =
            toml::from_str("repo = \"acme/widgets\"\ntimezone = \"Europe/Amsterdam\"").unwrap();
        assert_eq!(config.display_zone().unwrap(), chrono_tz::Europe::Amsterdam);
    }
}
