//! HackMD notes backend for meetbot.
//!
//! Creates anonymous notes by posting markdown to the public `/new`
//! endpoint; the note's URL is wherever the request lands after redirects.
//! Failure handling (degrading to no notes link) lives with the caller;
//! this crate only reports errors.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use meetbot_core::error::{MeetbotError, MeetbotResult};
use meetbot_core::notes::NotesService;

const DEFAULT_BASE_URL: &str = "https://hackmd.io";

/// A HackMD client for anonymous note creation.
pub struct HackmdNotes {
    http: reqwest::Client,
    base_url: String,
}

impl HackmdNotes {
    pub fn new() -> MeetbotResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Build a client against a different base URL (a local stub in tests).
    pub fn with_base_url(base_url: &str) -> MeetbotResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("meetbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MeetbotError::NotesCreation(e.to_string()))?;

        Ok(HackmdNotes {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl NotesService for HackmdNotes {
    async fn create_note(&self, content: &str) -> MeetbotResult<String> {
        let response = self
            .http
            .post(format!("{}/new", self.base_url))
            .header(CONTENT_TYPE, "text/markdown")
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| MeetbotError::NotesCreation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MeetbotError::NotesCreation(format!(
                "note service returned {status}"
            )));
        }

        let url = response.url().to_string();
        debug!(%url, "note created");
        Ok(url)
    }
}
