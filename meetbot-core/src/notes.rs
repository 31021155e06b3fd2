//! The collaborative-notes capability.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::MeetbotResult;

/// External notes document creation (e.g. HackMD).
#[async_trait]
pub trait NotesService: Send + Sync {
    /// Create a notes document and return its URL.
    async fn create_note(&self, content: &str) -> MeetbotResult<String>;
}

/// Create the meeting notes document, degrading to `None` on failure.
///
/// Notes are a best-effort extra: the meeting issue is still created and
/// updated when the notes service is down. The content that would have been
/// published is logged at debug level so it is not lost.
pub async fn create_notes_document(notes: &dyn NotesService, content: &str) -> Option<String> {
    match notes.create_note(content).await {
        Ok(url) => {
            debug!(%url, "created notes document");
            Some(url)
        }
        Err(err) => {
            warn!(error = %err, "failed to create notes document");
            debug!(content, "notes document that would have been created");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeetbotError;

    struct Broken;

    #[async_trait]
    impl NotesService for Broken {
        async fn create_note(&self, _content: &str) -> MeetbotResult<String> {
            Err(MeetbotError::NotesCreation("service down".to_string()))
        }
    }

    struct Working;

    #[async_trait]
    impl NotesService for Working {
        async fn create_note(&self, _content: &str) -> MeetbotResult<String> {
            Ok("https://hackmd.io/abc".to_string())
        }
    }

    #[tokio::test]
    async fn failure_degrades_to_none() {
        assert_eq!(create_notes_document(&Broken, "# notes").await, None);
    }

    #[tokio::test]
    async fn success_returns_the_url() {
        assert_eq!(
            create_notes_document(&Working, "# notes").await,
            Some("https://hackmd.io/abc".to_string())
        );
    }
}
