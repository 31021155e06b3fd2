//! Core types and scheduling logic for the meetbot ecosystem.
//!
//! This crate provides everything the CLI and the backend crates share:
//! - `schedule` and `occurrence` for recurrence resolution across DST
//! - `meeting` for the meeting-due decision and issue drafts
//! - `agenda` for aggregating labelled items across repositories
//! - `template` for issue/notes body rendering
//! - `tracker` and `notes` for the external capability traits

pub mod agenda;
pub mod error;
pub mod meeting;
pub mod notes;
pub mod occurrence;
pub mod schedule;
pub mod template;
pub mod tracker;

pub use error::{MeetbotError, MeetbotResult};
pub use schedule::{next_scheduled_meeting, Period, Schedule};
