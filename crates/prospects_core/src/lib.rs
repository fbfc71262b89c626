//! Core domain logic for Prospects.
//! This crate is the single source of truth for contact invariants.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use codec::identity::{
    decode_payload, CodecError, IdentityCodec, IdentityImage, IdentityPayload, MalformedReason,
};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactId, ContactValidationError};
pub use model::query::{ContactFilter, SortField, SortKey, SortSpec};
pub use reminder::center::{
    AuthorizationOptions, AuthorizationStatus, InProcessNotificationCenter, NotificationCenter,
    NotificationCenterError, PromptAnswer, ReminderContent, ReminderRequest,
};
pub use reminder::scheduler::{
    ReminderError, ReminderScheduler, ReminderState, ScheduledReminder, DEFAULT_REMINDER_DELAY,
};
pub use repo::contact_repo::{
    ContactListQuery, ContactRepository, RepoError, RepoResult, SqliteContactRepository,
};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use service::contact_store::{ContactSnapshot, ContactStore, StoreEvent};
pub use service::email_policy::EmailPolicy;
pub use service::profile_service::{ProfileService, SelfProfile};
pub use service::prospects_service::{ProspectsService, RemindError, ScanOutcome};
pub use service::selection::{EditSession, SelectionController};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
