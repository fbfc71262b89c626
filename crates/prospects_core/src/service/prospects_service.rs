//! Collaborator-facing facade over the prospects core.
//!
//! # Responsibility
//! - Turn scan outcomes into contacts (decode, then insert).
//! - Route listing, edit, selection and reminder actions to their owners.
//! - Refresh the user's identity code whenever the profile changes.
//!
//! # Invariants
//! - A rejected or failed scan never creates a record.
//! - Reminder failures are reported to the caller and never roll back or
//!   block store operations.

use crate::codec::identity::{IdentityCodec, IdentityImage};
use crate::config::CoreConfig;
use crate::db::SharedConnection;
use crate::model::contact::{Contact, ContactId};
use crate::model::query::{ContactFilter, SortSpec};
use crate::reminder::center::NotificationCenter;
use crate::reminder::scheduler::{ReminderError, ReminderScheduler, ScheduledReminder};
use crate::repo::contact_repo::{
    ContactRepository, RepoError, RepoResult, SqliteContactRepository,
};
use crate::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
use crate::service::contact_store::{ContactSnapshot, ContactStore};
use crate::service::profile_service::{ProfileService, SelfProfile};
use crate::service::selection::{EditSession, SelectionController};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// What the scanning surface delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Raw decoded payload text.
    Success(String),
    /// Scanner-side failure description; no store action is taken.
    Failure(String),
}

/// Failure of a contact-level reminder request.
#[derive(Debug)]
pub enum RemindError {
    Store(RepoError),
    Reminder(ReminderError),
}

impl Display for RemindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Reminder(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RemindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Reminder(err) => Some(err),
        }
    }
}

impl From<RepoError> for RemindError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<ReminderError> for RemindError {
    fn from(value: ReminderError) -> Self {
        Self::Reminder(value)
    }
}

/// Facade wiring store, profile, codec and reminders together.
pub struct ProspectsService<R: ContactRepository, S: SettingsRepository> {
    store: ContactStore<R>,
    profile: ProfileService<S>,
    codec: IdentityCodec,
    reminders: ReminderScheduler,
}

impl ProspectsService<SqliteContactRepository, SqliteSettingsRepository> {
    /// Builds the SQLite-backed facade from one migrated shared connection.
    pub fn open(
        conn: SharedConnection,
        config: &CoreConfig,
        center: Arc<dyn NotificationCenter>,
    ) -> RepoResult<Self> {
        let codec = config
            .codec()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        let contacts = SqliteContactRepository::try_new(Arc::clone(&conn))?;
        let settings = SqliteSettingsRepository::new(conn);
        Ok(Self::new(
            ContactStore::with_email_policy(contacts, config.email_policy),
            ProfileService::new(settings),
            codec,
            ReminderScheduler::with_default_delay(center, config.reminder_delay()),
        ))
    }
}

impl<R: ContactRepository, S: SettingsRepository> ProspectsService<R, S> {
    pub fn new(
        store: ContactStore<R>,
        profile: ProfileService<S>,
        codec: IdentityCodec,
        reminders: ReminderScheduler,
    ) -> Self {
        Self {
            store,
            profile,
            codec,
            reminders,
        }
    }

    pub fn store(&self) -> &ContactStore<R> {
        &self.store
    }

    pub fn codec(&self) -> &IdentityCodec {
        &self.codec
    }

    pub fn reminders(&self) -> &ReminderScheduler {
        &self.reminders
    }

    /// Decodes a scan and inserts the resulting contact.
    ///
    /// Returns `None` when the scan failed, the payload was malformed, or the
    /// fields were rejected; each case is logged and leaves the store as is.
    pub fn handle_scan(&self, outcome: ScanOutcome) -> Option<Contact> {
        let payload = match outcome {
            ScanOutcome::Success(payload) => payload,
            ScanOutcome::Failure(reason) => {
                warn!(
                    "event=scan_handle module=prospects status=scan_failed reason_chars={}",
                    reason.chars().count()
                );
                return None;
            }
        };

        let identity = match self.codec.decode(&payload) {
            Ok(identity) => identity,
            Err(err) => {
                warn!("event=scan_handle module=prospects status=discarded error={err}");
                return None;
            }
        };

        match self.store.insert(&identity.name, &identity.email) {
            Ok(contact) => {
                info!(
                    "event=scan_handle module=prospects status=ok contact_id={}",
                    contact.id
                );
                Some(contact)
            }
            Err(err) => {
                warn!("event=scan_handle module=prospects status=rejected error={err}");
                None
            }
        }
    }

    pub fn list(&self, filter: ContactFilter, sort: &SortSpec) -> RepoResult<ContactSnapshot> {
        self.store.query(filter, sort)
    }

    pub fn toggle_contacted(&self, id: ContactId) -> RepoResult<Contact> {
        self.store.toggle_contacted(id)
    }

    pub fn delete(&self, id: ContactId) -> RepoResult<bool> {
        self.store.delete(id)
    }

    pub fn delete_selected(&self, selection: &mut SelectionController) -> RepoResult<usize> {
        selection.delete_selected(&self.store)
    }

    /// Enters the editor for one contact; clears `selection`.
    pub fn begin_edit(
        &self,
        selection: &mut SelectionController,
        id: ContactId,
    ) -> RepoResult<EditSession> {
        EditSession::begin(&self.store, selection, id)
    }

    pub fn commit_edit(&self, session: EditSession) -> RepoResult<Contact> {
        session.commit(&self.store)
    }

    /// Schedules a follow-up reminder for a stored contact.
    ///
    /// `after = None` uses the configured default delay.
    pub async fn remind(
        &self,
        id: ContactId,
        after: Option<Duration>,
    ) -> Result<ScheduledReminder, RemindError> {
        let contact = self.store.get(id)?.ok_or(RepoError::NotFound(id))?;
        let delay = after.unwrap_or_else(|| self.reminders.default_delay());
        Ok(self.reminders.remind(&contact, delay).await?)
    }

    /// Fire-and-forget variant of [`Self::remind`] for row actions.
    pub fn remind_in_background(
        &self,
        id: ContactId,
        after: Option<Duration>,
    ) -> RepoResult<JoinHandle<Result<ScheduledReminder, ReminderError>>> {
        let contact = self.store.get(id)?.ok_or(RepoError::NotFound(id))?;
        let delay = after.unwrap_or_else(|| self.reminders.default_delay());
        Ok(self.reminders.remind_in_background(contact, delay))
    }

    pub fn my_profile(&self) -> RepoResult<SelfProfile> {
        self.profile.profile()
    }

    /// Current identity code for the "Me" surface.
    pub fn my_code(&self) -> RepoResult<IdentityImage> {
        self.profile.identity_code(&self.codec)
    }

    /// Updates the profile name and returns the refreshed code.
    pub fn set_my_name(&self, name: &str) -> RepoResult<IdentityImage> {
        self.profile.set_name(name)?;
        self.my_code()
    }

    /// Updates the profile email and returns the refreshed code.
    pub fn set_my_email(&self, email: &str) -> RepoResult<IdentityImage> {
        self.profile.set_email(email)?;
        self.my_code()
    }
}
