//! Contact store use-case service.
//!
//! # Responsibility
//! - Provide insert/edit/toggle/delete/query entry points for collaborators.
//! - Stamp query snapshots with a store revision and publish change events.
//!
//! # Invariants
//! - Every successful mutation advances the revision exactly once, after the
//!   write has committed.
//! - A snapshot reads the revision before reading rows, so it can be reported
//!   stale spuriously but never reported current while missing a committed
//!   mutation.
//! - `delete` of an absent id is a no-op, not an error.

use crate::model::contact::{validate_fields, Contact, ContactId, ContactValidationError};
use crate::model::query::{ContactFilter, SortSpec};
use crate::repo::contact_repo::{ContactListQuery, ContactRepository, RepoResult};
use crate::service::email_policy::EmailPolicy;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notification published after each committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Inserted { id: ContactId, revision: u64 },
    Deleted { id: ContactId, revision: u64 },
    Toggled { id: ContactId, is_contacted: bool, revision: u64 },
    Edited { id: ContactId, revision: u64 },
}

impl StoreEvent {
    pub fn revision(&self) -> u64 {
        match self {
            Self::Inserted { revision, .. }
            | Self::Deleted { revision, .. }
            | Self::Toggled { revision, .. }
            | Self::Edited { revision, .. } => *revision,
        }
    }
}

/// Ordered, read-consistent result of one `query` call.
///
/// A snapshot does not follow later mutations; check
/// [`ContactStore::is_current`] or subscribe to events and re-query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSnapshot {
    revision: u64,
    filter: ContactFilter,
    sort: SortSpec,
    contacts: Vec<Contact>,
}

impl ContactSnapshot {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn filter(&self) -> ContactFilter {
        self.filter
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn into_contacts(self) -> Vec<Contact> {
        self.contacts
    }

    pub fn ids(&self) -> Vec<ContactId> {
        self.contacts.iter().map(|contact| contact.id).collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Contact store facade over a repository implementation.
pub struct ContactStore<R: ContactRepository> {
    repo: R,
    email_policy: EmailPolicy,
    revision: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
}

impl<R: ContactRepository> ContactStore<R> {
    /// Creates a store with the permissive email policy.
    pub fn new(repo: R) -> Self {
        Self::with_email_policy(repo, EmailPolicy::default())
    }

    pub fn with_email_policy(repo: R, email_policy: EmailPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repo,
            email_policy,
            revision: AtomicU64::new(0),
            events,
        }
    }

    pub fn email_policy(&self) -> EmailPolicy {
        self.email_policy
    }

    /// Creates a new uncontacted contact stamped with the current time.
    ///
    /// # Errors
    /// - `RepoError::Validation` when name or email is empty after trimming,
    ///   or the email policy rejects the email. No record is created.
    pub fn insert(&self, name: &str, email: &str) -> RepoResult<Contact> {
        let contact = Contact::new(name, email);
        contact.validate()?;
        self.check_email(&contact.email)?;

        self.repo.insert_contact(&contact)?;
        let id = contact.id;
        let revision = self.bump(|revision| StoreEvent::Inserted { id, revision });
        info!(
            "event=contact_insert module=store status=ok contact_id={} revision={}",
            contact.id, revision
        );
        Ok(contact)
    }

    /// Gets one contact snapshot by id.
    pub fn get(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        self.repo.get_contact(id)
    }

    /// Permanently removes a contact.
    ///
    /// Returns `false` (and publishes nothing) when the id was already gone.
    pub fn delete(&self, id: ContactId) -> RepoResult<bool> {
        let removed = self.repo.delete_contact(id)?;
        if removed {
            let revision = self.bump(|revision| StoreEvent::Deleted { id, revision });
            info!(
                "event=contact_delete module=store status=ok contact_id={} revision={}",
                id, revision
            );
        } else {
            debug!("event=contact_delete module=store status=noop contact_id={id}");
        }
        Ok(removed)
    }

    /// Flips the contacted flag.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the id does not exist.
    pub fn toggle_contacted(&self, id: ContactId) -> RepoResult<Contact> {
        let updated = self.repo.toggle_contacted(id)?;
        let is_contacted = updated.is_contacted;
        let revision = self.bump(|revision| StoreEvent::Toggled {
            id,
            is_contacted,
            revision,
        });
        info!(
            "event=contact_toggle module=store status=ok contact_id={} is_contacted={} revision={}",
            id, updated.is_contacted, revision
        );
        Ok(updated)
    }

    /// Replaces name and email; `created_at` and `is_contacted` are untouched.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the id does not exist.
    /// - `RepoError::Validation` for empty fields or a rejected email.
    pub fn edit(&self, id: ContactId, name: &str, email: &str) -> RepoResult<Contact> {
        validate_fields(name, email)?;
        self.check_email(email)?;
        let updated = self.repo.update_fields(id, name, email)?;
        let revision = self.bump(|revision| StoreEvent::Edited { id, revision });
        info!(
            "event=contact_edit module=store status=ok contact_id={} revision={}",
            id, revision
        );
        Ok(updated)
    }

    /// Lists contacts passing `filter`, ordered by `sort`.
    pub fn query(&self, filter: ContactFilter, sort: &SortSpec) -> RepoResult<ContactSnapshot> {
        let revision = self.revision.load(Ordering::Acquire);
        let contacts = self.repo.list_contacts(&ContactListQuery {
            filter,
            sort: sort.clone(),
        })?;
        Ok(ContactSnapshot {
            revision,
            filter,
            sort: sort.clone(),
            contacts,
        })
    }

    /// Current store revision; advances on every committed mutation.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Returns whether no mutation has committed since `snapshot` was taken.
    pub fn is_current(&self, snapshot: &ContactSnapshot) -> bool {
        snapshot.revision == self.revision()
    }

    /// Subscribes to change events published after each mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn check_email(&self, email: &str) -> Result<(), ContactValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ContactValidationError::EmptyEmail);
        }
        if !self.email_policy.accepts(email) {
            warn!(
                "event=contact_validate module=store status=rejected policy={}",
                self.email_policy.label()
            );
            return Err(ContactValidationError::InvalidEmail(
                self.email_policy.label().to_string(),
            ));
        }
        Ok(())
    }

    fn bump(&self, event: impl FnOnce(u64) -> StoreEvent) -> u64 {
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        // No receivers is fine: collaborators may poll `is_current` instead.
        let _ = self.events.send(event(revision));
        revision
    }
}
