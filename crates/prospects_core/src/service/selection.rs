//! Listing selection and single-contact edit sessions.
//!
//! # Responsibility
//! - Track the set of contacts selected for batch delete.
//! - Own the rule that entering an edit session deselects everything.
//!
//! # Invariants
//! - `delete_selected` tolerates ids already removed by a direct delete.
//! - A successfully started `EditSession` always leaves the selection empty.
//! - Committing an edit never rewrites `created_at` or `is_contacted`.

use crate::model::contact::{Contact, ContactId};
use crate::repo::contact_repo::{ContactRepository, RepoError, RepoResult};
use crate::service::contact_store::ContactStore;
use log::{info, warn};
use std::collections::BTreeSet;

/// Set of contact ids currently selected in a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    selected: BTreeSet<ContactId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the id was not selected before.
    pub fn select(&mut self, id: ContactId) -> bool {
        self.selected.insert(id)
    }

    /// Returns `true` when the id was selected before.
    pub fn deselect(&mut self, id: ContactId) -> bool {
        self.selected.remove(&id)
    }

    pub fn contains(&self, id: ContactId) -> bool {
        self.selected.contains(&id)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in stable order.
    pub fn ids(&self) -> Vec<ContactId> {
        self.selected.iter().copied().collect()
    }

    /// Deletes every selected contact, then clears the selection.
    ///
    /// Returns how many rows were actually removed; ids that were already
    /// gone count as handled but not removed.
    ///
    /// # Errors
    /// - Returns the first storage error. Ids that failed stay selected so the
    ///   caller can retry; ids handled before and after the failure are
    ///   deselected.
    pub fn delete_selected<R: ContactRepository>(
        &mut self,
        store: &ContactStore<R>,
    ) -> RepoResult<usize> {
        let mut removed = 0;
        let mut first_error: Option<RepoError> = None;

        for id in self.ids() {
            match store.delete(id) {
                Ok(deleted) => {
                    self.selected.remove(&id);
                    if deleted {
                        removed += 1;
                    }
                }
                Err(err) => {
                    warn!(
                        "event=selection_delete module=selection status=error contact_id={} error={}",
                        id, err
                    );
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        info!("event=selection_delete module=selection status=ok removed={removed}");
        self.selected.clear();
        Ok(removed)
    }
}

/// Draft state for editing one contact's name and email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    original: Contact,
    name: String,
    email: String,
}

impl EditSession {
    /// Enters the editor for `id`, clearing the listing selection.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the contact does not exist; the selection
    ///   is left untouched in that case because no editor is entered.
    pub fn begin<R: ContactRepository>(
        store: &ContactStore<R>,
        selection: &mut SelectionController,
        id: ContactId,
    ) -> RepoResult<Self> {
        let original = store.get(id)?.ok_or(RepoError::NotFound(id))?;
        selection.clear();
        Ok(Self {
            name: original.name.clone(),
            email: original.email.clone(),
            original,
        })
    }

    /// Snapshot read when the session began.
    pub fn original(&self) -> &Contact {
        &self.original
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.name != self.original.name || self.email != self.original.email
    }

    /// Leaves the editor, writing the draft back through `edit`.
    ///
    /// An unchanged draft skips the write and returns the stored record.
    pub fn commit<R: ContactRepository>(self, store: &ContactStore<R>) -> RepoResult<Contact> {
        let id = self.original.id;
        if !self.is_dirty() {
            return store.get(id)?.ok_or(RepoError::NotFound(id));
        }
        store.edit(id, &self.name, &self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionController;
    use uuid::Uuid;

    #[test]
    fn select_and_deselect_report_membership_changes() {
        let mut selection = SelectionController::new();
        let id = Uuid::new_v4();

        assert!(selection.select(id));
        assert!(!selection.select(id));
        assert!(selection.contains(id));
        assert_eq!(selection.len(), 1);

        assert!(selection.deselect(id));
        assert!(!selection.deselect(id));
        assert!(selection.is_empty());
    }
}
