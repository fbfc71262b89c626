use prospects_core::db::open_shared_in_memory;
use prospects_core::{
    Contact, ContactFilter, ContactId, ContactListQuery, ContactRepository, ContactStore,
    EditSession, RepoError, RepoResult, SelectionController, SortSpec, SqliteContactRepository,
};
use uuid::Uuid;

fn new_store() -> ContactStore<SqliteContactRepository> {
    let repo = SqliteContactRepository::try_new(open_shared_in_memory().unwrap()).unwrap();
    ContactStore::new(repo)
}

/// Delegates to SQLite but refuses to delete one id.
struct StickyRepository {
    inner: SqliteContactRepository,
    sticky: ContactId,
}

impl ContactRepository for StickyRepository {
    fn insert_contact(&self, contact: &Contact) -> RepoResult<()> {
        self.inner.insert_contact(contact)
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        self.inner.get_contact(id)
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<bool> {
        if id == self.sticky {
            return Err(RepoError::LockPoisoned);
        }
        self.inner.delete_contact(id)
    }

    fn toggle_contacted(&self, id: ContactId) -> RepoResult<Contact> {
        self.inner.toggle_contacted(id)
    }

    fn update_fields(&self, id: ContactId, name: &str, email: &str) -> RepoResult<Contact> {
        self.inner.update_fields(id, name, email)
    }

    fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>> {
        self.inner.list_contacts(query)
    }
}

#[test]
fn delete_selected_tolerates_ids_removed_directly() {
    let store = new_store();
    let alice = store.insert("Alice", "a@x.com").unwrap();
    let bob = store.insert("Bob", "b@x.com").unwrap();
    let carl = store.insert("Carl", "c@x.com").unwrap();

    let mut selection = SelectionController::new();
    selection.select(alice.id);
    selection.select(bob.id);
    selection.select(Uuid::new_v4());

    assert!(store.delete(bob.id).unwrap());
    let removed = selection.delete_selected(&store).unwrap();

    assert_eq!(removed, 1);
    assert!(selection.is_empty());
    assert_eq!(
        store
            .query(ContactFilter::All, &SortSpec::by_name())
            .unwrap()
            .ids(),
        vec![carl.id]
    );
}

#[test]
fn delete_selected_keeps_failed_ids_selected() {
    let conn = open_shared_in_memory().unwrap();
    let seed = ContactStore::new(SqliteContactRepository::try_new(conn.clone()).unwrap());
    let alice = seed.insert("Alice", "a@x.com").unwrap();
    let bob = seed.insert("Bob", "b@x.com").unwrap();

    let store = ContactStore::new(StickyRepository {
        inner: SqliteContactRepository::try_new(conn).unwrap(),
        sticky: alice.id,
    });
    let mut selection = SelectionController::new();
    selection.select(alice.id);
    selection.select(bob.id);

    let err = selection.delete_selected(&store).unwrap_err();
    assert!(matches!(err, RepoError::LockPoisoned));
    assert_eq!(selection.ids(), vec![alice.id]);
    assert!(store.get(bob.id).unwrap().is_none());
    assert!(store.get(alice.id).unwrap().is_some());
}

#[test]
fn entering_edit_clears_selection_and_commit_keeps_created_at() {
    let store = new_store();
    let alice = store.insert("Alice", "a@x.com").unwrap();
    let bob = store.insert("Bob", "b@x.com").unwrap();
    store.toggle_contacted(alice.id).unwrap();

    let mut selection = SelectionController::new();
    selection.select(alice.id);
    selection.select(bob.id);

    let mut session = EditSession::begin(&store, &mut selection, alice.id).unwrap();
    assert!(selection.is_empty());
    assert_eq!(session.name(), "Alice");
    assert!(!session.is_dirty());

    session.set_name("Alicia");
    session.set_email("alicia@x.com");
    assert!(session.is_dirty());

    let saved = session.commit(&store).unwrap();
    assert_eq!(saved.id, alice.id);
    assert_eq!(saved.name, "Alicia");
    assert_eq!(saved.email, "alicia@x.com");
    assert_eq!(saved.created_at, alice.created_at);
    assert!(saved.is_contacted);
}

#[test]
fn clean_commit_skips_the_write() {
    let store = new_store();
    let alice = store.insert("Alice", "a@x.com").unwrap();
    let mut selection = SelectionController::new();

    let session = EditSession::begin(&store, &mut selection, alice.id).unwrap();
    let revision = store.revision();
    let saved = session.commit(&store).unwrap();

    assert_eq!(saved, alice);
    assert_eq!(store.revision(), revision);
}

#[test]
fn begin_for_missing_contact_leaves_selection_alone() {
    let store = new_store();
    let alice = store.insert("Alice", "a@x.com").unwrap();
    let mut selection = SelectionController::new();
    selection.select(alice.id);

    let missing = Uuid::new_v4();
    let err = EditSession::begin(&store, &mut selection, missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
    assert!(selection.contains(alice.id));
}

#[test]
fn commit_after_concurrent_delete_reports_not_found() {
    let store = new_store();
    let alice = store.insert("Alice", "a@x.com").unwrap();
    let mut selection = SelectionController::new();

    let mut session = EditSession::begin(&store, &mut selection, alice.id).unwrap();
    store.delete(alice.id).unwrap();
    session.set_name("Alicia");

    let err = session.commit(&store).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == alice.id));
}
