//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD and listing APIs over the `contacts` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Contact::validate()` (or field validation) before SQL.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `created_at` and `id` are never part of an UPDATE statement.
//! - Listing ties are broken by insertion order (`seq`), never by `id`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, SharedConnection};
use crate::model::contact::{validate_fields, Contact, ContactId, ContactValidationError};
use crate::model::query::{ContactFilter, SortField, SortSpec};
use crate::repo::{lock_conn, parse_contact_id};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    is_contacted,
    created_at
FROM contacts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    Db(DbError),
    NotFound(ContactId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::LockPoisoned => write!(f, "database lock poisoned by a panicked writer"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::LockPoisoned => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactListQuery {
    pub filter: ContactFilter,
    pub sort: SortSpec,
}

/// Repository interface for contact persistence.
///
/// Implementations must apply each write atomically with respect to
/// `list_contacts`.
pub trait ContactRepository: Send + Sync {
    fn insert_contact(&self, contact: &Contact) -> RepoResult<()>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    /// Returns `false` when no row matched.
    fn delete_contact(&self, id: ContactId) -> RepoResult<bool>;
    /// Flips `is_contacted` and returns the updated record.
    fn toggle_contacted(&self, id: ContactId) -> RepoResult<Contact>;
    /// Replaces name and email, returning the updated record.
    fn update_fields(&self, id: ContactId, name: &str, email: &str) -> RepoResult<Contact>;
    fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository {
    conn: SharedConnection,
}

impl SqliteContactRepository {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        {
            let guard = lock_conn(&conn)?;
            ensure_connection_ready(&guard)?;
        }
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository {
    fn insert_contact(&self, contact: &Contact) -> RepoResult<()> {
        contact.validate()?;

        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO contacts (
                id,
                name,
                email,
                is_contacted,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                contact.id.to_string(),
                contact.name.as_str(),
                contact.email.as_str(),
                bool_to_int(contact.is_contacted),
                contact.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let conn = lock_conn(&self.conn)?;
        select_contact(&conn, id)
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<bool> {
        let conn = lock_conn(&self.conn)?;
        let changed = conn.execute("DELETE FROM contacts WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn toggle_contacted(&self, id: ContactId) -> RepoResult<Contact> {
        let mut conn = lock_conn(&self.conn)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE contacts
             SET is_contacted = 1 - is_contacted
             WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let updated = select_contact(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn update_fields(&self, id: ContactId, name: &str, email: &str) -> RepoResult<Contact> {
        validate_fields(name, email)?;

        let mut conn = lock_conn(&self.conn)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE contacts
             SET
                name = ?2,
                email = ?3
             WHERE id = ?1;",
            params![id.to_string(), name.trim(), email.trim()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let updated = select_contact(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>> {
        let mut sql = format!("{CONTACT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(flag) = query.filter.contacted_flag() {
            sql.push_str(" AND is_contacted = ?");
            bind_values.push(Value::Integer(bool_to_int(flag)));
        }

        sql.push_str(&order_by_clause(&query.sort));

        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut contacts = Vec::new();

        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }

        Ok(contacts)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn select_contact(conn: &Connection, id: ContactId) -> RepoResult<Option<Contact>> {
    let contact = conn
        .query_row(
            &format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            |row| Ok(parse_contact_row(row)),
        )
        .optional()?;
    contact.transpose()
}

/// SQLite `NOCASE` folds ASCII letters only: "alice" and "Alice" tie, but
/// non-ASCII initials such as "Émile" order by code point, after "zoe".
fn order_by_clause(sort: &SortSpec) -> String {
    let mut terms: Vec<String> = sort
        .keys()
        .iter()
        .map(|key| {
            let direction = if key.ascending { "ASC" } else { "DESC" };
            match key.field {
                SortField::Name => format!("name COLLATE NOCASE {direction}, name {direction}"),
                SortField::CreatedAt => format!("created_at {direction}"),
            }
        })
        .collect();
    terms.push("seq ASC".to_string());
    format!(" ORDER BY {}", terms.join(", "))
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let id_text: String = row.get("id")?;
    let id = parse_contact_id(&id_text)?;

    let is_contacted = match row.get::<_, i64>("is_contacted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_contacted value `{other}` in contacts.is_contacted"
            )));
        }
    };

    let contact = Contact {
        id,
        name: row.get("name")?,
        email: row.get("email")?,
        is_contacted,
        created_at: row.get("created_at")?,
    };
    contact
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("contact {id}: {err}")))?;
    Ok(contact)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
