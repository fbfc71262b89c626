//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must validate records before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::SharedConnection;
use crate::model::contact::ContactId;
use rusqlite::Connection;
use std::sync::MutexGuard;
use uuid::Uuid;

pub mod contact_repo;
pub mod settings_repo;

use contact_repo::{RepoError, RepoResult};

pub(crate) fn lock_conn(conn: &SharedConnection) -> RepoResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| RepoError::LockPoisoned)
}

pub(crate) fn parse_contact_id(value: &str) -> RepoResult<ContactId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in contacts.id")))
}
