//! Local follow-up reminders for contacts.
//!
//! # Responsibility
//! - Define the platform notification seam.
//! - Schedule one-shot reminders after checking authorization.
//!
//! # Invariants
//! - Deleting a contact does not retract its pending reminders.

pub mod center;
pub mod scheduler;
