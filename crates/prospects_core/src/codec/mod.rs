//! Encode/decode pipelines for shareable identity codes.
//!
//! # Responsibility
//! - Turn the user's own name/email into a scannable QR image.
//! - Turn scanned payload strings back into name/email pairs.

pub mod identity;
