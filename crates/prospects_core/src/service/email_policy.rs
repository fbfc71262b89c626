//! Pluggable email acceptance policies.
//!
//! The default policy only requires a non-empty value so permissive test
//! data and scanned codes keep working; stricter checks are opt-in.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BASIC_EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid basic email regex")
});

/// Email acceptance strategy applied by the contact store on insert/edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailPolicy {
    /// Accept any non-empty value.
    #[default]
    Permissive,
    /// Require a `local@domain.tld` shape without whitespace.
    BasicSyntax,
}

impl EmailPolicy {
    /// Returns whether `email` (already known to be non-empty) is acceptable.
    pub fn accepts(self, email: &str) -> bool {
        match self {
            Self::Permissive => true,
            Self::BasicSyntax => BASIC_EMAIL_RE.is_match(email.trim()),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::BasicSyntax => "basic_syntax",
        }
    }
}
