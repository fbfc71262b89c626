//! Transient listing view state: filter and sort descriptors.
//!
//! # Invariants
//! - Neither type is persisted.
//! - Sort keys apply in order; remaining ties fall back to insertion order.

use serde::{Deserialize, Serialize};

/// Which contacts a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactFilter {
    #[default]
    All,
    ContactedOnly,
    UncontactedOnly,
}

impl ContactFilter {
    /// Required `is_contacted` value, or `None` when everything passes.
    pub fn contacted_flag(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::ContactedOnly => Some(true),
            Self::UncontactedOnly => Some(false),
        }
    }

    /// Listing title shown for this filter.
    pub fn title(self) -> &'static str {
        match self {
            Self::All => "Everyone",
            Self::ContactedOnly => "Contacted people",
            Self::UncontactedOnly => "Uncontacted people",
        }
    }
}

/// Sortable contact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    CreatedAt,
}

/// One sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub ascending: bool,
}

impl SortKey {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            ascending: false,
        }
    }
}

/// Ordered list of sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// "Sort by Name": `[name, created_at]`, both ascending.
    pub fn by_name() -> Self {
        Self::new(vec![
            SortKey::ascending(SortField::Name),
            SortKey::ascending(SortField::CreatedAt),
        ])
    }

    /// "Sort by Date": `[created_at, name]`, both ascending.
    pub fn by_date() -> Self {
        Self::new(vec![
            SortKey::ascending(SortField::CreatedAt),
            SortKey::ascending(SortField::Name),
        ])
    }

    /// Builds a spec from explicit keys. Repeated fields after the first are ignored.
    pub fn new(keys: Vec<SortKey>) -> Self {
        let mut deduped: Vec<SortKey> = Vec::with_capacity(keys.len());
        for key in keys {
            if !deduped.iter().any(|existing| existing.field == key.field) {
                deduped.push(key);
            }
        }
        Self { keys: deduped }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::by_name()
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactFilter, SortField, SortKey, SortSpec};

    #[test]
    fn presets_have_expected_key_order() {
        let by_name = SortSpec::by_name();
        assert_eq!(by_name.keys()[0].field, SortField::Name);
        assert_eq!(by_name.keys()[1].field, SortField::CreatedAt);

        let by_date = SortSpec::by_date();
        assert_eq!(by_date.keys()[0].field, SortField::CreatedAt);
        assert_eq!(by_date.keys()[1].field, SortField::Name);
    }

    #[test]
    fn new_drops_repeated_fields() {
        let spec = SortSpec::new(vec![
            SortKey::descending(SortField::Name),
            SortKey::ascending(SortField::Name),
        ]);
        assert_eq!(spec.keys(), &[SortKey::descending(SortField::Name)]);
    }

    #[test]
    fn filter_maps_to_flag_and_title() {
        assert_eq!(ContactFilter::All.contacted_flag(), None);
        assert_eq!(ContactFilter::ContactedOnly.contacted_flag(), Some(true));
        assert_eq!(ContactFilter::UncontactedOnly.contacted_flag(), Some(false));
        assert_eq!(ContactFilter::All.title(), "Everyone");
    }
}
