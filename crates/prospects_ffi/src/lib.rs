//! Flutter-facing bindings for the prospects core.

pub mod api;
