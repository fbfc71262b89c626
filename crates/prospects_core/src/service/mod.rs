//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod contact_store;
pub mod email_policy;
pub mod profile_service;
pub mod prospects_service;
pub mod selection;
