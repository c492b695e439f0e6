//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: display helpers (title truncation)

pub mod error;
pub mod string;
