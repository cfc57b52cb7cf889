//! Core types and rules for the mental-health survey warehouse.
//!
//! This crate is deliberately free of database and file-system dependencies.
//! The store and pipeline crates depend on it; it depends on nothing of
//! theirs.

pub mod category;
pub mod clean;
pub mod dimension;
pub mod error;
pub mod fact;
pub mod record;
pub mod store;
pub mod time;

pub use error::{Error, Result};
