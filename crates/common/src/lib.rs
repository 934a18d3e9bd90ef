//! Common utilities for cardlab
//!
//! Shared code used across all cardlab crates.

pub mod error;

pub use error::{Error, Result};
