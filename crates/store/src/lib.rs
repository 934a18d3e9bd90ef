//! Remote tabular store client for cardlab
//!
//! The card hierarchy lives in a hosted PostgREST-style store. This crate
//! exposes a small `Store` trait (one page of one collection at a time) and
//! a `fetch_all` pagination loop on top of it. Rows come back as loose JSON
//! values; typing happens downstream at the hierarchy-resolution boundary.

mod client;
mod config;

pub use client::{fetch_all, RestStore, Store, DEFAULT_PAGE_SIZE};
pub use config::StoreConfig;
