//! Library crate for userlist-manager.
//!
//! This crate exposes the building blocks of the tool:
//! - The user collection and its view state (`store`)
//! - Pure search/sort/page derivations (`query`)
//! - Seed data sources and the background loader (`loader`)
//! - Application state, key handling and config (`app`)
//! - Error and result types (`error`)
//! - UI rendering (`ui`)
//!
//! It is used by the `userlist-manager` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod app;
pub mod error;
pub mod loader;
pub mod query;
pub mod store;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
pub use loader::{JsonFileSource, StaticSource, UserSource};
pub use store::{LoadOutcome, SortField, SortOrder, User, UserDraft, UserPatch, UserStore};
