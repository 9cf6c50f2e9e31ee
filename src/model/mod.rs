//! Data models, split by where they are used.
//!
//! - [`api`]: what API callers send and receive.
//! - [`db`]: what is stored in the vote ledger and its neighbouring collections.
//! - [`common`]: types shared by both.
//! - [`mongodb`]: MongoDB helpers the storage layer builds on.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
