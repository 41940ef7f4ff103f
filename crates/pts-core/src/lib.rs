//! Core types and trait definitions for the PTS attendance ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::PtsStore`]; the HTTP layer drives the
//! [`ledger::AttendanceLedger`], [`desk::ApprovalDesk`] and
//! [`message::MessageBoard`] services.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod approval;
pub mod desk;
pub mod duration;
pub mod error;
pub mod event;
pub mod ledger;
pub mod message;
pub mod store;
pub mod subject;

pub use error::{Error, Result};

#[cfg(test)]
mod memory;
