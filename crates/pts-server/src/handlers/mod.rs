//! Route handlers, one module per resource.

pub mod accounts;
pub mod admin;
pub mod export;
pub mod messages;
pub mod requests;
pub mod terminal;
