//! HTTP handlers.
//!
//! Handlers own the mapping from service results to status codes. They never
//! talk to the store directly.

pub mod health;
pub mod songs;
