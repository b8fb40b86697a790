//! Core domain layer for UpCount: entity models, payload validation and the
//! pure state reducers that keep client-side collections consistent.
//!
//! Nothing in this crate performs I/O.

pub mod format;
pub mod models;
pub mod state;
pub mod validate;
