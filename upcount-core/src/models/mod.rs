//! Domain models for UpCount.
//!
//! # Core Concepts
//!
//! - [`User`]: An account, keyed by `userId`.
//! - [`Goal`]: A target a user works towards, keyed by `goalId` within its owner.
//!   Progress is `currentValue` out of `targetValue`, measured in `unit`.
//! - [`Log`]: A single progress entry recorded against a goal, keyed by `logId`
//!   within its goal. `userId` is denormalized from the goal for owner queries.
//!
//! Entities reference each other by identifier only. No entity owns another's
//! lifecycle: removing a goal leaves its logs in place.
//!
//! Identifiers are opaque strings and timestamps are ISO-8601 strings, exactly
//! as they travel on the wire. Use [`crate::validate`] to promote an untyped
//! payload into one of these types.

mod goal;
mod log;
mod user;

pub use goal::*;
pub use log::*;
pub use user::*;
