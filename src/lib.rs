pub mod api;
pub mod client;
pub mod config;
pub mod db;

pub use upcount_core::{format, models, state, validate};
