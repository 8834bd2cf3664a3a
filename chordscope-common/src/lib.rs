//! # Chordscope Common Library
//!
//! Shared code for the Chordscope front end service and its tooling:
//! - Error and result types
//! - TOML configuration model and loading
//! - Event types (ChordscopeEvent enum) and the EventBus
//! - Server-Sent Events helpers
//! - Human-readable durations
//! - Time utilities

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
