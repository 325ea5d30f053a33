//! vidrelay - split oversized videos and relay them to a chat channel
//!
//! This library crate exposes the core functionality for integration testing.

pub mod caption;
pub mod config;
pub mod error;
pub mod relay;
pub mod remote;
pub mod source;
pub mod split;
pub mod telegram;
pub mod upload;

pub use error::{Error, Result};
