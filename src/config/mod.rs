//! Configuration module for the wowlua build system
//!
//! Provides types, discovery and parsing for `wowlua.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
