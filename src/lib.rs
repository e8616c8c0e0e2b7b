//! wowlua - Build pipeline for World of Warcraft add-ons written in Lua
//!
//! This library provides functionality to:
//! - Preprocess annotated Lua sources (build variables, version flags and
//!   block macros, decorators)
//! - Find the globals each file declares and imports
//! - Order files by global usage and assemble per-version `.toc`/`.xml` output

pub mod analyze;
pub mod build;
pub mod cli;
pub mod config;
pub mod globals;
pub mod init;
pub mod lua;
pub mod preprocess;
pub mod source;
pub mod variable;
pub mod version;
pub mod watch;
