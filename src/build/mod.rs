//! Build pipeline module for wowlua
//!
//! Turns a tree of add-on and library Lua sources into one manifest pair plus
//! emitted sources per game version.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Discovery**: Find `.lua` files below the source and library roots
//! - **Preparation**: Preprocess and analyze every file once
//! - **Per target**: Resolve the dependency order, report unknown globals
//!   and assemble the `.toc`/`.xml` pair
//!
//! # Example
//!
//! ```ignore
//! use wowlua::build::{BuildContext, BuildPipeline};
//! use wowlua::config::load_config;
//!
//! let config = load_config(None)?;
//! let context = BuildContext::new(config, project_root);
//! let mut pipeline = BuildPipeline::new(context);
//!
//! let result = pipeline.build()?;
//! println!("{}", result.summary());
//! ```

pub mod assemble;
pub mod context;
pub mod diagnostics;
pub mod discovery;
pub mod graph;
pub mod pipeline;
pub mod result;
pub mod target;

pub use assemble::*;
pub use context::*;
pub use diagnostics::*;
pub use discovery::*;
pub use graph::*;
pub use pipeline::*;
pub use result::*;
pub use target::*;
