//! File planning and per-package generation.
//!
//! For every package: filter, plan the files from the schema and configuration, build the back-end
//! and script template data each with its own [BuildContext](protobridge_core::BuildContext), bind
//! the data and validate.
//! Nothing is rendered until the whole file set of a package is known to be complete.
//!
#![warn(missing_docs)]

mod files;
mod generator;
pub mod plan;
mod render;

pub use files::{GeneratedFileSet, OutputHandle};
pub use generator::Generator;
pub use plan::{FilePlan, FilePlanner, FileSpec, FileType};
pub use render::{JsonRenderer, RenderError, Renderer};
