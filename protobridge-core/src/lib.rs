//! Datatypes and utilities shared by the back-end and front-end generators.
//! This contains the schema graph, naming and path conventions, and the template data model.
//!
//! Nothing in here performs I/O besides [config::Config::load]; every builder receives a
//! [context::BuildContext] that lives for exactly one package build.
#![warn(missing_docs)]

pub mod config;
pub mod context;
mod errors;
pub mod filter;
pub mod model;
pub mod naming;
pub mod paths;
pub mod schema;
pub mod well_known;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use config::{Config, NamespaceMode};
pub use context::{BuildContext, ImportMap};
pub use errors::{BuildError, BuildResult, ConfigError};
pub use schema::SchemaGraph;

/// Generation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Rust bindings compiled to WASM
    Backend,
    /// TypeScript running in the browser
    Script,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Backend => write!(f, "backend"),
            Self::Script => write!(f, "script"),
        }
    }
}
