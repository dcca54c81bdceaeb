//! Front-end template data for TypeScript clients, types, factories and schemas.
//! The generated code runs in the browser and talks to the WASM back-end.
//!
//! The script target splits a package into many files: one client per service, one type file
//! per proto file, plus a factory, a schema registry and an `index` aggregating them. Every record
//! produced here is fully resolved, including import paths relative to the package directory.
//!
#![warn(missing_docs)]

mod builder;
mod data;
mod factory;
mod schema;
mod types;

pub use builder::ScriptDataBuilder;
pub use data::{ClientData, ImportGroup, ImportGroups, ScriptTemplateData, TypeFileData};
pub use factory::{
    deserializer_class_name, factory_class_name, DeserializerData, FactoryData, FactoryDependency,
    FactoryEntry, FactorySource, FieldFactory,
};
pub use schema::{
    FieldSchema, MessageSchema, RegistryImport, SchemaAggregatorData, SchemaRegistryData,
};

/// Appended to a proto file stem to name its type file, `cart.proto` becomes `cart_interfaces`
pub const TYPES_SUFFIX: &str = "_interfaces";
/// Appended to a service name to name its client file
pub const CLIENT_SUFFIX: &str = "_client";
/// Appended to a service name to name its browser implementation file
pub const BROWSER_SUFFIX: &str = "_browser";
/// Module of a package's factory
pub const FACTORY_MODULE: &str = "factory";
/// Module of a package's schema registry
pub const SCHEMAS_MODULE: &str = "schemas";
/// Module re-exporting a package
pub const INDEX_MODULE: &str = "index";

/// protobridge-core re-export
pub mod core {
    pub use protobridge_core::*;
}
