//! Back-end template data for WASM bindings.
//! The generated bindings are Rust compiled to WASM, with message types generated by prost.
//!
//! One package produces at most one [BackendTemplateData] record, consumed by the renderer of
//! `<package>_wasm.rs`.
//!
#![warn(missing_docs)]

mod builder;

pub use builder::{BackendDataBuilder, BackendTemplateData, RUNTIME_SUPPORT_IMPORT};

/// protobridge-core re-export
pub mod core {
    pub use protobridge_core::*;
}
