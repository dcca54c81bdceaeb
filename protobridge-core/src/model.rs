//! Template data shared by both targets.
//!
//! Everything in here is fully resolved: renderers substitute text and never compute names,
//! types or import paths.

use serde::Serialize;

/// One schema package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    /// Dotted package name, `a.b.v1`
    pub name: String,
    /// Directory of the package, `a/b/v1`
    pub path: String,
    /// Rust module path of the package on the backend target
    pub backend_import_path: String,
    /// Some file of the package declares a service
    pub has_services: bool,
    /// Some file of the package declares a message (map entries excluded)
    pub has_messages: bool,
    /// Some file of the package declares an enum
    pub has_enums: bool,
}

/// A service ready for rendering on one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceData {
    /// Schema name
    pub name: String,
    /// Fully-qualified schema name
    pub fq_name: String,
    /// Type name on the backend target
    pub backend_name: String,
    /// Name on the script target, the custom name when one is set
    pub script_name: String,
    /// Directory of the defining package
    pub package_path: String,
    /// Identifier of the defining package on this target
    pub package_alias: String,
    /// Implemented by the browser and called from the backend
    pub is_browser_provided: bool,
    /// Script name override
    pub custom_name: Option<String>,
    /// Leading comment
    pub comment: String,
    /// Methods that passed filtering, in declaration order
    pub methods: Vec<MethodData>,
}

/// A method ready for rendering on one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodData {
    /// Schema name
    pub name: String,
    /// Name on the script target
    pub script_name: String,
    /// Function name on the backend target
    pub backend_name: String,
    /// Fully-qualified request type
    pub request_fq_name: String,
    /// Fully-qualified response type
    pub response_fq_name: String,
    /// Request type as written on this target
    pub request_type: String,
    /// Response type as written on this target
    pub response_type: String,
    /// Exposed as async on the script side
    pub is_async: bool,
    /// Responses are streamed back through a callback
    pub is_server_streaming: bool,
    /// Always true, filtered-out methods are never materialized
    pub should_generate: bool,
    /// Leading comment
    pub comment: String,
}

/// Serialization kind of a field, shared by types, factories and schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Text
    String,
    /// Any 32-bit numeric or floating point
    Number,
    /// 64-bit integer, carried as text
    Int64,
    /// Boolean
    Boolean,
    /// Raw bytes
    Bytes,
    /// Enum value
    Enum,
    /// Nested message
    Message,
    /// Map of key to value
    Map,
}

/// A message field enriched for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    /// Name on the target
    pub name: String,
    /// Schema name
    pub proto_name: String,
    /// Field number
    pub number: i32,
    /// Serialization kind
    pub kind: FieldKind,
    /// Resolved target type
    pub target_type: String,
    /// Default value expression on the target
    pub default_value: String,
    /// Repeated (maps are not)
    pub is_repeated: bool,
    /// Explicit presence (`optional` in proto3)
    pub is_optional: bool,
    /// Member of a real oneof
    pub is_oneof: bool,
    /// Oneof group the field belongs to
    pub oneof_name: Option<String>,
    /// Map field
    pub is_map: bool,
    /// Resolved key type of a map
    pub map_key_type: Option<String>,
    /// Resolved value type of a map
    pub map_value_type: Option<String>,
    /// Fully-qualified name of the referenced message or enum, for map fields the value type
    pub type_fq_name: Option<String>,
    /// Package declaring the referenced type
    pub type_package: Option<String>,
    /// Referenced type is a well-known type with a native mapping
    pub is_well_known: bool,
    /// Leading comment
    pub comment: String,
}

/// A message enriched for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageInfo {
    /// Name on the target, nested types flattened
    pub name: String,
    /// Schema name
    pub proto_name: String,
    /// Owning package
    pub package: String,
    /// Fully-qualified schema name
    pub fq_name: String,
    /// Declaring proto file
    pub source_file: String,
    /// Declared inside another message
    pub is_nested: bool,
    /// Leading comment
    pub comment: String,
    /// Fields in declaration order
    pub fields: Vec<FieldInfo>,
    /// Real oneof groups in declaration order
    pub oneofs: Vec<String>,
}

/// One enum value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueInfo {
    /// Value name
    pub name: String,
    /// Value number
    pub number: i32,
    /// Leading comment
    pub comment: String,
}

/// An enum enriched for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumInfo {
    /// Name on the target, nested types flattened
    pub name: String,
    /// Schema name
    pub proto_name: String,
    /// Owning package
    pub package: String,
    /// Fully-qualified schema name
    pub fq_name: String,
    /// Declaring proto file
    pub source_file: String,
    /// Declared inside a message
    pub is_nested: bool,
    /// Leading comment
    pub comment: String,
    /// Values in declaration order
    pub values: Vec<EnumValueInfo>,
}

/// An import path and its alias
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ImportInfo {
    /// Import path
    pub path: String,
    /// Alias unique within one build
    pub alias: String,
}
