//! Runtime schema registry and the package index.

use std::collections::BTreeMap;

use serde::Serialize;

use protobridge_core::model::{FieldKind, PackageInfo};
use protobridge_core::schema::TypeKind;
use protobridge_core::{naming, paths, BuildContext};

use crate::types::ResolvedMessage;
use crate::SCHEMAS_MODULE;

/// Wire description of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    /// Field name on the script side
    pub name: String,
    /// Schema name
    pub proto_name: String,
    /// Field number
    pub number: i32,
    /// Serialization kind
    pub kind: FieldKind,
    /// Fully-qualified message type, also set for maps with message values
    pub message_type: Option<String>,
    /// Repeated field
    pub repeated: bool,
    /// Real oneof group
    pub oneof_group: Option<String>,
    /// Key kind of a map
    pub map_key_kind: Option<FieldKind>,
    /// Value kind of a map
    pub map_value_kind: Option<FieldKind>,
}

/// Wire description of one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSchema {
    /// Fully-qualified schema name
    pub fq_name: String,
    /// Script type name
    pub type_name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldSchema>,
}

/// The schema registry of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaRegistryData {
    /// Package name
    pub package: String,
    /// Every rendered message
    pub messages: Vec<MessageSchema>,
}

/// Registry of another package the index pulls in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryImport {
    /// Package name
    pub package: String,
    /// Module specifier
    pub path: String,
    /// Import alias
    pub alias: String,
}

/// The `index` of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaAggregatorData {
    /// Modules of this package to re-export
    pub modules: Vec<String>,
    /// Registries of referenced packages, sorted by path
    pub registries: Vec<RegistryImport>,
}

pub(crate) fn build_registry(
    package: &PackageInfo,
    messages: &[ResolvedMessage],
) -> SchemaRegistryData {
    SchemaRegistryData {
        package: package.name.clone(),
        messages: messages
            .iter()
            .map(|message| MessageSchema {
                fq_name: message.info.fq_name.clone(),
                type_name: message.info.name.clone(),
                fields: message
                    .info
                    .fields
                    .iter()
                    .zip(&message.fields)
                    .map(|(field, refs)| {
                        let is_message = refs.well_known.is_some()
                            || refs.reference.map(|e| e.kind == TypeKind::Message).unwrap_or(false);
                        FieldSchema {
                            name: field.name.clone(),
                            proto_name: field.proto_name.clone(),
                            number: field.number,
                            kind: field.kind,
                            message_type: if is_message {
                                field.type_fq_name.clone()
                            } else {
                                None
                            },
                            repeated: field.is_repeated,
                            oneof_group: field.oneof_name.clone(),
                            map_key_kind: refs.map_kinds.map(|(key, _)| key),
                            map_value_kind: refs.map_kinds.map(|(_, value)| value),
                        }
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Index re-exporting `modules` and importing the registry of every other package whose messages
/// are referenced.
///
/// Enum-only packages have no registry, so enum references never add an import.
pub(crate) fn build_aggregator(
    ctx: &mut BuildContext,
    package: &PackageInfo,
    messages: &[ResolvedMessage],
    modules: Vec<String>,
) -> SchemaAggregatorData {
    let mut registries = BTreeMap::new();
    let referenced = messages
        .iter()
        .flat_map(|message| message.fields.iter().filter_map(|refs| refs.reference))
        .filter(|entry| entry.kind == TypeKind::Message && entry.package != package.name);
    for entry in referenced {
        let relative = paths::relative_path(&package.path, &entry.package);
        let path = paths::join_import(&relative, SCHEMAS_MODULE);
        if registries.contains_key(&path) {
            continue;
        }
        let alias = ctx.alias_for(&naming::package_to_path(&entry.package));
        registries.insert(
            path.clone(),
            RegistryImport {
                package: entry.package.clone(),
                path,
                alias,
            },
        );
    }
    SchemaAggregatorData {
        modules,
        registries: registries.into_values().collect(),
    }
}
