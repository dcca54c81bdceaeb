//! Factories construct default messages, deserializers turn wire objects back into them.
//!
//! Generated code must never look a constructor up by concatenating `"new" + name`. Every
//! message-typed field is bound to an explicit [FactorySource], and [FactoryData::dispatch] maps
//! each fully-qualified type to its constructor.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use protobridge_core::model::PackageInfo;
use protobridge_core::schema::TypeKind;
use protobridge_core::well_known::SCRIPT_RUNTIME_MODULE;
use protobridge_core::{naming, paths};

use crate::data::{ImportGroup, ImportGroups};
use crate::types::{script_type_name, ResolvedMessage, TypeResolver};
use crate::FACTORY_MODULE;

/// Where the constructor of a nested message comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactorySource {
    /// Method of this package's factory
    Local {
        /// Constructor method
        method: String,
    },
    /// Method of another package's factory
    Dependency {
        /// Package owning the factory
        package: String,
        /// Factory class of that package
        class_name: String,
        /// Constructor method
        method: String,
    },
}

/// How one field is initialised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFactory {
    /// Field name on the script side
    pub name: String,
    /// Constructor of the message value, `None` for scalars and enums
    pub source: Option<FactorySource>,
    /// Repeated field
    pub is_repeated: bool,
    /// Map field, `source` then builds the values
    pub is_map: bool,
    /// Runtime converter of a well-known type
    pub deserialize_fn: Option<String>,
}

/// Constructor of one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryEntry {
    /// Script type name
    pub type_name: String,
    /// Fully-qualified schema name
    pub fq_name: String,
    /// Constructor method, `new<TypeName>`
    pub method: String,
    /// Fields in declaration order
    pub fields: Vec<FieldFactory>,
}

/// Factory of another package this one calls into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryDependency {
    /// Package owning the factory
    pub package: String,
    /// Factory class
    pub class_name: String,
    /// Module specifier
    pub path: String,
}

/// Deserializer class of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeserializerData {
    /// Class name
    pub class_name: String,
    /// Factory the deserializer builds defaults with
    pub factory_class: String,
    /// Fully-qualified names of every message it handles
    pub message_types: Vec<String>,
}

/// The factory file of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryData {
    /// Factory class name
    pub class_name: String,
    /// One constructor per message
    pub entries: Vec<FactoryEntry>,
    /// Fully-qualified type name to constructor method
    pub dispatch: BTreeMap<String, String>,
    /// Factories of other packages, sorted by path
    pub dependencies: Vec<FactoryDependency>,
    /// Message types, sorted by path
    pub type_imports: Vec<ImportGroup>,
    /// Converters imported from the runtime module
    pub runtime_imports: Vec<String>,
    /// Module the converters come from
    pub runtime_module: String,
    /// Deserializer of the same package
    pub deserializer: DeserializerData,
}

impl FactoryData {
    /// Constructor of a fully-qualified type, a leading dot is accepted
    pub fn constructor(&self, fq_name: &str) -> Option<&FactoryEntry> {
        let fq_name = fq_name.strip_prefix('.').unwrap_or(fq_name);
        let method = self.dispatch.get(fq_name)?;
        self.entries.iter().find(|entry| &entry.method == method)
    }
}

/// Factory class of a package, `shop.v1` becomes `ShopV1Factory`
pub fn factory_class_name(package: &str) -> String {
    format!("{}Factory", naming::to_pascal_case(package))
}

/// Deserializer class of a package, `shop.v1` becomes `ShopV1Deserializer`
pub fn deserializer_class_name(package: &str) -> String {
    format!("{}Deserializer", naming::to_pascal_case(package))
}

fn constructor_method(type_name: &str) -> String {
    format!("new{}", type_name)
}

/// Factory of `package`, `None` when it declares no messages
pub(crate) fn build_factory(
    resolver: &TypeResolver,
    package: &PackageInfo,
    messages: &[ResolvedMessage],
) -> Option<FactoryData> {
    if messages.is_empty() {
        return None;
    }
    let class_name = factory_class_name(&package.name);
    let mut entries = Vec::with_capacity(messages.len());
    let mut dispatch = BTreeMap::new();
    let mut dependencies = BTreeMap::new();
    let mut type_imports = ImportGroups::new();
    let mut runtime_imports = BTreeSet::new();

    for message in messages {
        type_imports.add(resolver.import_path(message.entry), message.info.name.clone());
        let method = constructor_method(&message.info.name);
        let fields = message
            .info
            .fields
            .iter()
            .zip(&message.fields)
            .map(|(field, refs)| {
                let source = refs
                    .reference
                    .filter(|entry| entry.kind == TypeKind::Message)
                    .map(|entry| {
                        let method = constructor_method(&script_type_name(entry));
                        if entry.package == package.name {
                            FactorySource::Local { method }
                        } else {
                            let class_name = factory_class_name(&entry.package);
                            let relative = paths::relative_path(&package.path, &entry.package);
                            let path = paths::join_import(&relative, FACTORY_MODULE);
                            dependencies
                                .entry(path.clone())
                                .or_insert_with(|| FactoryDependency {
                                    package: entry.package.clone(),
                                    class_name: class_name.clone(),
                                    path,
                                });
                            FactorySource::Dependency {
                                package: entry.package.clone(),
                                class_name,
                                method,
                            }
                        }
                    });
                if let Some(wkt) = refs.well_known {
                    runtime_imports.insert(wkt.script.serialize_fn.to_owned());
                    runtime_imports.insert(wkt.script.deserialize_fn.to_owned());
                }
                FieldFactory {
                    name: field.name.clone(),
                    source,
                    is_repeated: field.is_repeated,
                    is_map: field.is_map,
                    deserialize_fn: refs.well_known.map(|wkt| wkt.script.deserialize_fn.to_owned()),
                }
            })
            .collect();
        dispatch.insert(message.info.fq_name.clone(), method.clone());
        entries.push(FactoryEntry {
            type_name: message.info.name.clone(),
            fq_name: message.info.fq_name.clone(),
            method,
            fields,
        });
    }

    Some(FactoryData {
        deserializer: DeserializerData {
            class_name: deserializer_class_name(&package.name),
            factory_class: class_name.clone(),
            message_types: entries.iter().map(|entry| entry.fq_name.clone()).collect(),
        },
        class_name,
        entries,
        dispatch,
        dependencies: dependencies.into_values().collect(),
        type_imports: type_imports.into_groups(),
        runtime_imports: runtime_imports.into_iter().collect(),
        runtime_module: SCRIPT_RUNTIME_MODULE.to_owned(),
    })
}
