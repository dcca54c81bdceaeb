use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use protobridge_core::model::{EnumInfo, MessageInfo, PackageInfo, ServiceData};
use protobridge_core::{paths, NamespaceMode};

use crate::factory::FactoryData;
use crate::schema::{SchemaAggregatorData, SchemaRegistryData};
use crate::TYPES_SUFFIX;

/// Types imported from one module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportGroup {
    /// Module specifier
    pub path: String,
    /// Imported names, sorted
    pub types: Vec<String>,
    /// Local name of every import that would clash with another name of the file
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

/// Accumulates the imports of one generated file.
///
/// Every imported type gets a local name unique within the file: the type name itself, or,
/// when that is already declared or imported from another module, the name prefixed with the
/// last directory of the module (`c_Widget`, then `c_Widget_2`). The result is sorted by path,
/// then by type name.
#[derive(Debug, Clone, Default)]
pub struct ImportGroups {
    groups: BTreeMap<String, BTreeMap<String, String>>,
    taken: BTreeSet<String>,
}

impl ImportGroups {
    /// Empty set of groups
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name as declared by the file itself
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Import `type_name` from `path` and return its local name, duplicates are ignored
    pub fn add(&mut self, path: impl Into<String>, type_name: impl Into<String>) -> String {
        let path = path.into();
        let type_name = type_name.into();
        if let Some(local) = self.groups.get(&path).and_then(|group| group.get(&type_name)) {
            return local.clone();
        }
        let local = if self.taken.contains(&type_name) {
            let base = format!("{}_{}", module_qualifier(&path), type_name);
            let mut local = base.clone();
            let mut counter = 2;
            while self.taken.contains(&local) {
                local = format!("{}_{}", base, counter);
                counter += 1;
            }
            local
        } else {
            type_name.clone()
        };
        self.taken.insert(local.clone());
        self.groups
            .entry(path)
            .or_default()
            .insert(type_name, local.clone());
        local
    }

    /// Whether nothing was added
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sorted groups
    pub fn into_groups(self) -> Vec<ImportGroup> {
        self.groups
            .into_iter()
            .map(|(path, names)| ImportGroup {
                path,
                types: names.keys().cloned().collect(),
                aliases: names
                    .into_iter()
                    .filter(|(name, local)| name != local)
                    .collect(),
            })
            .collect()
    }
}

// `../d/models_interfaces` gives `d`, `./other_interfaces` gives `other`
fn module_qualifier(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();
    let qualifier = match segments.as_slice() {
        [.., directory, _] => *directory,
        [module] => module.strip_suffix(TYPES_SUFFIX).unwrap_or(*module),
        [] => path,
    };
    paths::alias_base(qualifier)
}

/// One client file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientData {
    /// Service and its methods, possibly none
    pub service: ServiceData,
    /// File name without extension
    pub file_stem: String,
    /// Key of the service under the module namespace, `service_based` mode only
    pub namespace_key: Option<String>,
    /// Request and response types, relative to the package directory
    pub imports: Vec<ImportGroup>,
}

/// One type file, generated from one proto file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeFileData {
    /// Proto file the types are declared in
    pub source_file: String,
    /// File name without extension
    pub file_stem: String,
    /// Messages, map entries excluded, nested ones flattened
    pub messages: Vec<MessageInfo>,
    /// Enums, nested ones flattened
    pub enums: Vec<EnumInfo>,
    /// Types declared by other files
    pub imports: Vec<ImportGroup>,
}

/// Everything the script renderers need for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptTemplateData {
    /// Package metadata
    pub package: PackageInfo,
    /// Module name, shared by every package when overridden
    pub module_name: String,
    /// Namespace the clients are attached to
    pub namespace: String,
    /// Namespace structuring
    pub namespace_mode: NamespaceMode,
    /// Regular services, zero-method ones included
    pub clients: Vec<ClientData>,
    /// Browser-provided services declared by this package, zero-method ones included
    pub browser_services: Vec<ClientData>,
    /// Type files, in descriptor set order
    pub type_files: Vec<TypeFileData>,
    /// Factory and deserializer, when the package has messages
    pub factory: Option<FactoryData>,
    /// Schema registry, when the package has messages
    pub schema: Option<SchemaRegistryData>,
    /// Package index, when the package has messages
    pub aggregator: Option<SchemaAggregatorData>,
}

impl ScriptTemplateData {
    /// Whether there is nothing to emit
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
            && self.browser_services.is_empty()
            && self.type_files.is_empty()
            && self.factory.is_none()
            && self.schema.is_none()
    }
}
