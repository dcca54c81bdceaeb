//! File planning.
//!
//! Every output file has a stable logical name (`client:CartService`, `types:shop/v1/cart.proto`)
//! independent of its physical file name, so post-processing can batch files by kind without
//! knowing the layout.

use std::collections::BTreeMap;

use serde::Serialize;

use protobridge_core::filter::FilteredPackage;
use protobridge_core::{naming, Config, NamespaceMode, SchemaGraph, Target};
use protobridge_front::{
    factory_class_name, BROWSER_SUFFIX, CLIENT_SUFFIX, FACTORY_MODULE, INDEX_MODULE,
    SCHEMAS_MODULE, TYPES_SUFFIX,
};

/// Logical name of the back-end bindings
pub const BACKEND_EXPORTS: &str = "backend:exports";
/// Logical name of the back-end build script
pub const BUILD_SCRIPT: &str = "backend:build_script";
/// Logical name of the factory
pub const FACTORY: &str = "factory";
/// Logical name of the schema registry
pub const SCHEMAS: &str = "schemas";
/// Logical name of the package index
pub const AGGREGATOR: &str = "aggregator";

const BUILD_SCRIPT_FILE: &str = "build.sh";
const SCRIPT_EXTENSION: &str = "ts";

/// Logical name of the client of `service`
pub fn client_name(service: &str) -> String {
    format!("client:{}", service)
}

/// Logical name of the browser implementation of `service`
pub fn browser_name(service: &str) -> String {
    format!("browser:{}", service)
}

/// Logical name of the type file generated from `proto_file`
pub fn types_name(proto_file: &str) -> String {
    format!("types:{}", proto_file)
}

/// Kind of output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// WASM bindings of a package
    BackendExports,
    /// Build script of the bindings
    BuildScript,
    /// Client of one service
    Client,
    /// Browser implementation of one service
    BrowserService,
    /// Interfaces of one proto file
    Types,
    /// Factory and deserializer
    Factory,
    /// Schema registry
    SchemaRegistry,
    /// Package index
    SchemaAggregator,
}

/// One logical output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSpec {
    /// Stable name, independent of the physical file
    pub logical_name: String,
    /// Path relative to the output root of `target`
    pub filename: String,
    /// Kind of file
    pub file_type: FileType,
    /// Target the file belongs to
    pub target: Target,
    /// Validation fails when a required file gets no content
    pub required: bool,
    /// Extra information for renderers
    pub hints: BTreeMap<String, String>,
}

/// Ordered files of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlan {
    /// Package name
    pub package: String,
    /// Files, back-end first
    pub specs: Vec<FileSpec>,
    /// Configuration the plan was made with
    pub config: Config,
}

impl FilePlan {
    /// File by logical name
    pub fn spec(&self, logical_name: &str) -> Option<&FileSpec> {
        self.specs.iter().find(|spec| spec.logical_name == logical_name)
    }
}

/// Decides which files a package produces and where they go.
///
/// The plan is derived from the filtered package, the schema and the configuration alone, so a
/// builder that fails to produce a required artifact is caught by
/// [GeneratedFileSet::validate](crate::GeneratedFileSet::validate).
pub struct FilePlanner<'g> {
    graph: &'g SchemaGraph,
    config: &'g Config,
}

impl<'g> FilePlanner<'g> {
    /// Planner for one schema and configuration
    pub fn new(graph: &'g SchemaGraph, config: &'g Config) -> Self {
        Self { graph, config }
    }

    /// Plan the files of one filtered package
    pub fn plan(&self, filtered: &FilteredPackage) -> FilePlan {
        let config = self.config;
        let package = &filtered.package;
        let mut specs = Vec::new();
        let mut add = |logical_name: String,
                       file: String,
                       file_type: FileType,
                       target: Target,
                       required: bool,
                       hints: &[(&str, &str)]| {
            specs.push(FileSpec {
                logical_name,
                filename: in_package_dir(&package.path, &file),
                file_type,
                target,
                required,
                hints: hints
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                    .collect(),
            });
        };

        // zero-method services have nothing to bind on the back-end
        let has_backend = filtered
            .services
            .iter()
            .filter(|service| !service.is_browser_provided())
            .chain(&filtered.browser_services)
            .any(|service| !service.methods.is_empty());
        if has_backend {
            let module_name = naming::to_module_name(&package.name, &config.module_name);
            let namespace = match config.namespace_mode {
                NamespaceMode::Namespaced => package.name.as_str(),
                NamespaceMode::Flat | NamespaceMode::ServiceBased => module_name.as_str(),
            };
            add(
                BACKEND_EXPORTS.to_owned(),
                format!("{}_wasm.rs", package.name.replace('.', "_")),
                FileType::BackendExports,
                Target::Backend,
                true,
                &[("module_name", module_name.as_str()), ("namespace", namespace)],
            );
            if config.generate_build_script {
                add(
                    BUILD_SCRIPT.to_owned(),
                    BUILD_SCRIPT_FILE.to_owned(),
                    FileType::BuildScript,
                    Target::Backend,
                    false,
                    &[("module_name", module_name.as_str())],
                );
            }
        }

        if config.generate_clients {
            for service in &filtered.services {
                let service_snake = naming::to_snake_case(service.name());
                let (logical_name, suffix, file_type) = if service.is_browser_provided() {
                    (browser_name(service.name()), BROWSER_SUFFIX, FileType::BrowserService)
                } else {
                    (client_name(service.name()), CLIENT_SUFFIX, FileType::Client)
                };
                add(
                    logical_name,
                    script_file(&format!("{}{}", service_snake, suffix)),
                    file_type,
                    Target::Script,
                    true,
                    &[("service", service.fq_name.as_str())],
                );
            }
        }

        if config.generate_types {
            for (_, file) in self.graph.package_files(&package.name) {
                let source_file = file.name();
                let declares_types = filtered
                    .messages
                    .iter()
                    .filter(|message| !message.entry.is_map_entry)
                    .map(|message| message.entry)
                    .chain(filtered.enums.iter().map(|enumeration| enumeration.entry))
                    .any(|entry| entry.file == source_file);
                if !declares_types {
                    continue;
                }
                add(
                    types_name(source_file),
                    script_file(&format!("{}{}", naming::file_stem(source_file), TYPES_SUFFIX)),
                    FileType::Types,
                    Target::Script,
                    true,
                    &[("source_file", source_file)],
                );
            }
        }

        if package.has_messages {
            if config.generate_factories {
                add(
                    FACTORY.to_owned(),
                    script_file(FACTORY_MODULE),
                    FileType::Factory,
                    Target::Script,
                    true,
                    &[("class_name", factory_class_name(&package.name).as_str())],
                );
            }
            if config.generate_types {
                add(
                    SCHEMAS.to_owned(),
                    script_file(SCHEMAS_MODULE),
                    FileType::SchemaRegistry,
                    Target::Script,
                    true,
                    &[],
                );
                add(
                    AGGREGATOR.to_owned(),
                    script_file(INDEX_MODULE),
                    FileType::SchemaAggregator,
                    Target::Script,
                    true,
                    &[],
                );
            }
        }

        log::debug!("Planned {} files for {}", specs.len(), package.name);
        FilePlan {
            package: package.name.clone(),
            specs,
            config: config.clone(),
        }
    }
}

fn script_file(stem: &str) -> String {
    format!("{}.{}", stem, SCRIPT_EXTENSION)
}

fn in_package_dir(package_path: &str, file: &str) -> String {
    if package_path.is_empty() {
        file.to_owned()
    } else {
        format!("{}/{}", package_path, file)
    }
}
