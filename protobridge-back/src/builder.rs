use serde::Serialize;

use protobridge_core::filter::{FilteredMethod, FilteredPackage, FilteredService};
use protobridge_core::model::{ImportInfo, MethodData, PackageInfo, ServiceData};
use protobridge_core::schema::backend_import_path;
use protobridge_core::{naming, BuildContext, BuildError, BuildResult, NamespaceMode, SchemaGraph};

/// Runtime helper crate every generated binding calls into
pub const RUNTIME_SUPPORT_IMPORT: &str = "protobridge_runtime";

const PROTOBUF_PACKAGE: &str = "google.protobuf";
const PROTOBUF_CRATE: &str = "::prost_types";

/// Everything the back-end renderer needs for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendTemplateData {
    /// Package metadata
    pub package: PackageInfo,
    /// Regular services with at least one method
    pub services: Vec<ServiceData>,
    /// Browser-provided services of every package, with at least one method
    pub browser_services: Vec<ServiceData>,
    /// Module name, shared by every package when overridden
    pub module_name: String,
    /// Namespace the bindings are exported under
    pub namespace: String,
    /// Imports, sorted by path
    pub imports: Vec<ImportInfo>,
    /// Whether `browser_services` is non-empty
    pub has_browser_services: bool,
    /// Emit a build script next to the bindings
    pub generate_build_script: bool,
}

/// Builds [BackendTemplateData] from a filtered package
pub struct BackendDataBuilder<'g> {
    graph: &'g SchemaGraph,
}

impl<'g> BackendDataBuilder<'g> {
    /// Builder resolving types against `graph`
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self { graph }
    }

    /// Template data of one package, `None` when no service of either kind survives.
    ///
    /// A service without methods has nothing to bind and is dropped from this target.
    pub fn build(
        &self,
        ctx: &mut BuildContext,
        filtered: &FilteredPackage,
    ) -> BuildResult<Option<BackendTemplateData>> {
        let config = ctx.config();
        let package = &filtered.package;

        let mut services = Vec::new();
        for service in filtered.services.iter().filter(|s| !s.is_browser_provided()) {
            if service.methods.is_empty() {
                log::debug!("Dropping {} from backend: no methods", service.fq_name);
                continue;
            }
            services.push(self.service_data(ctx, service)?);
        }

        let mut browser_services = Vec::new();
        for service in &filtered.browser_services {
            if service.methods.is_empty() {
                log::debug!(
                    "Dropping browser service {} from backend: no methods",
                    service.fq_name
                );
                continue;
            }
            browser_services.push(self.service_data(ctx, service)?);
        }

        if services.is_empty() && browser_services.is_empty() {
            log::debug!("No backend services for {}", package.name);
            return Ok(None);
        }

        ctx.alias_for(RUNTIME_SUPPORT_IMPORT);
        let module_name = naming::to_module_name(&package.name, &config.module_name);
        let namespace = match config.namespace_mode {
            NamespaceMode::Namespaced => package.name.clone(),
            NamespaceMode::Flat | NamespaceMode::ServiceBased => module_name.clone(),
        };
        Ok(Some(BackendTemplateData {
            package: package.clone(),
            has_browser_services: !browser_services.is_empty(),
            services,
            browser_services,
            module_name,
            namespace,
            imports: ctx.imports().imports(),
            generate_build_script: config.generate_build_script,
        }))
    }

    fn service_data(
        &self,
        ctx: &mut BuildContext,
        service: &FilteredService,
    ) -> BuildResult<ServiceData> {
        let package_path = backend_import_path(&ctx.config().backend_module_root, &service.package);
        let package_alias = ctx.alias_for(&package_path);
        let pascal = naming::to_pascal_case(service.name());
        let backend_name = if service.is_browser_provided() {
            format!("{}Client", pascal)
        } else {
            pascal
        };
        let methods = service
            .methods
            .iter()
            .map(|method| self.method_data(ctx, service, method))
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(ServiceData {
            name: service.name().to_owned(),
            fq_name: service.fq_name.clone(),
            backend_name,
            script_name: service
                .decision
                .custom_name
                .clone()
                .unwrap_or_else(|| service.name().to_owned()),
            package_path,
            package_alias,
            is_browser_provided: service.is_browser_provided(),
            custom_name: service.decision.custom_name.clone(),
            comment: service.comment.clone(),
            methods,
        })
    }

    fn method_data(
        &self,
        ctx: &mut BuildContext,
        service: &FilteredService,
        method: &FilteredMethod,
    ) -> BuildResult<MethodData> {
        let descriptor = method.descriptor;
        let fq_method = format!("{}.{}", service.fq_name, descriptor.name());
        Ok(MethodData {
            name: descriptor.name().to_owned(),
            script_name: method
                .decision
                .custom_name
                .clone()
                .unwrap_or_else(|| naming::to_camel_case(descriptor.name())),
            backend_name: naming::rust_ident(&naming::to_snake_case(descriptor.name())),
            request_fq_name: descriptor.input_type().trim_start_matches('.').to_owned(),
            response_fq_name: descriptor.output_type().trim_start_matches('.').to_owned(),
            request_type: self.resolve_type(ctx, &fq_method, descriptor.input_type())?,
            response_type: self.resolve_type(ctx, &fq_method, descriptor.output_type())?,
            is_async: method.decision.is_async,
            is_server_streaming: method.decision.is_server_streaming,
            should_generate: true,
            comment: method.comment.clone(),
        })
    }

    /// Rust path of a message, registering the import of its package
    fn resolve_type(
        &self,
        ctx: &mut BuildContext,
        fq_method: &str,
        type_name: &str,
    ) -> BuildResult<String> {
        let entry = self
            .graph
            .lookup(type_name)
            .ok_or_else(|| BuildError::UnresolvedMethodType {
                method: fq_method.to_owned(),
                type_name: type_name.to_owned(),
            })?;
        let type_path = naming::backend_type_path(&entry.parents, &entry.name);
        if entry.package == PROTOBUF_PACKAGE {
            return Ok(format!("{}::{}", PROTOBUF_CRATE, type_path));
        }
        let import_path = backend_import_path(&ctx.config().backend_module_root, &entry.package);
        let alias = ctx.alias_for(&import_path);
        Ok(format!("{}::{}", alias, type_path))
    }
}
