use serde::Serialize;

use protobridge_back::BackendDataBuilder;
use protobridge_core::filter::{filter_package, FilterCriteria};
use protobridge_core::model::PackageInfo;
use protobridge_core::{
    BuildContext, BuildResult, Config, ConfigError, NamespaceMode, SchemaGraph,
};
use protobridge_front::{ScriptDataBuilder, ScriptTemplateData};

use crate::plan::{self, FilePlanner};
use crate::GeneratedFileSet;

// package-wide fields every script file is rendered with
#[derive(Serialize)]
struct ScriptFileView<'a, T: Serialize> {
    package: &'a PackageInfo,
    module_name: &'a str,
    namespace: &'a str,
    namespace_mode: NamespaceMode,
    file: &'a T,
}

impl<'a, T: Serialize> ScriptFileView<'a, T> {
    fn new(script: &'a ScriptTemplateData, file: &'a T) -> Self {
        Self {
            package: &script.package,
            module_name: &script.module_name,
            namespace: &script.namespace,
            namespace_mode: script.namespace_mode,
            file,
        }
    }
}

/// Runs filtering, both builders and planning for each package
pub struct Generator<'g> {
    graph: &'g SchemaGraph,
    config: &'g Config,
    criteria: FilterCriteria,
}

impl<'g> Generator<'g> {
    /// Generator over `graph`, failing on invalid filter patterns
    pub fn new(graph: &'g SchemaGraph, config: &'g Config) -> Result<Self, ConfigError> {
        Ok(Self {
            graph,
            config,
            criteria: FilterCriteria::from_config(config)?,
        })
    }

    /// Validated file set of one package, `None` when neither target has anything to emit.
    ///
    /// The plan comes from the filtered package; the builders' data must then cover every
    /// required file of it.
    pub fn generate_package(&self, package: &str) -> BuildResult<Option<GeneratedFileSet>> {
        let filtered = filter_package(self.graph, &self.criteria, self.config, package)?;
        let file_plan = FilePlanner::new(self.graph, self.config).plan(&filtered);
        if file_plan.specs.is_empty() {
            log::warn!("Package {} produces no output", package);
            return Ok(None);
        }

        // each target gets its own context, imports never leak between them
        let backend = {
            let mut ctx = BuildContext::new(self.config);
            BackendDataBuilder::new(self.graph).build(&mut ctx, &filtered)?
        };
        let script = {
            let mut ctx = BuildContext::new(self.config);
            ScriptDataBuilder::new(self.graph).build(&mut ctx, &filtered)?
        };

        let mut files = GeneratedFileSet::from_plan(file_plan);
        if let Some(backend) = &backend {
            files.attach(plan::BACKEND_EXPORTS, backend)?;
            if self.config.generate_build_script {
                files.attach(plan::BUILD_SCRIPT, backend)?;
            }
        }
        for client in &script.clients {
            let view = ScriptFileView::new(&script, client);
            files.attach(&plan::client_name(&client.service.name), &view)?;
        }
        for client in &script.browser_services {
            let view = ScriptFileView::new(&script, client);
            files.attach(&plan::browser_name(&client.service.name), &view)?;
        }
        for types in &script.type_files {
            let view = ScriptFileView::new(&script, types);
            files.attach(&plan::types_name(&types.source_file), &view)?;
        }
        if let Some(factory) = &script.factory {
            files.attach(plan::FACTORY, &ScriptFileView::new(&script, factory))?;
        }
        if let Some(schema) = &script.schema {
            files.attach(plan::SCHEMAS, &ScriptFileView::new(&script, schema))?;
        }
        if let Some(aggregator) = &script.aggregator {
            files.attach(plan::AGGREGATOR, &ScriptFileView::new(&script, aggregator))?;
        }

        files.validate()?;
        log::info!("Package {}: {} files planned", package, files.plan().specs.len());
        Ok(Some(files))
    }

    /// File sets of every package in `packages`, stopping at the first failure.
    ///
    /// Packages are independent and built one after another.
    pub fn generate_all<'p>(
        &self,
        packages: impl IntoIterator<Item = &'p str>,
    ) -> BuildResult<Vec<GeneratedFileSet>> {
        let mut sets = Vec::new();
        for package in packages {
            if let Some(files) = self.generate_package(package)? {
                sets.push(files);
            }
        }
        log::info!("Generated {} packages", sets.len());
        Ok(sets)
    }
}
