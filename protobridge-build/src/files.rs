use std::collections::BTreeMap;

use serde::Serialize;

use protobridge_core::{BuildError, BuildResult, Target};

use crate::render::Renderer;
use crate::{FilePlan, FileSpec, FileType};

/// Where one logical file ends up
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputHandle {
    /// Path including the target output root
    pub path: String,
    /// Template data bound by the generator
    pub data: Option<serde_json::Value>,
    /// Rendered content
    pub content: Option<String>,
}

/// Every planned file of a package, bound to an output handle
#[derive(Debug, Clone)]
pub struct GeneratedFileSet {
    plan: FilePlan,
    handles: BTreeMap<String, OutputHandle>,
}

fn output_path(root: &str, filename: &str) -> String {
    let root = root.trim_end_matches('/');
    if root.is_empty() || root == "." {
        filename.to_owned()
    } else {
        format!("{}/{}", root, filename)
    }
}

impl GeneratedFileSet {
    /// Bind a handle to every file of `plan`
    pub fn from_plan(plan: FilePlan) -> Self {
        let handles = plan
            .specs
            .iter()
            .map(|spec| {
                let root = match spec.target {
                    Target::Backend => &plan.config.backend_out,
                    Target::Script => &plan.config.script_out,
                };
                (
                    spec.logical_name.clone(),
                    OutputHandle {
                        path: output_path(root, &spec.filename),
                        ..Default::default()
                    },
                )
            })
            .collect();
        Self { plan, handles }
    }

    /// Plan the set was made from
    pub fn plan(&self) -> &FilePlan {
        &self.plan
    }

    /// Handle of a logical file
    pub fn handle(&self, logical_name: &str) -> Option<&OutputHandle> {
        self.handles.get(logical_name)
    }

    /// Bind template data to a planned file
    pub fn attach<T: Serialize>(&mut self, logical_name: &str, data: &T) -> BuildResult<()> {
        let Some(handle) = self.handles.get_mut(logical_name) else {
            log::warn!("Ignoring data for unplanned file {}", logical_name);
            return Ok(());
        };
        let value = serde_json::to_value(data).map_err(|e| BuildError::Serialize {
            logical_name: logical_name.to_owned(),
            message: e.to_string(),
        })?;
        handle.data = Some(value);
        Ok(())
    }

    /// Fails with every required file that has no data
    pub fn validate(&self) -> BuildResult<()> {
        let missing: Vec<String> = self
            .required_files()
            .into_iter()
            .filter(|spec| {
                self.handles
                    .get(&spec.logical_name)
                    .map(|handle| handle.data.is_none() && handle.content.is_none())
                    .unwrap_or(true)
            })
            .map(|spec| spec.logical_name.clone())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BuildError::MissingFiles {
                package: self.plan.package.clone(),
                missing,
            })
        }
    }

    /// Files of one kind, in plan order
    pub fn files_by_type(&self, file_type: FileType) -> Vec<(&FileSpec, &OutputHandle)> {
        self.plan
            .specs
            .iter()
            .filter(|spec| spec.file_type == file_type)
            .filter_map(|spec| self.handles.get(&spec.logical_name).map(|handle| (spec, handle)))
            .collect()
    }

    /// Required files, in plan order
    pub fn required_files(&self) -> Vec<&FileSpec> {
        self.plan.specs.iter().filter(|spec| spec.required).collect()
    }

    /// Validate, then render every file that has data
    pub fn render_with(&mut self, renderer: &mut dyn Renderer) -> BuildResult<()> {
        self.validate()?;
        for spec in &self.plan.specs {
            let Some(handle) = self.handles.get_mut(&spec.logical_name) else {
                continue;
            };
            let Some(data) = &handle.data else {
                continue;
            };
            let content = renderer.render(spec, data).map_err(|e| BuildError::Render {
                logical_name: spec.logical_name.clone(),
                message: e.to_string(),
            })?;
            handle.content = Some(content);
        }
        Ok(())
    }

    /// Rendered files as `(path, content)`, in plan order
    pub fn outputs(&self) -> Vec<(&str, &str)> {
        self.plan
            .specs
            .iter()
            .filter_map(|spec| self.handles.get(&spec.logical_name))
            .filter_map(|handle| Some((handle.path.as_str(), handle.content.as_deref()?)))
            .collect()
    }
}
