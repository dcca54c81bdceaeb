use std::collections::BTreeMap;

use glob::Pattern;
use prost_types::{MethodDescriptorProto, ServiceDescriptorProto};

use crate::{Config, ConfigError};

/// Outcome of filtering one service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDecision {
    /// Service is generated
    pub include: bool,
    /// Service is implemented by the browser
    pub is_browser_provided: bool,
    /// Script-side name override
    pub custom_name: Option<String>,
}

/// Outcome of filtering one method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodDecision {
    /// Method is generated
    pub include: bool,
    /// Script-side name override
    pub custom_name: Option<String>,
    /// Exposed as async on the script side
    pub is_async: bool,
    /// Responses are streamed
    pub is_server_streaming: bool,
}

/// Compiled inclusion rules.
///
/// Service patterns match the simple or the fully-qualified service name. Method patterns match
/// `Method`, `Service.Method` or `pkg.Service.Method`.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    services: Vec<Pattern>,
    methods_include: Vec<Pattern>,
    methods_exclude: Vec<Pattern>,
    browser_services: Vec<Pattern>,
    async_methods: Vec<Pattern>,
    custom_names: BTreeMap<String, String>,
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], candidates: &[&str]) -> bool {
    patterns
        .iter()
        .any(|pattern| candidates.iter().any(|candidate| pattern.matches(candidate)))
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", package, name)
    }
}

impl FilterCriteria {
    /// Compile the filter lists of `config`
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            services: compile(&config.services)?,
            methods_include: compile(&config.methods_include)?,
            methods_exclude: compile(&config.methods_exclude)?,
            browser_services: compile(&config.browser_services)?,
            async_methods: compile(&config.async_methods)?,
            custom_names: config
                .custom_names
                .iter()
                .map(|(fq_name, name)| {
                    (fq_name.trim_start_matches('.').to_owned(), name.clone())
                })
                .collect(),
        })
    }

    /// Decide on a service of `package`
    pub fn service(&self, package: &str, service: &ServiceDescriptorProto) -> ServiceDecision {
        let fq_name = qualify(package, service.name());
        let candidates = [service.name(), fq_name.as_str()];
        let is_browser_provided = matches_any(&self.browser_services, &candidates);
        ServiceDecision {
            include: self.services.is_empty()
                || is_browser_provided
                || matches_any(&self.services, &candidates),
            is_browser_provided,
            custom_name: self.custom_names.get(&fq_name).cloned(),
        }
    }

    /// Decide on a method of `service` in `package`
    pub fn method(
        &self,
        package: &str,
        service: &ServiceDescriptorProto,
        method: &MethodDescriptorProto,
    ) -> MethodDecision {
        let scoped = format!("{}.{}", service.name(), method.name());
        let fq_name = qualify(package, &scoped);
        let candidates = [method.name(), scoped.as_str(), fq_name.as_str()];
        let include = !method.client_streaming()
            && (self.methods_include.is_empty() || matches_any(&self.methods_include, &candidates))
            && !matches_any(&self.methods_exclude, &candidates);
        MethodDecision {
            include,
            custom_name: self.custom_names.get(&fq_name).cloned(),
            is_async: matches_any(&self.async_methods, &candidates),
            is_server_streaming: method.server_streaming(),
        }
    }
}
