//! Inclusion decisions for services and methods, plus flat type collection.
//!
//! Builders never look at the raw service list themselves: they receive a [FilteredPackage]
//! where every service and method already passed [FilterCriteria].

mod collect;
mod criteria;

pub use collect::{collect_enums, collect_messages, CollectedEnum, CollectedMessage};
pub use criteria::{FilterCriteria, MethodDecision, ServiceDecision};

use prost_types::{MethodDescriptorProto, ServiceDescriptorProto};

use crate::model::PackageInfo;
use crate::schema::{FILE_SERVICE, SERVICE_METHOD};
use crate::{BuildError, BuildResult, Config, SchemaGraph};

/// A method that passed filtering
#[derive(Debug, Clone)]
pub struct FilteredMethod<'g> {
    /// Descriptor
    pub descriptor: &'g MethodDescriptorProto,
    /// Position in the service
    pub index: usize,
    /// Leading comment
    pub comment: String,
    /// Generation hints
    pub decision: MethodDecision,
}

/// A service that passed filtering, with only its surviving methods
#[derive(Debug, Clone)]
pub struct FilteredService<'g> {
    /// Package of the declaring file
    pub package: String,
    /// Fully-qualified name without leading dot
    pub fq_name: String,
    /// Descriptor
    pub descriptor: &'g ServiceDescriptorProto,
    /// Index of the declaring file
    pub file_index: usize,
    /// Position in the declaring file
    pub index: usize,
    /// Leading comment
    pub comment: String,
    /// Generation hints
    pub decision: ServiceDecision,
    /// Surviving methods, in declaration order, possibly none
    pub methods: Vec<FilteredMethod<'g>>,
}

impl FilteredService<'_> {
    /// Schema name
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Implemented by the browser
    pub fn is_browser_provided(&self) -> bool {
        self.decision.is_browser_provided
    }
}

/// Filtered view of one package
#[derive(Debug, Clone)]
pub struct FilteredPackage<'g> {
    /// Package metadata
    pub package: PackageInfo,
    /// Surviving services of this package, browser-provided ones included
    pub services: Vec<FilteredService<'g>>,
    /// Surviving browser-provided services of every package
    pub browser_services: Vec<FilteredService<'g>>,
    /// Messages of this package
    pub messages: Vec<CollectedMessage<'g>>,
    /// Enums of this package
    pub enums: Vec<CollectedEnum<'g>>,
}

/// Surviving services of `package`, in file then declaration order
pub fn package_services<'g>(
    graph: &'g SchemaGraph,
    criteria: &FilterCriteria,
    package: &str,
) -> Vec<FilteredService<'g>> {
    let mut services = Vec::new();
    for (file_index, file) in graph.package_files(package) {
        for (index, descriptor) in file.service.iter().enumerate() {
            let decision = criteria.service(package, descriptor);
            let fq_name = if package.is_empty() {
                descriptor.name().to_owned()
            } else {
                format!("{}.{}", package, descriptor.name())
            };
            if !decision.include {
                log::debug!("Service {} excluded", fq_name);
                continue;
            }
            let service_path = [FILE_SERVICE, index as i32];
            let mut methods = Vec::with_capacity(descriptor.method.len());
            for (method_index, method) in descriptor.method.iter().enumerate() {
                let method_decision = criteria.method(package, descriptor, method);
                if !method_decision.include {
                    log::debug!("Method {}.{} excluded", fq_name, method.name());
                    continue;
                }
                methods.push(FilteredMethod {
                    descriptor: method,
                    index: method_index,
                    comment: graph.comment(
                        file_index,
                        &[FILE_SERVICE, index as i32, SERVICE_METHOD, method_index as i32],
                    ),
                    decision: method_decision,
                });
            }
            services.push(FilteredService {
                package: package.to_owned(),
                fq_name,
                descriptor,
                file_index,
                index,
                comment: graph.comment(file_index, &service_path),
                decision,
                methods,
            });
        }
    }
    services
}

/// Surviving browser-provided services across every package of the graph
pub fn browser_services<'g>(
    graph: &'g SchemaGraph,
    criteria: &FilterCriteria,
) -> Vec<FilteredService<'g>> {
    graph
        .package_names()
        .flat_map(|package| package_services(graph, criteria, package))
        .filter(FilteredService::is_browser_provided)
        .collect()
}

/// Run every filter and collector over `package`
pub fn filter_package<'g>(
    graph: &'g SchemaGraph,
    criteria: &FilterCriteria,
    config: &Config,
    package: &str,
) -> BuildResult<FilteredPackage<'g>> {
    let info = graph
        .package_info(package, config)
        .ok_or_else(|| BuildError::UnknownPackage(package.to_owned()))?;
    let filtered = FilteredPackage {
        package: info,
        services: package_services(graph, criteria, package),
        browser_services: browser_services(graph, criteria),
        messages: collect_messages(graph, package),
        enums: collect_enums(graph, package),
    };
    log::debug!(
        "Package {}: {} services, {} browser services in the graph, {} messages, {} enums",
        package,
        filtered.services.len(),
        filtered.browser_services.len(),
        filtered.messages.len(),
        filtered.enums.len()
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn shop_filter_test() {
        let graph = graph(shop_files());
        let config = Config::from_parameter("methods_exclude=InternalDebug").unwrap();
        let criteria = FilterCriteria::from_config(&config).unwrap();
        let filtered = filter_package(&graph, &criteria, &config, "shop.v1").unwrap();
        assert_eq!(filtered.services.len(), 1);
        let cart = &filtered.services[0];
        assert_eq!(cart.fq_name, "shop.v1.CartService");
        assert_eq!(cart.comment, "Manages shopping carts.");
        let methods: Vec<&str> = cart.methods.iter().map(|m| m.descriptor.name()).collect();
        assert_eq!(methods, ["AddItem"]);
        assert_eq!(cart.methods[0].comment, "Adds one item.");
        assert!(filtered.browser_services.is_empty());
        assert_eq!(filtered.messages.len(), 5);
    }

    #[test]
    fn browser_services_across_packages_test() {
        let graph = graph(vec![
            file("ui/v1/ui.proto", "ui.v1")
                .service(service("TestService", vec![]))
                .build(),
            file("shop/v1/cart.proto", "shop.v1")
                .service(service("CartService", vec![]))
                .build(),
        ]);
        let config = Config::from_parameter("browser_services=TestService").unwrap();
        let criteria = FilterCriteria::from_config(&config).unwrap();
        let filtered = filter_package(&graph, &criteria, &config, "shop.v1").unwrap();
        assert_eq!(filtered.browser_services.len(), 1);
        assert_eq!(filtered.browser_services[0].fq_name, "ui.v1.TestService");
        assert!(filtered.browser_services[0].methods.is_empty());
        assert!(!filtered.services[0].is_browser_provided());
    }

    #[test]
    fn unknown_package_test() {
        let graph = graph(shop_files());
        let config = Config::default();
        let criteria = FilterCriteria::default();
        assert!(matches!(
            filter_package(&graph, &criteria, &config, "nope"),
            Err(BuildError::UnknownPackage(package)) if package == "nope"
        ));
    }
}
