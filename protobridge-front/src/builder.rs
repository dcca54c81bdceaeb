use protobridge_core::filter::{FilteredPackage, FilteredService};
use protobridge_core::model::{EnumInfo, FieldInfo, MethodData, PackageInfo, ServiceData};
use protobridge_core::{
    naming, paths, BuildContext, BuildError, BuildResult, NamespaceMode, SchemaGraph,
};

use crate::data::{ClientData, ImportGroups, ScriptTemplateData, TypeFileData};
use crate::factory::build_factory;
use crate::schema::{build_aggregator, build_registry};
use crate::types::{script_type_name, ResolvedMessage, TypeResolver};
use crate::{BROWSER_SUFFIX, CLIENT_SUFFIX, FACTORY_MODULE, SCHEMAS_MODULE, TYPES_SUFFIX};

/// Builds [ScriptTemplateData] from a filtered package
pub struct ScriptDataBuilder<'g> {
    graph: &'g SchemaGraph,
}

impl<'g> ScriptDataBuilder<'g> {
    /// Builder resolving types against `graph`
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self { graph }
    }

    /// Template data of one package.
    ///
    /// Unlike the back-end, services without methods are kept: a client with an empty method list
    /// is still a valid file.
    pub fn build(
        &self,
        ctx: &mut BuildContext,
        filtered: &FilteredPackage<'g>,
    ) -> BuildResult<ScriptTemplateData> {
        let config = ctx.config();
        let package = &filtered.package;
        let resolver = TypeResolver::new(self.graph, package);
        let module_name = naming::to_module_name(&package.name, &config.module_name);
        let namespace = match config.namespace_mode {
            NamespaceMode::Namespaced => package.name.clone(),
            NamespaceMode::Flat | NamespaceMode::ServiceBased => module_name.clone(),
        };

        let mut clients = Vec::new();
        let mut browser_services = Vec::new();
        if config.generate_clients {
            for service in &filtered.services {
                let client = self.client(ctx, &resolver, package, service)?;
                if service.is_browser_provided() {
                    browser_services.push(client);
                } else {
                    clients.push(client);
                }
            }
        }

        let messages = if config.generate_types || config.generate_factories {
            filtered
                .messages
                .iter()
                .filter(|message| !message.entry.is_map_entry)
                .map(|message| resolver.message(message))
                .collect::<BuildResult<Vec<_>>>()?
        } else {
            Vec::new()
        };

        let mut type_files = Vec::new();
        let mut schema = None;
        let mut aggregator = None;
        if config.generate_types {
            let enums: Vec<EnumInfo> = filtered
                .enums
                .iter()
                .map(|enumeration| resolver.enumeration(enumeration))
                .collect();
            type_files = self.type_files(&resolver, package, &messages, enums);
        }
        let factory = if config.generate_factories {
            build_factory(&resolver, package, &messages)
        } else {
            None
        };
        if config.generate_types && !messages.is_empty() {
            schema = Some(build_registry(package, &messages));
            let modules =
                index_modules(&type_files, &clients, &browser_services, factory.is_some());
            aggregator = Some(build_aggregator(ctx, package, &messages, modules));
        }

        log::debug!(
            "Script data for {}: {} clients, {} browser services, {} type files",
            package.name,
            clients.len(),
            browser_services.len(),
            type_files.len()
        );
        Ok(ScriptTemplateData {
            package: package.clone(),
            module_name,
            namespace,
            namespace_mode: config.namespace_mode,
            clients,
            browser_services,
            type_files,
            factory,
            schema,
            aggregator,
        })
    }

    fn client(
        &self,
        ctx: &mut BuildContext,
        resolver: &TypeResolver,
        package: &PackageInfo,
        service: &FilteredService,
    ) -> BuildResult<ClientData> {
        let mut imports = ImportGroups::new();
        let mut methods = Vec::with_capacity(service.methods.len());
        for method in &service.methods {
            let descriptor = method.descriptor;
            let fq_method = format!("{}.{}", service.fq_name, descriptor.name());
            let mut resolve = |type_name: &str| -> BuildResult<String> {
                let entry = self
                    .graph
                    .lookup(type_name)
                    .ok_or_else(|| BuildError::UnresolvedMethodType {
                        method: fq_method.clone(),
                        type_name: type_name.to_owned(),
                    })?;
                Ok(imports.add(resolver.import_path(entry), script_type_name(entry)))
            };
            let request_type = resolve(descriptor.input_type())?;
            let response_type = resolve(descriptor.output_type())?;
            methods.push(MethodData {
                name: descriptor.name().to_owned(),
                script_name: method
                    .decision
                    .custom_name
                    .clone()
                    .unwrap_or_else(|| naming::to_camel_case(descriptor.name())),
                backend_name: naming::rust_ident(&naming::to_snake_case(descriptor.name())),
                request_fq_name: descriptor.input_type().trim_start_matches('.').to_owned(),
                response_fq_name: descriptor.output_type().trim_start_matches('.').to_owned(),
                request_type,
                response_type,
                is_async: method.decision.is_async,
                is_server_streaming: method.decision.is_server_streaming,
                should_generate: true,
                comment: method.comment.clone(),
            });
        }

        let pascal = naming::to_pascal_case(service.name());
        let suffix = if service.is_browser_provided() {
            BROWSER_SUFFIX
        } else {
            CLIENT_SUFFIX
        };
        Ok(ClientData {
            file_stem: format!("{}{}", naming::to_snake_case(service.name()), suffix),
            namespace_key: match ctx.config().namespace_mode {
                NamespaceMode::ServiceBased => Some(naming::to_snake_case(service.name())),
                NamespaceMode::Namespaced | NamespaceMode::Flat => None,
            },
            imports: imports.into_groups(),
            service: ServiceData {
                name: service.name().to_owned(),
                fq_name: service.fq_name.clone(),
                backend_name: if service.is_browser_provided() {
                    format!("{}Client", pascal)
                } else {
                    pascal
                },
                script_name: service
                    .decision
                    .custom_name
                    .clone()
                    .unwrap_or_else(|| service.name().to_owned()),
                package_path: package.path.clone(),
                package_alias: ctx.alias_for(&package.path),
                is_browser_provided: service.is_browser_provided(),
                custom_name: service.decision.custom_name.clone(),
                comment: service.comment.clone(),
                methods,
            },
        })
    }

    fn type_files(
        &self,
        resolver: &TypeResolver,
        package: &PackageInfo,
        messages: &[ResolvedMessage],
        enums: Vec<EnumInfo>,
    ) -> Vec<TypeFileData> {
        let mut enums = enums;
        let mut files = Vec::new();
        for (_, file) in self.graph.package_files(&package.name) {
            let source_file = file.name();
            let file_messages: Vec<&ResolvedMessage> = messages
                .iter()
                .filter(|message| message.entry.file == source_file)
                .collect();
            let (file_enums, rest): (Vec<EnumInfo>, Vec<EnumInfo>) = enums
                .into_iter()
                .partition(|enumeration| enumeration.source_file == source_file);
            enums = rest;
            if file_messages.is_empty() && file_enums.is_empty() {
                continue;
            }
            let mut imports = ImportGroups::new();
            for name in file_messages.iter().map(|message| &message.info.name) {
                imports.reserve(name.clone());
            }
            for enumeration in &file_enums {
                imports.reserve(enumeration.name.clone());
            }
            let mut infos = Vec::with_capacity(file_messages.len());
            for message in file_messages {
                let mut info = message.info.clone();
                for (field, refs) in info.fields.iter_mut().zip(&message.fields) {
                    let external = refs.reference.filter(|entry| entry.file != source_file);
                    let Some(entry) = external else {
                        continue;
                    };
                    let type_name = script_type_name(entry);
                    let local = imports.add(resolver.import_path(entry), type_name.clone());
                    if local != type_name {
                        use_local_name(field, &type_name, &local);
                    }
                }
                infos.push(info);
            }
            files.push(TypeFileData {
                source_file: source_file.to_owned(),
                file_stem: format!("{}{}", naming::file_stem(source_file), TYPES_SUFFIX),
                messages: infos,
                enums: file_enums,
                imports: imports.into_groups(),
            });
        }
        files
    }
}

// point a field at the local alias of its referenced type
fn use_local_name(field: &mut FieldInfo, type_name: &str, local: &str) {
    field.target_type = if field.is_map {
        field.map_value_type = Some(local.to_owned());
        let key = field.map_key_type.as_deref().unwrap_or("string");
        format!("Map<{}, {}>", key, local)
    } else if field.is_repeated {
        format!("{}[]", local)
    } else {
        local.to_owned()
    };
    if let Some(value) = field
        .default_value
        .strip_prefix(type_name)
        .and_then(|rest| rest.strip_prefix('.'))
    {
        field.default_value = format!("{}.{}", local, value);
    }
}

// re-exported by `index`, type files first
fn index_modules(
    type_files: &[TypeFileData],
    clients: &[ClientData],
    browser_services: &[ClientData],
    has_factory: bool,
) -> Vec<String> {
    let mut modules: Vec<String> = type_files
        .iter()
        .map(|file| paths::join_import(".", &file.file_stem))
        .chain(
            clients
                .iter()
                .chain(browser_services)
                .map(|client| paths::join_import(".", &client.file_stem)),
        )
        .collect();
    if has_factory {
        modules.push(paths::join_import(".", FACTORY_MODULE));
    }
    modules.push(paths::join_import(".", SCHEMAS_MODULE));
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use protobridge_core::filter::{filter_package, FilterCriteria};
    use protobridge_core::fixtures::*;
    use protobridge_core::Config;

    use crate::ImportGroup;

    fn build(
        graph: &SchemaGraph,
        config: &Config,
        package: &str,
    ) -> BuildResult<ScriptTemplateData> {
        let criteria = FilterCriteria::from_config(config).unwrap();
        let filtered = filter_package(graph, &criteria, config, package)?;
        let mut ctx = BuildContext::new(config);
        ScriptDataBuilder::new(graph).build(&mut ctx, &filtered)
    }

    #[test]
    fn shop_methods_test() {
        let graph = graph(shop_files());
        let config = Config::from_parameter("methods_exclude=InternalDebug").unwrap();
        let data = build(&graph, &config, "shop.v1").unwrap();
        assert_eq!(data.clients.len(), 1);
        let cart = &data.clients[0];
        assert_eq!(cart.file_stem, "cart_service_client");
        let names: Vec<&str> = cart.service.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["AddItem"]);
        assert_eq!(cart.service.methods[0].request_type, "AddItemRequest");
        assert_eq!(
            cart.imports,
            vec![ImportGroup {
                path: "./cart_interfaces".to_owned(),
                types: vec!["AddItemRequest".to_owned(), "Cart".to_owned()],
                ..Default::default()
            }]
        );
        assert_eq!(data.namespace, "shop.v1");
        assert_eq!(cart.namespace_key, None);
    }

    #[test]
    fn zero_method_service_kept_test() {
        let graph = graph(vec![file("ui/v1/ui.proto", "ui.v1")
            .service(service("TestService", vec![]))
            .service(service(
                "DebugOnly",
                vec![method("Dump", ".ui.v1.Empty", ".ui.v1.Empty")],
            ))
            .message(message("Empty", vec![]))
            .build()]);
        let config =
            Config::from_parameter("browser_services=TestService,methods_exclude=Dump").unwrap();
        let data = build(&graph, &config, "ui.v1").unwrap();

        assert_eq!(data.browser_services.len(), 1);
        let test = &data.browser_services[0];
        assert_eq!(test.service.name, "TestService");
        assert!(test.service.is_browser_provided);
        assert!(test.service.methods.is_empty());
        assert_eq!(test.file_stem, "test_service_browser");

        assert_eq!(data.clients.len(), 1);
        assert!(data.clients[0].service.methods.is_empty());
        assert!(data.clients[0].imports.is_empty());
    }

    #[test]
    fn sibling_package_import_test() {
        let graph = graph(vec![
            file("a/c/models.proto", "a.c").message(message("Widget", vec![])).build(),
            file("a/b/uses.proto", "a.b")
                .message(message(
                    "User",
                    vec![
                        message_field("widget", 1, ".a.c.Widget"),
                        message_field("backup", 2, ".a.c.Widget"),
                        message_field("history", 3, ".a.c.Widget").repeated(),
                    ],
                ))
                .message(
                    message("Team", vec![map_field("members", 1, ".a.b.Team.MembersEntry")])
                        .nested(map_entry(
                            "MembersEntry",
                            message_field("value", 2, ".a.c.Widget"),
                        )),
                )
                .build(),
        ]);
        let data = build(&graph, &Config::default(), "a.b").unwrap();
        assert_eq!(data.type_files.len(), 1);
        let uses = &data.type_files[0];
        assert_eq!(uses.file_stem, "uses_interfaces");
        assert_eq!(
            uses.imports,
            vec![ImportGroup {
                path: "../c/models_interfaces".to_owned(),
                types: vec!["Widget".to_owned()],
                ..Default::default()
            }]
        );
        let team = &uses.messages[1];
        assert_eq!(team.fields[0].target_type, "Map<string, Widget>");

        let aggregator = data.aggregator.unwrap();
        assert_eq!(aggregator.registries.len(), 1);
        assert_eq!(aggregator.registries[0].path, "../c/schemas");
        assert_eq!(
            aggregator.modules,
            ["./uses_interfaces", "./factory", "./schemas"]
        );
    }

    #[test]
    fn same_name_imports_aliased_test() {
        let graph = graph(vec![
            file("a/c/m.proto", "a.c").message(message("Widget", vec![])).build(),
            file("a/d/m.proto", "a.d")
                .message(message("Widget", vec![]))
                .enumeration(enumeration("Shade", &[("SHADE_DARK", 0)]))
                .build(),
            file("a/b/uses.proto", "a.b")
                .message(
                    message(
                        "User",
                        vec![
                            message_field("first", 1, ".a.c.Widget"),
                            message_field("second", 2, ".a.d.Widget").repeated(),
                            map_field("spares", 3, ".a.b.User.SparesEntry"),
                            enum_field("shade", 4, ".a.d.Shade"),
                        ],
                    )
                    .nested(map_entry("SparesEntry", message_field("value", 2, ".a.d.Widget"))),
                )
                .enumeration(enumeration("Shade", &[("SHADE_LIGHT", 0)]))
                .service(service(
                    "UserService",
                    vec![
                        method("Swap", ".a.c.Widget", ".a.d.Widget"),
                        method("Again", ".a.d.Widget", ".a.c.Widget"),
                    ],
                ))
                .build(),
        ]);
        let data = build(&graph, &Config::default(), "a.b").unwrap();

        let uses = &data.type_files[0];
        assert_eq!(
            uses.imports,
            vec![
                ImportGroup {
                    path: "../c/m_interfaces".to_owned(),
                    types: vec!["Widget".to_owned()],
                    ..Default::default()
                },
                ImportGroup {
                    path: "../d/m_interfaces".to_owned(),
                    types: vec!["Shade".to_owned(), "Widget".to_owned()],
                    aliases: [
                        ("Shade".to_owned(), "d_Shade".to_owned()),
                        ("Widget".to_owned(), "d_Widget".to_owned()),
                    ]
                    .into(),
                },
            ]
        );
        let types: Vec<(&str, &str)> = uses.messages[0]
            .fields
            .iter()
            .map(|f| (f.target_type.as_str(), f.default_value.as_str()))
            .collect();
        assert_eq!(
            types,
            [
                ("Widget", "undefined"),
                ("d_Widget[]", "[]"),
                ("Map<string, d_Widget>", "new Map()"),
                ("d_Shade", "d_Shade.SHADE_DARK"),
            ]
        );
        assert_eq!(uses.messages[0].fields[2].map_value_type.as_deref(), Some("d_Widget"));

        let client = &data.clients[0];
        let signatures: Vec<(&str, &str)> = client
            .service
            .methods
            .iter()
            .map(|m| (m.request_type.as_str(), m.response_type.as_str()))
            .collect();
        assert_eq!(signatures, [("Widget", "d_Widget"), ("d_Widget", "Widget")]);
        assert_eq!(client.imports[1].aliases["Widget"], "d_Widget");
    }

    #[test]
    fn nested_types_flattened_test() {
        let graph = graph(shop_files());
        let data = build(&graph, &Config::default(), "shop.v1").unwrap();
        let cart_file = &data.type_files[0];
        let names: Vec<&str> = cart_file.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            ["Cart", "Cart_Item", "AddItemRequest", "DebugRequest", "DebugResponse"]
        );
        let items = &cart_file.messages[0].fields[1];
        assert_eq!(items.target_type, "Cart_Item[]");
        assert!(cart_file.imports.is_empty());
        assert_eq!(cart_file.messages[2].fields[1].target_type, "Cart_Item");
    }

    #[test]
    fn import_determinism_test() {
        let graph = graph(vec![
            file("z/z.proto", "z").message(message("Zed", vec![])).build(),
            file("a/a.proto", "a").message(message("Ay", vec![])).build(),
            file("m/m.proto", "m")
                .message(message(
                    "Mix",
                    vec![
                        message_field("zed", 1, ".z.Zed"),
                        message_field("ay", 2, ".a.Ay"),
                        message_field("other", 3, ".m.Other"),
                    ],
                ))
                .build(),
            file("m/other.proto", "m").message(message("Other", vec![])).build(),
        ]);
        let first = build(&graph, &Config::default(), "m").unwrap();
        let second = build(&graph, &Config::default(), "m").unwrap();
        assert_eq!(first, second);
        let paths: Vec<&str> = first.type_files[0]
            .imports
            .iter()
            .map(|g| g.path.as_str())
            .collect();
        assert_eq!(paths, ["../a/a_interfaces", "../z/z_interfaces", "./other_interfaces"]);
        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn module_override_and_service_namespace_test() {
        let graph = graph(shop_files());
        let config =
            Config::from_parameter("module_name=shop_bundle,namespace_mode=service_based")
                .unwrap();
        let data = build(&graph, &config, "shop.v1").unwrap();
        assert_eq!(data.module_name, "shop_bundle");
        assert_eq!(data.namespace, "shop_bundle");
        assert_eq!(data.clients[0].namespace_key.as_deref(), Some("cart_service"));
    }

    #[test]
    fn toggles_test() {
        let graph = graph(shop_files());
        let config = Config::from_parameter("generate_clients=false,generate_types=false").unwrap();
        let data = build(&graph, &config, "shop.v1").unwrap();
        assert!(data.clients.is_empty());
        assert!(data.type_files.is_empty());
        assert!(data.schema.is_none());
        assert!(data.aggregator.is_none());
        assert!(data.factory.is_some());
        assert!(!data.is_empty());
    }

    #[test]
    fn unresolved_method_type_test() {
        let graph = graph(vec![file("a.proto", "a")
            .service(service("Svc", vec![method("Call", ".a.Gone", ".a.Gone")]))
            .build()]);
        assert!(matches!(
            build(&graph, &Config::default(), "a"),
            Err(BuildError::UnresolvedMethodType { .. })
        ));
    }
}
