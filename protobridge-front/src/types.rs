//! Field and type resolution for TypeScript.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::FieldDescriptorProto;

use protobridge_core::filter::{CollectedEnum, CollectedMessage};
use protobridge_core::model::{
    EnumInfo, EnumValueInfo, FieldInfo, FieldKind, MessageInfo, PackageInfo,
};
use protobridge_core::schema::{TypeEntry, ENUM_VALUE, MESSAGE_FIELD};
use protobridge_core::well_known::{self, WellKnownType};
use protobridge_core::{naming, paths, BuildError, BuildResult, SchemaGraph};

use crate::TYPES_SUFFIX;

const MAP_KEY_NUMBER: i32 = 1;
const MAP_VALUE_NUMBER: i32 = 2;

/// Script identifier of a message or enum
pub(crate) fn script_type_name(entry: &TypeEntry) -> String {
    naming::flatten_nested(&entry.parents, &entry.name)
}

/// What a resolved field points at, aligned with [MessageInfo::fields]
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldRefs<'g> {
    /// Referenced message or enum, the value type for maps
    pub reference: Option<&'g TypeEntry>,
    /// Well-known type replacing the referenced message
    pub well_known: Option<&'static WellKnownType>,
    /// Key and value kinds of a map
    pub map_kinds: Option<(FieldKind, FieldKind)>,
}

/// A message with its field references
#[derive(Debug, Clone)]
pub(crate) struct ResolvedMessage<'g> {
    pub entry: &'g TypeEntry,
    pub info: MessageInfo,
    pub fields: Vec<FieldRefs<'g>>,
}

// resolved element type of a field, before repetition
struct ValueType<'g> {
    kind: FieldKind,
    target_type: String,
    default_value: String,
    entry: Option<&'g TypeEntry>,
    well_known: Option<&'static WellKnownType>,
}

impl ValueType<'_> {
    fn scalar(kind: FieldKind, target_type: &str, default_value: &str) -> Self {
        Self {
            kind,
            target_type: target_type.to_owned(),
            default_value: default_value.to_owned(),
            entry: None,
            well_known: None,
        }
    }

    fn fq_name(&self) -> Option<String> {
        self.entry
            .map(|entry| entry.fq_name.clone())
            .or_else(|| self.well_known.map(|wkt| wkt.fq_name.to_owned()))
    }

    fn package(&self) -> Option<String> {
        self.entry.map(|entry| entry.package.clone()).or_else(|| {
            self.well_known
                .and_then(|wkt| wkt.fq_name.rsplit_once('.'))
                .map(|(package, _)| package.to_owned())
        })
    }
}

/// Resolves fields of one package against the whole graph
pub(crate) struct TypeResolver<'g, 'p> {
    graph: &'g SchemaGraph,
    package: &'p PackageInfo,
}

impl<'g, 'p> TypeResolver<'g, 'p> {
    pub fn new(graph: &'g SchemaGraph, package: &'p PackageInfo) -> Self {
        Self { graph, package }
    }

    /// Module specifier of the type file declaring `entry`, relative to this package.
    ///
    /// The owning package comes from the declaring file, never from the type name.
    pub fn import_path(&self, entry: &TypeEntry) -> String {
        let module = format!("{}{}", naming::file_stem(&entry.file), TYPES_SUFFIX);
        if entry.package == self.package.name {
            paths::join_import(".", &module)
        } else {
            paths::join_import(&paths::relative_path(&self.package.path, &entry.package), &module)
        }
    }

    /// Message and its fields
    pub fn message(&self, collected: &CollectedMessage<'g>) -> BuildResult<ResolvedMessage<'g>> {
        let entry = collected.entry;
        let descriptor = collected.descriptor;
        let mut fields = Vec::with_capacity(descriptor.field.len());
        let mut refs = Vec::with_capacity(descriptor.field.len());
        for (k, field) in descriptor.field.iter().enumerate() {
            let mut path = entry.path.clone();
            path.extend([MESSAGE_FIELD, k as i32]);
            let comment = self.graph.comment(entry.file_index, &path);
            let oneof_name = real_oneof(field).and_then(|i| {
                descriptor
                    .oneof_decl
                    .get(i)
                    .map(|oneof| oneof.name().to_owned())
            });
            let (info, field_refs) = self.field(&entry.fq_name, field, oneof_name, comment)?;
            fields.push(info);
            refs.push(field_refs);
        }
        let oneofs = descriptor
            .oneof_decl
            .iter()
            .enumerate()
            .filter(|(i, _)| descriptor.field.iter().any(|f| real_oneof(f) == Some(*i)))
            .map(|(_, oneof)| oneof.name().to_owned())
            .collect();
        Ok(ResolvedMessage {
            entry,
            info: MessageInfo {
                name: script_type_name(entry),
                proto_name: entry.name.clone(),
                package: entry.package.clone(),
                fq_name: entry.fq_name.clone(),
                source_file: entry.file.clone(),
                is_nested: entry.is_nested(),
                comment: collected.comment.clone(),
                fields,
                oneofs,
            },
            fields: refs,
        })
    }

    /// Enum and its values
    pub fn enumeration(&self, collected: &CollectedEnum<'g>) -> EnumInfo {
        let entry = collected.entry;
        let values = collected
            .descriptor
            .value
            .iter()
            .enumerate()
            .map(|(k, value)| {
                let mut path = entry.path.clone();
                path.extend([ENUM_VALUE, k as i32]);
                EnumValueInfo {
                    name: value.name().to_owned(),
                    number: value.number(),
                    comment: self.graph.comment(entry.file_index, &path),
                }
            })
            .collect();
        EnumInfo {
            name: script_type_name(entry),
            proto_name: entry.name.clone(),
            package: entry.package.clone(),
            fq_name: entry.fq_name.clone(),
            source_file: entry.file.clone(),
            is_nested: entry.is_nested(),
            comment: collected.comment.clone(),
            values,
        }
    }

    fn field(
        &self,
        message_fq: &str,
        field: &FieldDescriptorProto,
        oneof_name: Option<String>,
        comment: String,
    ) -> BuildResult<(FieldInfo, FieldRefs<'g>)> {
        let field_fq = format!("{}.{}", message_fq, field.name());
        let name = if field.json_name().is_empty() {
            naming::to_camel_case(field.name())
        } else {
            field.json_name().to_owned()
        };
        let is_optional = field.proto3_optional();
        let is_oneof = oneof_name.is_some();

        if let Some((key, value)) = self.map_types(&field_fq, field)? {
            let info = FieldInfo {
                name,
                proto_name: field.name().to_owned(),
                number: field.number(),
                kind: FieldKind::Map,
                target_type: format!("Map<{}, {}>", key.target_type, value.target_type),
                default_value: "new Map()".to_owned(),
                is_repeated: false,
                is_optional,
                is_oneof,
                oneof_name,
                is_map: true,
                map_key_type: Some(key.target_type.clone()),
                map_value_type: Some(value.target_type.clone()),
                type_fq_name: value.fq_name(),
                type_package: value.package(),
                is_well_known: value.well_known.is_some(),
                comment,
            };
            let refs = FieldRefs {
                reference: value.entry,
                well_known: value.well_known,
                map_kinds: Some((key.kind, value.kind)),
            };
            return Ok((info, refs));
        }

        let value = self.value_type(&field_fq, field)?;
        let is_repeated = field.label() == Label::Repeated;
        let default_value = if is_optional || is_oneof {
            "undefined".to_owned()
        } else if is_repeated {
            "[]".to_owned()
        } else {
            value.default_value.clone()
        };
        let info = FieldInfo {
            name,
            proto_name: field.name().to_owned(),
            number: field.number(),
            kind: value.kind,
            target_type: if is_repeated {
                format!("{}[]", value.target_type)
            } else {
                value.target_type.clone()
            },
            default_value,
            is_repeated,
            is_optional,
            is_oneof,
            oneof_name,
            is_map: false,
            map_key_type: None,
            map_value_type: None,
            type_fq_name: value.fq_name(),
            type_package: value.package(),
            is_well_known: value.well_known.is_some(),
            comment,
        };
        let refs = FieldRefs {
            reference: value.entry,
            well_known: value.well_known,
            map_kinds: None,
        };
        Ok((info, refs))
    }

    // key and value of a map field, `None` for any other field
    fn map_types(
        &self,
        field_fq: &str,
        field: &FieldDescriptorProto,
    ) -> BuildResult<Option<(ValueType<'g>, ValueType<'g>)>> {
        if field.label() != Label::Repeated || field.r#type() != Type::Message {
            return Ok(None);
        }
        let entry = self.lookup(field_fq, field.type_name())?;
        if !entry.is_map_entry {
            return Ok(None);
        }
        let unresolved = || BuildError::UnresolvedType {
            field: field_fq.to_owned(),
            type_name: field.type_name().to_owned(),
        };
        let descriptor = self.graph.message(entry).ok_or_else(unresolved)?;
        let key = descriptor
            .field
            .iter()
            .find(|f| f.number() == MAP_KEY_NUMBER)
            .ok_or_else(unresolved)?;
        let value = descriptor
            .field
            .iter()
            .find(|f| f.number() == MAP_VALUE_NUMBER)
            .ok_or_else(unresolved)?;
        Ok(Some((
            self.value_type(field_fq, key)?,
            self.value_type(field_fq, value)?,
        )))
    }

    fn value_type(
        &self,
        field_fq: &str,
        field: &FieldDescriptorProto,
    ) -> BuildResult<ValueType<'g>> {
        Ok(match field.r#type() {
            Type::Double
            | Type::Float
            | Type::Int32
            | Type::Uint32
            | Type::Sint32
            | Type::Fixed32
            | Type::Sfixed32 => ValueType::scalar(FieldKind::Number, "number", "0"),
            // JSON mapping carries 64-bit integers as strings
            Type::Int64 | Type::Uint64 | Type::Sint64 | Type::Fixed64 | Type::Sfixed64 => {
                ValueType::scalar(FieldKind::Int64, "string", "\"0\"")
            }
            Type::Bool => ValueType::scalar(FieldKind::Boolean, "boolean", "false"),
            Type::String => ValueType::scalar(FieldKind::String, "string", "\"\""),
            Type::Bytes => ValueType::scalar(FieldKind::Bytes, "Uint8Array", "new Uint8Array()"),
            Type::Enum => {
                let entry = self.lookup(field_fq, field.type_name())?;
                let name = script_type_name(entry);
                let default_value = self
                    .graph
                    .enumeration(entry)
                    .and_then(|e| e.value.first())
                    .map(|first| format!("{}.{}", name, first.name()))
                    .unwrap_or_else(|| "0".to_owned());
                ValueType {
                    kind: FieldKind::Enum,
                    target_type: name,
                    default_value,
                    entry: Some(entry),
                    well_known: None,
                }
            }
            Type::Message | Type::Group => {
                if let Some(wkt) = well_known::lookup(field.type_name()) {
                    ValueType {
                        kind: FieldKind::Message,
                        target_type: wkt.script.native_type.to_owned(),
                        default_value: "undefined".to_owned(),
                        entry: None,
                        well_known: Some(wkt),
                    }
                } else {
                    let entry = self.lookup(field_fq, field.type_name())?;
                    ValueType {
                        kind: FieldKind::Message,
                        target_type: script_type_name(entry),
                        default_value: "undefined".to_owned(),
                        entry: Some(entry),
                        well_known: None,
                    }
                }
            }
        })
    }

    fn lookup(&self, field_fq: &str, type_name: &str) -> BuildResult<&'g TypeEntry> {
        let graph = self.graph;
        graph
            .lookup(type_name)
            .ok_or_else(|| BuildError::UnresolvedType {
                field: field_fq.to_owned(),
                type_name: type_name.to_owned(),
            })
    }
}

// index of the oneof a field belongs to, synthetic `optional` oneofs excluded
fn real_oneof(field: &FieldDescriptorProto) -> Option<usize> {
    if field.proto3_optional() {
        return None;
    }
    field.oneof_index.and_then(|i| usize::try_from(i).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use protobridge_core::filter::{collect_enums, collect_messages};
    use protobridge_core::fixtures::*;
    use protobridge_core::Config;

    fn resolve_all(graph: &SchemaGraph, package: &str) -> BuildResult<Vec<MessageInfo>> {
        let info = graph.package_info(package, &Config::default()).unwrap();
        let resolver = TypeResolver::new(graph, &info);
        collect_messages(graph, package)
            .iter()
            .filter(|m| !m.entry.is_map_entry)
            .map(|m| resolver.message(m).map(|r| r.info))
            .collect()
    }

    fn field<'a>(message: &'a MessageInfo, name: &str) -> &'a FieldInfo {
        message.fields.iter().find(|f| f.proto_name == name).unwrap()
    }

    #[test]
    fn scalar_mapping_test() {
        let graph = graph(vec![file("s.proto", "s")
            .message(message(
                "Scalars",
                vec![
                    scalar_field("ratio", 1, FieldType::Double),
                    scalar_field("count", 2, FieldType::Uint32),
                    scalar_field("big", 3, FieldType::Int64),
                    scalar_field("flag", 4, FieldType::Bool),
                    scalar_field("blob", 5, FieldType::Bytes),
                    scalar_field("labels", 6, FieldType::String).repeated(),
                    scalar_field("note", 7, FieldType::String).optional(),
                    scalar_field("display_name", 8, FieldType::String).json_name("displayName"),
                ],
            ))
            .build()]);
        let messages = resolve_all(&graph, "s").unwrap();
        let m = &messages[0];
        let types: Vec<(&str, &str, &str)> = m
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.target_type.as_str(), f.default_value.as_str()))
            .collect();
        assert_eq!(
            types,
            [
                ("ratio", "number", "0"),
                ("count", "number", "0"),
                ("big", "string", "\"0\""),
                ("flag", "boolean", "false"),
                ("blob", "Uint8Array", "new Uint8Array()"),
                ("labels", "string[]", "[]"),
                ("note", "string", "undefined"),
                ("displayName", "string", "\"\""),
            ]
        );
        assert_eq!(field(m, "big").kind, FieldKind::Int64);
        assert!(field(m, "note").is_optional);
        assert!(!field(m, "note").is_oneof);
        assert!(m.oneofs.is_empty());
    }

    #[test]
    fn nested_map_and_enum_test() {
        let graph = graph(vec![file("shop/v1/cart.proto", "shop.v1")
            .message(
                message(
                    "Cart",
                    vec![
                        map_field("lines", 1, ".shop.v1.Cart.LinesEntry"),
                        message_field("first", 2, ".shop.v1.Cart.Line"),
                        enum_field("state", 3, ".shop.v1.Cart.State"),
                        scalar_field("coupon", 4, FieldType::String).in_oneof(0),
                        scalar_field("gift_card", 5, FieldType::String).in_oneof(0),
                    ],
                )
                .oneof("discount")
                .nested(message("Line", vec![scalar_field("sku", 1, FieldType::String)]))
                .nested(map_entry("LinesEntry", message_field("value", 2, ".shop.v1.Cart.Line")))
                .nested_enum(enumeration("State", &[("STATE_OPEN", 0), ("STATE_PAID", 1)])),
            )
            .build()]);
        let messages = resolve_all(&graph, "shop.v1").unwrap();
        let names: Vec<&str> = messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Cart", "Cart_Line"]);

        let cart = &messages[0];
        let lines = field(cart, "lines");
        assert_eq!(lines.target_type, "Map<string, Cart_Line>");
        assert_eq!(lines.map_value_type.as_deref(), Some("Cart_Line"));
        assert_eq!(lines.default_value, "new Map()");
        assert_eq!(lines.kind, FieldKind::Map);
        assert!(lines.is_map);
        assert!(!lines.is_repeated);
        assert_eq!(lines.type_fq_name.as_deref(), Some("shop.v1.Cart.Line"));

        // declaration and references agree on the flattened name
        assert_eq!(field(cart, "first").target_type, messages[1].name);
        let state = field(cart, "state");
        assert_eq!(state.target_type, "Cart_State");
        assert_eq!(state.default_value, "Cart_State.STATE_OPEN");

        let coupon = field(cart, "coupon");
        assert!(coupon.is_oneof);
        assert_eq!(coupon.oneof_name.as_deref(), Some("discount"));
        assert_eq!(coupon.default_value, "undefined");
        assert_eq!(cart.oneofs, ["discount"]);
    }

    #[test]
    fn well_known_field_test() {
        let graph = graph(shop_files());
        let messages = resolve_all(&graph, "shop.v1").unwrap();
        let updated = field(&messages[0], "updated_at");
        assert_eq!(updated.name, "updatedAt");
        assert_eq!(updated.target_type, "Date");
        assert!(updated.is_well_known);
        assert_eq!(updated.type_package.as_deref(), Some("google.protobuf"));
        assert_eq!(updated.default_value, "undefined");
    }

    #[test]
    fn cross_package_import_path_test() {
        let graph = graph(vec![
            file("a/c/models.proto", "a.c").message(message("Widget", vec![])).build(),
            file("a/b/uses.proto", "a.b")
                .message(message("User", vec![message_field("widget", 1, ".a.c.Widget")]))
                .message(message("Other", vec![]))
                .build(),
            file("a/b/more.proto", "a.b").message(message("More", vec![])).build(),
        ]);
        let info = graph.package_info("a.b", &Config::default()).unwrap();
        let resolver = TypeResolver::new(&graph, &info);
        assert_eq!(
            resolver.import_path(graph.lookup("a.c.Widget").unwrap()),
            "../c/models_interfaces"
        );
        assert_eq!(
            resolver.import_path(graph.lookup("a.b.More").unwrap()),
            "./more_interfaces"
        );

        let messages = collect_messages(&graph, "a.b");
        let user = resolver.message(&messages[0]).unwrap();
        let referenced: Vec<&str> = user
            .fields
            .iter()
            .filter_map(|refs| refs.reference)
            .map(|entry| entry.fq_name.as_str())
            .collect();
        assert_eq!(referenced, ["a.c.Widget"]);
        assert_eq!(user.info.fields[0].type_package.as_deref(), Some("a.c"));
    }

    #[test]
    fn unresolved_type_test() {
        let graph = graph(vec![file("a.proto", "a")
            .message(message("Broken", vec![message_field("gone", 1, ".a.Gone")]))
            .build()]);
        let err = resolve_all(&graph, "a").unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnresolvedType { ref field, ref type_name }
                if field == "a.Broken.gone" && type_name == ".a.Gone"
        ));
    }

    #[test]
    fn enum_info_test() {
        let graph = graph(vec![file("e.proto", "e")
            .enumeration(enumeration("Color", &[("RED", 0), ("GREEN", 1)]))
            .comment(&[5, 0, 2, 1], " Go.\n")
            .build()]);
        let info = graph.package_info("e", &Config::default()).unwrap();
        let resolver = TypeResolver::new(&graph, &info);
        let enums = collect_enums(&graph, "e");
        let color = resolver.enumeration(&enums[0]);
        assert_eq!(color.name, "Color");
        assert_eq!(color.values[1].name, "GREEN");
        assert_eq!(color.values[1].comment, "Go.");
        assert!(!color.is_nested);
    }
}
