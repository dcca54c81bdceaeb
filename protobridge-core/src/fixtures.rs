//! Descriptor builders for tests.
//!
//! Type names passed to field and method helpers are written the way protoc writes them,
//! fully-qualified with a leading dot.

use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, MethodDescriptorProto, OneofDescriptorProto,
    ServiceDescriptorProto, SourceCodeInfo,
};

pub use prost_types::field_descriptor_proto::{Label, Type as FieldType};

use crate::SchemaGraph;

/// Builder of one proto file
pub struct FileBuilder {
    proto: FileDescriptorProto,
}

/// Start a file
pub fn file(name: &str, package: &str) -> FileBuilder {
    FileBuilder {
        proto: FileDescriptorProto {
            name: Some(name.to_owned()),
            package: if package.is_empty() {
                None
            } else {
                Some(package.to_owned())
            },
            syntax: Some("proto3".to_owned()),
            ..Default::default()
        },
    }
}

impl FileBuilder {
    /// Add a top-level message
    pub fn message(mut self, message: DescriptorProto) -> Self {
        self.proto.message_type.push(message);
        self
    }

    /// Add a top-level enum
    pub fn enumeration(mut self, enumeration: EnumDescriptorProto) -> Self {
        self.proto.enum_type.push(enumeration);
        self
    }

    /// Add a service
    pub fn service(mut self, service: ServiceDescriptorProto) -> Self {
        self.proto.service.push(service);
        self
    }

    /// Add an import
    pub fn dependency(mut self, file_name: &str) -> Self {
        self.proto.dependency.push(file_name.to_owned());
        self
    }

    /// Attach a leading comment to the element at `path`
    pub fn comment(mut self, path: &[i32], text: &str) -> Self {
        self.proto
            .source_code_info
            .get_or_insert_with(SourceCodeInfo::default)
            .location
            .push(Location {
                path: path.to_vec(),
                leading_comments: Some(text.to_owned()),
                ..Default::default()
            });
        self
    }

    /// Finished descriptor
    pub fn build(self) -> FileDescriptorProto {
        self.proto
    }
}

/// Message with fields
pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_owned()),
        field: fields,
        ..Default::default()
    }
}

/// Map entry message `<name>` with a string key
pub fn map_entry(name: &str, value: FieldDescriptorProto) -> DescriptorProto {
    map_entry_with_key(name, FieldType::String, value)
}

/// Map entry message `<name>`
pub fn map_entry_with_key(
    name: &str,
    key: FieldType,
    value: FieldDescriptorProto,
) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_owned()),
        field: vec![
            scalar_field("key", 1, key),
            FieldDescriptorProto {
                name: Some("value".to_owned()),
                number: Some(2),
                ..value
            },
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Additions to message descriptors
pub trait MessageExt {
    /// Add a nested message
    fn nested(self, message: DescriptorProto) -> Self;
    /// Add a nested enum
    fn nested_enum(self, enumeration: EnumDescriptorProto) -> Self;
    /// Declare a oneof group
    fn oneof(self, name: &str) -> Self;
}

impl MessageExt for DescriptorProto {
    fn nested(mut self, message: DescriptorProto) -> Self {
        self.nested_type.push(message);
        self
    }

    fn nested_enum(mut self, enumeration: EnumDescriptorProto) -> Self {
        self.enum_type.push(enumeration);
        self
    }

    fn oneof(mut self, name: &str) -> Self {
        self.oneof_decl.push(OneofDescriptorProto {
            name: Some(name.to_owned()),
            ..Default::default()
        });
        self
    }
}

/// Singular scalar field
pub fn scalar_field(name: &str, number: i32, kind: FieldType) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        ..Default::default()
    }
}

/// Singular message field
pub fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_owned()),
        ..scalar_field(name, number, FieldType::Message)
    }
}

/// Singular enum field
pub fn enum_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_owned()),
        ..scalar_field(name, number, FieldType::Enum)
    }
}

/// Map field using the entry message `entry_type_name`
pub fn map_field(name: &str, number: i32, entry_type_name: &str) -> FieldDescriptorProto {
    message_field(name, number, entry_type_name).repeated()
}

/// Additions to field descriptors
pub trait FieldExt {
    /// Mark repeated
    fn repeated(self) -> Self;
    /// Mark proto3 `optional`
    fn optional(self) -> Self;
    /// Place in the oneof at `index`
    fn in_oneof(self, index: i32) -> Self;
    /// Set the json name
    fn json_name(self, name: &str) -> Self;
}

impl FieldExt for FieldDescriptorProto {
    fn repeated(mut self) -> Self {
        self.label = Some(Label::Repeated as i32);
        self
    }

    fn optional(mut self) -> Self {
        self.proto3_optional = Some(true);
        self
    }

    fn in_oneof(mut self, index: i32) -> Self {
        self.oneof_index = Some(index);
        self
    }

    fn json_name(mut self, name: &str) -> Self {
        self.json_name = Some(name.to_owned());
        self
    }
}

/// Enum with `(name, number)` values
pub fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_owned()),
        value: values
            .iter()
            .map(|(value, number)| EnumValueDescriptorProto {
                name: Some((*value).to_owned()),
                number: Some(*number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// Service with methods
pub fn service(name: &str, methods: Vec<MethodDescriptorProto>) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.to_owned()),
        method: methods,
        ..Default::default()
    }
}

/// Unary method
pub fn method(name: &str, input_type: &str, output_type: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_owned()),
        input_type: Some(input_type.to_owned()),
        output_type: Some(output_type.to_owned()),
        ..Default::default()
    }
}

/// Additions to method descriptors
pub trait MethodExt {
    /// Stream responses
    fn server_streaming(self) -> Self;
    /// Stream requests
    fn client_streaming(self) -> Self;
}

impl MethodExt for MethodDescriptorProto {
    fn server_streaming(mut self) -> Self {
        self.server_streaming = Some(true);
        self
    }

    fn client_streaming(mut self) -> Self {
        self.client_streaming = Some(true);
        self
    }
}

/// Index files into a graph
pub fn graph(files: Vec<FileDescriptorProto>) -> SchemaGraph {
    SchemaGraph::new(files)
}

/// `shop.v1` with `CartService { AddItem, InternalDebug }` and a nested cart item
pub fn shop_files() -> Vec<FileDescriptorProto> {
    vec![
        file("shop/v1/cart.proto", "shop.v1")
            .message(
                message(
                    "Cart",
                    vec![
                        scalar_field("id", 1, FieldType::String),
                        message_field("items", 2, ".shop.v1.Cart.Item").repeated(),
                        message_field("updated_at", 3, ".google.protobuf.Timestamp"),
                    ],
                )
                .nested(message(
                    "Item",
                    vec![
                        scalar_field("sku", 1, FieldType::String),
                        scalar_field("quantity", 2, FieldType::Int32),
                    ],
                )),
            )
            .message(message(
                "AddItemRequest",
                vec![
                    scalar_field("cart_id", 1, FieldType::String),
                    message_field("item", 2, ".shop.v1.Cart.Item"),
                ],
            ))
            .message(message("DebugRequest", vec![]))
            .message(message("DebugResponse", vec![scalar_field("dump", 1, FieldType::String)]))
            .service(service(
                "CartService",
                vec![
                    method("AddItem", ".shop.v1.AddItemRequest", ".shop.v1.Cart"),
                    method("InternalDebug", ".shop.v1.DebugRequest", ".shop.v1.DebugResponse"),
                ],
            ))
            .comment(&[6, 0], " Manages shopping carts.\n")
            .comment(&[6, 0, 2, 0], " Adds one item.\n")
            .dependency("google/protobuf/timestamp.proto")
            .build(),
        file("google/protobuf/timestamp.proto", "google.protobuf")
            .message(message(
                "Timestamp",
                vec![
                    scalar_field("seconds", 1, FieldType::Int64),
                    scalar_field("nanos", 2, FieldType::Int32),
                ],
            ))
            .build(),
    ]
}
