use std::collections::HashMap;

use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto};

// Field numbers used in descriptor paths (see descriptor.proto)
/// `FileDescriptorProto.message_type`
pub const FILE_MESSAGE_TYPE: i32 = 4;
/// `FileDescriptorProto.enum_type`
pub const FILE_ENUM_TYPE: i32 = 5;
/// `FileDescriptorProto.service`
pub const FILE_SERVICE: i32 = 6;
/// `DescriptorProto.field`
pub const MESSAGE_FIELD: i32 = 2;
/// `DescriptorProto.nested_type`
pub const MESSAGE_NESTED_TYPE: i32 = 3;
/// `DescriptorProto.enum_type`
pub const MESSAGE_ENUM_TYPE: i32 = 4;
/// `ServiceDescriptorProto.method`
pub const SERVICE_METHOD: i32 = 2;
/// `EnumDescriptorProto.value`
pub const ENUM_VALUE: i32 = 2;

fn index(value: i32) -> Option<usize> {
    usize::try_from(value).ok()
}

/// Leading comments of one file, keyed by descriptor path
pub(crate) fn leading_comments(file: &FileDescriptorProto) -> HashMap<Vec<i32>, String> {
    let mut comments = HashMap::new();
    if let Some(info) = &file.source_code_info {
        for location in &info.location {
            if let Some(text) = &location.leading_comments {
                let text = normalize_comment(text);
                if !text.is_empty() {
                    comments.insert(location.path.clone(), text);
                }
            }
        }
    }
    comments
}

fn normalize_comment(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Message at a path of the form `[4, i, (3, j)*]`
pub(crate) fn message_at<'f>(
    file: &'f FileDescriptorProto,
    path: &[i32],
) -> Option<&'f DescriptorProto> {
    if path.len() < 2 || path.len() % 2 != 0 || path[0] != FILE_MESSAGE_TYPE {
        return None;
    }
    let mut message = file.message_type.get(index(path[1])?)?;
    for step in path[2..].chunks_exact(2) {
        if step[0] != MESSAGE_NESTED_TYPE {
            return None;
        }
        message = message.nested_type.get(index(step[1])?)?;
    }
    Some(message)
}

/// Enum at a path of the form `[5, i]` or `<message path>, 4, k`
pub(crate) fn enum_at<'f>(
    file: &'f FileDescriptorProto,
    path: &[i32],
) -> Option<&'f EnumDescriptorProto> {
    match path {
        [FILE_ENUM_TYPE, i] => file.enum_type.get(index(*i)?),
        [parent @ .., MESSAGE_ENUM_TYPE, k] if !parent.is_empty() => {
            message_at(file, parent)?.enum_type.get(index(*k)?)
        }
        _ => None,
    }
}
