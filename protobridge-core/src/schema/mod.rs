//! Index over the descriptor tree.
//!
//! The owning package of a type is the `package` statement of the file that declares it, found by
//! walking the tree once. Fully-qualified names are never split to recover it: `a.b.C.D` can be
//! message `D` nested in `C` of package `a.b`, or message `D` of package `a.b.C`.

mod source_info;

use std::collections::{BTreeMap, HashMap};

use prost::Message;
use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto, FileDescriptorSet};

use crate::model::PackageInfo;
use crate::{naming, Config};

pub use source_info::{
    ENUM_VALUE, FILE_ENUM_TYPE, FILE_MESSAGE_TYPE, FILE_SERVICE, MESSAGE_ENUM_TYPE, MESSAGE_FIELD,
    MESSAGE_NESTED_TYPE, SERVICE_METHOD,
};

/// Kind of a named type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Message
    Message,
    /// Enum
    Enum,
}

/// A message or enum declared somewhere in the descriptor set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// Fully-qualified name without leading dot
    pub fq_name: String,
    /// Simple name
    pub name: String,
    /// Message or enum
    pub kind: TypeKind,
    /// Package of the declaring file
    pub package: String,
    /// Name of the declaring file
    pub file: String,
    /// Index of the declaring file in [SchemaGraph::files]
    pub file_index: usize,
    /// Simple names of the enclosing messages, outermost first
    pub parents: Vec<String>,
    /// Synthetic map entry message
    pub is_map_entry: bool,
    /// Descriptor path inside the declaring file
    pub path: Vec<i32>,
}

impl TypeEntry {
    /// Declared inside a message
    pub fn is_nested(&self) -> bool {
        !self.parents.is_empty()
    }
}

/// Validated descriptor tree with a type index
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    files: Vec<FileDescriptorProto>,
    types: HashMap<String, TypeEntry>,
    // declaration order of each file's types
    order: Vec<Vec<String>>,
    packages: BTreeMap<String, Vec<usize>>,
    comments: Vec<HashMap<Vec<i32>, String>>,
}

impl SchemaGraph {
    /// Index a list of files
    pub fn new(files: Vec<FileDescriptorProto>) -> Self {
        let mut graph = Self {
            files: Vec::new(),
            types: HashMap::new(),
            order: Vec::with_capacity(files.len()),
            packages: BTreeMap::new(),
            comments: Vec::with_capacity(files.len()),
        };
        for (file_index, file) in files.iter().enumerate() {
            graph
                .packages
                .entry(file.package().to_owned())
                .or_default()
                .push(file_index);
            graph.comments.push(source_info::leading_comments(file));
            graph.order.push(Vec::new());
            graph.index_file(file_index, file);
        }
        graph.files = files;
        log::debug!(
            "Indexed {} files, {} packages, {} types",
            graph.files.len(),
            graph.packages.len(),
            graph.types.len()
        );
        graph
    }

    /// Index a descriptor set
    pub fn from_descriptor_set(set: FileDescriptorSet) -> Self {
        Self::new(set.file)
    }

    /// Decode and index an encoded descriptor set
    pub fn decode(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        FileDescriptorSet::decode(bytes).map(Self::from_descriptor_set)
    }

    fn index_file(&mut self, file_index: usize, file: &FileDescriptorProto) {
        let package = file.package();
        let prefix = if package.is_empty() {
            String::new()
        } else {
            format!("{}.", package)
        };
        for (i, message) in file.message_type.iter().enumerate() {
            self.index_message(
                file_index,
                file,
                &prefix,
                &mut Vec::new(),
                vec![FILE_MESSAGE_TYPE, i as i32],
                message,
            );
        }
        for (i, enumeration) in file.enum_type.iter().enumerate() {
            self.insert(
                file_index,
                file,
                &prefix,
                &[],
                vec![FILE_ENUM_TYPE, i as i32],
                enumeration.name(),
                TypeKind::Enum,
                false,
            );
        }
    }

    fn index_message(
        &mut self,
        file_index: usize,
        file: &FileDescriptorProto,
        prefix: &str,
        parents: &mut Vec<String>,
        path: Vec<i32>,
        message: &DescriptorProto,
    ) {
        let is_map_entry = message
            .options
            .as_ref()
            .map(|options| options.map_entry())
            .unwrap_or(false);
        self.insert(
            file_index,
            file,
            prefix,
            parents,
            path.clone(),
            message.name(),
            TypeKind::Message,
            is_map_entry,
        );

        parents.push(message.name().to_owned());
        for (j, nested) in message.nested_type.iter().enumerate() {
            let mut nested_path = path.clone();
            nested_path.extend([MESSAGE_NESTED_TYPE, j as i32]);
            self.index_message(file_index, file, prefix, parents, nested_path, nested);
        }
        for (k, enumeration) in message.enum_type.iter().enumerate() {
            let mut enum_path = path.clone();
            enum_path.extend([MESSAGE_ENUM_TYPE, k as i32]);
            self.insert(
                file_index,
                file,
                prefix,
                parents,
                enum_path,
                enumeration.name(),
                TypeKind::Enum,
                false,
            );
        }
        parents.pop();
    }

    #[allow(clippy::too_many_arguments)]
    fn insert(
        &mut self,
        file_index: usize,
        file: &FileDescriptorProto,
        prefix: &str,
        parents: &[String],
        path: Vec<i32>,
        name: &str,
        kind: TypeKind,
        is_map_entry: bool,
    ) {
        let mut fq_name = prefix.to_owned();
        for parent in parents {
            fq_name.push_str(parent);
            fq_name.push('.');
        }
        fq_name.push_str(name);
        self.order[file_index].push(fq_name.clone());
        self.types.insert(
            fq_name.clone(),
            TypeEntry {
                fq_name,
                name: name.to_owned(),
                kind,
                package: file.package().to_owned(),
                file: file.name().to_owned(),
                file_index,
                parents: parents.to_vec(),
                is_map_entry,
                path,
            },
        );
    }

    /// Every file, in descriptor set order
    pub fn files(&self) -> &[FileDescriptorProto] {
        &self.files
    }

    /// File by index
    pub fn file(&self, file_index: usize) -> Option<&FileDescriptorProto> {
        self.files.get(file_index)
    }

    /// Index of a file by name
    pub fn file_index(&self, file_name: &str) -> Option<usize> {
        self.files.iter().position(|file| file.name() == file_name)
    }

    /// Every package name, sorted
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Whether some file declares `package`
    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    /// Files declaring `package`, with their indexes
    pub fn package_files<'g>(
        &'g self,
        package: &str,
    ) -> impl Iterator<Item = (usize, &'g FileDescriptorProto)> + 'g {
        self.packages
            .get(package)
            .into_iter()
            .flatten()
            .filter_map(move |&i| self.files.get(i).map(|file| (i, file)))
    }

    /// Types declared by a file, in declaration order (parents before their nested types)
    pub fn file_types(&self, file_index: usize) -> impl Iterator<Item = &TypeEntry> {
        self.order
            .get(file_index)
            .into_iter()
            .flatten()
            .filter_map(move |fq_name| self.types.get(fq_name))
    }

    /// Type by fully-qualified name, with or without leading dot
    pub fn lookup(&self, type_name: &str) -> Option<&TypeEntry> {
        self.types
            .get(type_name.strip_prefix('.').unwrap_or(type_name))
    }

    /// Message descriptor of an entry
    pub fn message(&self, entry: &TypeEntry) -> Option<&DescriptorProto> {
        if entry.kind != TypeKind::Message {
            return None;
        }
        source_info::message_at(self.files.get(entry.file_index)?, &entry.path)
    }

    /// Enum descriptor of an entry
    pub fn enumeration(&self, entry: &TypeEntry) -> Option<&EnumDescriptorProto> {
        if entry.kind != TypeKind::Enum {
            return None;
        }
        source_info::enum_at(self.files.get(entry.file_index)?, &entry.path)
    }

    /// Leading comment of the element at `path`, empty when there is none
    pub fn comment(&self, file_index: usize, path: &[i32]) -> String {
        self.comments
            .get(file_index)
            .and_then(|comments| comments.get(path))
            .cloned()
            .unwrap_or_default()
    }

    /// Package metadata, `None` when no file declares `package`
    pub fn package_info(&self, package: &str, config: &Config) -> Option<PackageInfo> {
        let file_indexes = self.packages.get(package)?;
        let has_services = file_indexes
            .iter()
            .filter_map(|&i| self.files.get(i))
            .any(|file| !file.service.is_empty());
        let mut has_messages = false;
        let mut has_enums = false;
        for entry in file_indexes.iter().flat_map(|&i| self.file_types(i)) {
            match entry.kind {
                TypeKind::Message if !entry.is_map_entry => has_messages = true,
                TypeKind::Enum => has_enums = true,
                TypeKind::Message => {}
            }
        }
        Some(PackageInfo {
            name: package.to_owned(),
            path: naming::package_to_path(package),
            backend_import_path: backend_import_path(&config.backend_module_root, package),
            has_services,
            has_messages,
            has_enums,
        })
    }
}

/// Rust module path of a package under `module_root`
pub fn backend_import_path(module_root: &str, package: &str) -> String {
    let mut path = module_root.to_owned();
    for segment in package.split('.').filter(|segment| !segment.is_empty()) {
        if !path.is_empty() {
            path.push_str("::");
        }
        path.push_str(&naming::rust_ident(segment));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn ambiguous_graph() -> SchemaGraph {
        // `a.b.c.D` exists both as package `a.b.c` message `D` and as `a.b` message `c` nested `D`
        SchemaGraph::new(vec![
            file("a/b/c/d.proto", "a.b.c").message(message("D", vec![])).build(),
            file("a/b/c.proto", "a.b")
                .message(message("c", vec![]).nested(message("E", vec![])))
                .build(),
        ])
    }

    #[test]
    fn owning_package_from_declaring_file_test() {
        let graph = ambiguous_graph();
        let d = graph.lookup(".a.b.c.D").unwrap();
        assert_eq!(d.package, "a.b.c");
        assert_eq!(d.file, "a/b/c/d.proto");
        assert!(!d.is_nested());

        let e = graph.lookup("a.b.c.E").unwrap();
        assert_eq!(e.package, "a.b");
        assert_eq!(e.parents, ["c"]);
        assert_eq!(graph.message(e).unwrap().name(), "E");
    }

    #[test]
    fn map_entries_and_enums_test() {
        let graph = SchemaGraph::new(vec![file("shop/v1/cart.proto", "shop.v1")
            .message(
                message("Cart", vec![map_field("tags", 1, ".shop.v1.Cart.TagsEntry")])
                    .nested(map_entry("TagsEntry", scalar_field("value", 2, FieldType::String)))
                    .nested_enum(enumeration("State", &[("OPEN", 0), ("CLOSED", 1)])),
            )
            .enumeration(enumeration("Currency", &[("EUR", 0)]))
            .build()]);
        let entry = graph.lookup("shop.v1.Cart.TagsEntry").unwrap();
        assert!(entry.is_map_entry);
        let state = graph.lookup("shop.v1.Cart.State").unwrap();
        assert_eq!(state.kind, TypeKind::Enum);
        assert_eq!(graph.enumeration(state).unwrap().value.len(), 2);
        assert!(graph.message(state).is_none());

        let order: Vec<&str> = graph.file_types(0).map(|t| t.fq_name.as_str()).collect();
        assert_eq!(
            order,
            [
                "shop.v1.Cart",
                "shop.v1.Cart.TagsEntry",
                "shop.v1.Cart.State",
                "shop.v1.Currency"
            ]
        );

        let info = graph.package_info("shop.v1", &Config::default()).unwrap();
        assert!(info.has_messages);
        assert!(info.has_enums);
        assert!(!info.has_services);
        assert_eq!(info.path, "shop/v1");
        assert_eq!(info.backend_import_path, "crate::shop::v1");
        assert!(graph.package_info("nope", &Config::default()).is_none());
    }

    #[test]
    fn comments_test() {
        let graph = SchemaGraph::new(vec![file("shop/v1/cart.proto", "shop.v1")
            .message(message("Cart", vec![]))
            .comment(&[4, 0], " A shopping cart.\n")
            .build()]);
        assert_eq!(graph.comment(0, &[4, 0]), "A shopping cart.");
        assert_eq!(graph.comment(0, &[4, 1]), "");
        assert_eq!(graph.comment(7, &[4, 0]), "");
    }

    #[test]
    fn backend_import_path_test() {
        assert_eq!(backend_import_path("crate", "a.type.v1"), "crate::a::r#type::v1");
        assert_eq!(backend_import_path("crate::gen", ""), "crate::gen");
        assert_eq!(backend_import_path("", "shop.v1"), "shop::v1");
    }

    #[test]
    fn package_files_test() {
        let graph = ambiguous_graph();
        let names: Vec<&str> = graph.package_names().collect();
        assert_eq!(names, ["a.b", "a.b.c"]);
        assert_eq!(graph.package_files("a.b").count(), 1);
        assert_eq!(graph.package_files("missing").count(), 0);
        assert_eq!(graph.file_index("a/b/c.proto"), Some(1));
    }
}
