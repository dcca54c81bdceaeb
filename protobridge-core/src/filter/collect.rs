use prost_types::{DescriptorProto, EnumDescriptorProto};

use crate::schema::{SchemaGraph, TypeEntry, TypeKind};

/// A message of one package, with its index entry
#[derive(Debug, Clone)]
pub struct CollectedMessage<'g> {
    /// Name, fq name, owning package, source file, parents and map-entry flag
    pub entry: &'g TypeEntry,
    /// Descriptor
    pub descriptor: &'g DescriptorProto,
    /// Leading comment
    pub comment: String,
}

/// An enum of one package, with its index entry
#[derive(Debug, Clone)]
pub struct CollectedEnum<'g> {
    /// Name, fq name, owning package, source file and parents
    pub entry: &'g TypeEntry,
    /// Descriptor
    pub descriptor: &'g EnumDescriptorProto,
    /// Leading comment
    pub comment: String,
}

/// Every message declared by `package`, map entries included, parents before nested types
pub fn collect_messages<'g>(graph: &'g SchemaGraph, package: &str) -> Vec<CollectedMessage<'g>> {
    package_types(graph, package, TypeKind::Message)
        .filter_map(move |entry| {
            Some(CollectedMessage {
                entry,
                descriptor: graph.message(entry)?,
                comment: graph.comment(entry.file_index, &entry.path),
            })
        })
        .collect()
}

/// Every enum declared by `package`, in declaration order
pub fn collect_enums<'g>(graph: &'g SchemaGraph, package: &str) -> Vec<CollectedEnum<'g>> {
    package_types(graph, package, TypeKind::Enum)
        .filter_map(move |entry| {
            Some(CollectedEnum {
                entry,
                descriptor: graph.enumeration(entry)?,
                comment: graph.comment(entry.file_index, &entry.path),
            })
        })
        .collect()
}

fn package_types<'g>(
    graph: &'g SchemaGraph,
    package: &str,
    kind: TypeKind,
) -> impl Iterator<Item = &'g TypeEntry> + 'g {
    let file_indexes: Vec<usize> = graph.package_files(package).map(|(i, _)| i).collect();
    file_indexes
        .into_iter()
        .flat_map(move |i| graph.file_types(i))
        .filter(move |entry| entry.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn collect_test() {
        let graph = graph(vec![
            file("shop/v1/cart.proto", "shop.v1")
                .message(
                    message("Cart", vec![map_field("tags", 1, ".shop.v1.Cart.TagsEntry")])
                        .nested(map_entry("TagsEntry", scalar_field("value", 2, FieldType::String)))
                        .nested_enum(enumeration("State", &[("OPEN", 0)])),
                )
                .comment(&[4, 0], " The cart.\n")
                .build(),
            file("shop/v1/price.proto", "shop.v1")
                .message(message("Price", vec![]))
                .enumeration(enumeration("Currency", &[("EUR", 0)]))
                .build(),
            file("other.proto", "other").message(message("Other", vec![])).build(),
        ]);

        let messages = collect_messages(&graph, "shop.v1");
        let names: Vec<&str> = messages.iter().map(|m| m.entry.fq_name.as_str()).collect();
        assert_eq!(names, ["shop.v1.Cart", "shop.v1.Cart.TagsEntry", "shop.v1.Price"]);
        assert_eq!(messages[0].comment, "The cart.");
        assert!(messages[1].entry.is_map_entry);
        assert!(messages[1].entry.is_nested());
        assert_eq!(messages[2].entry.file, "shop/v1/price.proto");

        let enums = collect_enums(&graph, "shop.v1");
        let names: Vec<&str> = enums.iter().map(|e| e.descriptor.name()).collect();
        assert_eq!(names, ["State", "Currency"]);
        assert!(collect_enums(&graph, "other").is_empty());
    }
}
