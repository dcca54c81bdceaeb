//! Naming conventions shared by both targets.
//!
//! None of these fail: schema names are controlled input, and a strange name produces a strange
//! identifier rather than an aborted run. Characters that are not word separators pass through
//! untouched.

use heck::ToSnakeCase;

const WORD_SEPARATORS: [char; 3] = ['_', '.', '-'];

/// Suffix of a derived module name, `a.b.v1` becomes `a_b_v1_services`
pub const MODULE_SUFFIX: &str = "_services";

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try", "typeof",
    "unsized", "virtual", "yield",
];

// cannot be raw identifiers
const RUST_RESERVED_PATHS: &[&str] = &["crate", "self", "Self", "super"];

/// `add_item`, `add-item` and `AddItem` all become `AddItem`
pub fn to_pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for word in name.split(WORD_SEPARATORS).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `add_item` and `AddItem` both become `addItem`
pub fn to_camel_case(name: &str) -> String {
    let pascal = to_pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => pascal,
    }
}

/// `AddItem` becomes `add_item`
pub fn to_snake_case(name: &str) -> String {
    name.to_snake_case()
}

/// Module (and namespace) name for a package.
///
/// A non-empty `explicit_override` always wins, for every package of the run, since several
/// packages can be bundled into one physical module.
pub fn to_module_name(package_name: &str, explicit_override: &str) -> String {
    if !explicit_override.is_empty() {
        return explicit_override.to_owned();
    }
    format!("{}{}", package_name.replace('.', "_"), MODULE_SUFFIX)
}

/// Directory of a package, `a.b.v1` becomes `a/b/v1`
pub fn package_to_path(package_name: &str) -> String {
    package_name.replace('.', "/")
}

/// Script identifier of a possibly nested type, `Cart.Item` becomes `Cart_Item`
pub fn flatten_nested(parents: &[String], name: &str) -> String {
    if parents.is_empty() {
        return name.to_owned();
    }
    let mut out = parents.join("_");
    out.push('_');
    out.push_str(name);
    out
}

/// Proto file name without directory or extension, `shop/v1/cart.proto` becomes `cart`
pub fn file_stem(proto_file: &str) -> &str {
    let base = proto_file.rsplit('/').next().unwrap_or(proto_file);
    base.strip_suffix(".proto").unwrap_or(base)
}

/// Whether `name` is a Rust keyword that needs escaping
pub fn is_rust_keyword(name: &str) -> bool {
    RUST_KEYWORDS.contains(&name) || RUST_RESERVED_PATHS.contains(&name)
}

/// Usable Rust identifier for `name`, keywords become raw identifiers
pub fn rust_ident(name: &str) -> String {
    if RUST_RESERVED_PATHS.contains(&name) {
        format!("{}_", name)
    } else if RUST_KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_owned()
    }
}

/// Rust path of a prost-generated type relative to its package module.
///
/// prost nests child types in a snake-case module named after the parent, so `Cart.Item`
/// becomes `cart::Item`.
pub fn backend_type_path(parents: &[String], name: &str) -> String {
    let mut segments: Vec<String> = parents
        .iter()
        .map(|parent| rust_ident(&to_snake_case(parent)))
        .collect();
    segments.push(to_pascal_case(name));
    segments.join("::")
}
