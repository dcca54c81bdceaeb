//! Import aliases and relative paths between package directories.

use crate::naming;

/// Short identifier for an import path, before de-duplication.
///
/// The last segment of `a/b/c` or `crate::a::b` is used, characters that cannot appear in an
/// identifier become `_`.
pub fn alias_base(import_path: &str) -> String {
    let trimmed = import_path.trim_end_matches(['/', ':']);
    let last = trimmed
        .rsplit(|c: char| c == '/' || c == ':')
        .find(|segment| !segment.is_empty())
        .unwrap_or(trimmed);
    let mut alias: String = last
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if alias.is_empty() {
        alias.push_str("pkg");
    }
    if alias.starts_with(|c: char| c.is_ascii_digit()) {
        alias.insert(0, '_');
    }
    if naming::is_rust_keyword(&alias) {
        alias.push('_');
    }
    alias
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

/// Relative path from the directory of one package to the directory of another.
///
/// `from_package_path` is a directory (`a/b`), `to_package_name` a dotted package (`a.c`).
/// The result always starts with `./` or `../` and uses forward slashes, except when both point
/// at the same directory: then it is `.` and the caller must not import from itself.
pub fn relative_path(from_package_path: &str, to_package_name: &str) -> String {
    let from_normalized = from_package_path.replace('\\', "/");
    let to_normalized = naming::package_to_path(to_package_name);
    let from = segments(&from_normalized);
    let to = segments(&to_normalized);

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from.len() - common;
    let rest = &to[common..];

    if ups == 0 && rest.is_empty() {
        return ".".to_owned();
    }
    let mut out = if ups == 0 {
        ".".to_owned()
    } else {
        vec![".."; ups].join("/")
    };
    for segment in rest {
        out.push('/');
        out.push_str(segment);
    }
    out
}

/// Module specifier for `module` inside the directory `relative` points at
pub fn join_import(relative: &str, module: &str) -> String {
    if relative == "." {
        format!("./{}", module)
    } else {
        format!("{}/{}", relative, module)
    }
}
