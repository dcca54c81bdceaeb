//! Per-package build state.

use std::collections::{BTreeMap, HashSet};

use crate::model::ImportInfo;
use crate::{paths, Config};

/// Registry of import path to alias.
///
/// A path maps to exactly one alias and two paths never share an alias.
#[derive(Debug, Default, Clone)]
pub struct ImportMap {
    aliases: BTreeMap<String, String>,
    taken: HashSet<String>,
}

impl ImportMap {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of `import_path`, registering it on first use.
    ///
    /// The alias is the last path segment, a colliding alias gets `_2`, `_3`, ... appended.
    pub fn alias_for(&mut self, import_path: &str) -> String {
        if let Some(alias) = self.aliases.get(import_path) {
            return alias.clone();
        }
        let base = paths::alias_base(import_path);
        let mut alias = base.clone();
        let mut counter = 2;
        while self.taken.contains(&alias) {
            alias = format!("{}_{}", base, counter);
            counter += 1;
        }
        self.taken.insert(alias.clone());
        self.aliases.insert(import_path.to_owned(), alias.clone());
        alias
    }

    /// Alias of an already registered path
    pub fn get(&self, import_path: &str) -> Option<&str> {
        self.aliases.get(import_path).map(String::as_str)
    }

    /// Registered imports, sorted by path
    pub fn imports(&self) -> Vec<ImportInfo> {
        self.aliases
            .iter()
            .map(|(path, alias)| ImportInfo {
                path: path.clone(),
                alias: alias.clone(),
            })
            .collect()
    }

    /// Amount of registered paths
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Scratch space for building one package.
///
/// Created fresh for every package build and dropped afterwards. It is never shared between
/// packages, so distinct packages can be built in parallel.
#[derive(Debug)]
pub struct BuildContext<'a> {
    config: &'a Config,
    imports: ImportMap,
}

impl<'a> BuildContext<'a> {
    /// Context for a new package build
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            imports: ImportMap::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &'a Config {
        self.config
    }

    /// Alias of `import_path` within this build
    pub fn alias_for(&mut self, import_path: &str) -> String {
        self.imports.alias_for(import_path)
    }

    /// Imports registered so far
    pub fn imports(&self) -> &ImportMap {
        &self.imports
    }
}
