//! Generation configuration.
//!
//! One flat record, read-only for every builder call. It is read from the protoc plugin
//! parameter (`key=value,key=value`) and optionally from a TOML file named by `config=<path>`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Separator between items of a list value inside the plugin parameter
pub const LIST_SEPARATOR: char = '+';

/// How generated script clients are attached to the module namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceMode {
    /// One namespace per package, named after the package
    #[default]
    Namespaced,
    /// Every package shares the module namespace
    Flat,
    /// Every service gets its own key directly under the module namespace
    ServiceBased,
}

impl std::str::FromStr for NamespaceMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "namespaced" => Ok(Self::Namespaced),
            "flat" => Ok(Self::Flat),
            "service_based" => Ok(Self::ServiceBased),
            _ => Err(()),
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output root of the backend target
    pub backend_out: String,
    /// Output root of the script target
    pub script_out: String,
    /// Rust module every package module lives under
    pub backend_module_root: String,
    /// Namespace structuring of script clients
    pub namespace_mode: NamespaceMode,
    /// Module name shared by every package of the run, derived per package when empty
    pub module_name: String,
    /// Emit script clients
    pub generate_clients: bool,
    /// Emit script type, schema and aggregator files
    pub generate_types: bool,
    /// Emit script factories and deserializers
    pub generate_factories: bool,
    /// Emit a build script next to the backend bindings
    pub generate_build_script: bool,
    /// Services to generate (glob on simple or fully-qualified name), empty means all
    pub services: Vec<String>,
    /// Methods to generate, empty means all
    pub methods_include: Vec<String>,
    /// Methods never generated
    pub methods_exclude: Vec<String>,
    /// Services implemented by the browser and called from the backend
    pub browser_services: Vec<String>,
    /// Methods exposed as async on the script side
    pub async_methods: Vec<String>,
    /// Fully-qualified service or method name to script-side name
    pub custom_names: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_out: "backend".to_owned(),
            script_out: "script".to_owned(),
            backend_module_root: "crate".to_owned(),
            namespace_mode: NamespaceMode::default(),
            module_name: String::new(),
            generate_clients: true,
            generate_types: true,
            generate_factories: true,
            generate_build_script: false,
            services: Vec::new(),
            methods_include: Vec::new(),
            methods_exclude: Vec::new(),
            browser_services: Vec::new(),
            async_methods: Vec::new(),
            custom_names: BTreeMap::new(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" | "" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Read a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a protoc plugin parameter.
    ///
    /// `config=<path>` loads a TOML file first, wherever it appears, and the other keys override
    /// its values. Custom names use `custom_name=<fq name>:<script name>` and may repeat.
    pub fn from_parameter(parameter: &str) -> Result<Self, ConfigError> {
        let pairs: Vec<(&str, &str)> = parameter
            .split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (pair, ""),
            })
            .collect();

        let mut config = match pairs.iter().find(|(key, _)| *key == "config") {
            Some((_, path)) => Self::load(path)?,
            None => Self::default(),
        };
        for (key, value) in pairs {
            config.apply(key, value)?;
        }
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "config" => {}
            "backend_out" => self.backend_out = value.to_owned(),
            "script_out" => self.script_out = value.to_owned(),
            "backend_module_root" => self.backend_module_root = value.to_owned(),
            "namespace_mode" => {
                self.namespace_mode =
                    value
                        .parse::<NamespaceMode>()
                        .map_err(|_| ConfigError::InvalidValue {
                            key: key.to_owned(),
                            value: value.to_owned(),
                        })?
            }
            "module_name" => self.module_name = value.to_owned(),
            "generate_clients" => self.generate_clients = parse_bool(key, value)?,
            "generate_types" => self.generate_types = parse_bool(key, value)?,
            "generate_factories" => self.generate_factories = parse_bool(key, value)?,
            "generate_build_script" => self.generate_build_script = parse_bool(key, value)?,
            "services" => self.services = parse_list(value),
            "methods_include" => self.methods_include = parse_list(value),
            "methods_exclude" => self.methods_exclude = parse_list(value),
            "browser_services" => self.browser_services = parse_list(value),
            "async_methods" => self.async_methods = parse_list(value),
            "custom_name" => match value.split_once(':') {
                Some((fq_name, name)) if !fq_name.is_empty() && !name.is_empty() => {
                    self.custom_names.insert(fq_name.to_owned(), name.to_owned());
                }
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_owned(),
                        value: value.to_owned(),
                    })
                }
            },
            _ => return Err(ConfigError::UnknownKey(key.to_owned())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_parameter_test() {
        assert_eq!(Config::from_parameter("").unwrap(), Config::default());
    }

    #[test]
    fn parameter_test() {
        let config = Config::from_parameter(
            "module_name=shop_bundle, namespace_mode=flat,generate_build_script,\
             browser_services=TestService+shop.v1.Notifier,custom_name=shop.v1.CartService:cart",
        )
        .unwrap();
        assert_eq!(config.module_name, "shop_bundle");
        assert_eq!(config.namespace_mode, NamespaceMode::Flat);
        assert!(config.generate_build_script);
        assert_eq!(config.browser_services, ["TestService", "shop.v1.Notifier"]);
        assert_eq!(config.custom_names["shop.v1.CartService"], "cart");
    }

    #[test]
    fn bad_parameter_test() {
        assert!(matches!(
            Config::from_parameter("frobnicate=1"),
            Err(ConfigError::UnknownKey(key)) if key == "frobnicate"
        ));
        assert!(matches!(
            Config::from_parameter("generate_types=maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::from_parameter("namespace_mode=nested"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::from_parameter("custom_name=nocolon"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn toml_test() {
        let config = Config::from_toml_str(
            r#"
            module_name = "shop_bundle"
            namespace_mode = "service_based"
            generate_factories = false
            methods_exclude = ["*Debug"]

            [custom_names]
            "shop.v1.CartService.AddItem" = "put"
            "#,
        )
        .unwrap();
        assert_eq!(config.namespace_mode, NamespaceMode::ServiceBased);
        assert!(!config.generate_factories);
        assert!(config.generate_clients);
        assert_eq!(config.methods_exclude, ["*Debug"]);
        assert_eq!(config.custom_names["shop.v1.CartService.AddItem"], "put");
    }

    #[test]
    fn toml_unknown_field_test() {
        assert!(matches!(
            Config::from_toml_str("unknown = 1"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn config_file_then_overrides_test() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "module_name = \"from_file\"\nnamespace_mode = \"flat\"\ngenerate_factories = false"
        )
        .unwrap();
        let path = file.path().display().to_string();

        // the file is loaded first wherever it appears, explicit keys win
        let parameter = format!("module_name=shop_bundle,config={}", path);
        let config = Config::from_parameter(&parameter).unwrap();
        assert_eq!(config.module_name, "shop_bundle");
        assert_eq!(config.namespace_mode, NamespaceMode::Flat);
        assert!(!config.generate_factories);
        assert!(config.generate_types);

        let parameter = format!("config={},generate_factories", path);
        let config = Config::from_parameter(&parameter).unwrap();
        assert_eq!(config.module_name, "from_file");
        assert!(config.generate_factories);
    }

    #[test]
    fn missing_config_file_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Config::from_parameter(&format!("config={}", path.display())),
            Err(ConfigError::Io(_))
        ));
    }
}
