/// Errors raised while turning schema elements into template data
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A message field references a type that no file in the descriptor set declares
    #[error("field `{field}` references type `{type_name}` which is not declared by any file")]
    UnresolvedType {
        /// Fully-qualified field name (`pkg.Message.field`)
        field: String,
        /// Referenced type name as written in the descriptor
        type_name: String,
    },
    /// A method request or response type is not declared by any file
    #[error("method `{method}` references type `{type_name}` which is not declared by any file")]
    UnresolvedMethodType {
        /// Fully-qualified method name (`pkg.Service.Method`)
        method: String,
        /// Referenced type name as written in the descriptor
        type_name: String,
    },
    /// Required logical files were never produced
    #[error("package `{package}` is missing required files: {}", .missing.join(", "))]
    MissingFiles {
        /// Package being emitted
        package: String,
        /// Logical names of every missing required file
        missing: Vec<String>,
    },
    /// Package is not part of the schema graph
    #[error("package `{0}` is not declared by any file")]
    UnknownPackage(String),
    /// Template data could not be serialized for the renderer
    #[error("cannot serialize template data for `{logical_name}`: {message}")]
    Serialize {
        /// Logical file the data belongs to
        logical_name: String,
        /// Serializer message
        message: String,
    },
    /// The renderer rejected a file
    #[error("cannot render `{logical_name}`: {message}")]
    Render {
        /// Logical file being rendered
        logical_name: String,
        /// Renderer message
        message: String,
    },
}

/// Result of a build step
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Parameter key is not a configuration field
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),
    /// Parameter value cannot be parsed for its key
    #[error("invalid value `{value}` for configuration key `{key}`")]
    InvalidValue {
        /// Configuration key
        key: String,
        /// Offending value
        value: String,
    },
    /// Filter pattern is not a valid glob
    #[error("invalid filter pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Glob parser error
        #[source]
        source: glob::PatternError,
    },
    /// Configuration file cannot be read
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file is not valid TOML for [crate::Config]
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}
