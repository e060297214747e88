//! pscript_options: compiler configuration.
//!
//! Options come from a JSON config file shaped like a tsconfig: every field
//! is optional and falls back to a default when absent. Resolution only ever
//! sees the concrete `ResolveOptions` derived from them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// The reserved root namespace that holds runtime helpers such as `_typeof`.
pub const DEFAULT_ROOT_NAMESPACE: &str = "_root";

/// Which backend a compilation emits into. Selected once per compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileTarget {
    /// Managed bytecode.
    #[default]
    Native,
    /// Text for the dynamic scripting runtime.
    Script,
}

impl CompileTarget {
    pub fn name(self) -> &'static str {
        match self {
            CompileTarget::Native => "native",
            CompileTarget::Script => "script",
        }
    }
}

/// Strict host-language semantics or the extended dynamic dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Strict,
    Extended,
}

impl Dialect {
    #[inline]
    pub fn is_extended(self) -> bool {
        self == Dialect::Extended
    }
}

/// Compiler options as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    pub target: Option<CompileTarget>,
    /// Enable the extended dialect.
    pub extended: Option<bool>,
    pub root_namespace: Option<String>,
}

/// The concrete settings resolution runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub target: CompileTarget,
    pub dialect: Dialect,
    pub root_namespace: String,
}

impl ResolveOptions {
    pub fn new(target: CompileTarget, dialect: Dialect) -> Self {
        Self {
            target,
            dialect,
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
        }
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::new(CompileTarget::default(), Dialect::default())
    }
}

impl CompilerOptions {
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            target: self.target.unwrap_or_default(),
            dialect: if self.extended.unwrap_or(false) {
                Dialect::Extended
            } else {
                Dialect::Strict
            },
            root_namespace: self
                .root_namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_ROOT_NAMESPACE.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse compiler options from JSON text.
pub fn parse_config(content: &str) -> Result<CompilerOptions, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse compiler options from a file on disk.
pub fn parse_config_file(path: impl AsRef<Path>) -> Result<CompilerOptions, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = parse_config("{}").unwrap().resolve_options();
        assert_eq!(opts.target, CompileTarget::Native);
        assert_eq!(opts.dialect, Dialect::Strict);
        assert_eq!(opts.root_namespace, "_root");
    }

    #[test]
    fn test_script_extended() {
        let opts = parse_config(r#"{ "target": "script", "extended": true, "rootNamespace": "_top" }"#)
            .unwrap()
            .resolve_options();
        assert_eq!(opts.target, CompileTarget::Script);
        assert!(opts.dialect.is_extended());
        assert_eq!(opts.root_namespace, "_top");
    }

    #[test]
    fn test_unknown_target_rejected() {
        assert!(matches!(parse_config(r#"{ "target": "wasm" }"#), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            parse_config_file("/nonexistent/pscript.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
