use crate::compiler::Importers;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// File extensions the plugin handles
pub const STYLE_EXTENSIONS: &[&str] = &[".scss", ".sass"];

/// Deprecation silenced on every render
pub const LEGACY_JS_API: &str = "legacy-js-api";

/// User-supplied plugin configuration.
///
/// Native compiler options the plugin does not interpret are kept in
/// `passthrough` and forwarded to the compiler untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    /// Extra load paths, relative ones are resolved against the project root
    #[serde(default)]
    pub include_paths: Vec<String>,

    /// Style sheets imported ahead of every compiled file
    #[serde(default)]
    pub inject_global_paths: Vec<String>,

    /// User importers, run before the generated module importer
    #[serde(skip)]
    pub importer: Importers,

    pub silence_deprecations: Option<Vec<String>>,

    /// Accepted for compatibility, never forwarded to the compiler
    pub file: Option<String>,

    #[serde(flatten)]
    pub passthrough: FxHashMap<String, Value>,
}

/// Compiler-ready options derived from [`PluginOptions`] for one file
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Injected `@import` statements followed by the source text
    pub data: String,

    pub indented_syntax: bool,

    /// Always absolute
    pub include_paths: Vec<String>,

    #[serde(skip)]
    pub importer: Importers,

    pub silence_deprecations: Vec<String>,

    #[serde(flatten)]
    pub passthrough: FxHashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warn,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Css,
    Build,
}

/// Style-sheet syntax of the file a diagnostic points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Scss,
    Sass,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warn => f.write_str("warn"),
            Self::Info => f.write_str("info"),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scss => f.write_str("scss"),
            Self::Sass => f.write_str("sass"),
        }
    }
}

/// A compiler error translated for the host's diagnostics reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub language: Language,
    pub header: String,
    pub code: String,
    pub rel_file_path: Option<String>,
    pub abs_file_path: Option<String>,
    pub message_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<usize>,
    pub lines: Vec<SourceLineContext>,
}

/// One line of the excerpt attached to a [`Diagnostic`].
///
/// Lines around the error carry `-1` for both span fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLineContext {
    pub line_index: usize,
    pub line_number: usize,
    pub text: String,
    pub error_char_start: i32,
    pub error_length: i32,
}

/// Module resolution failed inside the generated importer
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cannot resolve module '{module_id}': {source}")]
    Resolve {
        module_id: String,
        #[source]
        source: ResolveError,
    },

    #[error("Importer failed: {0}")]
    Other(String),
}

/// Error reported by a host module resolver
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

/// The compiler could not be invoked at all
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("Compiler unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid render options: {0}")]
    InvalidOptions(String),
}
