use serde::Serialize;

/// Prefix marking an import as package-relative: `@import "~pkg/file"`.
pub const MODULE_MARKER: char = '~';

/// A `~` import specifier split into its package id and in-package path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReference {
    /// `pkg` or `@scope/pkg`; `None` when the specifier names no package
    pub module_id: Option<String>,
    /// Remaining segments joined by `/`, empty when there are none
    pub file_path: String,
}

/// Split a module specifier such as `~@scope/pkg/theme/vars.scss`.
///
/// Package name legality is not checked. Malformed specifiers produce a
/// best-effort split rather than an error.
pub fn split_module_specifier(spec: &str) -> ModuleReference {
    let spec = spec.strip_prefix(MODULE_MARKER).unwrap_or(spec);
    let segments: Vec<&str> = spec.split('/').collect();

    let (module_id, rest) = if spec.starts_with('@') && segments.len() > 1 {
        (segments[..2].join("/"), &segments[2..])
    } else {
        (segments[0].to_string(), &segments[1..])
    };

    ModuleReference {
        module_id: if module_id.is_empty() { None } else { Some(module_id) },
        file_path: rest.join("/"),
    }
}
