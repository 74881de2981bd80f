use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// `\\?\C:\...` style paths must never be rewritten
fn extended_path_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\\\\\?\\").unwrap())
}

fn non_ascii_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[^\x00-\x{80}]+").unwrap())
}

/// Convert a path to its canonical forward-slash form.
///
/// Extended-length (`\\?\`) and non-ASCII paths are returned trimmed but
/// otherwise untouched. A trailing slash is dropped unless it marks a root:
/// either a bare `/`, or a drive root such as `C:/` where the colon sits
/// within two characters of the end.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();

    if extended_path_regex().is_match(path) || non_ascii_regex().is_match(path) {
        return path.to_string();
    }

    let mut normalized = path.replace('\\', "/");

    if normalized.ends_with('/') {
        match normalized.find(':') {
            Some(colon) => {
                if colon + 2 < normalized.len() {
                    normalized.pop();
                }
            }
            None => {
                if normalized.len() > 1 {
                    normalized.pop();
                }
            }
        }
    }

    normalized
}

/// Resolve `path` against `base` unless it is already absolute, folding
/// `.` and `..` components lexically. Nothing touches the disk.
pub fn resolve_against(base: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    let joined = if candidate.is_absolute() { candidate.to_path_buf() } else { base.join(candidate) };
    clean(&joined)
}

/// Append `path` to `base` even when `path` starts with a separator, so
/// the result always stays under `base` apart from explicit `..` segments.
pub fn join_under(base: &Path, path: &str) -> PathBuf {
    clean(&base.join(path.trim_start_matches(['/', '\\'])))
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // never walk above a root
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Directory portion of a file name; `"."` when it has none.
pub fn dirname(file_name: &str) -> &str {
    match Path::new(file_name).parent().and_then(|p| p.to_str()) {
        Some("") | None => ".",
        Some(dir) => dir,
    }
}
