use crate::compiler::SassError;
use crate::host::PluginCtx;
use crate::path::normalize_path;
use crate::types::{Diagnostic, DiagnosticKind, DiagnosticLevel, Language, SourceLineContext};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

pub const HEADER: &str = "sass error";

/// Compiler messages carry their own source excerpt after this marker
const EXCERPT_MARKER: char = '╷';

/// Characters that bound the token highlighted in an error line. Reading
/// past the end of the line also counts as a stop.
const STOP_CHARS: &[char] = &[
    '\n', '\r', '\t', ' ', ':', ';', ',', '{', '}', '.', '#', '@', '!', '[', ']', '(', ')', '&',
    '+', '~', '^', '*', '$',
];

const MAX_DISPLAY_PATH: usize = 80;

/// Sentinel span for context lines around the error
const NO_SPAN: i32 = -1;

#[derive(Error, Debug)]
enum LineContextError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line} is past the end of {path} ({total} lines)")]
    OutOfRange { path: String, line: usize, total: usize },
}

/// Translate a compiler error into a [`Diagnostic`] and push it to the
/// context's diagnostics sink.
///
/// Returns `None`, pushing nothing, when either the context or the error is
/// missing. `fallback_file_path` is used when the error does not name a real
/// file of its own.
pub fn build_diagnostic(
    ctx: Option<&PluginCtx>,
    error: Option<&SassError>,
    fallback_file_path: Option<&str>,
) -> Option<Diagnostic> {
    let (ctx, error) = (ctx?, error?);

    let mut diagnostic = Diagnostic {
        level: DiagnosticLevel::Error,
        kind: DiagnosticKind::Css,
        language: Language::Scss,
        header: HEADER.to_string(),
        code: error.status.map(|status| status.to_string()).unwrap_or_default(),
        rel_file_path: None,
        abs_file_path: None,
        message_text: format_message(&error.message),
        line_number: None,
        column_number: None,
        lines: Vec::new(),
    };

    let file_path = match error.file.as_deref() {
        Some(file) if file != "stdin" => Some(file),
        _ => fallback_file_path,
    };

    if let Some(file_path) = file_path {
        diagnostic.language = language_for(file_path);
        diagnostic.abs_file_path = Some(file_path.to_string());
        diagnostic.rel_file_path = Some(format_file_name(&ctx.config.root_dir, file_path));

        if let Some(line_number) = error.line {
            diagnostic.line_number = Some(line_number);
            diagnostic.column_number = error.column;

            if line_number >= 1 {
                let column = error.column.unwrap_or(0);
                match load_line_context(ctx, file_path, line_number - 1, column) {
                    Ok(lines) => diagnostic.lines = lines,
                    Err(e) => warn!("sass plugin could not build line context: {e}"),
                }
            }
        }
    }

    ctx.diagnostics.push(diagnostic.clone());
    Some(diagnostic)
}

/// Message-only diagnostic for failures that never reached the compiler
pub fn failure_diagnostic(message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        level: DiagnosticLevel::Error,
        kind: DiagnosticKind::Css,
        language: Language::Scss,
        header: HEADER.to_string(),
        code: String::new(),
        rel_file_path: None,
        abs_file_path: None,
        message_text: message.into(),
        line_number: None,
        column_number: None,
        lines: Vec::new(),
    }
}

fn format_message(message: &str) -> String {
    message.split(EXCERPT_MARKER).next().unwrap_or_default().to_string()
}

fn language_for(file_path: &str) -> Language {
    if file_path.to_ascii_lowercase().ends_with(".scss") { Language::Scss } else { Language::Sass }
}

/// Path relative to the project root, keeping only the last 80 characters
fn format_file_name(root_dir: &Path, file_path: &str) -> String {
    let root = normalize_path(&root_dir.to_string_lossy());
    if root.is_empty() || file_path.is_empty() {
        return String::new();
    }

    let file = normalize_path(file_path);
    let relative = file.strip_prefix(root.as_str()).unwrap_or(&file);
    let relative = relative.strip_prefix(['/', '\\']).unwrap_or(relative);

    let len = relative.chars().count();
    if len > MAX_DISPLAY_PATH {
        let tail: String = relative.chars().skip(len - MAX_DISPLAY_PATH).collect();
        format!("...{tail}")
    } else {
        relative.to_string()
    }
}

/// Split on `\n` and `\r\n`
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    for line in &mut lines[..last] {
        *line = line.strip_suffix('\r').unwrap_or(line);
    }
    lines
}

fn load_line_context(
    ctx: &PluginCtx,
    file_path: &str,
    line_index: usize,
    column: usize,
) -> Result<Vec<SourceLineContext>, LineContextError> {
    let source = ctx
        .fs
        .read_file_sync(file_path)
        .map_err(|source| LineContextError::Read { path: file_path.to_string(), source })?;
    let src_lines = split_lines(&source);

    let Some(text) = src_lines.get(line_index) else {
        return Err(LineContextError::OutOfRange {
            path: file_path.to_string(),
            line: line_index + 1,
            total: src_lines.len(),
        });
    };

    let (error_char_start, error_length) = find_error_span(text, column);
    let mut lines = Vec::with_capacity(3);

    if line_index > 0 {
        lines.push(context_line(line_index - 1, src_lines[line_index - 1]));
    }
    lines.push(SourceLineContext {
        line_index,
        line_number: line_index + 1,
        text: text.to_string(),
        error_char_start,
        error_length,
    });
    if let Some(next) = src_lines.get(line_index + 1) {
        lines.push(context_line(line_index + 1, next));
    }

    Ok(lines)
}

fn context_line(line_index: usize, text: &str) -> SourceLineContext {
    SourceLineContext {
        line_index,
        line_number: line_index + 1,
        text: text.to_string(),
        error_char_start: NO_SPAN,
        error_length: NO_SPAN,
    }
}

/// Widen `column` to the whole token around it.
///
/// Scans back from `column` to the first stop character, then forward
/// counting non-stop characters. An empty token right after another token
/// becomes a one character span over that token's last character.
fn find_error_span(text: &str, column: usize) -> (i32, i32) {
    let chars: Vec<char> = text.chars().collect();
    let is_stop = |i: usize| chars.get(i).map_or(true, |c| STOP_CHARS.contains(c));

    let mut start = column;
    let mut i = column;
    while !is_stop(i) {
        start = i;
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut length = 0usize;
    while !is_stop(start + length) {
        length += 1;
    }

    if length == 0 && start > 0 {
        length = 1;
        start -= 1;
    }

    (to_i32(start), to_i32(length))
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
