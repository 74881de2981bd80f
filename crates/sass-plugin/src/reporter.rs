use crate::types::{Diagnostic, SourceLineContext};
use std::fmt::Write;

/// Render diagnostics the way a terminal build log shows them
pub fn format_text(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();

    for diagnostic in diagnostics {
        let _ = writeln!(out, "[{}] {}", diagnostic.level, diagnostic.header);

        if let Some(path) = diagnostic.rel_file_path.as_deref().filter(|p| !p.is_empty()) {
            match (diagnostic.line_number, diagnostic.column_number) {
                (Some(line), Some(column)) => {
                    let _ = writeln!(out, "  {path}:{line}:{column}");
                }
                (Some(line), None) => {
                    let _ = writeln!(out, "  {path}:{line}");
                }
                _ => {
                    let _ = writeln!(out, "  {path}");
                }
            }
        }

        let _ = writeln!(out, "  {}", diagnostic.message_text.trim_end());

        let width = diagnostic.lines.iter().map(|l| l.line_number.to_string().len()).max();
        for line in &diagnostic.lines {
            write_line(&mut out, line, width.unwrap_or(1));
        }
        out.push('\n');
    }

    out
}

fn write_line(out: &mut String, line: &SourceLineContext, width: usize) {
    let _ = writeln!(out, "  {:>width$} | {}", line.line_number, line.text);

    if line.error_char_start >= 0 && line.error_length > 0 {
        let pad = " ".repeat(line.error_char_start as usize);
        let carets = "^".repeat(line.error_length as usize);
        let _ = writeln!(out, "  {:>width$} | {pad}{carets}", "");
    }
}

pub fn report_text(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        println!("No diagnostics.");
        return;
    }
    print!("{}", format_text(diagnostics));
}

pub fn report_json(diagnostics: &[Diagnostic]) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(diagnostics)?);
    Ok(())
}
