use crate::compiler::StyleCompiler;
use crate::diagnostics::{build_diagnostic, failure_diagnostic};
use crate::host::{BoxFuture, PluginCtx, WriteOptions};
use crate::options::build_options;
use crate::path::normalize_path;
use crate::types::PluginOptions;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

pub const PLUGIN_NAME: &str = "sass";
pub const PLUGIN_TYPE: &str = "css";

fn style_file_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?i)\.s[ac]ss$").unwrap())
}

/// Whether the plugin should transform `file_name`
pub fn use_plugin(file_name: &str) -> bool {
    style_file_regex().is_match(file_name)
}

/// Output id for a style sheet: the last `.` segment becomes `css`.
///
/// A name without any `.` is replaced entirely, so `"button"` gives `"css"`.
pub fn create_results_id(file_name: &str) -> String {
    let mut parts: Vec<&str> = file_name.split('.').collect();
    if let Some(last) = parts.last_mut() {
        *last = "css";
    }
    parts.join(".")
}

/// Output of a transform the plugin accepted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub id: String,
    pub code: String,
    /// Files the compiled output depends on
    pub dependencies: Vec<String>,
}

/// A build pipeline transform step
pub trait Plugin: Send + Sync {
    /// Plugin identifier (e.g., "sass")
    fn name(&self) -> &str;

    /// Kind of output the plugin produces (e.g., "css")
    fn plugin_type(&self) -> &str;

    /// Transform one file. `None` means the plugin does not handle it.
    fn transform<'a>(
        &'a self,
        source_text: &'a str,
        file_name: &'a str,
        ctx: &'a PluginCtx,
    ) -> BoxFuture<'a, Option<TransformResult>>;
}

/// Compiles `.scss` and `.sass` files through a [`StyleCompiler`].
///
/// Compile failures never surface as errors: they are pushed to the
/// context's diagnostics and the file compiles to a comment so the build
/// can carry on.
pub struct SassPlugin {
    options: PluginOptions,
    compiler: Arc<dyn StyleCompiler>,
}

impl SassPlugin {
    pub fn new(options: PluginOptions, compiler: Arc<dyn StyleCompiler>) -> Self {
        Self { options, compiler }
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    async fn run(
        &self,
        source_text: &str,
        file_name: &str,
        ctx: &PluginCtx,
    ) -> Option<TransformResult> {
        if !use_plugin(file_name) {
            return None;
        }

        let mut results = TransformResult { id: create_results_id(file_name), ..Default::default() };

        if source_text.trim().is_empty() {
            return Some(results);
        }

        let render_opts = build_options(&self.options, source_text, file_name, ctx);
        debug!(file = file_name, id = %results.id, "rendering");

        let render = match self.compiler.render(render_opts) {
            Ok(render) => render,
            Err(e) => {
                warn!(file = file_name, "compiler invocation failed: {e}");
                ctx.diagnostics.push(failure_diagnostic(e.to_string()));
                results.code = failure_comment(&e.to_string());
                return Some(results);
            }
        };

        match render.await {
            Ok(compiled) => {
                results.dependencies =
                    compiled.included_files.iter().map(|dep| normalize_path(dep)).collect();
                results.code = compiled.css;

                // other css plugins pick the output up from memory
                let write = WriteOptions { in_memory_only: true };
                if let Err(e) = ctx.fs.write_file(&results.id, &results.code, write).await {
                    warn!(id = %results.id, "failed to store compiled css: {e}");
                }
            }
            Err(err) => {
                build_diagnostic(Some(ctx), Some(&err), Some(file_name));
                results.code = error_comment(&err.message);
            }
        }

        Some(results)
    }
}

fn error_comment(message: &str) -> String {
    if message.is_empty() {
        "/**  sass error  **/".to_string()
    } else {
        format!("/**  sass error: {message}  **/")
    }
}

fn failure_comment(message: &str) -> String {
    if message.is_empty() {
        "/** sass error **/".to_string()
    } else {
        format!("/** sass error: {message} **/")
    }
}

impl Plugin for SassPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn plugin_type(&self) -> &str {
        PLUGIN_TYPE
    }

    fn transform<'a>(
        &'a self,
        source_text: &'a str,
        file_name: &'a str,
        ctx: &'a PluginCtx,
    ) -> BoxFuture<'a, Option<TransformResult>> {
        Box::pin(self.run(source_text, file_name, ctx))
    }
}
