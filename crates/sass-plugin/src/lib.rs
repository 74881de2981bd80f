pub mod cli;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod fs;
pub mod host;
pub mod module_id;
pub mod options;
pub mod path;
pub mod plugin;
pub mod reporter;
pub mod resolver;
pub mod types;

pub use compiler::{
    CompiledCss, ImportFuture, ImportResolution, Importer, Importers, RenderFuture, SassError,
    StyleCompiler,
};
pub use config::{ConfigError, find_default_config, load_config_file};
pub use diagnostics::{build_diagnostic, failure_diagnostic};
pub use fs::HostFs;
pub use host::{
    BoxFuture, DiagnosticsBuffer, DiagnosticsSink, FileSystem, HostConfig, HostSys,
    ModuleResolver, PluginCtx, ResolveModuleIdRequest, ResolveModuleIdResults, WriteOptions,
};
pub use module_id::{ModuleReference, split_module_specifier};
pub use options::{ModuleImporter, build_options};
pub use path::normalize_path;
pub use plugin::{Plugin, SassPlugin, TransformResult, create_results_id, use_plugin};
pub use resolver::NodeModuleResolver;
pub use types::{
    Diagnostic, DiagnosticKind, DiagnosticLevel, ImportError, InvokeError, Language,
    PluginOptions, RenderOptions, ResolveError, SourceLineContext,
};

use std::path::Path;
use std::sync::Arc;

/// Context backed by the real disk and `node_modules` resolution, as a
/// host without its own capabilities would provide it
pub fn disk_context(root_dir: &Path, diagnostics: Arc<dyn DiagnosticsSink>) -> PluginCtx {
    let sys = HostSys {
        normalize_path: None,
        module_resolver: Some(Arc::new(NodeModuleResolver::new(root_dir))),
    };
    PluginCtx::new(HostConfig { root_dir: root_dir.to_path_buf() }, Arc::new(HostFs::new()), diagnostics)
        .with_sys(sys)
}
