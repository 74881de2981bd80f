use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sass_plugin::cli::{Cli, Command, OutputFormat};
use sass_plugin::reporter::{report_json, report_text};
use sass_plugin::{
    DiagnosticsBuffer, HostSys, Importer, ModuleImporter, NodeModuleResolver, PluginOptions,
    SassError, build_diagnostic, build_options, disk_context, find_default_config,
    load_config_file, normalize_path, split_module_specifier,
};

fn init_tracing(verbose: bool) {
    let default = if verbose { "sass_plugin=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Load options from `--config`, or the default config file in `cwd`
fn load_options(config: Option<&Path>, cwd: &Path) -> Result<PluginOptions, Box<dyn std::error::Error>> {
    if let Some(config_path) = config {
        // Use specified config file (error if not found)
        if !config_path.exists() {
            eprintln!("Error: Config file not found: {}", config_path.display());
            std::process::exit(1);
        }
        debug!(path = %config_path.display(), "loading config file");
        return Ok(load_config_file(config_path)?);
    }

    match find_default_config(cwd) {
        Some(path) => match load_config_file(&path) {
            Ok(options) => {
                debug!(path = %path.display(), "using default config file");
                Ok(options)
            }
            Err(e) => {
                eprintln!("Warning: Failed to parse config file '{}': {}", path.display(), e);
                Ok(PluginOptions::default())
            }
        },
        None => {
            debug!(cwd = %cwd.display(), "no config file found, using defaults");
            Ok(PluginOptions::default())
        }
    }
}

fn absolute(cwd: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() { file.to_path_buf() } else { cwd.join(file) }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = cli.cwd.canonicalize()?;

    match cli.command {
        Command::Normalize { path } => println!("{}", normalize_path(&path)),

        Command::Split { spec } => {
            println!("{}", serde_json::to_string_pretty(&split_module_specifier(&spec))?);
        }

        Command::Options { file, include_paths, inject_global_paths } => {
            let mut options = load_options(cli.config.as_deref(), &cwd)?;

            // CLI args override file config
            if !include_paths.is_empty() {
                options.include_paths = include_paths;
            }
            if !inject_global_paths.is_empty() {
                options.inject_global_paths = inject_global_paths;
            }

            let file = absolute(&cwd, &file);
            let source = fs::read_to_string(&file)?;
            let ctx = disk_context(&cwd, Arc::new(DiagnosticsBuffer::new()));

            let rendered = build_options(&options, &source, &file.to_string_lossy(), &ctx);
            let mut value = serde_json::to_value(&rendered)?;
            value["importerCount"] = rendered.importer.len().into();
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Command::Resolve { spec, from } => {
            let importer = ModuleImporter::new(Arc::new(NodeModuleResolver::new(&cwd)), HostSys::default());
            match importer.import(&spec, &from).await {
                Ok(Some(resolution)) => println!("{}", resolution.file),
                Ok(None) => {
                    println!("declined: {spec}");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Command::Diagnose { file, line, column, message, format } => {
            let file = absolute(&cwd, &file);
            let buffer = Arc::new(DiagnosticsBuffer::new());
            let ctx = disk_context(&cwd, buffer.clone());

            let error = SassError::new(message).at(file.to_string_lossy(), line, column);
            build_diagnostic(Some(&ctx), Some(&error), None);

            let diagnostics = buffer.snapshot();
            match format {
                OutputFormat::Text => report_text(&diagnostics),
                OutputFormat::Json => report_json(&diagnostics)?,
            }

            if !diagnostics.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
