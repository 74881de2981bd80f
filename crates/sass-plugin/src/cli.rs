use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sass-plugin")]
#[command(about = "Inspect how the sass plugin prepares, resolves and reports style sheets")]
pub struct Cli {
    /// Path to config file (sass.config.json or sass.config.jsonc)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root directory
    #[arg(short = 'C', long, default_value = ".", global = true)]
    pub cwd: PathBuf,

    /// Log option building and import resolution
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the compiler options derived for a style sheet
    Options {
        /// Style sheet to build options for
        file: PathBuf,

        /// Additional include paths (replaces the config's list)
        #[arg(long = "include-path")]
        include_paths: Vec<String>,

        /// Style sheets to inject ahead of the source (replaces the config's list)
        #[arg(long = "inject-global")]
        inject_global_paths: Vec<String>,
    },

    /// Resolve a `~` import the way the generated module importer does
    Resolve {
        /// Import specifier, e.g. `~bootstrap/scss/variables`
        spec: String,

        /// File the import appears in
        #[arg(long, default_value = "stdin")]
        from: String,
    },

    /// Normalize a path
    Normalize { path: String },

    /// Split a module specifier into package id and file path
    Split { spec: String },

    /// Build the diagnostic for a compiler error at a source position
    Diagnose {
        /// File the error occurred in
        file: PathBuf,

        /// 1-based line
        #[arg(long)]
        line: usize,

        #[arg(long, default_value = "0")]
        column: usize,

        #[arg(long, default_value = "Error")]
        message: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
