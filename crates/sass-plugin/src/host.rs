//! Capabilities the host build system lends the plugin for one compilation.

use crate::path::normalize_path;
use crate::types::{Diagnostic, ResolveError};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Project-level configuration
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Keep the content in the host's in-memory file system only
    pub in_memory_only: bool,
}

/// Host file system. The plugin performs no I/O outside of it.
pub trait FileSystem: Send + Sync {
    fn read_file_sync(&self, path: &str) -> io::Result<String>;

    fn write_file<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
        options: WriteOptions,
    ) -> BoxFuture<'a, io::Result<()>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveModuleIdRequest {
    pub module_id: String,
    pub containing_file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveModuleIdResults {
    /// Package root directory, absent when the package was not found
    pub pkg_dir_path: Option<String>,
}

/// Host capability that locates a package's directory
pub trait ModuleResolver: Send + Sync {
    fn resolve_module_id(
        &self,
        request: ResolveModuleIdRequest,
    ) -> BoxFuture<'_, Result<ResolveModuleIdResults, ResolveError>>;
}

pub type NormalizeFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Optional system capabilities; absent ones fall back to built-in behavior
/// or disable the feature depending on them.
#[derive(Clone, Default)]
pub struct HostSys {
    pub normalize_path: Option<NormalizeFn>,
    pub module_resolver: Option<Arc<dyn ModuleResolver>>,
}

impl HostSys {
    /// Normalize with the host's normalizer, or [`normalize_path`] without one
    pub fn normalize(&self, path: &str) -> String {
        match &self.normalize_path {
            Some(normalize) => normalize(path),
            None => normalize_path(path),
        }
    }
}

/// Append-only collection the host reports diagnostics from
pub trait DiagnosticsSink: Send + Sync {
    fn push(&self, diagnostic: Diagnostic);
}

/// [`DiagnosticsSink`] shared by concurrent transforms
#[derive(Debug, Default)]
pub struct DiagnosticsBuffer {
    items: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticsBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything pushed so far
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticsSink for DiagnosticsBuffer {
    fn push(&self, diagnostic: Diagnostic) {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).push(diagnostic);
    }
}

/// Runtime context for a single transform call
#[derive(Clone)]
pub struct PluginCtx {
    pub config: HostConfig,
    pub fs: Arc<dyn FileSystem>,
    pub sys: HostSys,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
}

impl PluginCtx {
    pub fn new(
        config: HostConfig,
        fs: Arc<dyn FileSystem>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        Self { config, fs, sys: HostSys::default(), diagnostics }
    }

    pub fn with_sys(mut self, sys: HostSys) -> Self {
        self.sys = sys;
        self
    }
}
