use crate::host::BoxFuture;
use crate::types::{ImportError, InvokeError, RenderOptions};
use std::fmt;
use std::sync::Arc;

/// Error reported by the compiler for a failed render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SassError {
    /// Message, possibly followed by a `╷` framed source excerpt
    pub message: String,
    pub status: Option<i32>,
    /// File the error occurred in; `"stdin"` for inline data
    pub file: Option<String>,
    /// 1-based
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl SassError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Default::default() }
    }

    pub fn at(mut self, file: impl Into<String>, line: usize, column: usize) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for SassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SassError {}

impl From<ImportError> for SassError {
    fn from(err: ImportError) -> Self {
        SassError::new(err.to_string()).with_status(1)
    }
}

/// Result of a successful render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledCss {
    pub css: String,
    /// Every file the compiler loaded while rendering
    pub included_files: Vec<String>,
}

pub type RenderFuture<'a> = BoxFuture<'a, Result<CompiledCss, SassError>>;

/// The external style-sheet compiler.
///
/// `render` fails synchronously with [`InvokeError`] when the compiler can
/// not be started; errors in the style sheet itself arrive through the
/// returned future.
pub trait StyleCompiler: Send + Sync {
    fn render(&self, options: RenderOptions) -> Result<RenderFuture<'_>, InvokeError>;
}

/// A file an importer resolved an `@import` url to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResolution {
    pub file: String,
}

/// `Ok(None)` declines so the next importer, or the compiler's own load
/// path lookup, gets a turn.
pub type ImportFuture<'a> = BoxFuture<'a, Result<Option<ImportResolution>, ImportError>>;

/// Custom import resolution hook the compiler invokes per `@import`.
///
/// The compiler may run several imports of one file concurrently, so
/// implementations must not rely on call ordering.
pub trait Importer: Send + Sync {
    fn import<'a>(&'a self, url: &'a str, prev: &'a str) -> ImportFuture<'a>;
}

/// Ordered importer list handed to the compiler
#[derive(Clone, Default)]
pub struct Importers(Vec<Arc<dyn Importer>>);

impl Importers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, importer: Arc<dyn Importer>) {
        self.0.push(importer);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Importer>> {
        self.0.iter()
    }

    /// Run importers in order until one resolves `url` or fails
    pub async fn resolve(
        &self,
        url: &str,
        prev: &str,
    ) -> Result<Option<ImportResolution>, ImportError> {
        for importer in &self.0 {
            if let Some(resolution) = importer.import(url, prev).await? {
                return Ok(Some(resolution));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for Importers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Importers").field("len", &self.0.len()).finish()
    }
}

impl From<Arc<dyn Importer>> for Importers {
    fn from(importer: Arc<dyn Importer>) -> Self {
        Self(vec![importer])
    }
}

impl From<Vec<Arc<dyn Importer>>> for Importers {
    fn from(importers: Vec<Arc<dyn Importer>>) -> Self {
        Self(importers)
    }
}
