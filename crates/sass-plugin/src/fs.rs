use crate::host::{BoxFuture, FileSystem, WriteOptions};
use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Disk-backed [`FileSystem`] with an in-memory overlay.
///
/// Reads prefer content written through [`FileSystem::write_file`];
/// in-memory-only writes never reach the disk.
#[derive(Debug, Default)]
pub struct HostFs {
    overlay: DashMap<PathBuf, String>,
}

impl HostFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content previously written for `path`, if any
    pub fn in_memory(&self, path: &str) -> Option<String> {
        self.overlay.get(Path::new(path)).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.overlay.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlay.is_empty()
    }
}

impl FileSystem for HostFs {
    fn read_file_sync(&self, path: &str) -> io::Result<String> {
        if let Some(content) = self.in_memory(path) {
            return Ok(content);
        }
        std::fs::read_to_string(path)
    }

    fn write_file<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
        options: WriteOptions,
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            if !options.in_memory_only {
                tokio::fs::write(path, content).await?;
            }
            self.overlay.insert(PathBuf::from(path), content.to_string());
            Ok(())
        })
    }
}
