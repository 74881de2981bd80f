use crate::host::{BoxFuture, ModuleResolver, ResolveModuleIdRequest, ResolveModuleIdResults};
use crate::types::ResolveError;
use oxc_resolver::{ResolveOptions, Resolver};
use std::path::{Path, PathBuf};

/// Locates package directories in `node_modules` by resolving the
/// package's `package.json`.
pub struct NodeModuleResolver {
    resolver: Resolver,
    root_dir: PathBuf,
}

impl NodeModuleResolver {
    pub fn new(root_dir: &Path) -> Self {
        let options = ResolveOptions {
            // `package.json` is routinely left out of `exports`
            exports_fields: vec![],
            extensions: vec![".json".into()],
            ..Default::default()
        };

        Self { resolver: Resolver::new(options), root_dir: root_dir.to_path_buf() }
    }

    /// Directory the lookup starts from: the containing file's directory
    /// when it is absolute, the project root otherwise
    fn lookup_dir(&self, containing_file: &str) -> PathBuf {
        let containing = Path::new(containing_file);
        if containing.is_absolute() {
            containing.parent().unwrap_or(&self.root_dir).to_path_buf()
        } else {
            self.root_dir.clone()
        }
    }

    pub fn find_package_dir(
        &self,
        module_id: &str,
        containing_file: &str,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let dir = self.lookup_dir(containing_file);
        let specifier = format!("{module_id}/package.json");

        match self.resolver.resolve(&dir, &specifier) {
            Ok(resolution) => Ok(resolution.path().parent().map(Path::to_path_buf)),
            Err(oxc_resolver::ResolveError::NotFound(_)) => Ok(None),
            Err(e) => Err(ResolveError::Failed(e.to_string())),
        }
    }
}

impl ModuleResolver for NodeModuleResolver {
    fn resolve_module_id(
        &self,
        request: ResolveModuleIdRequest,
    ) -> BoxFuture<'_, Result<ResolveModuleIdResults, ResolveError>> {
        let result = self
            .find_package_dir(&request.module_id, &request.containing_file)
            .map(|dir| ResolveModuleIdResults {
                pkg_dir_path: dir.map(|d| d.to_string_lossy().into_owned()),
            });
        Box::pin(async move { result })
    }
}
