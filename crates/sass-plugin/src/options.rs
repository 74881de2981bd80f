use crate::compiler::{ImportFuture, ImportResolution, Importer};
use crate::host::{HostSys, ModuleResolver, PluginCtx, ResolveModuleIdRequest};
use crate::module_id::{split_module_specifier, MODULE_MARKER};
use crate::path::{dirname, join_under, resolve_against};
use crate::types::{ImportError, PluginOptions, RenderOptions, LEGACY_JS_API};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Passthrough keys the builder owns; user values for them are dropped
const RESERVED_KEYS: &[&str] = &["data", "indentedSyntax", "importer"];

/// Whether a file uses the indented (`.sass`) syntax
pub fn is_indented_syntax(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".sass")
}

/// Derive the compiler options for one file.
///
/// `user` is never modified. When the host can resolve modules, a
/// [`ModuleImporter`] is appended after any user importers.
pub fn build_options(
    user: &PluginOptions,
    source_text: &str,
    file_name: &str,
    ctx: &PluginCtx,
) -> RenderOptions {
    let opts = user.clone();
    let root = ctx.config.root_dir.as_path();

    let mut passthrough = opts.passthrough;
    passthrough.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));

    // decides the import terminator below
    let indented_syntax = is_indented_syntax(file_name);

    let mut include_paths = opts.include_paths;
    include_paths.push(dirname(file_name).to_string());
    let include_paths = include_paths
        .iter()
        .map(|p| resolve_against(root, p).to_string_lossy().into_owned())
        .collect();

    let mut data = String::new();
    if !opts.inject_global_paths.is_empty() {
        let terminator = if indented_syntax { "\n" } else { ";" };
        for global in &opts.inject_global_paths {
            let absolute = if Path::new(global).is_absolute() {
                global.clone()
            } else {
                ctx.sys.normalize(&resolve_against(root, global).to_string_lossy())
            };
            data.push_str(&format!("@import \"{absolute}\"{terminator}"));
        }
        debug!(file = file_name, count = opts.inject_global_paths.len(), "injected global imports");
    }
    data.push_str(source_text);

    let mut importer = opts.importer;
    if let Some(resolver) = &ctx.sys.module_resolver {
        importer.push(Arc::new(ModuleImporter::new(Arc::clone(resolver), ctx.sys.clone())));
    }

    let mut silence_deprecations = opts.silence_deprecations.unwrap_or_default();
    silence_deprecations.push(LEGACY_JS_API.to_string());

    RenderOptions {
        data,
        indented_syntax,
        include_paths,
        importer,
        silence_deprecations,
        passthrough,
    }
}

/// Resolves `~pkg/path` imports to files inside package directories
pub struct ModuleImporter {
    resolver: Arc<dyn ModuleResolver>,
    sys: HostSys,
}

impl ModuleImporter {
    pub fn new(resolver: Arc<dyn ModuleResolver>, sys: HostSys) -> Self {
        Self { resolver, sys }
    }
}

impl Importer for ModuleImporter {
    fn import<'a>(&'a self, url: &'a str, _prev: &'a str) -> ImportFuture<'a> {
        Box::pin(async move {
            if !url.starts_with(MODULE_MARKER) {
                return Ok(None);
            }

            let reference = split_module_specifier(url);
            let Some(module_id) = reference.module_id else {
                return Ok(None);
            };

            let request = ResolveModuleIdRequest {
                module_id: module_id.clone(),
                containing_file: reference.file_path.clone(),
            };
            let resolved = self
                .resolver
                .resolve_module_id(request)
                .await
                .map_err(|source| ImportError::Resolve { module_id: module_id.clone(), source })?;

            let Some(pkg_dir) = resolved.pkg_dir_path else {
                debug!(%module_id, "package directory not found");
                return Ok(None);
            };

            let joined = join_under(Path::new(&pkg_dir), &reference.file_path);
            let file = self.sys.normalize(&joined.to_string_lossy());
            debug!(url, %file, "resolved module import");
            Ok(Some(ImportResolution { file }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        BoxFuture, DiagnosticsBuffer, FileSystem, HostConfig, ResolveModuleIdResults, WriteOptions,
    };
    use crate::types::ResolveError;
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;
    use serde_json::json;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct NoFs;

    impl FileSystem for NoFs {
        fn read_file_sync(&self, path: &str) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        }

        fn write_file<'a>(
            &'a self,
            _path: &'a str,
            _content: &'a str,
            _options: WriteOptions,
        ) -> BoxFuture<'a, io::Result<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[derive(Default)]
    struct FakeResolver {
        packages: FxHashMap<String, String>,
        fail: bool,
        requests: Mutex<Vec<ResolveModuleIdRequest>>,
    }

    impl FakeResolver {
        fn with(packages: &[(&str, &str)]) -> Self {
            Self {
                packages: packages.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                ..Default::default()
            }
        }
    }

    impl ModuleResolver for FakeResolver {
        fn resolve_module_id(
            &self,
            request: ResolveModuleIdRequest,
        ) -> BoxFuture<'_, Result<ResolveModuleIdResults, ResolveError>> {
            let result = if self.fail {
                Err(ResolveError::Failed("resolver offline".to_string()))
            } else {
                Ok(ResolveModuleIdResults {
                    pkg_dir_path: self.packages.get(&request.module_id).cloned(),
                })
            };
            self.requests.lock().unwrap().push(request);
            Box::pin(async move { result })
        }
    }

    struct Decline;

    impl Importer for Decline {
        fn import<'a>(&'a self, _url: &'a str, _prev: &'a str) -> ImportFuture<'a> {
            Box::pin(async { Ok(None) })
        }
    }

    fn ctx(sys: HostSys) -> PluginCtx {
        PluginCtx::new(
            HostConfig { root_dir: PathBuf::from("/project") },
            Arc::new(NoFs),
            Arc::new(DiagnosticsBuffer::new()),
        )
        .with_sys(sys)
    }

    fn with_resolver(resolver: FakeResolver) -> HostSys {
        HostSys { normalize_path: None, module_resolver: Some(Arc::new(resolver)) }
    }

    #[test]
    fn test_data_is_source_without_injection() {
        let rendered =
            build_options(&PluginOptions::default(), ".a { b: c; }", "/project/a.scss", &ctx(HostSys::default()));
        assert_eq!(rendered.data, ".a { b: c; }");
        assert!(!rendered.indented_syntax);
    }

    #[test]
    fn test_inject_global_paths_scss() {
        let user = PluginOptions {
            inject_global_paths: vec!["globals.scss".to_string(), "/abs/theme.scss".to_string()],
            ..Default::default()
        };
        let rendered = build_options(&user, ".a{}", "/project/src/a.scss", &ctx(HostSys::default()));
        assert_eq!(
            rendered.data,
            "@import \"/project/globals.scss\";@import \"/abs/theme.scss\";.a{}"
        );
    }

    #[test]
    fn test_inject_global_paths_indented() {
        let user = PluginOptions {
            inject_global_paths: vec!["src/globals.sass".to_string()],
            ..Default::default()
        };
        let rendered = build_options(&user, ".a\n  b: c", "/project/src/A.SASS", &ctx(HostSys::default()));
        assert!(rendered.indented_syntax);
        assert_eq!(rendered.data, "@import \"/project/src/globals.sass\"\n.a\n  b: c");
    }

    #[test]
    fn test_inject_uses_host_normalizer() {
        let sys = HostSys {
            normalize_path: Some(Arc::new(|p: &str| format!("host:{p}"))),
            module_resolver: None,
        };
        let user = PluginOptions {
            inject_global_paths: vec!["globals.scss".to_string()],
            ..Default::default()
        };
        let rendered = build_options(&user, "", "/project/a.scss", &ctx(sys));
        assert_eq!(rendered.data, "@import \"host:/project/globals.scss\";");
    }

    #[test]
    fn test_include_paths_absolute_with_file_dir_last() {
        let user = PluginOptions {
            include_paths: vec!["node_modules".to_string(), "/shared/styles".to_string()],
            ..Default::default()
        };
        let rendered = build_options(&user, "", "src/components/button.scss", &ctx(HostSys::default()));
        assert_eq!(
            rendered.include_paths,
            vec![
                "/project/node_modules".to_string(),
                "/shared/styles".to_string(),
                "/project/src/components".to_string(),
            ]
        );
    }

    #[test]
    fn test_silence_deprecations_appended_without_dedup() {
        let user = PluginOptions {
            silence_deprecations: Some(vec!["import".to_string(), LEGACY_JS_API.to_string()]),
            ..Default::default()
        };
        let rendered = build_options(&user, "", "/project/a.scss", &ctx(HostSys::default()));
        assert_eq!(rendered.silence_deprecations, vec!["import", LEGACY_JS_API, LEGACY_JS_API]);
        // caller's options are left alone
        assert_eq!(user.silence_deprecations.as_ref().map(Vec::len), Some(2));

        let rendered = build_options(&PluginOptions::default(), "", "/project/a.scss", &ctx(HostSys::default()));
        assert_eq!(rendered.silence_deprecations, vec![LEGACY_JS_API]);
    }

    #[test]
    fn test_passthrough_kept_and_reserved_dropped() {
        let user: PluginOptions = serde_json::from_value(json!({
            "outputStyle": "compressed",
            "precision": 6,
            "data": "ignored",
            "indentedSyntax": true,
            "file": "src/a.scss",
            "injectGlobalPaths": []
        }))
        .unwrap();
        let rendered = build_options(&user, "x", "/project/a.scss", &ctx(HostSys::default()));
        assert_eq!(rendered.passthrough.get("outputStyle"), Some(&json!("compressed")));
        assert_eq!(rendered.passthrough.get("precision"), Some(&json!(6)));
        assert!(!rendered.passthrough.contains_key("data"));
        assert!(!rendered.indented_syntax);

        let serialized = serde_json::to_value(&rendered).unwrap();
        assert!(serialized.get("file").is_none());
        assert!(serialized.get("injectGlobalPaths").is_none());
        assert_eq!(serialized["data"], json!("x"));
    }

    #[test]
    fn test_importer_only_installed_with_module_resolver() {
        let mut user = PluginOptions::default();
        user.importer.push(Arc::new(Decline));

        let rendered = build_options(&user, "", "/project/a.scss", &ctx(HostSys::default()));
        assert_eq!(rendered.importer.len(), 1);

        let rendered = build_options(&user, "", "/project/a.scss", &ctx(with_resolver(FakeResolver::default())));
        assert_eq!(rendered.importer.len(), 2);
        assert_eq!(user.importer.len(), 1);
    }

    struct Claim(&'static str);

    impl Importer for Claim {
        fn import<'a>(&'a self, _url: &'a str, _prev: &'a str) -> ImportFuture<'a> {
            Box::pin(async move { Ok(Some(ImportResolution { file: self.0.to_string() })) })
        }
    }

    #[tokio::test]
    async fn test_user_importers_run_before_module_importer() {
        let mut user = PluginOptions::default();
        user.importer.push(Arc::new(Decline));
        let resolver = FakeResolver::with(&[("pkg", "/nm/pkg")]);
        let sys = with_resolver(resolver);

        // module importer is last, so it answers once user importers decline
        let rendered = build_options(&user, "", "/project/a.scss", &ctx(sys.clone()));
        let resolved = rendered.importer.resolve("~pkg/a.scss", "stdin").await.unwrap();
        assert_eq!(resolved.unwrap().file, "/nm/pkg/a.scss");

        user.importer.push(Arc::new(Claim("/user/a.scss")));
        let rendered = build_options(&user, "", "/project/a.scss", &ctx(sys));
        assert_eq!(rendered.importer.len(), 3);
        let resolved = rendered.importer.resolve("~pkg/a.scss", "stdin").await.unwrap();
        assert_eq!(resolved.unwrap().file, "/user/a.scss");
    }

    #[tokio::test]
    async fn test_module_importer_stays_inside_package_dir() {
        let resolver = Arc::new(FakeResolver::with(&[("pkg", "/nm/pkg")]));
        let importer = ModuleImporter::new(resolver, HostSys::default());
        let resolved = importer.import("~pkg//theme.scss", "stdin").await.unwrap();
        assert_eq!(resolved.unwrap().file, "/nm/pkg/theme.scss");
    }

    #[tokio::test]
    async fn test_module_importer_declines_plain_urls() {
        let importer = ModuleImporter::new(Arc::new(FakeResolver::default()), HostSys::default());
        assert_eq!(importer.import("./local", "stdin").await.unwrap(), None);
        assert_eq!(importer.import("~/no-package", "stdin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_module_importer_resolves_package_file() {
        let resolver = Arc::new(FakeResolver::with(&[
            ("bootstrap", "/project/node_modules/bootstrap"),
            ("@ionic/core", "/project/node_modules/@ionic/core"),
        ]));
        let importer = ModuleImporter::new(resolver.clone(), HostSys::default());

        let resolved = importer.import("~bootstrap/scss/variables", "stdin").await.unwrap();
        assert_eq!(
            resolved,
            Some(ImportResolution {
                file: "/project/node_modules/bootstrap/scss/variables".to_string()
            })
        );

        let resolved = importer.import("~@ionic/core/css/core.css", "stdin").await.unwrap();
        assert_eq!(resolved.unwrap().file, "/project/node_modules/@ionic/core/css/core.css");

        let resolved = importer.import("~bootstrap", "stdin").await.unwrap();
        assert_eq!(resolved.unwrap().file, "/project/node_modules/bootstrap");

        let requests = resolver.requests.lock().unwrap();
        assert_eq!(
            requests[0],
            ResolveModuleIdRequest {
                module_id: "bootstrap".to_string(),
                containing_file: "scss/variables".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_module_importer_declines_missing_package() {
        let importer = ModuleImporter::new(Arc::new(FakeResolver::default()), HostSys::default());
        assert_eq!(importer.import("~missing/file", "stdin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_module_importer_propagates_failure() {
        let resolver = FakeResolver { fail: true, ..Default::default() };
        let importer = ModuleImporter::new(Arc::new(resolver), HostSys::default());
        let err = importer.import("~pkg/file", "stdin").await.unwrap_err();
        assert!(matches!(err, ImportError::Resolve { ref module_id, .. } if module_id == "pkg"));
        assert_eq!(err.to_string(), "Cannot resolve module 'pkg': resolver offline");
    }

    #[tokio::test]
    async fn test_module_importer_concurrent_calls() {
        let resolver = Arc::new(FakeResolver::with(&[("a", "/nm/a"), ("b", "/nm/b")]));
        let importer = ModuleImporter::new(resolver, HostSys::default());
        let (a, b) = tokio::join!(importer.import("~a/x", "stdin"), importer.import("~b/y", "stdin"));
        assert_eq!(a.unwrap().unwrap().file, "/nm/a/x");
        assert_eq!(b.unwrap().unwrap().file, "/nm/b/y");
    }
}
