use crate::clienv;
use crate::error::{Result, SupervisorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::descriptor::ServiceDescriptor;

/// Replaced by the service's `binary_name` in toolchain arguments.
pub const BINARY_PLACEHOLDER: &str = "{binary}";

/// Compiler invocation used for every service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            args: vec!["build".into(), "-o".into(), BINARY_PLACEHOLDER.into()],
        }
    }
}

impl Toolchain {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(|s| s.into()).collect();
        self
    }

    fn resolved_args(&self, binary_name: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(BINARY_PLACEHOLDER, binary_name))
            .collect()
    }
}

/// Isolated cache directories shared by builds and launched services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCache {
    pub build_cache: PathBuf,
    pub module_cache: PathBuf,
    pub workspace: PathBuf,
}

impl BuildCache {
    pub fn new(
        build_cache: impl Into<PathBuf>,
        module_cache: impl Into<PathBuf>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            build_cache: build_cache.into(),
            module_cache: module_cache.into(),
            workspace: workspace.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            clienv::build_cache_dir(),
            clienv::module_cache_dir(),
            clienv::workspace_dir(),
        )
    }

    /// Create every cache directory with permissive modes. Called once at startup.
    pub fn prepare(&self) -> Result<()> {
        for dir in [&self.build_cache, &self.module_cache, &self.workspace] {
            create_permissive_dir(dir)?;
        }
        debug!(
            build_cache = %self.build_cache.display(),
            module_cache = %self.module_cache.display(),
            workspace = %self.workspace.display(),
            "Cache directories ready"
        );
        Ok(())
    }

    /// Environment entries pointing the toolchain (and children) at the caches.
    pub fn env(&self) -> [(&'static str, String); 3] {
        [
            ("GOCACHE", self.build_cache.display().to_string()),
            ("GOMODCACHE", self.module_cache.display().to_string()),
            ("GOPATH", self.workspace.display().to_string()),
        ]
    }
}

fn create_permissive_dir(dir: &Path) -> Result<()> {
    let setup_err = |source| SupervisorError::CacheSetup {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(setup_err)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Directories owned by another user keep their mode.
        if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o777)) {
            if e.kind() != std::io::ErrorKind::PermissionDenied {
                return Err(setup_err(e));
            }
            debug!(dir = %dir.display(), "Leaving cache directory mode unchanged: {}", e);
        }
    }
    Ok(())
}

/// A compiled service binary. The file is removed when this guard is dropped.
#[derive(Debug)]
pub struct BuiltArtifact {
    path: PathBuf,
}

impl BuiltArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuiltArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(artifact = %self.path.display(), "Removed build artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                artifact = %self.path.display(),
                "Failed to remove build artifact: {}", e
            ),
        }
    }
}

pub struct Builder {
    toolchain: Toolchain,
    cache: BuildCache,
}

impl Builder {
    pub fn new(toolchain: Toolchain, cache: BuildCache) -> Self {
        Self { toolchain, cache }
    }

    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// Compile `service` into `<path>/<binary_name>`.
    ///
    /// Compiler output is captured: on failure it is carried by
    /// [`SupervisorError::Build`], on success it is forwarded to `debug!`.
    pub async fn build(&self, service: &ServiceDescriptor) -> Result<BuiltArtifact> {
        let args = self.toolchain.resolved_args(&service.binary_name);
        info!(
            service = %service.display_path(),
            "Building {} ({} {})",
            service.binary_name,
            self.toolchain.program,
            args.join(" ")
        );

        let output = Command::new(&self.toolchain.program)
            .args(&args)
            .current_dir(&service.path)
            .envs(self.cache.env())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SupervisorError::Build {
                path: service.path.clone(),
                status: format!("could not run {}", self.toolchain.program),
                output: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let mut combined = stdout.into_owned();
            combined.push_str(&stderr);
            return Err(SupervisorError::Build {
                path: service.path.clone(),
                status: output.status.to_string(),
                output: combined.trim_end().to_string(),
            });
        }

        for line in stdout.lines().chain(stderr.lines()) {
            debug!(service = %service.display_path(), "build: {}", line);
        }

        Ok(BuiltArtifact {
            path: service.binary_path(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toolchain_substitutes_binary() {
        let toolchain = Toolchain::default();
        assert_eq!(toolchain.program, "go");
        assert_eq!(toolchain.resolved_args("wf-ceo"), vec!["build", "-o", "wf-ceo"]);
    }

    #[test]
    fn test_cache_env_names() {
        let cache = BuildCache::new("/tmp/a", "/tmp/b", "/tmp/c");
        let env = cache.env();
        assert_eq!(env[0], ("GOCACHE", "/tmp/a".to_string()));
        assert_eq!(env[1], ("GOMODCACHE", "/tmp/b".to_string()));
        assert_eq!(env[2], ("GOPATH", "/tmp/c".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_prepare_creates_permissive_dirs() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let cache = BuildCache::new(
            tmp.path().join("gocache"),
            tmp.path().join("mod/cache"),
            tmp.path().join("gopath"),
        );
        cache.prepare().unwrap();
        // Idempotent
        cache.prepare().unwrap();

        let mode = std::fs::metadata(tmp.path().join("mod/cache"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o777);
    }

    #[test]
    fn test_artifact_removed_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wf-ceo");
        std::fs::write(&path, b"binary").unwrap();

        let artifact = BuiltArtifact { path: path.clone() };
        assert!(artifact.path().exists());
        drop(artifact);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_failure_carries_output() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = BuildCache::new(
            tmp.path().join("c1"),
            tmp.path().join("c2"),
            tmp.path().join("c3"),
        );
        let toolchain =
            Toolchain::new("sh").args(["-c", "echo 'undefined: main' >&2; exit 2"]);
        let builder = Builder::new(toolchain, cache);
        let service = ServiceDescriptor::new(tmp.path(), "9001", "svc");

        let err = builder.build(&service).await.unwrap_err();
        match err {
            SupervisorError::Build { output, .. } => {
                assert!(output.contains("undefined: main"))
            }
            other => panic!("expected build error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_sees_cache_env() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = BuildCache::new("/tmp/x-cache", "/tmp/x-mod", "/tmp/x-path");
        let toolchain = Toolchain::new("sh").args([
            "-c",
            "test \"$GOMODCACHE\" = /tmp/x-mod && echo ok > {binary}",
        ]);
        let builder = Builder::new(toolchain, cache);
        let service = ServiceDescriptor::new(tmp.path(), "9001", "svc");

        let artifact = builder.build(&service).await.unwrap();
        assert_eq!(artifact.path(), tmp.path().join("svc"));
        assert!(artifact.path().exists());
    }
}
