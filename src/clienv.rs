use std::path::PathBuf;

const SERVER_PORT: &str = "SERVER_PORT";
const WF_RUN_CONFIG: &str = "WF_RUN_CONFIG";
const WF_RUN_STATIC_DIR: &str = "WF_RUN_STATIC_DIR";
const WF_RUN_GOCACHE: &str = "WF_RUN_GOCACHE";
const WF_RUN_GOMODCACHE: &str = "WF_RUN_GOMODCACHE";
const WF_RUN_GOPATH: &str = "WF_RUN_GOPATH";

const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_GOCACHE: &str = "/tmp/gocache";
const DEFAULT_GOMODCACHE: &str = "/tmp/gomodcache";
const DEFAULT_GOPATH: &str = "/tmp/gopath";
const STATIC_SUBDIR: &str = "static";

/// Non-empty value of an environment variable.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// Supervisor HTTP port ($SERVER_PORT or 8080)
pub fn server_port() -> u16 {
    let port = env_opt(SERVER_PORT)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SERVER_PORT);
    tracing::trace!(port = port, "Server port");
    port
}

/// Services config file override ($WF_RUN_CONFIG)
pub fn config_path() -> Option<PathBuf> {
    let path = env_opt(WF_RUN_CONFIG).map(PathBuf::from);
    tracing::trace!(path = ?path, "WF_RUN_CONFIG env var");
    path
}

/// Static assets directory ($WF_RUN_STATIC_DIR or `<exe dir>/static`)
pub fn static_dir() -> PathBuf {
    let dir = env_opt(WF_RUN_STATIC_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."))
                .join(STATIC_SUBDIR)
        });
    tracing::debug!(dir = %dir.display(), "Static directory resolved");
    dir
}

/// Build cache shared by every service build ($WF_RUN_GOCACHE or /tmp/gocache)
pub fn build_cache_dir() -> PathBuf {
    PathBuf::from(env_or(WF_RUN_GOCACHE, DEFAULT_GOCACHE))
}

/// Module cache ($WF_RUN_GOMODCACHE or /tmp/gomodcache)
pub fn module_cache_dir() -> PathBuf {
    PathBuf::from(env_or(WF_RUN_GOMODCACHE, DEFAULT_GOMODCACHE))
}

/// Workspace root for fetched sources ($WF_RUN_GOPATH or /tmp/gopath)
pub fn workspace_dir() -> PathBuf {
    PathBuf::from(env_or(WF_RUN_GOPATH, DEFAULT_GOPATH))
}
