#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use webrunner::supervisor::GracefulStop;

/// Keeps a background loop in the same process group that records SIGTERM
/// in `term.txt`. `port.txt` appears once the trap is installed.
pub const LOOPING_SERVICE: &str = r#"sh -c 'trap "echo term > term.txt; exit 0" TERM; echo "$PORT" > port.txt; while :; do sleep 1; done' &
wait"#;

const POLL_ATTEMPTS: usize = 100;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Create `<root>/<name>/run.sh` with `body` as its script.
pub fn service_dir(root: &Path, name: &str, body: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let script = dir.join("run.sh");
    std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    dir
}

pub async fn wait_for_file(path: &Path) -> String {
    for _ in 0..POLL_ATTEMPTS {
        if let Ok(content) = std::fs::read_to_string(path) {
            if !content.is_empty() {
                return content;
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    panic!("{} never appeared", path.display());
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..POLL_ATTEMPTS {
        if condition() {
            return true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    false
}

/// Stand-in for the HTTP listener.
pub struct NoHttp;

impl GracefulStop for NoHttp {
    async fn stop_within(&self, _timeout: Duration) -> webrunner::Result<()> {
        Ok(())
    }
}
