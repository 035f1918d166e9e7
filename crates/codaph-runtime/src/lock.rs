use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const STALE_MTIME_THRESHOLD: Duration = Duration::from_secs(10 * 60);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockContents {
    pub token: String,
    pub pid: u32,
    pub started_at: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// The per-repo sync lock at `<mirror>/locks/sync.lock`, acquired by
/// exclusive file creation. Never released by unlinking someone else's
/// lock: release checks the file still carries this run's token.
pub struct SyncLock {
    path: PathBuf,
    token: String,
    held: bool,
}

impl SyncLock {
    fn lock_path(mirror_root: &Path) -> PathBuf {
        mirror_root.join("locks").join("sync.lock")
    }

    /// Attempt to acquire the lock, polling every 250ms until `deadline`
    /// elapses. `deadline = Duration::ZERO` means "try once, don't wait" —
    /// the hook-driven behavior.
    pub fn acquire(mirror_root: &Path, metadata: serde_json::Value, deadline: Duration) -> Result<Self> {
        let path = Self::lock_path(mirror_root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let token = uuid::Uuid::new_v4().to_string();
        let contents = LockContents {
            token: token.clone(),
            pid: std::process::id(),
            started_at: chrono::Utc::now().to_rfc3339(),
            metadata,
        };

        let started = Instant::now();
        loop {
            match try_create(&path, &contents) {
                Ok(()) => return Ok(Self { path, token, held: true }),
                Err(_) => {
                    if reclaim_if_stale(&path)? {
                        continue;
                    }
                    if started.elapsed() >= deadline {
                        return Err(Error::LockTimeout(format!("could not acquire sync lock at {}", path.display())));
                    }
                    std::thread::sleep(POLL_INTERVAL.min(deadline.saturating_sub(started.elapsed()).max(Duration::from_millis(1))));
                }
            }
        }
    }

    /// Release the lock, but only if it still carries this run's token.
    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        if !self.held {
            return Ok(());
        }
        if let Ok(bytes) = std::fs::read(&self.path) {
            if let Ok(contents) = serde_json::from_slice::<LockContents>(&bytes) {
                if contents.token == self.token {
                    let _ = std::fs::remove_file(&self.path);
                }
            }
        }
        self.held = false;
        Ok(())
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        let _ = self.release_inner();
    }
}

fn try_create(path: &Path, contents: &LockContents) -> std::io::Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let body = serde_json::to_vec_pretty(contents).map_err(std::io::Error::from)?;
    file.write_all(&body)
}

/// Delete the lock file if it is stale: its pid is no longer alive, or it
/// has no parseable pid and its mtime is older than 10 minutes. Returns
/// `true` if the lock was reclaimed (caller should retry acquisition).
fn reclaim_if_stale(path: &Path) -> Result<bool> {
    let Ok(bytes) = std::fs::read(path) else {
        // Lock disappeared between create failure and this read; retry.
        return Ok(true);
    };
    let parsed: Option<LockContents> = serde_json::from_slice(&bytes).ok();

    let stale = match parsed {
        Some(contents) => !pid_is_alive(contents.pid),
        None => mtime_older_than(path, STALE_MTIME_THRESHOLD)?,
    };

    if stale {
        tracing::warn!(path = %path.display(), "reclaiming stale sync lock");
        let _ = std::fs::remove_file(path);
        Ok(true)
    } else {
        Ok(false)
    }
}

#[cfg(unix)]
fn pid_is_alive(pid: u32) -> bool {
    let result = unsafe { libc::kill(pid as i32, 0) };
    result == 0
}

#[cfg(not(unix))]
fn pid_is_alive(_pid: u32) -> bool {
    true
}

fn mtime_older_than(path: &Path, threshold: Duration) -> Result<bool> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified()?;
    Ok(modified.elapsed().unwrap_or_default() > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_leaves_no_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SyncLock::acquire(dir.path(), serde_json::json!({}), Duration::from_millis(10)).unwrap();
        let path = SyncLock::lock_path(dir.path());
        assert!(path.exists());
        lock.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn second_acquire_times_out_while_first_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let _first = SyncLock::acquire(dir.path(), serde_json::json!({}), Duration::from_millis(10)).unwrap();
        let second = SyncLock::acquire(dir.path(), serde_json::json!({}), Duration::from_millis(50));
        assert!(second.is_err());
    }

    #[test]
    fn stale_lock_with_dead_pid_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = SyncLock::lock_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let stale = LockContents { token: "dead".into(), pid: 999_999, started_at: "x".into(), metadata: serde_json::json!({}) };
        std::fs::write(&path, serde_json::to_vec(&stale).unwrap()).unwrap();

        let lock = SyncLock::acquire(dir.path(), serde_json::json!({}), Duration::from_millis(500)).unwrap();
        lock.release().unwrap();
    }
}
