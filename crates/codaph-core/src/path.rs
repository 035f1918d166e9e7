use std::path::{Path, PathBuf};

use codaph_types::repo_id;

use crate::error::{Error, Result};

pub const MIRROR_DIR_NAME: &str = ".codaph";

/// Resolve the per-project mirror root based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. `CODAPH_PATH` environment variable (with tilde expansion)
/// 3. `<project_root>/.codaph`
pub fn resolve_mirror_root(project_root: &Path, explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }
    if let Ok(env_path) = std::env::var("CODAPH_PATH") {
        return Ok(expand_tilde(&env_path));
    }
    Ok(project_root.join(MIRROR_DIR_NAME))
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Normalize a path for comparison: canonicalize if possible, otherwise make
/// it absolute against the current working directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// Derive the repoId for a project root: the 12-hex-char hash of its
/// normalized absolute path.
pub fn project_repo_id(project_root: &Path) -> String {
    let normalized = normalize_path(project_root);
    repo_id(&normalized.to_string_lossy())
}

/// Discover the project root based on priority:
/// 1. `explicit_project_root` (e.g. a `--project-root` flag)
/// 2. `CODAPH_PROJECT_ROOT` environment variable
/// 3. Current working directory
pub fn discover_project_root(explicit_project_root: Option<&str>) -> Result<PathBuf> {
    if let Some(root) = explicit_project_root {
        return Ok(PathBuf::from(root));
    }
    if let Ok(env_root) = std::env::var("CODAPH_PROJECT_ROOT") {
        return Ok(PathBuf::from(env_root));
    }
    std::env::current_dir().map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_id_is_stable_for_the_same_root() {
        let a = project_repo_id(Path::new("/tmp"));
        let b = project_repo_id(Path::new("/tmp"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn explicit_path_wins_over_env_and_default() {
        let root = resolve_mirror_root(Path::new("/project"), Some("/explicit")).unwrap();
        assert_eq!(root, PathBuf::from("/explicit"));
    }

    #[test]
    fn default_mirror_root_is_dot_codaph_under_project() {
        // SAFETY: test runs single-threaded within this process's env mutation scope.
        unsafe {
            std::env::remove_var("CODAPH_PATH");
        }
        let root = resolve_mirror_root(Path::new("/project"), None).unwrap();
        assert_eq!(root, PathBuf::from("/project/.codaph"));
    }
}
