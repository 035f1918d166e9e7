use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const BEGIN_MARKER: &str = "# >>> codaph sync >>>";
const END_MARKER: &str = "# <<< codaph sync <<<";

/// Which hook entry point the managed block runs behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookName {
    PostCommit,
    PostPush,
    AgentComplete,
}

impl HookName {
    fn cli_subcommand(&self) -> &'static str {
        match self {
            HookName::PostCommit => "post-commit",
            HookName::PostPush => "post-push",
            HookName::AgentComplete => "agent-complete",
        }
    }
}

fn managed_block(binary_name: &str, hook: HookName) -> String {
    format!(
        "{BEGIN_MARKER}\nif command -v {binary_name} >/dev/null 2>&1; then\n  {binary_name} hooks run {} \"$@\" || true\nfi\n{END_MARKER}\n",
        hook.cli_subcommand()
    )
}

/// Idempotently install (or refresh) the managed block inside `hook_path`.
/// Refuses to edit a file containing NUL bytes. Creates a minimal bash
/// shebang if the file does not exist, and sets it executable.
pub fn install(hook_path: &Path, binary_name: &str, hook: HookName) -> Result<()> {
    let existing = read_existing(hook_path)?;
    if let Some(bytes) = &existing {
        if bytes.contains(&0u8) {
            return Err(Error::Config(format!("{} contains NUL bytes; refusing to edit", hook_path.display())));
        }
    }

    let block = managed_block(binary_name, hook);
    let body = match existing {
        None => format!("#!/usr/bin/env bash\n{block}"),
        Some(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            replace_or_append_block(&text, &block)
        }
    };

    if let Some(parent) = hook_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(hook_path, body)?;
    set_executable(hook_path)?;
    tracing::info!(path = %hook_path.display(), hook = hook.cli_subcommand(), "installed sync hook");
    Ok(())
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::File::open(path) {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn replace_or_append_block(text: &str, block: &str) -> String {
    match (text.find(BEGIN_MARKER), text.find(END_MARKER)) {
        (Some(start), Some(end)) if end > start => {
            let end = end + END_MARKER.len();
            let mut out = String::with_capacity(text.len() + block.len());
            out.push_str(&text[..start]);
            out.push_str(block.trim_end());
            out.push('\n');
            out.push_str(text[end..].trim_start_matches('\n'));
            out
        }
        _ => {
            let mut out = text.to_string();
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&block);
            out
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_new_file_with_shebang_and_managed_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-commit");
        install(&path, "codaph", HookName::PostCommit).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("#!/usr/bin/env bash\n"));
        assert!(text.contains(BEGIN_MARKER));
        assert!(text.contains("post-commit"));
    }

    #[test]
    fn installing_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-commit");
        install(&path, "codaph", HookName::PostCommit).unwrap();
        install(&path, "codaph", HookName::PostCommit).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches(BEGIN_MARKER).count(), 1);
    }

    #[test]
    fn preserves_surrounding_content_in_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-commit");
        std::fs::write(&path, "#!/usr/bin/env bash\necho existing\n").unwrap();
        install(&path, "codaph", HookName::PostCommit).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("echo existing"));
        assert!(text.contains(BEGIN_MARKER));
    }

    #[test]
    fn refuses_files_with_nul_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-commit");
        std::fs::write(&path, b"#!/bin/bash\n\0binary").unwrap();
        assert!(install(&path, "codaph", HookName::PostCommit).is_err());
    }
}
