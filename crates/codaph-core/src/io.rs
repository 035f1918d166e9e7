use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Write `value` as pretty-printed JSON with a trailing newline, replacing
/// any existing file. Writes to a sibling temp file first and renames over
/// the destination so readers never observe a partially-written file.
pub fn write_json_pretty_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut body = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    body.push('\n');

    let tmp_path = tmp_sibling(path);
    fs::write(&tmp_path, body.as_bytes())?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read `path` as JSON, returning `T::default()` if the file is missing or
/// cannot be parsed as `T` (tolerates missing files and shape mismatches).
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let Ok(bytes) = fs::read(path) else {
        return T::default();
    };
    serde_json::from_slice(&bytes).unwrap_or_default()
}

/// Read `path` as JSON, returning `None` if missing or unparseable as `T`.
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("tmp");
    let pid = std::process::id();
    path.with_file_name(format!(".{file_name}.{pid}.tmp"))
}
