mod error;
mod io;
mod path;
mod redact;

pub use error::{Error, Result};
pub use io::{read_json_opt, read_json_or_default, write_json_pretty_atomic};
pub use path::{discover_project_root, expand_tilde, normalize_path, project_repo_id, resolve_mirror_root, MIRROR_DIR_NAME};
pub use redact::{NoopRedactor, PatternRedactor, Redactor};
