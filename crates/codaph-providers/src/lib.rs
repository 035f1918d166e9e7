pub mod claude;
pub mod codex;
pub mod cursor;
pub mod error;
pub mod gemini;
pub mod sync;
pub mod traits;

pub use claude::ClaudeReader;
pub use codex::CodexReader;
pub use cursor::{FileCursor, HistorySyncState};
pub use error::{Error, Result};
pub use gemini::GeminiReader;
pub use sync::{sync, SyncSummary};
pub use traits::{ProjectedEvent, ProviderReader};

/// Look up the built-in reader for a provider name (`"codex"`, `"claude"`,
/// `"gemini"`).
pub fn reader_for(provider: &str) -> Option<Box<dyn ProviderReader>> {
    match provider {
        "codex" => Some(Box::new(CodexReader)),
        "claude" => Some(Box::new(ClaudeReader)),
        "gemini" => Some(Box::new(GeminiReader)),
        _ => None,
    }
}
