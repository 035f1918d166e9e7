use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::traits::{ProjectedEvent, ProviderReader};

/// Reads Gemini CLI's checkpoint files, which store a whole session as a
/// single JSON array rather than newline-delimited records.
pub struct GeminiReader;

impl ProviderReader for GeminiReader {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn default_history_root(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".gemini").join("tmp"))
    }

    fn list_candidates(&self, history_root: &Path) -> Vec<PathBuf> {
        WalkDir::new(history_root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().file_name().and_then(|n| n.to_str()) == Some("logs.json"))
            .map(|e| e.into_path())
            .collect()
    }

    fn split_records(&self, bytes: &[u8]) -> Vec<Value> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    fn derive_session_and_cwd(&self, records: &[Value]) -> (Option<String>, Option<String>) {
        for record in records {
            let session_id = record.get("sessionId").and_then(Value::as_str);
            let cwd = record.get("cwd").and_then(Value::as_str);
            if session_id.is_some() || cwd.is_some() {
                return (session_id.map(str::to_string), cwd.map(str::to_string));
            }
        }
        (None, None)
    }

    fn project_record(&self, record: &Value) -> Vec<ProjectedEvent> {
        let ts = record.get("timestamp").and_then(Value::as_str).map(str::to_string);
        let Some(kind) = record.get("type").and_then(Value::as_str) else {
            return Vec::new();
        };
        match kind {
            "user" => {
                let text = record.get("message").and_then(Value::as_str).unwrap_or_default();
                let mut event = ProjectedEvent::new("prompt.submitted", serde_json::json!({"text": text}));
                if let Some(ts) = ts {
                    event = event.with_ts(ts);
                }
                vec![event]
            }
            "gemini" | "model" => {
                let mut event = ProjectedEvent::new(
                    "item.completed",
                    serde_json::json!({"item": {"type": "agent_message", "text": record.get("message")}}),
                );
                if let Some(ts) = ts {
                    event = event.with_ts(ts);
                }
                vec![event]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_json_array_into_records() {
        let reader = GeminiReader;
        let bytes = serde_json::to_vec(&serde_json::json!([{"type": "user", "message": "hi"}])).unwrap();
        assert_eq!(reader.split_records(&bytes).len(), 1);
    }

    #[test]
    fn projects_model_turn_to_item_completed() {
        let reader = GeminiReader;
        let record = serde_json::json!({"type": "model", "message": "done"});
        let projected = reader.project_record(&record);
        assert_eq!(projected[0].event_type, "item.completed");
    }
}
