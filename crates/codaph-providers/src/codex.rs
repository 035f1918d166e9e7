use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::traits::{ProjectedEvent, ProviderReader};

/// Reads Codex's JSONL rollout files (`~/.codex/sessions/**/*.jsonl`).
pub struct CodexReader;

impl ProviderReader for CodexReader {
    fn provider_name(&self) -> &'static str {
        "codex"
    }

    fn default_history_root(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".codex").join("sessions"))
    }

    fn list_candidates(&self, history_root: &Path) -> Vec<PathBuf> {
        WalkDir::new(history_root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("jsonl"))
            .map(|e| e.into_path())
            .collect()
    }

    fn split_records(&self, bytes: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(bytes)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }

    fn derive_session_and_cwd(&self, records: &[Value]) -> (Option<String>, Option<String>) {
        for record in records {
            let session_id = record.get("session_id").or_else(|| record.get("id")).and_then(Value::as_str);
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
            "user_message" => {
                let text = record.get("content").and_then(Value::as_str).unwrap_or_default();
                let mut event = ProjectedEvent::new("prompt.submitted", serde_json::json!({"text": text}));
                if let Some(ts) = ts {
                    event = event.with_ts(ts);
                }
                vec![event]
            }
            "agent_message" | "reasoning" | "function_call" => {
                let mut event = ProjectedEvent::new(
                    "item.completed",
                    serde_json::json!({"item": {"type": kind, "text": record.get("content").cloned().unwrap_or(Value::Null)}}),
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
