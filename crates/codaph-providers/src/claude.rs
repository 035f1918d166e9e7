use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::traits::{ProjectedEvent, ProviderReader};

/// Reads Claude Code's JSONL session transcripts
/// (`~/.claude/projects/<slug>/*.jsonl`).
pub struct ClaudeReader;

impl ProviderReader for ClaudeReader {
    fn provider_name(&self) -> &'static str {
        "claude"
    }

    fn default_history_root(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".claude").join("projects"))
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
        for record in records.iter().take(10) {
            let session_id = record.get("sessionId").and_then(Value::as_str);
            let cwd = record.get("cwd").and_then(Value::as_str);
            if session_id.is_some() || cwd.is_some() {
                return (session_id.map(str::to_string), cwd.map(str::to_string));
            }
        }
        (None, None)
    }

    fn project_record(&self, record: &Value) -> Vec<ProjectedEvent> {
        let Some(kind) = record.get("type").and_then(Value::as_str) else {
            return Vec::new();
        };
        let ts = record.get("timestamp").and_then(Value::as_str).map(str::to_string);
        if record.get("isMeta").and_then(Value::as_bool).unwrap_or(false) {
            return Vec::new();
        }

        match kind {
            "user" => {
                let text = record
                    .pointer("/message/content")
                    .and_then(extract_text)
                    .unwrap_or_default();
                if text.is_empty() {
                    return Vec::new();
                }
                let mut event = ProjectedEvent::new("prompt.submitted", serde_json::json!({"text": text}));
                if let Some(ts) = ts {
                    event = event.with_ts(ts);
                }
                vec![event]
            }
            "assistant" => record
                .pointer("/message/content")
                .and_then(Value::as_array)
                .map(|blocks| {
                    blocks
                        .iter()
                        .filter_map(|block| project_assistant_block(block, ts.as_deref()))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

fn extract_text(content: &Value) -> Option<String> {
    if let Some(s) = content.as_str() {
        return Some(s.to_string());
    }
    content.as_array().map(|blocks| {
        blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn project_assistant_block(block: &Value, ts: Option<&str>) -> Option<ProjectedEvent> {
    let block_type = block.get("type").and_then(Value::as_str)?;
    let sub_item = match block_type {
        "text" => serde_json::json!({"type": "agent_message", "text": block.get("text")}),
        "thinking" => serde_json::json!({"type": "reasoning", "text": block.get("thinking")}),
        "tool_use" => serde_json::json!({"type": "file_change", "tool": block.get("name"), "input": block.get("input")}),
        _ => return None,
    };
    let mut event = ProjectedEvent::new("item.completed", serde_json::json!({"item": sub_item}));
    if let Some(ts) = ts {
        event = event.with_ts(ts.to_string());
    }
    Some(event)
}
