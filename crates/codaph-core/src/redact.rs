use regex::Regex;
use serde_json::{Map, Value};

/// Scrubs secrets out of a free-form payload before it is mirrored or
/// replicated. Implementations MUST be deep-structural (walk every map/array
/// node) and MUST NOT mutate their input — callers always see a fresh,
/// redacted copy.
///
/// The regex substitutions a production deployment applies (cloud-provider
/// key formats, vendor token shapes, …) are an operational concern supplied
/// by the host application; this crate only defines the walk and the
/// key-name predicate it runs under.
pub trait Redactor: Send + Sync {
    fn redact(&self, payload: &Value) -> Value;
}

/// A key-name-aware, regex-driven redactor. Masks any value whose containing
/// object key matches `sensitive_key_pattern` wholesale, then runs each
/// pattern in `value_patterns` against every remaining string leaf.
pub struct PatternRedactor {
    sensitive_key_pattern: Regex,
    value_patterns: Vec<Regex>,
    mask: &'static str,
}

impl PatternRedactor {
    /// A minimal, illustrative rule set: common credential-shaped key names
    /// and a generic bearer-token value pattern. Host applications supply a
    /// richer pack via [`PatternRedactor::with_patterns`].
    pub fn minimal() -> Self {
        Self {
            sensitive_key_pattern: Regex::new(
                r"(?i)^(secret|token|password|passwd|api[_-]?key|apikey|authorization|auth|credential|private[_-]?key)s?$",
            )
            .expect("static regex"),
            value_patterns: vec![Regex::new(r"(?i)bearer\s+[a-z0-9._\-]{8,}").expect("static regex")],
            mask: "[redacted]",
        }
    }

    pub fn with_patterns(key_pattern: Regex, value_patterns: Vec<Regex>) -> Self {
        Self {
            sensitive_key_pattern: key_pattern,
            value_patterns,
            mask: "[redacted]",
        }
    }

    fn redact_string(&self, s: &str) -> String {
        let mut out = s.to_string();
        for pattern in &self.value_patterns {
            if pattern.is_match(&out) {
                out = pattern.replace_all(&out, self.mask).into_owned();
            }
        }
        out
    }

    fn redact_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.redact_string(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact_value(v)).collect()),
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, val) in map {
                    if self.sensitive_key_pattern.is_match(key) {
                        out.insert(key.clone(), Value::String(self.mask.to_string()));
                    } else {
                        out.insert(key.clone(), self.redact_value(val));
                    }
                }
                Value::Object(out)
            }
            other => other.clone(),
        }
    }
}

impl Default for PatternRedactor {
    fn default() -> Self {
        Self::minimal()
    }
}

impl Redactor for PatternRedactor {
    fn redact(&self, payload: &Value) -> Value {
        self.redact_value(payload)
    }
}

/// A redactor that performs no scrubbing; useful for tests and for hosts
/// that apply redaction upstream of the pipeline.
pub struct NoopRedactor;

impl Redactor for NoopRedactor {
    fn redact(&self, payload: &Value) -> Value {
        payload.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_sensitive_key_names_regardless_of_nesting() {
        let redactor = PatternRedactor::minimal();
        let input = json!({
            "user": "alice",
            "credentials": {"api_key": "sk-abcdef123456", "nested": {"password": "hunter2"}},
            "items": [{"token": "xyz"}, {"note": "fine"}],
        });
        let out = redactor.redact(&input);
        assert_eq!(out["credentials"]["api_key"], "[redacted]");
        assert_eq!(out["credentials"]["nested"]["password"], "[redacted]");
        assert_eq!(out["items"][0]["token"], "[redacted]");
        assert_eq!(out["items"][1]["note"], "fine");
        assert_eq!(out["user"], "alice");
    }

    #[test]
    fn masks_bearer_tokens_embedded_in_prose() {
        let redactor = PatternRedactor::minimal();
        let input = json!({"text": "curl -H 'Authorization: Bearer abcdefgh12345678'"});
        let out = redactor.redact(&input);
        assert!(out["text"].as_str().unwrap().contains("[redacted]"));
        assert!(!out["text"].as_str().unwrap().contains("abcdefgh12345678"));
    }

    #[test]
    fn redaction_is_idempotent() {
        let redactor = PatternRedactor::minimal();
        let input = json!({"api_key": "sk-live-123", "text": "Bearer aaaaaaaaaaaaaaaa"});
        let once = redactor.redact(&input);
        let twice = redactor.redact(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn does_not_mutate_input() {
        let redactor = PatternRedactor::minimal();
        let input = json!({"password": "secret"});
        let clone = input.clone();
        let _ = redactor.redact(&input);
        assert_eq!(input, clone);
    }

    #[test]
    fn noop_redactor_passes_payload_through() {
        let input = json!({"password": "secret"});
        assert_eq!(NoopRedactor.redact(&input), input);
    }
}
