//! Configuration validation with unknown field detection.

use serde_json::Value;
use std::collections::HashSet;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["handoff", "logging"];

/// Known fields for each section.
const KNOWN_HANDOFF: &[&str] = &[
    "shell",
    "security_level",
    "debug",
    "temp_dir",
    "depth_warning_threshold",
    "disable_depth_warnings",
    "stale_script_max_age_secs",
];

const KNOWN_LOGGING: &[&str] = &["format", "level", "file"];

const KNOWN_SECURITY_LEVELS: &[&str] = &["permissive", "normal", "strict"];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Suggest the closest known field name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

fn check_keys(
    obj: &serde_json::Map<String, Value>,
    known: &[&str],
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let known_set: HashSet<&str> = known.iter().copied().collect();
    let mut has_unknown = false;
    for key in obj.keys() {
        if known_set.contains(key.as_str()) {
            continue;
        }
        has_unknown = true;
        let message = match suggest_field(key, known) {
            Some(suggestion) => format!("Unknown field '{}' ({})", key, suggestion),
            None => format!("Unknown field '{}'", key),
        };
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            path,
            message,
        });
    }
    has_unknown
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Error,
                path: String::new(),
                message: "Config must be a JSON object".to_string(),
            });
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Ok,
        path: String::new(),
        message: "Valid JSON".to_string(),
    });

    let mut has_unknown = check_keys(obj, KNOWN_TOP_LEVEL, "", &mut diagnostics);

    if let Some(handoff) = obj.get("handoff").and_then(|v| v.as_object()) {
        has_unknown |= check_keys(handoff, KNOWN_HANDOFF, "handoff", &mut diagnostics);

        if let Some(level) = handoff.get("security_level").and_then(|v| v.as_str()) {
            if !KNOWN_SECURITY_LEVELS.contains(&level) {
                diagnostics.push(Diagnostic {
                    level: DiagnosticLevel::Error,
                    path: "handoff.security_level".to_string(),
                    message: format!(
                        "Unknown security level '{}' (expected one of: {})",
                        level,
                        KNOWN_SECURITY_LEVELS.join(", ")
                    ),
                });
            }
        }

        if handoff.get("security_level").and_then(|v| v.as_str()) == Some("permissive") {
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Warn,
                path: "handoff.security_level".to_string(),
                message: "Permissive level skips all path shape checks".to_string(),
            });
        }

        if handoff.get("stale_script_max_age_secs").and_then(|v| v.as_u64()) == Some(0) {
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Warn,
                path: "handoff.stale_script_max_age_secs".to_string(),
                message: "A zero age lets cleanup race scripts that are about to run".to_string(),
            });
        }
    }

    if let Some(logging) = obj.get("logging").and_then(|v| v.as_object()) {
        has_unknown |= check_keys(logging, KNOWN_LOGGING, "logging", &mut diagnostics);
    }

    if !has_unknown {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Ok,
            path: String::new(),
            message: "All fields recognized".to_string(),
        });
    }

    diagnostics
}
