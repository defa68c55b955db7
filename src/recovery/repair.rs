//! JSON repair for non-conformant model output.
//!
//! Models wrap JSON in markdown fences, leave trailing commas, break strings
//! across lines, stop mid-object at the token limit, and append prose after
//! the closing brace. Each step below fixes exactly one of those failure
//! modes, is idempotent, and never touches well-formed input. Domain
//! fallbacks live with the callers; this module only repairs or fails.

use regex::Regex;
use serde::de::DeserializeOwned;

use super::RecoveryError;

/// Apply all repair heuristics in order. The result is not guaranteed to
/// parse; [`recover_value`] is the front door that also validates.
pub fn repair_json(raw: &str) -> String {
    let text = raw.trim();
    let text = strip_code_fences(text);
    let text = strip_trailing_commas(&text);
    let text = escape_inner_quotes(&text);
    let text = collapse_string_newlines(&text);
    let text = balance_closers(&text);
    truncate_after_last_brace(&text)
}

/// Repair and parse into a JSON value.
pub fn recover_value(raw: &str) -> Result<serde_json::Value, RecoveryError> {
    let repaired = repair_json(raw);
    match serde_json::from_str(&repaired) {
        Ok(value) => Ok(value),
        Err(err) => {
            // Last resort: prose before the opening brace (fences were already
            // stripped, but models sometimes preface the object with a sentence).
            if let Some(start) = repaired.find('{') {
                if start > 0 {
                    if let Ok(value) = serde_json::from_str(&repaired[start..]) {
                        tracing::debug!("recovered JSON after dropping leading prose");
                        return Ok(value);
                    }
                }
            }
            Err(RecoveryError::Unrecoverable {
                reason: err.to_string(),
                snippet: snippet_of(&repaired),
            })
        }
    }
}

/// Repair, parse, and deserialize into the expected schema.
pub fn recover<T: DeserializeOwned>(raw: &str) -> Result<T, RecoveryError> {
    let value = recover_value(raw)?;
    serde_json::from_value(value).map_err(|e| RecoveryError::SchemaMismatch(e.to_string()))
}

/// Deserialize an array field leniently; items that fail to deserialize are
/// skipped, so one malformed entry does not discard the rest.
pub fn parse_array_lenient<T: DeserializeOwned>(items: Option<&serde_json::Value>) -> Vec<T> {
    match items.and_then(|v| v.as_array()) {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}

/// Step 1: strip leading/trailing ``` or ```json fence markers.
fn strip_code_fences(text: &str) -> String {
    let mut s = text.trim();
    if s.starts_with("```") {
        s = s.trim_start_matches("```");
        // Tag on the opening fence ("json", "JSON") ends at the first newline
        if let Some(nl) = s.find('\n') {
            let tag = s[..nl].trim();
            if tag.eq_ignore_ascii_case("json") || tag.is_empty() {
                s = &s[nl + 1..];
            }
        }
    }
    let mut s = s.trim_end();
    if s.ends_with("```") {
        s = s[..s.len() - 3].trim_end();
    }
    s.to_string()
}

/// Step 2: remove trailing commas immediately before a closing `}` or `]`.
fn strip_trailing_commas(text: &str) -> String {
    let re = Regex::new(r",(\s*[}\]])").unwrap();
    re.replace_all(text, "$1").into_owned()
}

/// Step 3: escape an unescaped quoted span nested inside a string value.
///
/// Only the unambiguous shape is repaired: a value containing exactly one
/// inner quoted span, directly followed by a `,`, `}` or `]`. Anything
/// murkier is left for the structural parse to accept or reject.
fn escape_inner_quotes(text: &str) -> String {
    let re =
        Regex::new(r#":\s*"([^"\\\n]*)"([^"\\\n]*)"([^"\\\n]*)"(\s*[,}\]])"#).unwrap();
    re.replace_all(text, r#": "$1\"$2\"$3"$4"#).into_owned()
}

/// Step 4: collapse literal newlines inside string values to one space.
fn collapse_string_newlines(text: &str) -> String {
    let re = Regex::new(r#":\s*"([^"\\\n]*)\n\s*([^"\\]*)""#).unwrap();
    let mut current = text.to_string();
    loop {
        let next = re.replace_all(&current, r#": "$1 $2""#).into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Step 5: close whatever the model left open.
///
/// Tracks `{`/`[` outside string literals. A `}` that arrives while an array
/// is still open closes the array first (the dominant truncation shape:
/// `{"a":1,"b":[1,2,}` becomes `{"a":1,"b":[1,2]}` after step 2 ran), and
/// anything still open at end-of-input is closed innermost-first.
fn balance_closers(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '{' | '[' => {
                stack.push(ch);
                out.push(ch);
            }
            '}' => {
                while stack.last() == Some(&'[') {
                    stack.pop();
                    out.push(']');
                }
                if stack.last() == Some(&'{') {
                    stack.pop();
                }
                out.push(ch);
            }
            ']' => {
                while stack.last() == Some(&'{') {
                    stack.pop();
                    out.push('}');
                }
                if stack.last() == Some(&'[') {
                    stack.pop();
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    if in_string {
        out.push('"');
    }
    while let Some(open) = stack.pop() {
        out.push(if open == '{' { '}' } else { ']' });
    }
    out
}

/// Step 6: discard trailing prose after the final `}`.
fn truncate_after_last_brace(text: &str) -> String {
    match text.rfind('}') {
        Some(idx) if idx + 1 < text.len() => text[..=idx].to_string(),
        _ => text.to_string(),
    }
}

fn snippet_of(text: &str) -> String {
    text.chars().take(80).collect::<String>().replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn well_formed_input_passes_through() {
        let raw = r#"{"a": 1, "b": [1, 2]}"#;
        assert_eq!(repair_json(raw), raw);
        let value = recover_value(raw).unwrap();
        assert_eq!(value["b"][1], 2);
    }

    #[test]
    fn round_trip_through_fence_prose_and_trailing_comma() {
        let original = serde_json::json!({
            "recommendation": "NEGOTIATE",
            "win_probability": 62,
            "items": ["kitchen_counter", "bath_tiles"],
        });
        let serialized = serde_json::to_string_pretty(&original).unwrap();
        // Inject a trailing comma before the final brace
        let broken = serialized.replacen("62\n}", "62,\n}", 1);
        assert_ne!(broken, serialized);
        let wrapped = format!(
            "```json\n{broken}\n```\nLet me know if you need anything else!"
        );
        let recovered = recover_value(&wrapped).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn dangling_comma_then_missing_array_closer() {
        // The repaired output must close the array, then the object
        let recovered = recover_value(r#"{"a":1,"b":[1,2,}"#).unwrap();
        assert_eq!(recovered, serde_json::json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn truncated_object_gets_closed() {
        let raw = r#"{"summary": "Strong case", "factors": ["photos", "timeline""#;
        let recovered = recover_value(raw).unwrap();
        assert_eq!(recovered["factors"][1], "timeline");
    }

    #[test]
    fn fence_without_language_tag() {
        let raw = "```\n{\"x\": true}\n```";
        assert_eq!(recover_value(raw).unwrap()["x"], true);
    }

    #[test]
    fn newlines_inside_string_values_collapse() {
        let raw = "{\"description\": \"scratch on the\nleft side\"}";
        let recovered = recover_value(raw).unwrap();
        assert_eq!(recovered["description"], "scratch on the left side");
    }

    #[test]
    fn unescaped_inner_quotes_in_value() {
        let raw = r#"{"note": "tenant said "no damage" on exit", "ok": true}"#;
        let recovered = recover_value(raw).unwrap();
        assert_eq!(recovered["note"], "tenant said \"no damage\" on exit");
        assert_eq!(recovered["ok"], true);
    }

    #[test]
    fn repair_is_idempotent() {
        let raw = "```json\n{\"a\": 1, \"b\": [1, 2,}\n```\ntrailing words";
        let once = repair_json(raw);
        let twice = repair_json(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_balancing() {
        let raw = r#"{"text": "see clause {5} and [6]", "n": 1"#;
        let recovered = recover_value(raw).unwrap();
        assert_eq!(recovered["text"], "see clause {5} and [6]");
    }

    #[test]
    fn leading_prose_is_dropped_as_last_resort() {
        let raw = "Here is the assessment: {\"severity\": \"minor\"}";
        let recovered = recover_value(raw).unwrap();
        assert_eq!(recovered["severity"], "minor");
    }

    #[test]
    fn pure_prose_is_unrecoverable() {
        let err = recover_value("I cannot provide a structured answer to that.")
            .unwrap_err();
        assert!(matches!(err, RecoveryError::Unrecoverable { .. }));
    }

    #[test]
    fn typed_recovery_reports_schema_mismatch() {
        #[derive(Deserialize, Debug)]
        struct Verdict {
            #[allow(dead_code)]
            severity: u32, // wrong type on purpose
        }
        let err = recover::<Verdict>(r#"{"severity": "minor"}"#).unwrap_err();
        assert!(matches!(err, RecoveryError::SchemaMismatch(_)));
    }

    #[test]
    fn lenient_parsing_skips_bad_items() {
        #[derive(Deserialize)]
        struct Entry {
            name: String,
        }
        let value = serde_json::json!([
            {"name": "first"},
            {"unrelated": true},
            {"name": "third"},
        ]);
        let parsed: Vec<Entry> = parse_array_lenient(Some(&value));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "first");
        assert_eq!(parsed[1].name, "third");
    }

    #[test]
    fn typed_recovery_parses_into_schema() {
        #[derive(Deserialize)]
        struct Verdict {
            severity: String,
            tenant_liable: bool,
        }
        let raw = "```json\n{\"severity\": \"none\", \"tenant_liable\": false,}\n```";
        let verdict: Verdict = recover(raw).unwrap();
        assert_eq!(verdict.severity, "none");
        assert!(!verdict.tenant_liable);
    }
}
