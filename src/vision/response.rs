//! Best-effort recovery of a JSON object from a model reply.

use serde_json::Value;

/// Remove Markdown code fences (```` ``` ```` and ```` ```json ````).
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Find the first balanced `{...}` object in `text`.
///
/// Braces inside JSON strings are ignored. When the object never closes,
/// the span from the first `{` to the last `}` is returned instead.
///
/// # Examples
///
/// ```
/// use chart_oxide::vision::extract_json_object;
///
/// let reply = r#"Sure! {"label": "a}b", "n": {"v": 1}} Hope this helps."#;
/// assert_eq!(extract_json_object(reply), Some(r#"{"label": "a}b", "n": {"v": 1}}"#));
/// assert_eq!(extract_json_object("no json here"), None);
/// ```
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {},
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            },
            _ => {},
        }
    }

    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the JSON object embedded in a model reply.
pub fn parse_reply(text: &str) -> std::result::Result<Value, String> {
    let cleaned = strip_code_fences(text);
    let candidate = extract_json_object(&cleaned).unwrap_or(&cleaned);
    serde_json::from_str(candidate).map_err(|e| format!("JSON parse error: {}", e))
}

/// Numeric value of a JSON number or numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Numeric entries of a JSON array, skipping anything else.
pub fn number_list(value: Option<&Value>) -> Vec<f64> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(as_number).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_handles_escaped_quotes() {
        let text = r#"{"t": "say \"}\"", "k": 2}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_unbalanced_object_falls_back_to_last_brace() {
        let text = r#"{"a": {"b": 1} trailing"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 1}"#));
    }

    #[test]
    fn test_parse_reply_reports_errors() {
        assert!(parse_reply("```json\n{\"x\": [1, 2]}\n```").is_ok());
        let err = parse_reply("{broken").unwrap_err();
        assert!(err.starts_with("JSON parse error"));
    }

    #[test]
    fn test_number_list_skips_non_numeric() {
        let value: Value = serde_json::from_str(r#"[1, "2.5", "n/a", null, 3e2]"#).unwrap();
        assert_eq!(number_list(Some(&value)), vec![1.0, 2.5, 300.0]);
        assert!(number_list(None).is_empty());
    }
}
