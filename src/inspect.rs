//! Structural rendering of console arguments.
//!
//! Non-string values crossing the relay are flattened to a compact,
//! human-readable form on the frame side so the host never has to interpret
//! structured payloads from untrusted code. Output is length-bounded by the
//! caller.

use serde_json::Value;

/// Renders `value` in a compact structural form, truncated to `max_chars`
/// characters.
pub fn inspect(value: &Value, max_chars: usize) -> String {
    let mut out = String::new();
    render(value, &mut out);
    truncate_chars(&out, max_chars)
}

fn render(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => render_quoted(s, out),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render(item, out);
            }
            out.push_str(" ]");
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_identifier(key) {
                    out.push_str(key);
                } else {
                    render_quoted(key, out);
                }
                out.push_str(": ");
                render(item, out);
            }
            out.push_str(" }");
        }
    }
}

fn render_quoted(s: &str, out: &mut String) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ch if ch.is_control() => {
                out.push_str(&format!("\\x{:02x}", ch as u32));
            }
            ch => out.push(ch),
        }
    }
    out.push('\'');
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

/// Truncates `s` to at most `max_chars` characters, on a character boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => s[..byte_index].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(inspect(&json!(null), 100), "null");
        assert_eq!(inspect(&json!(true), 100), "true");
        assert_eq!(inspect(&json!(42), 100), "42");
        assert_eq!(inspect(&json!(1.5), 100), "1.5");
        assert_eq!(inspect(&json!("hi"), 100), "'hi'");
    }

    #[test]
    fn test_structures() {
        assert_eq!(inspect(&json!([]), 100), "[]");
        assert_eq!(inspect(&json!([1, "a"]), 100), "[ 1, 'a' ]");
        assert_eq!(
            inspect(&json!({"a": 1, "b c": [true]}), 100),
            "{ a: 1, 'b c': [ true ] }"
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(inspect(&json!("it's\n"), 100), "'it\\'s\\n'");
    }

    #[test]
    fn test_truncation_bound() {
        let value = json!(vec!["x".repeat(100); 500]);
        let rendered = inspect(&value, 32 * 1024);
        assert_eq!(rendered.chars().count(), 32 * 1024);
    }

    #[test]
    fn test_truncate_chars_is_boundary_safe() {
        let s = "éééé";
        assert_eq!(truncate_chars(s, 2), "éé");
        assert_eq!(truncate_chars(s, 10), "éééé");
    }
}
