//! Wire types and validation for the console relay.
//!
//! Wire message (frame → host):
//!
//! ```json
//! {"type": "console", "method": "log", "args": ["a", "b"]}
//! ```
//!
//! carried in a transport envelope that the *transport* stamps — user code
//! inside the frame has no way to forge the origin fields:
//!
//! ```json
//! {"origin": "<sender origin>", "target": "<intended receiver origin>", "data": {…}}
//! ```
//!
//! `method` must match `^[a-z]{1,16}$` and every element of `args` must be a
//! string. Anything else is a protocol violation: the whole message is
//! dropped with a warning and never reaches the UI.

use crate::constants::MAX_METHOD_LEN;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Payload discriminator for console traffic.
pub const CONSOLE_TYPE: &str = "console";

/// A validated console call relayed out of the content frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    /// One of the intercepted console methods, e.g. `log`.
    pub method: String,
    /// Stringified, length-bounded arguments.
    pub args: Vec<String>,
}

impl ConsoleMessage {
    /// Renders the wire form, `{"type":"console",…}`.
    pub fn to_wire(&self) -> Value {
        json!({
            "type": CONSOLE_TYPE,
            "method": self.method,
            "args": self.args,
        })
    }
}

/// One message as observed by the receiving side's transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Origin of the posting context, stamped by the transport.
    pub origin: String,
    /// Origin the sender addressed; the transport only delivers matches.
    pub target: String,
    /// Unvalidated payload.
    pub data: Value,
}

/// Shape violations detected while validating an inbound console payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("console message method is missing or not a string")]
    MethodMissing,

    #[error("console message method {0:?} must be 1-16 lowercase ascii letters")]
    BadMethod(String),

    #[error("console message args is missing or not an array")]
    ArgsNotArray,

    #[error("console message args[{index}] is not a string")]
    NonStringArg { index: usize },
}

/// Returns `true` for methods matching `^[a-z]{1,16}$`.
pub fn method_is_valid(method: &str) -> bool {
    !method.is_empty()
        && method.len() <= MAX_METHOD_LEN
        && method.bytes().all(|b| b.is_ascii_lowercase())
}

/// Validates an inbound payload.
///
/// `Ok(None)` means the payload is not console traffic at all (other message
/// types share the channel and are ignored here). `Err` means it claimed to
/// be console traffic but failed validation; the caller logs and drops it.
pub fn parse_console(data: &Value) -> Result<Option<ConsoleMessage>, ProtocolViolation> {
    if data.get("type").and_then(Value::as_str) != Some(CONSOLE_TYPE) {
        return Ok(None);
    }

    let method = data
        .get("method")
        .and_then(Value::as_str)
        .ok_or(ProtocolViolation::MethodMissing)?;
    if !method_is_valid(method) {
        return Err(ProtocolViolation::BadMethod(method.to_string()));
    }

    let args = data
        .get("args")
        .and_then(Value::as_array)
        .ok_or(ProtocolViolation::ArgsNotArray)?;

    let mut strings = Vec::with_capacity(args.len());
    for (index, arg) in args.iter().enumerate() {
        match arg.as_str() {
            Some(s) => strings.push(s.to_string()),
            None => return Err(ProtocolViolation::NonStringArg { index }),
        }
    }

    Ok(Some(ConsoleMessage {
        method: method.to_string(),
        args: strings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_message_parses() {
        let data = json!({"type": "console", "method": "log", "args": ["a", "b"]});
        let msg = parse_console(&data).expect("valid").expect("console");
        assert_eq!(msg.method, "log");
        assert_eq!(msg.args, vec!["a", "b"]);
    }

    #[test]
    fn test_non_console_type_is_ignored_not_rejected() {
        assert_eq!(parse_console(&json!({"type": "ping"})), Ok(None));
        assert_eq!(parse_console(&json!("just a string")), Ok(None));
        assert_eq!(parse_console(&json!(null)), Ok(None));
    }

    #[test]
    fn test_method_regex() {
        assert!(method_is_valid("log"));
        assert!(method_is_valid("a"));
        assert!(method_is_valid(&"a".repeat(16)));
        assert!(!method_is_valid(""));
        assert!(!method_is_valid(&"a".repeat(17)));
        assert!(!method_is_valid("LOG!"));
        assert!(!method_is_valid("log1"));
        assert!(!method_is_valid("lög"));
    }

    #[test]
    fn test_bad_method_is_a_violation() {
        let data = json!({"type": "console", "method": "LOG!", "args": []});
        assert_eq!(
            parse_console(&data),
            Err(ProtocolViolation::BadMethod("LOG!".to_string()))
        );

        let data = json!({"type": "console", "args": []});
        assert_eq!(parse_console(&data), Err(ProtocolViolation::MethodMissing));
    }

    #[test]
    fn test_non_string_arg_reports_first_offending_index() {
        let data = json!({"type": "console", "method": "log", "args": ["ok", 1, 2]});
        assert_eq!(
            parse_console(&data),
            Err(ProtocolViolation::NonStringArg { index: 1 })
        );

        let data = json!({"type": "console", "method": "log", "args": "nope"});
        assert_eq!(parse_console(&data), Err(ProtocolViolation::ArgsNotArray));
    }

    #[test]
    fn test_wire_round_trip() {
        let msg = ConsoleMessage {
            method: "warn".to_string(),
            args: vec!["x".to_string()],
        };
        let parsed = parse_console(&msg.to_wire()).expect("valid").expect("console");
        assert_eq!(parsed, msg);
    }
}
