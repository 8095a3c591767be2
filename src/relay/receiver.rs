//! Host-side console relay receiver.
//!
//! Security boundary: the origin check happens before any payload field is
//! read. Messages from any other origin are silently ignored; messages from
//! the expected origin that fail shape validation are logged and dropped.
//! Neither case throws, and neither stops processing of later messages.

use crate::events::EventBus;
use crate::relay::protocol::{parse_console, ConsoleMessage, MessageEvent};

/// Validates inbound frame messages and re-emits accepted console calls on
/// the console-message bus.
pub struct ConsoleReceiver {
    expected_origin: String,
    bus: EventBus<ConsoleMessage>,
}

impl ConsoleReceiver {
    /// `expected_origin` is computed from the resolved frame URL, not from
    /// anything the frame sent.
    pub fn new(expected_origin: impl Into<String>, bus: EventBus<ConsoleMessage>) -> Self {
        Self {
            expected_origin: expected_origin.into(),
            bus,
        }
    }

    /// The bus accepted messages are re-emitted on.
    pub fn bus(&self) -> &EventBus<ConsoleMessage> {
        &self.bus
    }

    /// Handles one transport event.
    pub fn on_message(&self, event: &MessageEvent) {
        if event.origin != self.expected_origin {
            log::debug!(
                "dropping message from unexpected origin {:?} (expected {:?})",
                event.origin,
                self.expected_origin
            );
            return;
        }

        match parse_console(&event.data) {
            Ok(Some(message)) => self.bus.emit(&message),
            Ok(None) => {}
            Err(violation) => {
                log::warn!("dropping malformed console message: {violation}");
            }
        }
    }
}

impl std::fmt::Debug for ConsoleReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleReceiver")
            .field("expected_origin", &self.expected_origin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const FRAME_ORIGIN: &str = "http://ject.page.local:1850";

    fn fixture() -> (ConsoleReceiver, Arc<Mutex<Vec<ConsoleMessage>>>) {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sub = {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |msg: &ConsoleMessage| {
                seen.lock().expect("seen").push(msg.clone());
            })
        };
        // Keep the display subscription alive for the test's duration.
        std::mem::forget(sub);
        (ConsoleReceiver::new(FRAME_ORIGIN, bus), seen)
    }

    fn event(origin: &str, data: serde_json::Value) -> MessageEvent {
        MessageEvent {
            origin: origin.to_string(),
            target: "http://ject.dev.local:1850".to_string(),
            data,
        }
    }

    #[test]
    fn test_valid_message_yields_exactly_one_event() {
        let (receiver, seen) = fixture();
        receiver.on_message(&event(
            FRAME_ORIGIN,
            json!({"type": "console", "method": "log", "args": ["a", "b"]}),
        ));

        let seen = seen.lock().expect("seen");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "log");
        assert_eq!(seen[0].args, vec!["a", "b"]);
    }

    #[test]
    fn test_unexpected_origin_yields_zero_events() {
        let (receiver, seen) = fixture();
        receiver.on_message(&event(
            "https://evil.example",
            json!({"type": "console", "method": "log", "args": ["a"]}),
        ));
        assert!(seen.lock().expect("seen").is_empty());
    }

    #[test]
    fn test_bad_method_yields_zero_events() {
        let (receiver, seen) = fixture();
        receiver.on_message(&event(
            FRAME_ORIGIN,
            json!({"type": "console", "method": "LOG!", "args": ["a"]}),
        ));
        assert!(seen.lock().expect("seen").is_empty());
    }

    #[test]
    fn test_non_string_args_yield_zero_events() {
        let (receiver, seen) = fixture();
        receiver.on_message(&event(
            FRAME_ORIGIN,
            json!({"type": "console", "method": "log", "args": [1, 2]}),
        ));
        assert!(seen.lock().expect("seen").is_empty());
    }

    #[test]
    fn test_malformed_message_does_not_stop_later_messages() {
        let (receiver, seen) = fixture();
        receiver.on_message(&event(FRAME_ORIGIN, json!({"type": "console"})));
        receiver.on_message(&event(
            FRAME_ORIGIN,
            json!({"type": "console", "method": "info", "args": ["after"]}),
        ));

        let seen = seen.lock().expect("seen");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].args, vec!["after"]);
    }

    #[test]
    fn test_non_console_traffic_is_ignored() {
        let (receiver, seen) = fixture();
        receiver.on_message(&event(FRAME_ORIGIN, json!({"type": "resize", "w": 10})));
        assert!(seen.lock().expect("seen").is_empty());
    }
}
