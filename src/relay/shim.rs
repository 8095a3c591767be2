//! `ject frame` — the sender half of the relay, packaged as the process the
//! host spawns for its content frame.
//!
//! The actual page execution engine is an external collaborator; it pipes
//! console activity into this shim as newline-delimited JSON calls
//! (`{"method":"log","args":[…]}`) on stdin. The shim wraps them in the
//! relay protocol and writes transport envelopes on stdout, where the host's
//! frame channel picks them up. Lines that fail to parse take the
//! uncaught-error path, mirroring a page script blowing up.

use crate::config::Config;
use crate::constants::LIVE_RELOAD_NOTICE;
use crate::relay::origin::{origin_of, parent_origin};
use crate::relay::protocol::MessageEvent;
use crate::relay::sender::{ConsoleBackend, ConsoleTap, MessagePort, Method};
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// One console call piped in by the page runner.
#[derive(Debug, Deserialize)]
struct FrameCall {
    method: String,
    #[serde(default)]
    args: Vec<Value>,
}

/// Posts envelopes on stdout, stamped with this frame's origin.
struct StdoutPort {
    self_origin: String,
}

impl MessagePort for StdoutPort {
    fn post(&self, data: Value, target_origin: &str) {
        let event = MessageEvent {
            origin: self.self_origin.clone(),
            target: target_origin.to_string(),
            data,
        };
        match serde_json::to_string(&event) {
            Ok(line) => {
                let mut stdout = io::stdout().lock();
                let _ = writeln!(stdout, "{line}");
                let _ = stdout.flush();
            }
            Err(err) => log::error!("failed to encode relay envelope: {err}"),
        }
    }
}

/// The frame's own visible console, kept working underneath the tap.
struct StderrConsole;

impl ConsoleBackend for StderrConsole {
    fn write(&self, method: Method, line: &str) {
        eprintln!("[{method}] {line}");
    }
}

/// Runs the shim until stdin closes.
pub fn run(config: &Config, page_url: &str) -> Result<()> {
    let target_origin = parent_origin(page_url, &config.domain_main, &config.domain_frame)?;
    let self_origin = origin_of(page_url)?;
    log::info!("frame shim for {page_url}: relaying console to {target_origin}");

    let tap = ConsoleTap::new(
        target_origin,
        Arc::new(StdoutPort { self_origin }),
        Arc::new(StderrConsole),
    );

    // Dev-server chatter announcing the transport is live. The host filters
    // this before display.
    tap.info(&[Value::String(LIVE_RELOAD_NOTICE.to_string())]);

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<FrameCall>(&line) {
            Ok(call) => match Method::from_name(&call.method) {
                Some(method) => tap.call(method, &call.args),
                // Methods outside the intercepted set stay local to the frame.
                None => eprintln!("[{}] {}", call.method, Value::Array(call.args)),
            },
            Err(err) => tap.uncaught_error(&format!("Uncaught SyntaxError: {err}")),
        }
    }

    Ok(())
}
