//! Frame-side console interception.
//!
//! [`ConsoleTap`] wraps the frame's console entry points. Every intercepted
//! call is forwarded to the original backend unchanged (the frame's own
//! console keeps working), then serialized and posted toward the parent
//! origin: string arguments pass through capped at 16 KiB, everything else
//! goes through the structural inspector capped at 32 KiB.
//!
//! The tap also provides the uncaught-error hook: frame runtimes funnel
//! unhandled errors through [`ConsoleTap::uncaught_error`], which takes the
//! same path as an explicit `console.error`.

use crate::constants::{MAX_INSPECT_CHARS, MAX_STRING_ARG_CHARS};
use crate::inspect::{inspect, truncate_chars};
use crate::relay::protocol::ConsoleMessage;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Console methods intercepted by the relay. Everything else stays local to
/// the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Log,
    Info,
    Warn,
    Error,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Log, Method::Info, Method::Warn, Method::Error];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Log => "log",
            Method::Info => "info",
            Method::Warn => "warn",
            Method::Error => "error",
        }
    }

    /// Maps a method name onto an intercepted method, if it is one.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Method::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound half of the window messaging primitive.
///
/// Implementations deliver `data` only to a receiver whose origin matches
/// `target_origin`.
pub trait MessagePort: Send + Sync {
    fn post(&self, data: Value, target_origin: &str);
}

/// The original console implementation being wrapped.
pub trait ConsoleBackend: Send + Sync {
    fn write(&self, method: Method, line: &str);
}

/// Wraps a frame's console, relaying bounded copies of every call.
pub struct ConsoleTap {
    target_origin: String,
    port: Arc<dyn MessagePort>,
    backend: Arc<dyn ConsoleBackend>,
}

impl ConsoleTap {
    /// `target_origin` is computed once at startup, see
    /// [`crate::relay::origin::parent_origin`].
    pub fn new(
        target_origin: impl Into<String>,
        port: Arc<dyn MessagePort>,
        backend: Arc<dyn ConsoleBackend>,
    ) -> Self {
        Self {
            target_origin: target_origin.into(),
            port,
            backend,
        }
    }

    /// One intercepted console call.
    pub fn call(&self, method: Method, args: &[Value]) {
        let strings: Vec<String> = args.iter().map(stringify_arg).collect();

        let message = ConsoleMessage {
            method: method.as_str().to_string(),
            args: strings,
        };
        self.port.post(message.to_wire(), &self.target_origin);

        // Transparency: the frame's own console output is unchanged.
        self.backend.write(method, &message.args.join(" "));
    }

    pub fn log(&self, args: &[Value]) {
        self.call(Method::Log, args);
    }

    pub fn info(&self, args: &[Value]) {
        self.call(Method::Info, args);
    }

    pub fn warn(&self, args: &[Value]) {
        self.call(Method::Warn, args);
    }

    pub fn error(&self, args: &[Value]) {
        self.call(Method::Error, args);
    }

    /// Global error hook: uncaught frame errors take the `error` path.
    pub fn uncaught_error(&self, message: &str) {
        self.error(&[Value::String(message.to_string())]);
    }
}

impl fmt::Debug for ConsoleTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleTap")
            .field("target_origin", &self.target_origin)
            .finish_non_exhaustive()
    }
}

fn stringify_arg(arg: &Value) -> String {
    match arg {
        Value::String(s) => truncate_chars(s, MAX_STRING_ARG_CHARS),
        other => inspect(other, MAX_INSPECT_CHARS),
    }
}
