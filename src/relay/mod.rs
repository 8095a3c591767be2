//! Cross-frame console relay.
//!
//! Two sides, asymmetric. The *sender* runs inside the sandboxed content
//! frame: it wraps the frame's console entry points, bounds every argument,
//! and posts structured messages toward the parent origin. The *receiver*
//! runs in the host: it filters by origin **before** reading any payload
//! field, validates shape, and re-emits accepted messages on the
//! console-message bus.
//!
//! The two processes share nothing but this protocol. Every inbound payload
//! is revalidated regardless of source; malformed traffic is logged and
//! dropped, never displayed and never fatal.

pub mod origin;
pub mod protocol;
pub mod receiver;
pub mod sender;
pub mod shim;

pub use protocol::{ConsoleMessage, MessageEvent};
pub use receiver::ConsoleReceiver;
pub use sender::{ConsoleBackend, ConsoleTap, MessagePort, Method};
