//! Shared constants for the playground, relay protocol, and compile proxy.

/// Cap applied to string console arguments before they cross the frame
/// boundary, in characters.
pub const MAX_STRING_ARG_CHARS: usize = 16 * 1024;

/// Cap applied to the inspected rendering of a non-string console argument,
/// in characters.
pub const MAX_INSPECT_CHARS: usize = 32 * 1024;

/// Console relay methods must match `^[a-z]{1,16}$`.
pub const MAX_METHOD_LEN: usize = 16;

/// Number of log entries per group in the console view. Groups bound how much
/// of the log a single repaint has to touch.
pub const CONSOLE_GROUP_SIZE: usize = 10;

/// Host frame tick, the paint boundary for the render phase and for debounced
/// resize emission.
pub const FRAME_TICK_MS: u64 = 16;

/// Default listen port for `ject compile-server`.
pub const DEFAULT_COMPILE_PORT: u16 = 1951;

/// Liveness line emitted by the frame shim when its transport comes up.
/// The host suppresses it before display.
pub const LIVE_RELOAD_NOTICE: &str = "[WDS] Live Reloading enabled.";

/// Development hostname suffix. A frame served from `<frame_domain>.local`
/// relays to `<main_domain>.local`.
pub const LOCAL_SUFFIX: &str = ".local";
