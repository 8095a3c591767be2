//! ject - a terminal code playground.
//!
//! Four panes share one screen: editors for markup, script, and style, plus
//! a content frame that runs the page and streams its console back across a
//! process boundary. Sessions live in an external session API; the compile
//! proxy fronts an external transpiler.
//!
//! # Architecture
//!
//! - **tui** - the quad-split workspace and its event loop
//! - **session** - the in-memory session model and templates
//! - **api** - session API client
//! - **relay** - the cross-process console relay (sender, receiver, wire
//!   protocol, origin math)
//! - **scheduler** - batched measure/render scheduling for layout reads
//! - **events** - typed pub/sub channels
//! - **compile** - the HTTP compile proxy and its transpiler client

pub mod api;
pub mod compile;
pub mod config;
pub mod constants;
pub mod events;
pub mod inspect;
pub mod relay;
pub mod scheduler;
pub mod session;
pub mod tui;

pub use config::Config;
