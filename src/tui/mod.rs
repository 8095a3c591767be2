//! Terminal UI: the quad-split workspace and everything drawn inside it.

pub mod app;
pub mod console_view;
pub mod editor;
pub mod frame_view;
pub mod split;

pub use app::{run, Buses, PageController};
