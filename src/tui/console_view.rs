//! The grouped console log pane.
//!
//! Messages arrive on the console bus at relay speed but only become
//! visible once per frame: the subscription parks them in a pending queue
//! and `on_frame` drains it. The visible log is stored in groups of
//! [`CONSOLE_GROUP_SIZE`] so rendering can skip whole groups when the pane
//! is scrolled, and dev-server liveness chatter is filtered out before it
//! ever reaches a group.

use std::sync::{Arc, Mutex};

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::constants::{CONSOLE_GROUP_SIZE, LIVE_RELOAD_NOTICE};
use crate::events::{EventBus, Subscription};
use crate::relay::ConsoleMessage;

/// Dev-server liveness notices are relayed like any other console call but
/// carry no information for the user.
#[must_use]
pub fn is_dev_noise(message: &ConsoleMessage) -> bool {
    message.method == "info" && message.args == [LIVE_RELOAD_NOTICE]
}

pub struct ConsoleView {
    pending: Arc<Mutex<Vec<ConsoleMessage>>>,
    groups: Vec<Vec<ConsoleMessage>>,
    _subscription: Subscription,
}

impl ConsoleView {
    /// Subscribes to the console bus; the subscription lives as long as
    /// the view.
    pub fn new(bus: &EventBus<ConsoleMessage>) -> Self {
        let pending = Arc::new(Mutex::new(Vec::new()));
        let subscription = {
            let pending = Arc::clone(&pending);
            bus.subscribe(move |message: &ConsoleMessage| {
                pending.lock().expect("console pending queue").push(message.clone());
            })
        };
        Self {
            pending,
            groups: Vec::new(),
            _subscription: subscription,
        }
    }

    /// Moves pending messages into the visible log. Called once per frame
    /// tick so a burst of relay traffic costs one redraw, not one per
    /// message.
    pub fn on_frame(&mut self) {
        let drained: Vec<ConsoleMessage> =
            std::mem::take(&mut *self.pending.lock().expect("console pending queue"));
        for message in drained {
            if is_dev_noise(&message) {
                continue;
            }
            match self.groups.last_mut() {
                Some(group) if group.len() < CONSOLE_GROUP_SIZE => group.push(message),
                _ => self.groups.push(vec![message]),
            }
        }
    }

    /// Number of visible messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.pending.lock().expect("console pending queue").clear();
    }

    /// Visible messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &ConsoleMessage> {
        self.groups.iter().flatten()
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::TOP)
            .title(format!("console ({})", self.len()));
        let inner = block.inner(area);

        // Tail view: walk groups from the back until the pane is full.
        let capacity = inner.height as usize;
        let mut lines: Vec<Line<'_>> = Vec::with_capacity(capacity);
        'groups: for group in self.groups.iter().rev() {
            for message in group.iter().rev() {
                if lines.len() == capacity {
                    break 'groups;
                }
                lines.push(render_message(message));
            }
        }
        lines.reverse();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn render_message(message: &ConsoleMessage) -> Line<'_> {
    let style = Style::default().fg(method_color(&message.method));
    let mut spans = vec![Span::styled(format!("{:>5} ", message.method), style)];
    spans.push(Span::raw(message.args.join(" ")));
    Line::from(spans)
}

fn method_color(method: &str) -> Color {
    match method {
        "info" => Color::Cyan,
        "warn" => Color::Yellow,
        "error" => Color::Red,
        _ => Color::White,
    }
}

impl std::fmt::Debug for ConsoleView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleView")
            .field("groups", &self.groups.len())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(method: &str, text: &str) -> ConsoleMessage {
        ConsoleMessage {
            method: method.to_string(),
            args: vec![text.to_string()],
        }
    }

    #[test]
    fn test_messages_stay_pending_until_the_frame_tick() {
        let bus = EventBus::new();
        let mut view = ConsoleView::new(&bus);

        bus.emit(&message("log", "early"));
        assert_eq!(view.len(), 0);

        view.on_frame();
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_log_is_stored_in_groups_of_ten() {
        let bus = EventBus::new();
        let mut view = ConsoleView::new(&bus);
        for i in 0..25 {
            bus.emit(&message("log", &format!("line {i}")));
        }
        view.on_frame();

        let sizes: Vec<usize> = view.groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(view.len(), 25);

        // The next batch tops up the partial group first.
        for i in 25..32 {
            bus.emit(&message("log", &format!("line {i}")));
        }
        view.on_frame();
        let sizes: Vec<usize> = view.groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![10, 10, 10, 2]);
    }

    #[test]
    fn test_live_reload_chatter_is_filtered() {
        let bus = EventBus::new();
        let mut view = ConsoleView::new(&bus);

        bus.emit(&message("info", LIVE_RELOAD_NOTICE));
        bus.emit(&message("log", LIVE_RELOAD_NOTICE));
        bus.emit(&message("info", "actual info"));
        view.on_frame();

        let visible: Vec<&str> = view
            .messages()
            .map(|m| m.args[0].as_str())
            .collect();
        // Only the info method with exactly the notice text is noise.
        assert_eq!(visible, vec![LIVE_RELOAD_NOTICE, "actual info"]);
        assert_eq!(view.messages().next().expect("first").method, "log");
    }

    #[test]
    fn test_clear_drops_visible_and_pending() {
        let bus = EventBus::new();
        let mut view = ConsoleView::new(&bus);
        bus.emit(&message("log", "a"));
        view.on_frame();
        bus.emit(&message("log", "b"));

        view.clear();
        view.on_frame();
        assert!(view.is_empty());
    }
}
