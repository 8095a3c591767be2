//! The content frame pane.
//!
//! The pane itself only shows where the page lives and how big it is; the
//! page runs in the separate frame process. What matters here is *how* the
//! size label is kept fresh: a resize event queues a measure that reads the
//! pane's current geometry, and the paired render writes the label. Reading
//! and writing go through the scheduler so that a whole burst of resize
//! events costs one measure pass and one render pass.

use std::sync::{Arc, Mutex};

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::events::{EventBus, Subscription};
use crate::scheduler::{MeasureHandle, Scheduler};

/// Shared cells the measure and render closures read and write.
#[derive(Debug, Default)]
struct FrameCells {
    /// Pane geometry from the most recent layout pass.
    area: Mutex<Rect>,
    /// Last measured size, as shown in the label.
    size: Mutex<(u16, u16)>,
}

pub struct FrameView {
    cells: Arc<FrameCells>,
    scheduler: Scheduler,
    page_url: String,
    pending: Arc<Mutex<Option<MeasureHandle>>>,
}

impl FrameView {
    pub fn new(scheduler: Scheduler, page_url: impl Into<String>) -> Self {
        Self {
            cells: Arc::new(FrameCells::default()),
            scheduler,
            page_url: page_url.into(),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// The page moved, e.g. a session id arrived late.
    pub fn set_page_url(&mut self, url: impl Into<String>) {
        self.page_url = url.into();
    }

    /// Geometry handed down by the layout pass. Cheap; does not schedule
    /// anything by itself.
    pub fn set_area(&self, area: Rect) {
        *self.cells.area.lock().expect("frame area cell") = area;
    }

    /// Last size written by a completed measure/render pair.
    #[must_use]
    pub fn measured_size(&self) -> (u16, u16) {
        *self.cells.size.lock().expect("frame size cell")
    }

    /// Queues a measure of the pane and a render of the size label.
    ///
    /// A still-pending update from an earlier call is canceled first, so
    /// only the newest geometry ever reaches the label.
    pub fn update_size(&self) {
        queue_size_update(&self.cells, &self.scheduler, &self.pending);
    }

    /// Ties the view to the resize bus for its lifetime.
    #[must_use]
    pub fn subscribe_resize(&self, bus: &EventBus<()>) -> Subscription {
        let cells = Arc::clone(&self.cells);
        let scheduler = self.scheduler.clone();
        let pending = Arc::clone(&self.pending);
        bus.subscribe(move |(): &()| {
            queue_size_update(&cells, &scheduler, &pending);
        })
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        self.set_area(area);

        let block = Block::default().borders(Borders::ALL).title("page");
        let (width, height) = self.measured_size();
        let lines = vec![
            Line::raw(self.page_url.as_str()),
            Line::styled(
                format!("{width} x {height}"),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn queue_size_update(
    cells: &Arc<FrameCells>,
    scheduler: &Scheduler,
    pending: &Arc<Mutex<Option<MeasureHandle>>>,
) {
    let mut pending = pending.lock().expect("frame pending handle");
    if let Some(handle) = pending.take() {
        handle.cancel();
    }

    let cells = Arc::clone(cells);
    let handle = scheduler.queue_measure(move || {
        let area = *cells.area.lock().expect("frame area cell");
        let measured = (area.width, area.height);
        Some(Box::new(move || {
            *cells.size.lock().expect("frame size cell") = measured;
        }) as crate::scheduler::RenderFn)
    });
    *pending = Some(handle);
}

impl std::fmt::Debug for FrameView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameView")
            .field("page_url", &self.page_url)
            .field("measured_size", &self.measured_size())
            .finish_non_exhaustive()
    }
}
