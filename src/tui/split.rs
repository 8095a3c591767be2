//! Quad-split layout and divider dragging.
//!
//! The workspace is divided by three splits: a vertical one (`X`) between
//! the left and right columns, and one horizontal split per column (`Y1`
//! left, `Y2` right). Each split holds a fraction of its axis; fractions
//! are deliberately not clamped while dragging, so a divider pushed past
//! the edge springs back only when the pointer returns. Clamping happens
//! at layout time, when fractions become cells.

use ratatui::layout::Rect;

/// One of the three draggable dividers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitId {
    /// Vertical divider between the two columns.
    X,
    /// Horizontal divider in the left column.
    Y1,
    /// Horizontal divider in the right column.
    Y2,
}

/// The four content panes, clockwise from the top left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneId {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl PaneId {
    pub const ALL: [PaneId; 4] = [
        PaneId::TopLeft,
        PaneId::TopRight,
        PaneId::BottomRight,
        PaneId::BottomLeft,
    ];
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    id: SplitId,
    start_coord: u16,
    start_size: u16,
    start_percent: f64,
}

/// Computed cell geometry for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadLayout {
    pub panes: [Rect; 4],
    pub x_divider: Rect,
    pub y1_divider: Rect,
    pub y2_divider: Rect,
}

impl QuadLayout {
    /// The pane at the given index of [`PaneId::ALL`].
    #[must_use]
    pub fn pane(&self, id: PaneId) -> Rect {
        let index = PaneId::ALL
            .iter()
            .position(|candidate| *candidate == id)
            .expect("PaneId::ALL is exhaustive");
        self.panes[index]
    }

    /// Which divider, if any, the given cell lands on.
    #[must_use]
    pub fn hit_test(&self, column: u16, row: u16) -> Option<SplitId> {
        let hit = |rect: Rect| {
            column >= rect.x
                && column < rect.x + rect.width
                && row >= rect.y
                && row < rect.y + rect.height
        };
        if hit(self.x_divider) {
            Some(SplitId::X)
        } else if hit(self.y1_divider) {
            Some(SplitId::Y1)
        } else if hit(self.y2_divider) {
            Some(SplitId::Y2)
        } else {
            None
        }
    }
}

/// Divider positions plus the active drag, if any.
///
/// At most one divider can be dragged at a time; a press while another
/// drag is active is ignored.
#[derive(Debug)]
pub struct SplitEngine {
    x: f64,
    y1: f64,
    y2: f64,
    drag: Option<DragState>,
    resize_queued: bool,
}

impl Default for SplitEngine {
    fn default() -> Self {
        Self {
            x: 0.5,
            y1: 0.5,
            y2: 0.5,
            drag: None,
            resize_queued: false,
        }
    }
}

impl SplitEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current fraction of the given split. May be outside `0.0..=1.0`
    /// during a drag.
    #[must_use]
    pub fn percent(&self, id: SplitId) -> f64 {
        match id {
            SplitId::X => self.x,
            SplitId::Y1 => self.y1,
            SplitId::Y2 => self.y2,
        }
    }

    fn percent_mut(&mut self, id: SplitId) -> &mut f64 {
        match id {
            SplitId::X => &mut self.x,
            SplitId::Y1 => &mut self.y1,
            SplitId::Y2 => &mut self.y2,
        }
    }

    #[must_use]
    pub fn dragging(&self) -> Option<SplitId> {
        self.drag.map(|drag| drag.id)
    }

    /// Starts a drag. `coord` is the pointer position along the split's
    /// axis and `size` the extent of that axis in cells. Ignored while
    /// another drag is active or when the axis has no extent.
    pub fn press(&mut self, id: SplitId, coord: u16, size: u16) {
        if self.drag.is_some() || size == 0 {
            return;
        }
        self.drag = Some(DragState {
            id,
            start_coord: coord,
            start_size: size,
            start_percent: self.percent(id),
        });
        self.resize_queued = true;
    }

    /// Updates the active drag from pointer motion. The new fraction is
    /// the press-time fraction offset by the pointer delta over the
    /// press-time axis size; no-op when no drag is active.
    pub fn motion(&mut self, coord: u16) {
        let Some(drag) = self.drag else {
            return;
        };
        let delta = f64::from(coord) - f64::from(drag.start_coord);
        let next = drag.start_percent + delta / f64::from(drag.start_size);
        if (next - self.percent(drag.id)).abs() > f64::EPSILON {
            *self.percent_mut(drag.id) = next;
            self.resize_queued = true;
        }
    }

    pub fn release(&mut self) {
        if self.drag.take().is_some() {
            self.resize_queued = true;
        }
    }

    /// True once per frame after a divider was grabbed, moved, or let go;
    /// reading it resets it. This coalesces a burst of motion events into
    /// a single resize notification on the next tick.
    pub fn take_resize_queued(&mut self) -> bool {
        std::mem::take(&mut self.resize_queued)
    }

    /// The cell where the three dividers visually meet: the vertical
    /// divider's column crossed with whichever horizontal divider sits
    /// closer to the middle of its column. On a tie the right column wins.
    #[must_use]
    pub fn virtual_center(&self, area: Rect) -> (u16, u16) {
        let layout = self.layout(area);
        let y1_distance = (self.y1 - 0.5).abs();
        let y2_distance = (self.y2 - 0.5).abs();
        let row = if y1_distance < y2_distance {
            layout.y1_divider.y
        } else {
            layout.y2_divider.y
        };
        (layout.x_divider.x, row)
    }

    /// Converts the fractions into cell rectangles. Every pane keeps at
    /// least one cell; each divider occupies a single row or column.
    #[must_use]
    pub fn layout(&self, area: Rect) -> QuadLayout {
        let x_col = split_at(self.x, area.width);
        let left = Rect::new(area.x, area.y, x_col, area.height);
        let x_divider = Rect::new(area.x + x_col, area.y, 1, area.height);
        let right = Rect::new(
            area.x + x_col + 1,
            area.y,
            area.width.saturating_sub(x_col + 1),
            area.height,
        );

        let (top_left, y1_divider, bottom_left) = split_column(left, self.y1);
        let (top_right, y2_divider, bottom_right) = split_column(right, self.y2);

        QuadLayout {
            panes: [top_left, top_right, bottom_right, bottom_left],
            x_divider,
            y1_divider,
            y2_divider,
        }
    }
}

/// Clamped cell offset for a fraction of `size`, leaving room for one cell
/// on each side of the divider.
fn split_at(percent: f64, size: u16) -> u16 {
    if size < 3 {
        return size / 2;
    }
    let raw = (percent * f64::from(size)).round();
    let clamped = raw.clamp(1.0, f64::from(size - 2));
    clamped as u16
}

fn split_column(column: Rect, percent: f64) -> (Rect, Rect, Rect) {
    let y_row = split_at(percent, column.height);
    let top = Rect::new(column.x, column.y, column.width, y_row);
    let divider = Rect::new(column.x, column.y + y_row, column.width, 1);
    let bottom = Rect::new(
        column.x,
        column.y + y_row + 1,
        column.width,
        column.height.saturating_sub(y_row + 1),
    );
    (top, divider, bottom)
}
