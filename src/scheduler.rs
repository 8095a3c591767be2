//! Batched measure/render scheduling.
//!
//! Components that need fresh layout geometry register a *measure* closure;
//! all measures registered within one window run together in a single pass,
//! and any *render* closures they return run together at the next paint
//! boundary. Reads are never interleaved with writes, which is the whole
//! point: one layout recalculation per batch instead of one per component.
//!
//! The "is a flush pending" flag lives inside the [`Scheduler`] instance, and
//! the timing of both phases is delegated to a [`FlushDriver`], so tests can
//! construct a scheduler and step the phases deterministically.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, Weak};

/// A deferred DOM-write-equivalent, produced by a measure closure.
pub type RenderFn = Box<dyn FnOnce() + Send>;

/// A layout read. Returns `Some(render)` to schedule a paired write for the
/// next paint boundary.
pub type MeasureFn = Box<dyn FnOnce() -> Option<RenderFn> + Send>;

struct MeasureSlot {
    id: u64,
    measure: MeasureFn,
}

struct RenderSlot {
    id: u64,
    render: RenderFn,
}

struct SchedulerState {
    scheduled: bool,
    next_task_id: u64,
    measures: Vec<MeasureSlot>,
    renders: Vec<RenderSlot>,
    canceled: HashSet<u64>,
}

/// Decides *when* the two phases of a pending flush actually run.
///
/// The driver receives one [`FlushHandle`] per flush window. It must call
/// [`FlushHandle::measures`] first (earliest-available deferred callback) and
/// [`FlushHandle::renders`] at the following paint boundary.
pub trait FlushDriver: Send + Sync {
    fn schedule(&self, flush: FlushHandle);
}

/// Coalesces measure requests into one measure pass plus one render pass.
pub struct Scheduler {
    state: Arc<Mutex<SchedulerState>>,
    driver: Arc<dyn FlushDriver>,
}

impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            driver: Arc::clone(&self.driver),
        }
    }
}

impl Scheduler {
    pub fn new(driver: Arc<dyn FlushDriver>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                scheduled: false,
                next_task_id: 0,
                measures: Vec::new(),
                renders: Vec::new(),
                canceled: HashSet::new(),
            })),
            driver,
        }
    }

    /// Registers a measure closure for the current flush window.
    ///
    /// The first registration of a window asks the driver to schedule a
    /// flush; later registrations in the same window coalesce into it.
    /// Measures run in registration order, and so do the renders they return.
    #[must_use = "dropping the handle loses the ability to cancel"]
    pub fn queue_measure(
        &self,
        measure: impl FnOnce() -> Option<RenderFn> + Send + 'static,
    ) -> MeasureHandle {
        let (id, needs_schedule) = {
            let mut state = self.lock();
            let id = state.next_task_id;
            state.next_task_id += 1;
            state.measures.push(MeasureSlot {
                id,
                measure: Box::new(measure),
            });
            let needs_schedule = !state.scheduled;
            state.scheduled = true;
            (id, needs_schedule)
        };

        if needs_schedule {
            self.driver.schedule(FlushHandle {
                state: Arc::downgrade(&self.state),
            });
        }

        MeasureHandle {
            state: Arc::downgrade(&self.state),
            id,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SchedulerState> {
        self.state
            .lock()
            .expect("scheduler state must not be poisoned")
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

/// One pending flush window handed to the [`FlushDriver`].
pub struct FlushHandle {
    state: Weak<Mutex<SchedulerState>>,
}

impl FlushHandle {
    /// Runs the measure phase: every measure registered since the last flush,
    /// in registration order. Render closures they return are parked for
    /// [`FlushHandle::renders`].
    ///
    /// Measures registered *during* this phase open a new flush window; they
    /// are not run here.
    pub fn measures(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };

        let batch = {
            let mut state = state.lock().expect("scheduler state must not be poisoned");
            state.scheduled = false;
            std::mem::take(&mut state.measures)
        };

        for slot in batch {
            let render = (slot.measure)();
            if let Some(render) = render {
                let mut state = state.lock().expect("scheduler state must not be poisoned");
                if !state.canceled.contains(&slot.id) {
                    state.renders.push(RenderSlot {
                        id: slot.id,
                        render,
                    });
                }
            }
        }
    }

    /// Runs the render phase: every render produced by the preceding measure
    /// phase, in the order their measures were registered.
    pub fn renders(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };

        let batch = {
            let mut state = state.lock().expect("scheduler state must not be poisoned");
            state.canceled.clear();
            std::mem::take(&mut state.renders)
        };

        for slot in batch {
            (slot.render)();
        }
    }
}

impl std::fmt::Debug for FlushHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushHandle").finish_non_exhaustive()
    }
}

/// Cancellation token for one queued measurement.
#[derive(Debug)]
pub struct MeasureHandle {
    state: Weak<Mutex<SchedulerState>>,
    id: u64,
}

impl MeasureHandle {
    /// Removes this measurement, and its produced render if any, without
    /// affecting delivery of the others. Idempotent.
    pub fn cancel(&self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock().expect("scheduler state must not be poisoned");
            state.measures.retain(|slot| slot.id != self.id);
            state.renders.retain(|slot| slot.id != self.id);
            state.canceled.insert(self.id);
        }
    }
}

/// A [`FlushDriver`] that parks flush handles until they are pumped.
///
/// The host loop pumps [`QueuedDriver::run_measures`] every loop turn (the
/// earliest-available deferred callback) and [`QueuedDriver::run_renders`] on
/// the frame tick (the paint boundary). Tests pump both by hand.
#[derive(Default)]
pub struct QueuedDriver {
    pending: Mutex<Vec<FlushHandle>>,
    awaiting_render: Mutex<Vec<FlushHandle>>,
}

impl QueuedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the measure phase for every flush scheduled before this call.
    pub fn run_measures(&self) {
        let batch: Vec<FlushHandle> = {
            let mut pending = self.pending.lock().expect("driver queue");
            std::mem::take(&mut *pending)
        };
        for flush in batch {
            flush.measures();
            self.awaiting_render
                .lock()
                .expect("driver queue")
                .push(flush);
        }
    }

    /// Runs the render phase for every flush whose measure phase completed.
    pub fn run_renders(&self) {
        let batch: Vec<FlushHandle> = {
            let mut awaiting = self.awaiting_render.lock().expect("driver queue");
            std::mem::take(&mut *awaiting)
        };
        for flush in batch {
            flush.renders();
        }
    }

    /// Measure pass immediately followed by render pass.
    pub fn run_frame(&self) {
        self.run_measures();
        self.run_renders();
    }
}

impl FlushDriver for QueuedDriver {
    fn schedule(&self, flush: FlushHandle) {
        self.pending.lock().expect("driver queue").push(flush);
    }
}

impl std::fmt::Debug for QueuedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedDriver").finish_non_exhaustive()
    }
}
