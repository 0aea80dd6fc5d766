use crate::host::{Host, HostEvent, Subscription};
use std::cell::Cell;
use std::rc::Rc;

/// How many viewport heights a pinned section stays pinned for.
pub const PIN_FACTOR: f32 = 2.5;

/// Scroll offsets over which a pinned section runs from progress 0 to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinRange {
    pub start: f32,
    pub end: f32,
}

impl PinRange {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Range for a section whose top sits at `top` and stays pinned for `factor` viewports.
    pub fn pinned(top: f32, viewport_height: f32, factor: f32) -> Self {
        Self {
            start: top,
            end: top + viewport_height * factor,
        }
    }

    pub fn progress_at(&self, offset: f32) -> f32 {
        if !offset.is_finite() {
            return 0.0;
        }
        let span = self.end - self.start;
        if !(span > 0.0) {
            return if offset >= self.start { 1.0 } else { 0.0 };
        }
        ((offset - self.start) / span).clamp(0.0, 1.0)
    }
}

/// Read side of the published progress. Cloning shares the same cell.
#[derive(Clone, Debug, Default)]
pub struct ProgressHandle(Rc<Cell<f32>>);

impl ProgressHandle {
    pub fn get(&self) -> f32 {
        self.0.get()
    }
}

#[derive(Debug)]
struct DriverState {
    range: Cell<PinRange>,
    offset: Cell<f32>,
}

/// Maps the page scroll offset to the pinned section's 0..1 progress.
///
/// The value is written into a shared cell; readers poll it from their own frame
/// callbacks instead of being notified.
#[derive(Clone, Debug)]
pub struct ScrollProgressDriver {
    state: Rc<DriverState>,
    value: ProgressHandle,
}

impl ScrollProgressDriver {
    pub fn new(range: PinRange) -> Self {
        let driver = Self {
            state: Rc::new(DriverState {
                range: Cell::new(range),
                offset: Cell::new(0.0),
            }),
            value: ProgressHandle::default(),
        };
        driver.update(0.0);
        driver
    }

    pub fn range(&self) -> PinRange {
        self.state.range.get()
    }

    /// Replaces the pin range (after a resize) and republishes for the last known offset.
    pub fn set_range(&self, range: PinRange) {
        self.state.range.set(range);
        self.update(self.state.offset.get());
    }

    pub fn update(&self, offset: f32) -> f32 {
        if offset.is_finite() {
            self.state.offset.set(offset);
        }
        let p = self.state.range.get().progress_at(self.state.offset.get());
        self.value.0.set(p);
        p
    }

    pub fn progress(&self) -> f32 {
        self.value.get()
    }

    pub fn handle(&self) -> ProgressHandle {
        self.value.clone()
    }

    /// Polling accessor in the shape the particle canvas expects.
    pub fn getter(&self) -> impl Fn() -> f32 + 'static {
        let handle = self.handle();
        move || handle.get()
    }

    /// Follows the host's scroll events until the returned subscription is dropped.
    pub fn attach(&self, host: &Host) -> Subscription {
        let driver = self.clone();
        host.events().subscribe(move |ev| {
            if let HostEvent::Scroll { offset, .. } = *ev {
                driver.update(offset);
            }
        })
    }
}
