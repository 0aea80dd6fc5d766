use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One tick of the host frame loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    pub frame: u64,
    /// Seconds since the host started ticking.
    pub elapsed: f32,
    pub dt: f32,
}

/// Input the host forwards to mounted components.
///
/// Coordinates and sizes are logical viewport units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostEvent {
    PointerMove { x: f32, y: f32 },
    Resize { width: f32, height: f32, pixel_ratio: f32 },
    Scroll { offset: f32, velocity: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostEnv {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Device pixels per logical unit as reported by the host (before any surface clamp).
    pub pixel_ratio: f32,
    pub reduced_motion: bool,
}

impl Default for HostEnv {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            pixel_ratio: 1.0,
            reduced_motion: false,
        }
    }
}

enum Slot<T> {
    Vacant,
    Idle(Box<dyn FnMut(&T)>),
    Running,
}

type Slots<T> = Rc<RefCell<Vec<Slot<T>>>>;

/// Single-threaded callback registry used for both the frame ticker and the host event bus.
///
/// Callbacks run in registration order. A callback may cancel any subscription, including
/// its own, while a dispatch is in progress; a cancelled callback is never invoked again.
pub struct Dispatcher<T> {
    slots: Slots<T>,
}

impl<T: 'static> Dispatcher<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let idx = {
            let mut slots = self.slots.borrow_mut();
            match slots.iter().position(|s| matches!(s, Slot::Vacant)) {
                Some(i) => {
                    slots[i] = Slot::Idle(Box::new(callback));
                    i
                }
                None => {
                    slots.push(Slot::Idle(Box::new(callback)));
                    slots.len() - 1
                }
            }
        };

        let weak: Weak<RefCell<Vec<Slot<T>>>> = Rc::downgrade(&self.slots);
        Subscription {
            cancel: Some(Box::new(move || {
                let Some(slots) = weak.upgrade() else {
                    return;
                };
                // Take the callback out before dropping it: its captures may hold
                // subscriptions on this same dispatcher.
                let removed = {
                    let mut slots = slots.borrow_mut();
                    match slots.get_mut(idx) {
                        Some(slot) => std::mem::replace(slot, Slot::Vacant),
                        None => Slot::Vacant,
                    }
                };
                drop(removed);
            })),
        }
    }

    pub fn dispatch(&self, value: &T) {
        let len = self.slots.borrow().len();
        for i in 0..len {
            let taken = {
                let mut slots = self.slots.borrow_mut();
                match slots.get_mut(i) {
                    Some(slot) if matches!(slot, Slot::Idle(_)) => {
                        std::mem::replace(slot, Slot::Running)
                    }
                    _ => continue,
                }
            };
            let Slot::Idle(mut callback) = taken else {
                continue;
            };

            callback(value);

            let leftover = {
                let mut slots = self.slots.borrow_mut();
                match slots.get_mut(i) {
                    Some(slot) if matches!(slot, Slot::Running) => {
                        *slot = Slot::Idle(callback);
                        None
                    }
                    // Cancelled while running.
                    _ => Some(callback),
                }
            };
            drop(leftover);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|s| !matches!(s, Slot::Vacant))
            .count()
    }
}

impl<T: 'static> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration guard returned by [`Dispatcher::subscribe`]. Dropping it deregisters the callback.
#[must_use = "dropping a Subscription deregisters its callback immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// The page host: owns the frame ticker, the event bus and the environment snapshot.
pub struct Host {
    ticker: Dispatcher<FrameInfo>,
    events: Dispatcher<HostEvent>,
    env: HostEnv,
    frame: u64,
    elapsed: f32,
}

impl Host {
    pub fn new(env: HostEnv) -> Self {
        Self {
            ticker: Dispatcher::new(),
            events: Dispatcher::new(),
            env,
            frame: 0,
            elapsed: 0.0,
        }
    }

    pub fn env(&self) -> HostEnv {
        self.env
    }

    pub fn ticker(&self) -> &Dispatcher<FrameInfo> {
        &self.ticker
    }

    pub fn events(&self) -> &Dispatcher<HostEvent> {
        &self.events
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn set_reduced_motion(&mut self, on: bool) {
        self.env.reduced_motion = on;
    }

    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.env.viewport_width = width;
        self.env.viewport_height = height;
        self.env.pixel_ratio = pixel_ratio;
        self.events.dispatch(&HostEvent::Resize {
            width,
            height,
            pixel_ratio,
        });
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        self.events.dispatch(&HostEvent::PointerMove { x, y });
    }

    pub fn scroll(&self, offset: f32, velocity: f32) {
        self.events.dispatch(&HostEvent::Scroll { offset, velocity });
    }

    pub fn tick(&mut self, dt: f32) -> FrameInfo {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.frame += 1;
        self.elapsed += dt;
        let info = FrameInfo {
            frame: self.frame,
            elapsed: self.elapsed,
            dt,
        };
        self.ticker.dispatch(&info);
        info
    }
}
