/// Seconds a smooth scroll takes to settle on its target.
pub const SCROLL_DURATION: f32 = 1.2;

/// Exponential-out easing used for every smooth scroll.
pub fn ease_out_expo(t: f32) -> f32 {
    (1.001 - 2f32.powf(-10.0 * t)).min(1.0)
}

/// Smoothed page scroll: input moves a target, the rendered offset eases toward it.
///
/// Offsets are logical units from the top of the page, clamped to `[0, limit]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothScroll {
    offset: f32,
    target: f32,
    from: f32,
    elapsed: f32,
    duration: f32,
    animating: bool,
    limit: f32,
    velocity: f32,
    autoplay: Option<f32>,
}

impl SmoothScroll {
    pub fn new(limit: f32) -> Self {
        Self {
            offset: 0.0,
            target: 0.0,
            from: 0.0,
            elapsed: 0.0,
            duration: SCROLL_DURATION,
            animating: false,
            limit: sanitize_limit(limit),
            velocity: 0.0,
            autoplay: None,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Units per second over the last update.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn set_limit(&mut self, limit: f32) {
        self.limit = sanitize_limit(limit);
        self.offset = self.offset.clamp(0.0, self.limit);
        self.target = self.target.clamp(0.0, self.limit);
        self.from = self.from.clamp(0.0, self.limit);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        if delta.is_finite() {
            self.scroll_to(self.target + delta);
        }
    }

    /// Starts a new eased scroll from the current offset.
    pub fn scroll_to(&mut self, target: f32) {
        if !target.is_finite() {
            return;
        }
        self.target = target.clamp(0.0, self.limit);
        self.from = self.offset;
        self.elapsed = 0.0;
        self.animating = self.target != self.offset;
    }

    /// Moves immediately, without easing.
    pub fn jump_to(&mut self, offset: f32) {
        if !offset.is_finite() {
            return;
        }
        self.offset = offset.clamp(0.0, self.limit);
        self.target = self.offset;
        self.from = self.offset;
        self.animating = false;
        self.velocity = 0.0;
    }

    /// Constant-speed scrolling in units per second that loops to the top; `None` stops it.
    pub fn set_autoplay(&mut self, speed: Option<f32>) {
        self.autoplay = speed.filter(|s| s.is_finite() && *s > 0.0);
    }

    pub fn autoplay(&self) -> Option<f32> {
        self.autoplay
    }

    /// Advances by `dt` seconds. Returns `true` when the offset moved.
    pub fn update(&mut self, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let before = self.offset;

        if self.animating {
            self.elapsed += dt;
            let t = (self.elapsed / self.duration).min(1.0);
            self.offset = self.from + (self.target - self.from) * ease_out_expo(t);
            if t >= 1.0 {
                self.offset = self.target;
                self.animating = false;
            }
        } else if let Some(speed) = self.autoplay {
            let next = self.offset + speed * dt;
            if next >= self.limit {
                self.jump_to(0.0);
                return before != 0.0;
            }
            self.offset = next;
            self.target = next;
        }

        self.velocity = if dt > 0.0 {
            (self.offset - before) / dt
        } else {
            0.0
        };
        self.offset != before
    }
}

fn sanitize_limit(limit: f32) -> f32 {
    if limit.is_finite() { limit.max(0.0) } else { 0.0 }
}
