use crate::host::{Host, HostEvent, Subscription};
use crate::surface::{hex_rgb, RasterSurface, Rgb, Sizing};
use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;

pub const PARTICLE_PALETTE: [Rgb; 3] = [hex_rgb(0x6346E6), hex_rgb(0xFFF07A), hex_rgb(0x1A1A1E)];
const LINK_RGB: Rgb = [26, 26, 30];
const LINK_WIDTH: f32 = 0.5;

// Share of the surface the lattice spans, and its top-left margin.
const SPAN_X: f32 = 0.76;
const SPAN_Y: f32 = 0.70;
const MARGIN_X: f32 = 0.12;
const MARGIN_Y: f32 = 0.15;

const DECAY_START_SCALE: f32 = 0.6;
const RESILIENCE_FALLOFF: f32 = 0.9;
const ANGLE_STEP: f32 = 0.008;
const DRIFT_X: f32 = 1.5;
const DRIFT_Y: f32 = 0.8;
const FADE_RATE: f32 = 1.3;
const SHRINK_RATE: f32 = 0.8;
const HOME_EASE: f32 = 0.04;
const RECOVER_STEP: f32 = 0.02;
const BREATH_RATE: f32 = 0.015;
const BREATH_AMPLITUDE: f32 = 0.4;

const LINK_ALPHA: f32 = 0.07;
const LINK_FADE: f32 = 1.5;
const LINK_CUTOFF: f32 = 0.005;
const MIN_LINK_OPACITY: f32 = 0.2;
const MIN_DRAW_OPACITY: f32 = 0.01;
const MIN_RADIUS: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldParams {
    pub rows: usize,
    pub cols: usize,
    pub jitter_x: f32,
    pub jitter_y: f32,
    /// How many later particles (in creation order) each particle may link to.
    pub neighbor_window: usize,
    pub link_distance: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 5,
            jitter_x: 20.0,
            jitter_y: 15.0,
            neighbor_window: 7,
            link_distance: 70.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub size: f32,
    pub base_size: f32,
    pub opacity: f32,
    pub speed: f32,
    pub angle: f32,
    pub drift: f32,
    pub color: Rgb,
    /// 1.0 at the field center, 0.1 at the corners. Higher resists decay longer.
    pub resilience: f32,
    pub breath_phase: f32,
}

impl Particle {
    pub fn decay_start(&self) -> f32 {
        decay_start(self.resilience)
    }

    pub fn decay_progress(&self, progress: f32) -> f32 {
        decay_progress(self.resilience, progress)
    }
}

pub fn decay_start(resilience: f32) -> f32 {
    resilience * DECAY_START_SCALE
}

pub fn decay_progress(resilience: f32, progress: f32) -> f32 {
    let start = decay_start(resilience);
    ((progress - start) / (1.0 - start)).max(0.0)
}

pub fn resilience_at(x: f32, y: f32, width: f32, height: f32) -> f32 {
    let cx = width * 0.5;
    let cy = height * 0.5;
    let max_dist = cx.hypot(cy);
    if max_dist <= 0.0 {
        return 1.0;
    }
    let norm = ((x - cx).hypot(y - cy) / max_dist).clamp(0.0, 1.0);
    1.0 - norm * RESILIENCE_FALLOFF
}

fn lattice_fraction(i: usize, n: usize) -> f32 {
    if n <= 1 { 0.5 } else { i as f32 / (n - 1) as f32 }
}

/// Lays out `rows × cols` particles on a jittered lattice over a `width × height` field.
///
/// Resilience comes from each particle's lattice anchor, so two layouts of the same size
/// agree on count and resilience even though jittered positions differ.
pub fn generate(params: &FieldParams, width: f32, height: f32, rng: &mut fastrand::Rng) -> Vec<Particle> {
    let mut particles = Vec::with_capacity(params.rows * params.cols);
    for i in 0..params.cols {
        for j in 0..params.rows {
            let anchor_x = width * MARGIN_X + lattice_fraction(i, params.cols) * width * SPAN_X;
            let anchor_y = height * MARGIN_Y + lattice_fraction(j, params.rows) * height * SPAN_Y;
            let x = anchor_x + (rng.f32() - 0.5) * params.jitter_x;
            let y = anchor_y + (rng.f32() - 0.5) * params.jitter_y;
            let base_size = 2.5 + rng.f32() * 2.5;
            particles.push(Particle {
                x,
                y,
                origin_x: x,
                origin_y: y,
                size: base_size,
                base_size,
                opacity: 1.0,
                speed: 0.2 + rng.f32() * 0.6,
                angle: rng.f32() * TAU,
                drift: 0.3 + rng.f32() * 0.7,
                color: PARTICLE_PALETTE[rng.usize(..PARTICLE_PALETTE.len())],
                resilience: resilience_at(anchor_x, anchor_y, width, height),
                breath_phase: rng.f32() * TAU,
            });
        }
    }
    particles
}

/// One frame of motion. `frame` is the frame counter driving the idle breathing.
pub fn advance_particles(particles: &mut [Particle], progress: f32, frame: u64) {
    let progress = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 };
    let breath_t = frame as f32 * BREATH_RATE;
    for pt in particles.iter_mut() {
        let decay = pt.decay_progress(progress);
        if decay > 0.0 {
            pt.angle += ANGLE_STEP * pt.drift;
            pt.x += pt.angle.sin() * pt.speed * decay * DRIFT_X;
            pt.y += pt.speed * decay * DRIFT_Y;
            pt.opacity = (1.0 - decay * FADE_RATE).max(0.0);
            pt.size = pt.base_size * (1.0 - decay * SHRINK_RATE).max(0.0);
        } else {
            pt.x += (pt.origin_x - pt.x) * HOME_EASE;
            pt.y += (pt.origin_y - pt.y) * HOME_EASE;
            pt.opacity = (pt.opacity + RECOVER_STEP).min(1.0);
            pt.size = pt.base_size + (breath_t + pt.breath_phase).sin() * BREATH_AMPLITUDE;
        }
    }
}

pub fn connection_opacity(progress: f32) -> f32 {
    LINK_ALPHA * (1.0 - progress * LINK_FADE).max(0.0)
}

/// Draws links then discs. The surface is not cleared here.
pub fn render_particles(
    surface: &mut RasterSurface,
    particles: &[Particle],
    progress: f32,
    params: &FieldParams,
) {
    let link_alpha = connection_opacity(progress);
    if link_alpha > LINK_CUTOFF && params.link_distance > 0.0 {
        let n = particles.len();
        for i in 0..n {
            let a = &particles[i];
            if a.opacity < MIN_LINK_OPACITY {
                continue;
            }
            let end = (i + 1 + params.neighbor_window).min(n);
            for b in &particles[i + 1..end] {
                if b.opacity < MIN_LINK_OPACITY {
                    continue;
                }
                let dist = (a.x - b.x).hypot(a.y - b.y);
                if dist < params.link_distance {
                    let alpha = link_alpha
                        * (1.0 - dist / params.link_distance)
                        * a.opacity.min(b.opacity);
                    surface.stroke_line((a.x, a.y), (b.x, b.y), LINK_WIDTH, LINK_RGB, alpha);
                }
            }
        }
    }

    for pt in particles {
        if pt.opacity < MIN_DRAW_OPACITY {
            continue;
        }
        surface.fill_disc(pt.x, pt.y, pt.size.max(MIN_RADIUS), pt.color, pt.opacity);
    }
}

/// Owns the particle set for one surface size and the random source used to regenerate it.
pub struct ParticleField {
    params: FieldParams,
    rng: fastrand::Rng,
    particles: Vec<Particle>,
    frame: u64,
    size: (f32, f32),
}

impl ParticleField {
    pub fn new(params: FieldParams, rng: fastrand::Rng) -> Self {
        Self {
            params,
            rng,
            particles: Vec::new(),
            frame: 0,
            size: (0.0, 0.0),
        }
    }

    pub fn with_seed(params: FieldParams, seed: u64) -> Self {
        Self::new(params, fastrand::Rng::with_seed(seed))
    }

    /// Replaces the whole particle set for a field of the given logical size.
    pub fn initialize(&mut self, width: f32, height: f32) -> &[Particle] {
        self.particles = generate(&self.params, width, height, &mut self.rng);
        self.size = (width, height);
        &self.particles
    }

    pub fn advance(&mut self, progress: f32) {
        self.frame += 1;
        advance_particles(&mut self.particles, progress, self.frame);
    }

    pub fn render(&self, surface: &mut RasterSurface, progress: f32) {
        render_particles(surface, &self.particles, progress, &self.params);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    pub fn size(&self) -> (f32, f32) {
        self.size
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

struct ParticleScene {
    field: ParticleField,
    surface: RasterSurface,
    sizing: Sizing,
    progress: Box<dyn Fn() -> f32>,
}

impl ParticleScene {
    fn draw_frame(&mut self) {
        self.surface.clear();
        let p = (self.progress)();
        self.field.advance(p);
        self.field.render(&mut self.surface, p);
    }

    fn on_resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        let (w, h) = self.sizing.resolve(width, height);
        let reallocated = self.surface.resize(w, h, pixel_ratio);
        // A zoom can keep the device size while the logical size moves.
        if reallocated || self.surface.logical_size() != self.field.size() {
            let (w, h) = self.surface.logical_size();
            self.field.initialize(w, h);
            log::debug!(
                "particle field regenerated: {} particles for {:.0}x{:.0}",
                self.field.particles().len(),
                w,
                h
            );
        }
    }
}

/// The particle field mounted on a host: redraws every tick, regenerates on resize.
pub struct ParticleCanvas {
    scene: Rc<RefCell<ParticleScene>>,
    frame_sub: Subscription,
    resize_sub: Subscription,
}

impl ParticleCanvas {
    /// Returns `None` (and starts nothing) when no surface can be acquired for the container.
    pub fn mount(
        host: &Host,
        sizing: Sizing,
        params: FieldParams,
        rng: fastrand::Rng,
        progress: impl Fn() -> f32 + 'static,
    ) -> Option<Self> {
        let env = host.env();
        let (w, h) = sizing.resolve(env.viewport_width, env.viewport_height);
        let Some(surface) = RasterSurface::acquire(w, h, env.pixel_ratio) else {
            log::debug!("particle canvas not started: no surface for {w:.0}x{h:.0}");
            return None;
        };

        let mut field = ParticleField::new(params, rng);
        field.initialize(w, h);

        let scene = Rc::new(RefCell::new(ParticleScene {
            field,
            surface,
            sizing,
            progress: Box::new(progress),
        }));

        let tick_scene = Rc::clone(&scene);
        let frame_sub = host.ticker().subscribe(move |_| {
            tick_scene.borrow_mut().draw_frame();
        });

        let resize_scene = Rc::clone(&scene);
        let resize_sub = host.events().subscribe(move |ev| {
            if let HostEvent::Resize {
                width,
                height,
                pixel_ratio,
            } = *ev
            {
                resize_scene.borrow_mut().on_resize(width, height, pixel_ratio);
            }
        });

        log::debug!("particle canvas mounted ({w:.0}x{h:.0})");
        Some(Self {
            scene,
            frame_sub,
            resize_sub,
        })
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(&RasterSurface) -> R) -> R {
        f(&self.scene.borrow().surface)
    }

    pub fn with_field<R>(&self, f: impl FnOnce(&ParticleField) -> R) -> R {
        f(&self.scene.borrow().field)
    }

    pub fn unmount(self) {
        let Self {
            scene,
            frame_sub,
            resize_sub,
        } = self;
        frame_sub.cancel();
        resize_sub.cancel();
        log::debug!(
            "particle canvas unmounted after {} frames",
            scene.borrow().field.frame()
        );
    }
}
