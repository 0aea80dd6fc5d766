use crate::host::{Host, HostEnv, HostEvent, Subscription};
use crate::surface::{covers_pixel, hex_rgb, RasterSurface, Rgb, Sizing};
use crate::visual::shader::{ShaderBackend, ShaderContext, ShaderError};
use noise::{NoiseFn, Simplex};
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

pub const CREAM: [f32; 3] = [0.961, 0.945, 0.922];
pub const VIOLET_SOFT: [f32; 3] = [0.898, 0.875, 0.988];
pub const CORAL_SOFT: [f32; 3] = [0.988, 0.918, 0.898];
pub const SAGE_SOFT: [f32; 3] = [0.878, 0.941, 0.906];

pub const FALLBACK_ANGLE_DEG: f32 = 135.0;
pub const FALLBACK_STOPS: [(f32, Rgb); 3] = [
    (0.0, hex_rgb(0xF5F1EB)),
    (0.6, hex_rgb(0xE5DFFC)),
    (1.0, hex_rgb(0xFCEAE5)),
];

/// Viewports narrower than this get the static gradient.
pub const MIN_SHADER_VIEWPORT_WIDTH: f32 = 768.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientParams {
    pub time_scale: f32,
    /// Share of the remaining pointer distance covered each frame.
    pub mouse_ease: f32,
    pub warp_strength: f32,
    pub warp_radius: f32,
    pub noise_seed: u32,
}

impl Default for GradientParams {
    fn default() -> Self {
        Self {
            time_scale: 0.12,
            mouse_ease: 0.05,
            warp_strength: 0.04,
            warp_radius: 0.5,
            noise_seed: 0,
        }
    }
}

/// Values fed to the fragment program each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientUniforms {
    pub time: f32,
    /// Smoothed pointer, normalized with the origin at the bottom-left.
    pub mouse: [f32; 2],
    /// Latest raw pointer sample.
    pub target: [f32; 2],
}

impl Default for GradientUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            mouse: [0.5, 0.5],
            target: [0.5, 0.5],
        }
    }
}

impl GradientUniforms {
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.target = [x, y];
        }
    }

    pub fn step(&mut self, time: f32, ease: f32) {
        self.time = time;
        self.mouse[0] += (self.target[0] - self.mouse[0]) * ease;
        self.mouse[1] += (self.target[1] - self.mouse[1]) * ease;
    }
}

/// GLSL `smoothstep`, including reversed edges.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span == 0.0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// The procedural gradient as a pure per-pixel function.
pub struct GradientProgram {
    noise: Simplex,
    params: GradientParams,
}

impl GradientProgram {
    pub fn new(params: GradientParams) -> Self {
        Self {
            noise: Simplex::new(params.noise_seed),
            params,
        }
    }

    pub fn params(&self) -> &GradientParams {
        &self.params
    }

    fn snoise(&self, x: f32, y: f32) -> f32 {
        self.noise.get([x as f64, y as f64]) as f32
    }

    /// Color at `(u, v)`; `v` grows upward.
    pub fn shade(&self, u: f32, v: f32, uniforms: &GradientUniforms) -> [f32; 3] {
        let p = &self.params;
        let t = uniforms.time * p.time_scale;

        // Push pixels away from the pointer, fading out at `warp_radius`.
        let dx = u - uniforms.mouse[0];
        let dy = v - uniforms.mouse[1];
        let falloff = smoothstep(p.warp_radius, 0.0, dx.hypot(dy));
        let x = u + dx * p.warp_strength * falloff;
        let y = v + dy * p.warp_strength * falloff;

        let n1 = self.snoise(x * 1.8 + t, y * 1.8 + t * 0.7);
        let n2 = self.snoise(x * 2.5 - t * 0.6 + 50.0, y * 2.5 + t * 0.4 + 50.0);
        let n3 = self.snoise(x * 1.2 + t * 0.3 + 100.0, y * 1.2 - t * 0.5 + 100.0);

        let mut color = CREAM;
        color = mix(color, VIOLET_SOFT, smoothstep(-0.2, 0.6, n1) * 0.7);
        color = mix(color, CORAL_SOFT, smoothstep(0.0, 0.8, n2) * 0.45);
        color = mix(color, SAGE_SOFT, smoothstep(0.1, 0.7, n3) * 0.3);
        mix(color, VIOLET_SOFT, (x * 0.3 + (1.0 - y) * 0.2) * 0.5)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientMode {
    Shader,
    Static,
}

impl GradientMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Shader => "shader",
            Self::Static => "static",
        }
    }
}

/// Why the static gradient was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    ReducedMotion,
    NarrowViewport { width: f32 },
    ContextFailed(ShaderError),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReducedMotion => write!(f, "reduced motion requested"),
            Self::NarrowViewport { width } => write!(
                f,
                "viewport {width:.0} narrower than {MIN_SHADER_VIEWPORT_WIDTH:.0}"
            ),
            Self::ContextFailed(err) => write!(f, "{err}"),
        }
    }
}

/// Requests a context, turning a panicking backend into an ordinary failure.
fn create_context_guarded(
    backend: &mut dyn ShaderBackend,
    width: f32,
    height: f32,
    pixel_ratio: f32,
) -> Result<Box<dyn ShaderContext>, ShaderError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        backend.create_context(width, height, pixel_ratio)
    }))
    .unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        log::warn!("{} shader backend panicked: {reason}", backend.name());
        Err(ShaderError::Unavailable(format!("backend panicked: {reason}")))
    })
}

/// Environment checks that rule out the shader before any context is requested.
pub fn environment_degradation(env: &HostEnv) -> Option<Degradation> {
    if env.viewport_width < MIN_SHADER_VIEWPORT_WIDTH {
        return Some(Degradation::NarrowViewport {
            width: env.viewport_width,
        });
    }
    if env.reduced_motion {
        return Some(Degradation::ReducedMotion);
    }
    None
}

pub fn paint_fallback(surface: &mut RasterSurface) {
    surface.fill_linear_gradient(FALLBACK_ANGLE_DEG, &FALLBACK_STOPS);
}

enum Backdrop {
    Live {
        ctx: Box<dyn ShaderContext>,
        program: GradientProgram,
        uniforms: GradientUniforms,
        started: f32,
    },
    Static {
        surface: RasterSurface,
        reason: Degradation,
    },
}

struct GradientScene {
    backdrop: Backdrop,
    sizing: Sizing,
    size: (f32, f32),
    origin: (f32, f32),
}

impl GradientScene {
    fn on_frame(&mut self, elapsed: f32) {
        let Backdrop::Live {
            ctx,
            program,
            uniforms,
            started,
        } = &mut self.backdrop
        else {
            return;
        };
        uniforms.step(elapsed - *started, program.params().mouse_ease);
        let u = *uniforms;
        if let Err(err) = ctx.draw(&|x, y| program.shade(x, y, &u)) {
            log::debug!("gradient frame skipped: {err}");
        }
    }

    fn on_pointer(&mut self, x: f32, y: f32) {
        let Backdrop::Live { uniforms, .. } = &mut self.backdrop else {
            return;
        };
        let (w, h) = self.size;
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let nx = (x - self.origin.0) / w;
        let ny = 1.0 - (y - self.origin.1) / h;
        uniforms.set_pointer(nx, ny);
    }

    fn on_resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        let (w, h) = self.sizing.resolve(width, height);
        self.size = (w, h);
        match &mut self.backdrop {
            Backdrop::Live { ctx, .. } => ctx.set_size(w, h, pixel_ratio),
            Backdrop::Static { surface, .. } => {
                if surface.resize(w, h, pixel_ratio) {
                    paint_fallback(surface);
                }
            }
        }
    }

    fn release(&mut self) {
        if let Backdrop::Live { ctx, .. } = &mut self.backdrop {
            ctx.release();
        }
    }
}

/// The hero background: animated noise gradient, or a static gradient when degraded.
///
/// The choice is made once at mount and holds for the component's lifetime.
pub struct MeshGradient {
    scene: Rc<RefCell<GradientScene>>,
    subs: Vec<Subscription>,
}

impl MeshGradient {
    /// Returns `None` when the container does not cover a single pixel.
    pub fn mount(
        host: &Host,
        sizing: Sizing,
        params: GradientParams,
        backend: &mut dyn ShaderBackend,
    ) -> Option<Self> {
        let env = host.env();
        let (w, h) = sizing.resolve(env.viewport_width, env.viewport_height);
        if !covers_pixel(w, h, env.pixel_ratio) {
            log::debug!("gradient not started: empty container {w:.0}x{h:.0}");
            return None;
        }

        let backdrop = match environment_degradation(&env) {
            Some(reason) => Self::fallback(w, h, env.pixel_ratio, reason)?,
            None => match create_context_guarded(backend, w, h, env.pixel_ratio) {
                Ok(ctx) => {
                    log::info!("gradient running on {} shader backend", backend.name());
                    Backdrop::Live {
                        ctx,
                        program: GradientProgram::new(params),
                        uniforms: GradientUniforms::default(),
                        started: host.elapsed(),
                    }
                }
                Err(err) => {
                    Self::fallback(w, h, env.pixel_ratio, Degradation::ContextFailed(err))?
                }
            },
        };

        let live = matches!(backdrop, Backdrop::Live { .. });
        let scene = Rc::new(RefCell::new(GradientScene {
            backdrop,
            sizing,
            size: (w, h),
            origin: (0.0, 0.0),
        }));

        let mut subs = Vec::with_capacity(2);
        if live {
            let frame_scene = Rc::clone(&scene);
            subs.push(host.ticker().subscribe(move |info| {
                frame_scene.borrow_mut().on_frame(info.elapsed);
            }));
        }
        let event_scene = Rc::clone(&scene);
        subs.push(host.events().subscribe(move |ev| match *ev {
            HostEvent::PointerMove { x, y } => event_scene.borrow_mut().on_pointer(x, y),
            HostEvent::Resize {
                width,
                height,
                pixel_ratio,
            } => event_scene.borrow_mut().on_resize(width, height, pixel_ratio),
            HostEvent::Scroll { .. } => {}
        }));

        Some(Self { scene, subs })
    }

    fn fallback(w: f32, h: f32, pixel_ratio: f32, reason: Degradation) -> Option<Backdrop> {
        log::info!("gradient using static fallback: {reason}");
        let mut surface = RasterSurface::acquire(w, h, pixel_ratio)?;
        paint_fallback(&mut surface);
        Some(Backdrop::Static { surface, reason })
    }

    pub fn mode(&self) -> GradientMode {
        match self.scene.borrow().backdrop {
            Backdrop::Live { .. } => GradientMode::Shader,
            Backdrop::Static { .. } => GradientMode::Static,
        }
    }

    pub fn degradation(&self) -> Option<Degradation> {
        match &self.scene.borrow().backdrop {
            Backdrop::Live { .. } => None,
            Backdrop::Static { reason, .. } => Some(reason.clone()),
        }
    }

    pub fn uniforms(&self) -> Option<GradientUniforms> {
        match &self.scene.borrow().backdrop {
            Backdrop::Live { uniforms, .. } => Some(*uniforms),
            Backdrop::Static { .. } => None,
        }
    }

    /// Where the container's top-left corner currently sits in the viewport.
    pub fn set_origin(&self, left: f32, top: f32) {
        self.scene.borrow_mut().origin = (left, top);
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(Option<&RasterSurface>) -> R) -> R {
        let scene = self.scene.borrow();
        match &scene.backdrop {
            Backdrop::Live { ctx, .. } => f(ctx.surface()),
            Backdrop::Static { surface, .. } => f(Some(surface)),
        }
    }

    pub fn unmount(self) {
        log::debug!("gradient unmounted ({})", self.mode().label());
    }
}

impl Drop for MeshGradient {
    fn drop(&mut self) {
        // Stop frames and listeners before the context goes away.
        self.subs.clear();
        self.scene.borrow_mut().release();
    }
}
