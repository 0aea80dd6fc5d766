use crate::host::{FrameInfo, Host, HostEnv, Subscription};
use crate::progress::{PinRange, ScrollProgressDriver, PIN_FACTOR};
use crate::scroll::SmoothScroll;
use crate::surface::{hex_rgb, over_opaque, RasterSurface, Rgb, Sizing};
use crate::visual::gradient::{Degradation, GradientMode, GradientParams, MeshGradient};
use crate::visual::marquee::{CouplerParams, MarqueeBand};
use crate::visual::particles::{FieldParams, ParticleCanvas};
use crate::visual::shader::ShaderBackend;

pub const DEFAULT_BAND_HEIGHT: f32 = 96.0;
const PAGE_RGB: Rgb = hex_rgb(0xF5F1EB);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageOptions {
    pub env: HostEnv,
    pub field: FieldParams,
    pub coupler: CouplerParams,
    pub gradient: GradientParams,
    pub band_height: f32,
    pub seed: u64,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            env: HostEnv::default(),
            field: FieldParams::default(),
            coupler: CouplerParams::default(),
            gradient: GradientParams::default(),
            band_height: DEFAULT_BAND_HEIGHT,
            seed: 7,
        }
    }
}

/// Vertical positions of the page sections, in page coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub band_height: f32,
    pub marquee_top: f32,
    pub gap_top: f32,
    /// Scroll distance the gap section stays pinned for.
    pub gap_pin: f32,
    pub spacer_top: f32,
    pub total_height: f32,
}

impl PageLayout {
    pub fn new(viewport_width: f32, viewport_height: f32, band_height: f32) -> Self {
        let vh = viewport_height.max(0.0);
        let marquee_top = vh;
        let gap_top = marquee_top + band_height;
        let gap_pin = vh * PIN_FACTOR;
        let spacer_top = gap_top + vh + gap_pin;
        Self {
            viewport_width,
            viewport_height: vh,
            band_height,
            marquee_top,
            gap_top,
            gap_pin,
            spacer_top,
            total_height: spacer_top + vh,
        }
    }

    /// Largest scroll offset.
    pub fn limit(&self) -> f32 {
        (self.total_height - self.viewport_height).max(0.0)
    }

    pub fn gap_range(&self) -> PinRange {
        PinRange::pinned(self.gap_top, self.viewport_height, PIN_FACTOR)
    }

    /// Screen-space top of the gap section: it scrolls in, holds at 0 while pinned, then leaves.
    pub fn gap_screen_top(&self, offset: f32) -> f32 {
        if offset < self.gap_top {
            self.gap_top - offset
        } else if offset <= self.gap_top + self.gap_pin {
            0.0
        } else {
            self.gap_top + self.gap_pin - offset
        }
    }

    /// Screen-space top of the hero, marquee, gap and spacer sections.
    pub fn screen_tops(&self, offset: f32) -> [f32; 4] {
        [
            -offset,
            self.marquee_top - offset,
            self.gap_screen_top(offset),
            self.spacer_top - offset,
        ]
    }
}

/// Snapshot for the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct PageStatus {
    pub offset: f32,
    pub limit: f32,
    pub velocity: f32,
    pub progress: f32,
    pub multiplier: f32,
    pub gradient: Option<GradientMode>,
    pub degradation: Option<Degradation>,
    pub particles: usize,
    pub autoplay: bool,
    pub reduced_motion: bool,
}

impl PageStatus {
    pub fn summary(&self) -> String {
        let gradient = match (&self.gradient, &self.degradation) {
            (Some(mode), Some(reason)) => format!("{} ({reason})", mode.label()),
            (Some(mode), None) => mode.label().to_string(),
            (None, _) => "off".to_string(),
        };
        format!(
            "scroll {:.0}/{:.0} v={:.0} progress={:.2} marquee x{:.2} gradient={} particles={}{}",
            self.offset,
            self.limit,
            self.velocity,
            self.progress,
            self.multiplier,
            gradient,
            self.particles,
            if self.autoplay { " autoplay" } else { "" },
        )
    }
}

/// The scrolling page: owns the host and every mounted component.
pub struct Page {
    gradient: Option<MeshGradient>,
    marquee: Option<MarqueeBand>,
    particles: Option<ParticleCanvas>,
    _progress_sub: Subscription,
    driver: ScrollProgressDriver,
    scroll: SmoothScroll,
    layout: PageLayout,
    options: PageOptions,
    backend: Box<dyn ShaderBackend>,
    host: Host,
}

impl Page {
    pub fn new(options: PageOptions, mut backend: Box<dyn ShaderBackend>) -> Self {
        let host = Host::new(options.env);
        let env = host.env();
        let layout = PageLayout::new(env.viewport_width, env.viewport_height, options.band_height);
        let scroll = SmoothScroll::new(layout.limit());

        let driver = ScrollProgressDriver::new(layout.gap_range());
        let progress_sub = driver.attach(&host);

        let gradient = MeshGradient::mount(&host, Sizing::Viewport, options.gradient, backend.as_mut());
        let marquee = MarqueeBand::mount(&host, options.band_height, options.coupler);
        let particles = ParticleCanvas::mount(
            &host,
            Sizing::Viewport,
            options.field,
            fastrand::Rng::with_seed(options.seed),
            driver.getter(),
        );
        log::info!(
            "page mounted at {:.0}x{:.0} (ratio {:.2}), scroll limit {:.0}",
            env.viewport_width,
            env.viewport_height,
            env.pixel_ratio,
            layout.limit()
        );

        Self {
            gradient,
            marquee,
            particles,
            _progress_sub: progress_sub,
            driver,
            scroll,
            layout,
            options,
            backend,
            host,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn scroll(&self) -> &SmoothScroll {
        &self.scroll
    }

    pub fn progress(&self) -> f32 {
        self.driver.progress()
    }

    pub fn gradient(&self) -> Option<&MeshGradient> {
        self.gradient.as_ref()
    }

    pub fn marquee(&self) -> Option<&MarqueeBand> {
        self.marquee.as_ref()
    }

    pub fn particles(&self) -> Option<&ParticleCanvas> {
        self.particles.as_ref()
    }

    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        let env = self.host.env();
        if env.viewport_width == width
            && env.viewport_height == height
            && env.pixel_ratio == pixel_ratio
        {
            return;
        }
        self.layout = PageLayout::new(width, height, self.options.band_height);
        self.scroll.set_limit(self.layout.limit());
        self.driver.set_range(self.layout.gap_range());
        self.host.resize(width, height, pixel_ratio);
        log::debug!("page resized to {width:.0}x{height:.0} (ratio {pixel_ratio:.2})");
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        self.host.pointer_move(x, y);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll.scroll_by(delta);
    }

    pub fn scroll_to(&mut self, offset: f32) {
        self.scroll.scroll_to(offset);
    }

    pub fn toggle_autoplay(&mut self, speed: f32) -> bool {
        let next = match self.scroll.autoplay() {
            Some(_) => None,
            None => Some(speed),
        };
        self.scroll.set_autoplay(next);
        self.scroll.autoplay().is_some()
    }

    /// Changes the reduced-motion preference and remounts the gradient, which decides
    /// its mode again for the new lifetime.
    pub fn set_reduced_motion(&mut self, on: bool) {
        if self.host.env().reduced_motion == on {
            return;
        }
        self.host.set_reduced_motion(on);
        self.remount_gradient();
    }

    pub fn remount_gradient(&mut self) {
        if let Some(old) = self.gradient.take() {
            old.unmount();
        }
        self.gradient = MeshGradient::mount(
            &self.host,
            Sizing::Viewport,
            self.options.gradient,
            self.backend.as_mut(),
        );
    }

    /// One frame: scroll, publish the scroll sample, then tick every component.
    pub fn frame(&mut self, dt: f32) -> FrameInfo {
        if self.scroll.update(dt) {
            self.host.scroll(self.scroll.offset(), self.scroll.velocity());
        }
        if let Some(gradient) = &self.gradient {
            gradient.set_origin(0.0, -self.scroll.offset());
        }
        self.host.tick(dt)
    }

    pub fn status(&self) -> PageStatus {
        PageStatus {
            offset: self.scroll.offset(),
            limit: self.scroll.limit(),
            velocity: self.scroll.velocity(),
            progress: self.driver.progress(),
            multiplier: self
                .marquee
                .as_ref()
                .map_or(1.0, |m| m.coupler().multiplier()),
            gradient: self.gradient.as_ref().map(|g| g.mode()),
            degradation: self.gradient.as_ref().and_then(|g| g.degradation()),
            particles: self
                .particles
                .as_ref()
                .map_or(0, |p| p.with_field(|f| f.particles().len())),
            autoplay: self.scroll.autoplay().is_some(),
            reduced_motion: self.host.env().reduced_motion,
        }
    }

    /// Paints the visible viewport into an RGBA buffer of `width`×`height` pixels.
    pub fn composite(&self, width: usize, height: usize, out: &mut Vec<u8>) {
        out.clear();
        out.resize(width * height * 4, 0);
        if width == 0 || height == 0 {
            return;
        }
        let layout = &self.layout;
        let [hero_top, marquee_top, gap_top, _] = layout.screen_tops(self.scroll.offset());
        let vh = layout.viewport_height;
        let band = layout.band_height;

        for y in 0..height {
            let ly = (y as f32 + 0.5) / height as f32 * vh;
            let row = &mut out[y * width * 4..(y + 1) * width * 4];

            // The pinned gap section paints over whatever it overlaps.
            if ly >= gap_top && ly < gap_top + vh {
                if let Some(p) = &self.particles {
                    p.with_surface(|s| fill_row(row, Some(s), (ly - gap_top) / vh));
                    continue;
                }
            } else if ly >= hero_top && ly < hero_top + vh {
                if let Some(g) = &self.gradient {
                    g.with_surface(|s| fill_row(row, s, (ly - hero_top) / vh));
                    continue;
                }
            } else if ly >= marquee_top && ly < marquee_top + band {
                if let Some(m) = &self.marquee {
                    m.with_surface(|s| fill_row(row, Some(s), (ly - marquee_top) / band));
                    continue;
                }
            }
            fill_row(row, None, 0.0);
        }
    }
}

/// Fills one output row from a component surface sampled at height `v`, over the page color.
fn fill_row(row: &mut [u8], surface: Option<&RasterSurface>, v: f32) {
    let width = row.len() / 4;
    for (x, px) in row.chunks_exact_mut(4).enumerate() {
        let rgb = match surface {
            Some(s) => over_opaque(PAGE_RGB, s.sample((x as f32 + 0.5) / width as f32, v)),
            None => PAGE_RGB,
        };
        px[0] = rgb[0];
        px[1] = rgb[1];
        px[2] = rgb[2];
        px[3] = 255;
    }
}
