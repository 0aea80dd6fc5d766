use crate::host::{Host, HostEvent, Subscription};
use crate::surface::{hex_rgb, RasterSurface, Rgb, Sizing};
use crate::typography::{draw_text, text_height, text_width};
use std::cell::RefCell;
use std::rc::Rc;

pub const MARQUEE_WORDS: [&str; 4] = ["RECALL", "REINFORCE", "REMEMBER", "RETAIN"];
pub const MARQUEE_DOTS: [Rgb; 4] = [
    hex_rgb(0x6346E6),
    hex_rgb(0xE8573D),
    hex_rgb(0x3B7D5E),
    hex_rgb(0xD4940A),
];
/// Copies of the word set laid end to end; at least two are needed for a seamless wrap.
pub const TRACK_COPIES: usize = 4;

const BAND_RGB: Rgb = hex_rgb(0x1A1A1E);
const TEXT_RGB: Rgb = hex_rgb(0xF5F1EB);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CouplerParams {
    /// Track travel per frame at multiplier 1.
    pub base_speed: f32,
    /// Scroll velocity (units/second) that adds 1.0 to the multiplier.
    pub velocity_scale: f32,
    pub max_boost: f32,
    /// Share of the gap to 1.0 the multiplier closes each frame.
    pub decay: f32,
}

impl Default for CouplerParams {
    fn default() -> Self {
        Self {
            base_speed: 0.6,
            velocity_scale: 400.0,
            max_boost: 4.0,
            decay: 0.03,
        }
    }
}

/// Couples scroll velocity to the speed of an endlessly looping horizontal offset.
#[derive(Clone, Debug, PartialEq)]
pub struct VelocityCoupler {
    params: CouplerParams,
    position: f32,
    multiplier: f32,
}

impl VelocityCoupler {
    pub fn new(params: CouplerParams) -> Self {
        Self {
            params,
            position: 0.0,
            multiplier: 1.0,
        }
    }

    pub fn target_multiplier(&self, velocity: f32) -> f32 {
        if !velocity.is_finite() || self.params.velocity_scale <= 0.0 {
            return 1.0;
        }
        1.0 + (velocity.abs() / self.params.velocity_scale).min(self.params.max_boost)
    }

    /// Called from the scroll observer, any number of times between frames.
    pub fn sample_velocity(&mut self, velocity: f32) {
        self.multiplier = self.target_multiplier(velocity);
    }

    /// One frame: decay the multiplier, move the track, wrap by `half_width`.
    pub fn advance(&mut self, half_width: f32) -> f32 {
        self.multiplier += (1.0 - self.multiplier) * self.params.decay;
        self.position -= self.params.base_speed * self.multiplier;
        if half_width > 0.0 {
            while self.position.abs() >= half_width {
                self.position -= half_width * self.position.signum();
            }
        }
        self.position
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn params(&self) -> &CouplerParams {
        &self.params
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackItem {
    pub word: &'static str,
    pub dot: Rgb,
    /// Left edge within the track.
    pub x: f32,
    pub width: f32,
}

/// Horizontal layout of the duplicated word track for a band of a given height.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackLayout {
    items: Vec<TrackItem>,
    width: f32,
    cell: f32,
    band_height: f32,
}

impl TrackLayout {
    pub fn new(words: &[&'static str], dots: &[Rgb], copies: usize, band_height: f32) -> Self {
        let cell = (band_height * 0.4 / text_height(1.0)).max(0.5);
        let pad = 4.0 * cell;
        let dot = 3.0 * cell;
        let mut items = Vec::with_capacity(words.len() * copies);
        let mut x = 0.0f32;
        for i in 0..words.len() * copies {
            let word = words[i % words.len()];
            let width = pad + dot + 3.0 * cell + text_width(word, cell) + pad;
            items.push(TrackItem {
                word,
                dot: dots.get(i % dots.len().max(1)).copied().unwrap_or(TEXT_RGB),
                x,
                width,
            });
            x += width;
        }
        Self {
            items,
            width: x,
            cell,
            band_height,
        }
    }

    pub fn standard(band_height: f32) -> Self {
        Self::new(&MARQUEE_WORDS, &MARQUEE_DOTS, TRACK_COPIES, band_height)
    }

    pub fn items(&self) -> &[TrackItem] {
        &self.items
    }

    /// Total scrollable width of the track.
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    pub fn draw(&self, surface: &mut RasterSurface, offset: f32) {
        surface.fill(BAND_RGB);
        let (view_w, _) = surface.logical_size();
        let cell = self.cell;
        let text_y = (self.band_height - text_height(cell)) * 0.5;
        let mid_y = self.band_height * 0.5;
        for item in &self.items {
            let left = item.x + offset;
            if left > view_w || left + item.width < 0.0 {
                continue;
            }
            let dot_r = 1.5 * cell;
            surface.fill_disc(left + 4.0 * cell + dot_r, mid_y, dot_r, item.dot, 1.0);
            let text_x = left + 4.0 * cell + 3.0 * cell + 3.0 * cell;
            draw_text(surface, item.word, text_x, text_y, cell, TEXT_RGB, 1.0);
        }
    }
}

struct MarqueeScene {
    coupler: VelocityCoupler,
    track: TrackLayout,
    surface: RasterSurface,
    sizing: Sizing,
}

/// The scroll-reactive word strip.
pub struct MarqueeBand {
    scene: Rc<RefCell<MarqueeScene>>,
    subs: Vec<Subscription>,
}

impl MarqueeBand {
    pub fn mount(host: &Host, band_height: f32, params: CouplerParams) -> Option<Self> {
        let env = host.env();
        let sizing = Sizing::Band {
            height: band_height,
        };
        let (w, h) = sizing.resolve(env.viewport_width, env.viewport_height);
        let Some(surface) = RasterSurface::acquire(w, h, env.pixel_ratio) else {
            log::debug!("marquee not started: no surface for {w:.0}x{h:.0}");
            return None;
        };

        let scene = Rc::new(RefCell::new(MarqueeScene {
            coupler: VelocityCoupler::new(params),
            track: TrackLayout::standard(band_height),
            surface,
            sizing,
        }));

        let frame_scene = Rc::clone(&scene);
        let frame_sub = host.ticker().subscribe(move |_| {
            let scene = &mut *frame_scene.borrow_mut();
            let offset = scene.coupler.advance(scene.track.half_width());
            scene.track.draw(&mut scene.surface, offset);
        });

        let event_scene = Rc::clone(&scene);
        let event_sub = host.events().subscribe(move |ev| match *ev {
            HostEvent::Scroll { velocity, .. } => {
                event_scene.borrow_mut().coupler.sample_velocity(velocity);
            }
            HostEvent::Resize {
                width,
                height,
                pixel_ratio,
            } => {
                let scene = &mut *event_scene.borrow_mut();
                let (w, h) = scene.sizing.resolve(width, height);
                scene.surface.resize(w, h, pixel_ratio);
            }
            HostEvent::PointerMove { .. } => {}
        });

        Some(Self {
            scene,
            subs: vec![frame_sub, event_sub],
        })
    }

    pub fn coupler(&self) -> VelocityCoupler {
        self.scene.borrow().coupler.clone()
    }

    pub fn track_width(&self) -> f32 {
        self.scene.borrow().track.width()
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(&RasterSurface) -> R) -> R {
        f(&self.scene.borrow().surface)
    }

    pub fn unmount(mut self) {
        self.subs.clear();
        log::debug!("marquee unmounted");
    }
}
