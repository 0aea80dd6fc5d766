/// Device pixels per logical unit are capped here, whatever the host reports.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

pub type Rgb = [u8; 3];

pub const fn hex_rgb(hex: u32) -> Rgb {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}

/// How a component's container is sized relative to the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sizing {
    /// Fills the viewport (`inset: 0` of a one-viewport-tall section).
    Viewport,
    /// Full viewport width, fixed logical height.
    Band { height: f32 },
}

impl Sizing {
    pub fn resolve(self, viewport_width: f32, viewport_height: f32) -> (f32, f32) {
        match self {
            Self::Viewport => (viewport_width, viewport_height),
            Self::Band { height } => (viewport_width, height),
        }
    }
}

pub fn effective_ratio(pixel_ratio: f32) -> f32 {
    if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

fn device_extent(logical: f32, ratio: f32) -> usize {
    let v = (logical * ratio).round();
    if v.is_finite() && v >= 1.0 { v as usize } else { 0 }
}

/// True when a container of this logical size covers at least one device pixel.
pub fn covers_pixel(logical_w: f32, logical_h: f32, pixel_ratio: f32) -> bool {
    let ratio = effective_ratio(pixel_ratio);
    device_extent(logical_w, ratio) > 0 && device_extent(logical_h, ratio) > 0
}

/// An RGBA drawing surface addressed in logical units and backed by a device-pixel buffer.
///
/// Colors are straight (non-premultiplied) alpha; a cleared surface is fully transparent.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    logical_w: f32,
    logical_h: f32,
    ratio: f32,
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RasterSurface {
    /// Returns `None` when the container would not cover a single device pixel.
    pub fn acquire(logical_w: f32, logical_h: f32, pixel_ratio: f32) -> Option<Self> {
        let ratio = effective_ratio(pixel_ratio);
        let width = device_extent(logical_w, ratio);
        let height = device_extent(logical_h, ratio);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            logical_w,
            logical_h,
            ratio,
            width,
            height,
            pixels: vec![0; width * height * 4],
        })
    }

    /// Resizes the backing store. Returns `true` when the device-pixel dimensions changed.
    ///
    /// A resize to an empty container keeps the previous buffer.
    pub fn resize(&mut self, logical_w: f32, logical_h: f32, pixel_ratio: f32) -> bool {
        let ratio = effective_ratio(pixel_ratio);
        let width = device_extent(logical_w, ratio);
        let height = device_extent(logical_h, ratio);
        if width == 0 || height == 0 {
            return false;
        }
        self.logical_w = logical_w;
        self.logical_h = logical_h;
        self.ratio = ratio;
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height * 4, 0);
        true
    }

    pub fn logical_size(&self) -> (f32, f32) {
        (self.logical_w, self.logical_h)
    }

    pub fn pixel_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn fill(&mut self, rgb: Rgb) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = rgb[0];
            px[1] = rgb[1];
            px[2] = rgb[2];
            px[3] = 255;
        }
    }

    pub fn put_device(&mut self, x: usize, y: usize, rgb: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y * self.width + x) * 4;
        self.pixels[i] = rgb[0];
        self.pixels[i + 1] = rgb[1];
        self.pixels[i + 2] = rgb[2];
        self.pixels[i + 3] = 255;
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Source-over blend of one device pixel.
    pub fn blend_device(&mut self, x: i64, y: i64, rgb: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let dst_a = self.pixels[i + 3] as f32 / 255.0;
        let out_a = a + dst_a * (1.0 - a);
        if out_a <= 0.0 {
            return;
        }
        for c in 0..3 {
            let src = rgb[c] as f32;
            let dst = self.pixels[i + c] as f32;
            let v = (src * a + dst * dst_a * (1.0 - a)) / out_a;
            self.pixels[i + c] = v.round().clamp(0.0, 255.0) as u8;
        }
        self.pixels[i + 3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    /// Filled, anti-aliased disc in logical coordinates.
    pub fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, rgb: Rgb, alpha: f32) {
        if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) || radius <= 0.0 {
            return;
        }
        let dcx = cx * self.ratio;
        let dcy = cy * self.ratio;
        let dr = radius * self.ratio;
        let x0 = (dcx - dr - 1.0).floor() as i64;
        let x1 = (dcx + dr + 1.0).ceil() as i64;
        let y0 = (dcy - dr - 1.0).floor() as i64;
        let y1 = (dcy + dr + 1.0).ceil() as i64;
        // Sub-pixel discs keep their area as coverage instead of vanishing.
        let area_scale = if dr < 0.5 { (dr * 2.0).max(0.0) } else { 1.0 };
        let reach = dr.max(0.5);
        for y in y0.max(0)..=y1.min(self.height as i64 - 1) {
            for x in x0.max(0)..=x1.min(self.width as i64 - 1) {
                let px = x as f32 + 0.5 - dcx;
                let py = y as f32 + 0.5 - dcy;
                let d = (px * px + py * py).sqrt();
                let coverage = (reach - d + 0.5).clamp(0.0, 1.0) * area_scale;
                if coverage > 0.0 {
                    self.blend_device(x, y, rgb, alpha * coverage);
                }
            }
        }
    }

    /// Anti-aliased line segment in logical coordinates.
    pub fn stroke_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        rgb: Rgb,
        alpha: f32,
    ) {
        let (ax, ay) = (from.0 * self.ratio, from.1 * self.ratio);
        let (bx, by) = (to.0 * self.ratio, to.1 * self.ratio);
        if !(ax.is_finite() && ay.is_finite() && bx.is_finite() && by.is_finite()) {
            return;
        }
        let device_w = (width * self.ratio).max(0.0);
        // Hairlines are drawn one pixel wide with proportionally reduced alpha.
        let alpha = alpha * device_w.min(1.0);
        let half = device_w.max(1.0) * 0.5;

        let x0 = (ax.min(bx) - half - 1.0).floor() as i64;
        let x1 = (ax.max(bx) + half + 1.0).ceil() as i64;
        let y0 = (ay.min(by) - half - 1.0).floor() as i64;
        let y1 = (ay.max(by) + half + 1.0).ceil() as i64;

        let dx = bx - ax;
        let dy = by - ay;
        let len_sq = dx * dx + dy * dy;
        for y in y0.max(0)..=y1.min(self.height as i64 - 1) {
            for x in x0.max(0)..=x1.min(self.width as i64 - 1) {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let t = if len_sq > 0.0 {
                    (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let qx = ax + dx * t - px;
                let qy = ay + dy * t - py;
                let dist = (qx * qx + qy * qy).sqrt();
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_device(x, y, rgb, alpha * coverage);
                }
            }
        }
    }

    /// Axis-aligned rectangle in logical coordinates (no anti-aliasing).
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rgb: Rgb, alpha: f32) {
        let x0 = (x * self.ratio).round() as i64;
        let y0 = (y * self.ratio).round() as i64;
        let x1 = ((x + w) * self.ratio).round() as i64;
        let y1 = ((y + h) * self.ratio).round() as i64;
        // Keep thin rects visible at low ratios.
        let x1 = x1.max(x0 + 1);
        let y1 = y1.max(y0 + 1);
        for yy in y0.max(0)..y1.min(self.height as i64) {
            for xx in x0.max(0)..x1.min(self.width as i64) {
                self.blend_device(xx, yy, rgb, alpha);
            }
        }
    }

    /// CSS-style `linear-gradient(<angle>deg, ...)` over the whole surface.
    ///
    /// `stops` are `(position, color)` pairs with ascending positions in `0..=1`.
    pub fn fill_linear_gradient(&mut self, angle_deg: f32, stops: &[(f32, Rgb)]) {
        if stops.is_empty() {
            return;
        }
        let a = angle_deg.to_radians();
        // 0deg points up, 90deg points right (y grows downward on screen).
        let dir = (a.sin(), -a.cos());
        let w = self.width as f32;
        let h = self.height as f32;
        let line_len = (w * dir.0).abs() + (h * dir.1).abs();
        let line_len = line_len.max(1e-6);
        for y in 0..self.height {
            for x in 0..self.width {
                let px = x as f32 + 0.5 - w * 0.5;
                let py = y as f32 + 0.5 - h * 0.5;
                let t = (px * dir.0 + py * dir.1) / line_len + 0.5;
                let rgb = gradient_at(stops, t);
                self.put_device(x, y, rgb);
            }
        }
    }

    /// Nearest sample at normalized `(u, v)`, with `v` growing downward.
    pub fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        if !(u.is_finite() && v.is_finite()) {
            return [0, 0, 0, 0];
        }
        let x = (u * self.width as f32).floor() as i64;
        let y = (v * self.height as f32).floor() as i64;
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let i = (y * self.width + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

pub fn gradient_at(stops: &[(f32, Rgb)], t: f32) -> Rgb {
    let Some(first) = stops.first() else {
        return [0, 0, 0];
    };
    if t <= first.0 {
        return first.1;
    }
    for pair in stops.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if t <= p1 {
            let span = (p1 - p0).max(1e-6);
            let k = ((t - p0) / span).clamp(0.0, 1.0);
            return lerp_rgb(c0, c1, k);
        }
    }
    stops[stops.len() - 1].1
}

pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for c in 0..3 {
        out[c] = (a[c] as f32 * (1.0 - t) + b[c] as f32 * t).round() as u8;
    }
    out
}

/// Source-over blend of a straight-alpha RGBA sample onto an opaque RGB pixel.
pub fn over_opaque(dst: Rgb, src: [u8; 4]) -> Rgb {
    let a = src[3] as f32 / 255.0;
    lerp_rgb(dst, [src[0], src[1], src[2]], a)
}
