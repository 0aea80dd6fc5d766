use crate::surface::RasterSurface;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    Unavailable(String),
    EmptySurface { width: f32, height: f32 },
    Released,
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "shader context unavailable: {reason}"),
            Self::EmptySurface { width, height } => {
                write!(f, "cannot create shader surface of {width}x{height}")
            }
            Self::Released => write!(f, "shader context already released"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Per-pixel program: normalized `(u, v)` with the origin at the bottom-left, linear RGB out.
pub type Fragment<'a> = &'a dyn Fn(f32, f32) -> [f32; 3];

/// A full-surface quad the fragment program is evaluated over.
pub trait ShaderContext {
    fn set_size(&mut self, width: f32, height: f32, pixel_ratio: f32);
    fn draw(&mut self, fragment: Fragment<'_>) -> Result<(), ShaderError>;
    fn surface(&self) -> Option<&RasterSurface>;
    /// Frees the quad and its target. Idempotent.
    fn release(&mut self);
}

/// Factory for shader contexts.
pub trait ShaderBackend {
    fn name(&self) -> &'static str;
    fn create_context(
        &mut self,
        width: f32,
        height: f32,
        pixel_ratio: f32,
    ) -> Result<Box<dyn ShaderContext>, ShaderError>;
}

/// Evaluates the fragment program on the CPU, one call per device pixel.
#[derive(Debug, Default)]
pub struct SoftwareBackend;

impl ShaderBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn create_context(
        &mut self,
        width: f32,
        height: f32,
        pixel_ratio: f32,
    ) -> Result<Box<dyn ShaderContext>, ShaderError> {
        let surface = RasterSurface::acquire(width, height, pixel_ratio)
            .ok_or(ShaderError::EmptySurface { width, height })?;
        Ok(Box::new(SoftwareContext {
            surface: Some(surface),
        }))
    }
}

/// Backend for hosts without shader support: every context request fails.
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ShaderBackend for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn create_context(
        &mut self,
        _width: f32,
        _height: f32,
        _pixel_ratio: f32,
    ) -> Result<Box<dyn ShaderContext>, ShaderError> {
        Err(ShaderError::Unavailable(self.reason.clone()))
    }
}

struct SoftwareContext {
    surface: Option<RasterSurface>,
}

impl ShaderContext for SoftwareContext {
    fn set_size(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(width, height, pixel_ratio);
        }
    }

    fn draw(&mut self, fragment: Fragment<'_>) -> Result<(), ShaderError> {
        let surface = self.surface.as_mut().ok_or(ShaderError::Released)?;
        let (w, h) = surface.pixel_size();
        let inv_w = 1.0 / w as f32;
        let inv_h = 1.0 / h as f32;
        for y in 0..h {
            let v = 1.0 - (y as f32 + 0.5) * inv_h;
            for x in 0..w {
                let u = (x as f32 + 0.5) * inv_w;
                let c = fragment(u, v);
                surface.put_device(x, y, to_rgb8(c));
            }
        }
        Ok(())
    }

    fn surface(&self) -> Option<&RasterSurface> {
        self.surface.as_ref()
    }

    fn release(&mut self) {
        self.surface = None;
    }
}

pub fn to_rgb8(c: [f32; 3]) -> [u8; 3] {
    [
        (c[0].clamp(0.0, 1.0) * 255.0).round() as u8,
        (c[1].clamp(0.0, 1.0) * 255.0).round() as u8,
        (c[2].clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}
