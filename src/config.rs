use anyhow::bail;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "scroll-canvas",
    version,
    about = "Scroll-driven particle field, noise gradient and velocity marquee in the terminal"
)]
pub struct Config {
    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, value_enum, default_value_t = GradientEngine::Shader)]
    pub gradient: GradientEngine,

    #[arg(long, default_value_t = false)]
    pub reduced_motion: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_probe: bool,

    /// Device pixels per logical page unit, per terminal column of the half-block renderer.
    /// The animated gradient needs a logical width of 768, which at 0.125 is 96 columns.
    #[arg(long, default_value_t = 0.125)]
    pub pixel_ratio: f32,

    /// Logical viewport width; overrides --pixel-ratio when given.
    #[arg(long)]
    pub viewport_width: Option<f32>,

    #[arg(long, default_value_t = 3)]
    pub particle_rows: usize,

    #[arg(long, default_value_t = 5)]
    pub particle_cols: usize,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    #[arg(long, default_value_t = false)]
    pub autoplay: bool,

    /// Autoplay speed in logical units per second.
    #[arg(long, default_value_t = 240.0)]
    pub autoplay_speed: f32,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long)]
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    Kitty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GradientEngine {
    #[value(alias = "noise")]
    Shader,
    #[value(alias = "css", alias = "fallback")]
    Static,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fps == 0 {
            bail!("--fps must be greater than 0");
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            bail!("--pixel-ratio must be a positive number (got {})", self.pixel_ratio);
        }
        if let Some(w) = self.viewport_width {
            if !(w.is_finite() && w > 0.0) {
                bail!("--viewport-width must be a positive number (got {w})");
            }
        }
        if self.particle_rows == 0 {
            bail!("--particle-rows must be at least 1");
        }
        if self.particle_cols == 0 {
            bail!("--particle-cols must be at least 1");
        }
        if !(self.autoplay_speed.is_finite() && self.autoplay_speed > 0.0) {
            bail!(
                "--autoplay-speed must be a positive number (got {})",
                self.autoplay_speed
            );
        }
        Ok(())
    }

    /// Device pixels per logical unit for a drawing area `pixel_width` pixels wide, where
    /// each terminal column holds `cols_per_cell` pixels.
    pub fn device_pixel_ratio(&self, pixel_width: usize, cols_per_cell: usize) -> f32 {
        match self.viewport_width {
            Some(w) if pixel_width > 0 => pixel_width as f32 / w,
            _ => self.pixel_ratio * cols_per_cell.max(1) as f32,
        }
    }
}
