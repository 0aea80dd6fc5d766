mod ascii;
mod halfblock;
mod kitty;

pub use ascii::{ramp_char, AsciiRenderer};
pub use halfblock::HalfBlockRenderer;
pub use kitty::KittyRenderer;

use crate::config::RendererMode;
use std::io::Write;

pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    /// Pixel columns painted per terminal column.
    fn cols_per_cell(&self) -> usize {
        1
    }
    /// Pixel rows painted per terminal row.
    fn rows_per_cell(&self) -> usize;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn make_renderer(mode: RendererMode) -> Box<dyn Renderer> {
    match mode {
        RendererMode::Ascii => Box::new(AsciiRenderer::new()),
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Kitty => Box::new(KittyRenderer::new()),
    }
}

/// Pixel buffer size a renderer wants for the visual area.
pub fn pixel_dims(renderer: &dyn Renderer, cols: u16, visual_rows: u16) -> (usize, usize) {
    (
        cols as usize * renderer.cols_per_cell(),
        visual_rows as usize * renderer.rows_per_cell(),
    )
}

pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 54 + g as u32 * 183 + b as u32 * 19) >> 8) as u8
}

pub(crate) fn write_fg_rgb(out: &mut dyn Write, r: u8, g: u8, b: u8) -> std::io::Result<()> {
    write!(out, "\x1b[38;2;{r};{g};{b}m")
}

pub(crate) fn write_bg_rgb(out: &mut dyn Write, r: u8, g: u8, b: u8) -> std::io::Result<()> {
    write!(out, "\x1b[48;2;{r};{g};{b}m")
}

/// Starts a synchronized update when the terminal supports one.
pub(crate) fn open_frame(out: &mut dyn Write, sync: bool) -> std::io::Result<()> {
    if sync {
        out.write_all(b"\x1b[?2026h")?;
    }
    Ok(())
}

/// Ends the synchronized update and flushes.
pub(crate) fn close_frame(out: &mut dyn Write, sync: bool) -> std::io::Result<()> {
    if sync {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()
}

/// Homes the cursor and turns autowrap off so a full-width row never wraps.
pub(crate) fn begin_rows(out: &mut dyn Write) -> std::io::Result<()> {
    out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")
}

pub(crate) fn end_rows(out: &mut dyn Write) -> std::io::Result<()> {
    out.write_all(b"\x1b[?7h")
}

/// Text layers drawn over the pixels: the HUD, then the help popup if shown.
pub(crate) fn write_text_layers(out: &mut dyn Write, frame: &Frame<'_>) -> anyhow::Result<()> {
    write_hud(out, frame)?;
    if let Some(text) = frame.overlay {
        draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
    }
    Ok(())
}

/// True when the buffer holds `width`×`height` RGBA pixels.
pub(crate) fn buffer_fits(frame: &Frame<'_>) -> bool {
    frame.pixels_rgba.len() >= frame.pixel_width * frame.pixel_height * 4
}

pub(crate) fn write_hud(out: &mut dyn Write, frame: &Frame<'_>) -> anyhow::Result<()> {
    let cols = frame.term_cols as usize;
    let mut hud_lines = frame.hud.lines();
    for i in 0..(frame.hud_rows as usize) {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", frame.visual_rows as usize + i + 1)?;
        if let Some(line) = hud_lines.next() {
            let clipped: String = line.chars().take(cols).collect();
            out.write_all(clipped.as_bytes())?;
        }
    }
    Ok(())
}

/// Splits `line` into pieces of at most `width` characters; an empty line stays one piece.
pub(crate) fn wrap_chars(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width.max(1)).map(|c| c.iter().collect()).collect()
}

const POPUP_INK: &str = "\x1b[38;2;26;26;30m";
const POPUP_CREAM: &str = "\x1b[48;2;245;241;235m";
const POPUP_VIOLET: &str = "\x1b[38;2;99;70;230m";

/// Centered box in the page palette. The first line is the title.
pub fn draw_overlay_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
) -> anyhow::Result<()> {
    let (cols, rows) = (term_cols as usize, term_rows as usize);
    if text.trim().is_empty() || cols < 8 || rows < 4 {
        return Ok(());
    }

    let max_inner = cols - 6;
    let lines: Vec<String> = text
        .lines()
        .flat_map(|l| wrap_chars(l, max_inner))
        .collect();
    let inner = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(1)
        .clamp(1, max_inner);
    let box_w = inner + 4;
    let body_h = lines.len().min(rows - 3);
    let box_h = body_h + 2;
    let left = (cols - box_w) / 2 + 1;
    let top = (rows - box_h) / 2 + 1;

    let edge = format!("+{}+", "-".repeat(box_w - 2));
    let blank = " ".repeat(inner);
    write!(out, "\x1b[0m{POPUP_INK}{POPUP_CREAM}\x1b[{top};{left}H{edge}")?;
    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = top + 1 + i;
        write!(out, "\x1b[{row};{left}H| {blank} |\x1b[{row};{}H", left + 2)?;
        if i == 0 {
            write!(out, "\x1b[1m{POPUP_VIOLET}{line}\x1b[22m{POPUP_INK}")?;
        } else {
            out.write_all(line.as_bytes())?;
        }
    }
    write!(out, "\x1b[{};{left}H{edge}\x1b[0m", top + box_h - 1)?;
    Ok(())
}
