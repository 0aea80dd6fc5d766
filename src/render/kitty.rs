use crate::render::{buffer_fits, close_frame, open_frame, write_hud, write_text_layers, Frame, Renderer};
use anyhow::Context;
use base64::Engine;
use std::io::Write;

// 3072 raw bytes encode to exactly 4096 base64 bytes, the protocol's chunk limit.
const RAW_CHUNK: usize = 3 * 1024;
const PIXELS_PER_COL: usize = 4;
const PIXELS_PER_ROW: usize = 8;

/// Kitty graphics protocol renderer using direct (in-band, base64) transmission.
///
/// The page image is retransmitted every frame under one image id, which replaces
/// the previous placement in place.
pub struct KittyRenderer {
    image_id: u32,
    placement_id: u32,
    b64_buf: Vec<u8>,
    popup_shown: bool,
    last_hud_rows: u16,
}

impl KittyRenderer {
    pub fn new() -> Self {
        Self {
            image_id: 1,
            placement_id: 1,
            b64_buf: Vec::new(),
            popup_shown: false,
            last_hud_rows: 0,
        }
    }

    /// Hides the image so the help popup reads over a plain screen.
    fn render_popup(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        write!(out, "\x1b_Ga=d,d=I,i={}\x1b\\", self.image_id)?;
        clear_text_rows(out, frame.term_rows as usize)?;
        write_text_layers(out, frame)?;
        self.popup_shown = true;
        Ok(())
    }

    fn render_image(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let (w, h) = (frame.pixel_width, frame.pixel_height);
        out.write_all(b"\x1b[H")?;
        write_direct_rgba(
            out,
            &frame.pixels_rgba[..w * h * 4],
            (w, h),
            (frame.term_cols as usize, frame.visual_rows as usize),
            (self.image_id, self.placement_id),
            &mut self.b64_buf,
        )?;

        // Stale HUD or popup text would otherwise sit on top of the image.
        if frame.hud_rows != self.last_hud_rows {
            clear_text_rows(out, frame.term_rows as usize)?;
        } else if self.popup_shown {
            clear_text_rows(out, frame.visual_rows as usize)?;
        }
        write_hud(out, frame)?;
        self.popup_shown = false;
        Ok(())
    }
}

impl Default for KittyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for KittyRenderer {
    fn name(&self) -> &'static str {
        "kitty"
    }

    fn cols_per_cell(&self) -> usize {
        PIXELS_PER_COL
    }

    fn rows_per_cell(&self) -> usize {
        PIXELS_PER_ROW
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        if frame.term_cols == 0
            || frame.visual_rows == 0
            || frame.pixel_width == 0
            || frame.pixel_height == 0
            || !buffer_fits(frame)
        {
            return Ok(());
        }

        open_frame(out, frame.sync_updates)?;
        if frame.overlay.is_some() {
            self.render_popup(frame, out)?;
        } else {
            self.render_image(frame, out)?;
        }
        self.last_hud_rows = frame.hud_rows;
        close_frame(out, frame.sync_updates)?;
        Ok(())
    }
}

/// Transmits and places an RGBA image in base64 chunks (`a=T,t=d`).
pub fn write_direct_rgba(
    out: &mut dyn Write,
    rgba: &[u8],
    (w, h): (usize, usize),
    (cols, rows): (usize, usize),
    (image_id, placement_id): (u32, u32),
    b64_buf: &mut Vec<u8>,
) -> anyhow::Result<()> {
    let mut chunks = rgba.chunks(RAW_CHUNK).peekable();
    let mut first = true;
    while let Some(chunk) = chunks.next() {
        let b64_len = chunk.len().div_ceil(3) * 4;
        if b64_buf.len() < b64_len {
            b64_buf.resize(b64_len, 0);
        }
        let written = base64::engine::general_purpose::STANDARD
            .encode_slice(chunk, &mut b64_buf[..b64_len])
            .context("base64 encode pixels")?;

        let more = u8::from(chunks.peek().is_some());
        if first {
            write!(
                out,
                "\x1b_Ga=T,f=32,s={w},v={h},t=d,i={image_id},p={placement_id},c={cols},r={rows},C=1,q=2,z=-1,m={more};"
            )?;
            first = false;
        } else {
            write!(out, "\x1b_Gm={more};")?;
        }
        out.write_all(&b64_buf[..written])?;
        out.write_all(b"\x1b\\")?;
    }
    Ok(())
}

fn clear_text_rows(out: &mut dyn Write, rows: usize) -> anyhow::Result<()> {
    for row in 1..=rows {
        write!(out, "\x1b[{row};1H\x1b[0m\x1b[2K")?;
    }
    Ok(())
}
