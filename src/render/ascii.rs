use crate::render::{
    begin_rows, buffer_fits, close_frame, end_rows, luma_u8, open_frame, write_fg_rgb,
    write_text_layers, Frame, Renderer,
};
use std::io::Write;

// Dark to bright. The page is mostly light, so the top of the ramp carries the detail.
const RAMP: &[u8] = b"@%#*+=-:. ";

/// One character per pixel, tinted with the pixel color.
#[derive(Default)]
pub struct AsciiRenderer {
    last_fg: Option<[u8; 3]>,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn ramp_char(r: u8, g: u8, b: u8) -> u8 {
    let l = luma_u8(r, g, b) as usize;
    RAMP[l * (RAMP.len() - 1) / 255]
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn rows_per_cell(&self) -> usize {
        1
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let rows = frame.visual_rows as usize;
        if cols == 0 || rows == 0 || frame.pixel_width != cols || frame.pixel_height != rows {
            return Ok(());
        }
        if !buffer_fits(frame) {
            return Ok(());
        }

        open_frame(out, frame.sync_updates)?;
        begin_rows(out)?;
        self.last_fg = None;

        for row in frame.pixels_rgba[..cols * rows * 4].chunks_exact(cols * 4) {
            for px in row.chunks_exact(4) {
                let fg = [px[0], px[1], px[2]];
                if self.last_fg != Some(fg) {
                    write_fg_rgb(out, fg[0], fg[1], fg[2])?;
                    self.last_fg = Some(fg);
                }
                out.write_all(&[ramp_char(fg[0], fg[1], fg[2])])?;
            }
            out.write_all(b"\r\n")?;
        }

        write_text_layers(out, frame)?;
        end_rows(out)?;
        close_frame(out, frame.sync_updates)?;
        Ok(())
    }
}
