use crate::render::{
    begin_rows, buffer_fits, close_frame, end_rows, open_frame, write_bg_rgb, write_fg_rgb,
    write_text_layers, Frame, Renderer,
};
use std::io::Write;

/// Upper half block: foreground paints the top pixel, background the bottom one.
const UPPER_HALF: &str = "\u{2580}";

/// Two pixel rows per terminal row.
#[derive(Default)]
pub struct HalfBlockRenderer {
    last_fg: Option<[u8; 3]>,
    last_bg: Option<[u8; 3]>,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn paint_cell(&mut self, out: &mut dyn Write, top: &[u8], bottom: &[u8]) -> std::io::Result<()> {
        let fg = [top[0], top[1], top[2]];
        let bg = [bottom[0], bottom[1], bottom[2]];
        if self.last_fg != Some(fg) {
            write_fg_rgb(out, fg[0], fg[1], fg[2])?;
            self.last_fg = Some(fg);
        }
        if self.last_bg != Some(bg) {
            write_bg_rgb(out, bg[0], bg[1], bg[2])?;
            self.last_bg = Some(bg);
        }
        out.write_all(UPPER_HALF.as_bytes())
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn rows_per_cell(&self) -> usize {
        2
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let rows = frame.visual_rows as usize;
        let (w, h) = (frame.pixel_width, frame.pixel_height);
        if cols == 0 || rows == 0 || w != cols || h != rows * 2 {
            return Ok(());
        }

        open_frame(out, frame.sync_updates)?;
        if !buffer_fits(frame) {
            write!(
                out,
                "\x1b[H\x1b[0m\x1b[2Jpixel buffer too small (need {}, got {})",
                w * h * 4,
                frame.pixels_rgba.len()
            )?;
            close_frame(out, frame.sync_updates)?;
            return Ok(());
        }

        begin_rows(out)?;
        self.last_fg = None;
        self.last_bg = None;

        let stride = w * 4;
        for pair in frame.pixels_rgba[..stride * h].chunks_exact(stride * 2) {
            let (top, bottom) = pair.split_at(stride);
            for (t, b) in top.chunks_exact(4).zip(bottom.chunks_exact(4)) {
                self.paint_cell(out, t, b)?;
            }
            out.write_all(b"\r\n")?;
        }

        write_text_layers(out, frame)?;
        end_rows(out)?;
        close_frame(out, frame.sync_updates)?;
        Ok(())
    }
}
