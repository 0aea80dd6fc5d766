use scroll_canvas::config::RendererMode;
use scroll_canvas::render::{
    make_renderer, pixel_dims, ramp_char, AsciiRenderer, Frame, HalfBlockRenderer, KittyRenderer,
    Renderer,
};

/// Build a solid-color RGBA pixel buffer.
fn solid_pixels(w: usize, h: usize, rgb: [u8; 3]) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px[..3].copy_from_slice(&rgb);
        px[3] = 255;
    }
    buf
}

/// Cream on top, ink on the bottom half.
fn split_pixels(w: usize, h: usize) -> Vec<u8> {
    let mut buf = solid_pixels(w, h, [0xF5, 0xF1, 0xEB]);
    for y in h / 2..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            buf[i..i + 3].copy_from_slice(&[0x1A, 0x1A, 0x1E]);
        }
    }
    buf
}

fn make_frame<'a>(
    cols: u16,
    visual_rows: u16,
    pw: usize,
    ph: usize,
    pixels: &'a [u8],
    sync: bool,
) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: visual_rows + 2,
        visual_rows,
        pixel_width: pw,
        pixel_height: ph,
        pixels_rgba: pixels,
        hud: "scroll 0/3336 progress=0.00",
        hud_rows: 1,
        overlay: None,
        sync_updates: sync,
    }
}

// ── ASCII renderer ──────────────────────────────────────────────────────────

#[test]
fn ascii_renders_solid_frame() {
    let pixels = solid_pixels(30, 5, [200, 200, 200]);
    let frame = make_frame(30, 5, 30, 5, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[H"), "missing home cursor");
    assert!(s.contains("\x1b[?7l"), "missing autowrap-off");
    assert!(s.contains("\x1b[?7h"), "missing autowrap-on");
    assert!(s.contains("38;2;200;200;200"), "missing FG color");
    assert!(s.contains("progress=0.00"), "HUD text missing");
    assert!(!s.contains("\x1b[?2026h"));
    // One color escape for the whole uniform frame.
    assert_eq!(s.matches("38;2;").count(), 1);
}

#[test]
fn hud_is_clipped_to_terminal_width() {
    let pixels = solid_pixels(10, 5, [200, 200, 200]);
    let frame = make_frame(10, 5, 10, 5, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[6;1H\x1b[0m\x1b[2Kscroll 0/3"));
    assert!(!s.contains("progress"));
}

#[test]
fn ascii_ramp_runs_dark_to_light() {
    assert_eq!(ramp_char(0, 0, 0), b'@');
    assert_eq!(ramp_char(255, 255, 255), b' ');
    let cream = ramp_char(0xF5, 0xF1, 0xEB);
    let ink = ramp_char(0x1A, 0x1A, 0x1E);
    assert_ne!(cream, ink);
}

#[test]
fn ascii_skips_mismatched_buffer() {
    let pixels = solid_pixels(10, 5, [0, 0, 0]);
    let frame = make_frame(10, 5, 8, 5, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn ascii_renders_overlay_popup() {
    let pixels = solid_pixels(40, 12, [0xF5, 0xF1, 0xEB]);
    let mut frame = make_frame(40, 12, 40, 12, &pixels, false);
    frame.overlay = Some("Scroll Canvas Keys\nq quit");
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("Scroll Canvas Keys"));
    assert!(s.contains("q quit"));
    assert!(s.contains("38;2;99;70;230"), "title should be violet");
}

// ── Half-block renderer ─────────────────────────────────────────────────────

#[test]
fn halfblock_paints_two_pixel_rows_per_cell() {
    let pixels = split_pixels(6, 2);
    let frame = make_frame(6, 1, 6, 2, &pixels, true);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.starts_with("\x1b[?2026h"));
    assert!(s.ends_with("\x1b[?2026l"));
    assert!(s.contains("38;2;245;241;235"), "top half should be cream");
    assert!(s.contains("48;2;26;26;30"), "bottom half should be ink");
    assert_eq!(s.matches('\u{2580}').count(), 6);
}

#[test]
fn halfblock_skips_dimension_mismatch() {
    let pixels = solid_pixels(10, 10, [1, 2, 3]);
    let frame = make_frame(10, 5, 10, 9, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn halfblock_reports_short_buffer() {
    let pixels = vec![0u8; 16];
    let frame = make_frame(4, 2, 4, 4, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("pixel buffer too small (need 64, got 16)"));
}

#[test]
fn halfblock_resets_color_cache_each_frame() {
    let pixels = solid_pixels(4, 4, [9, 9, 9]);
    let frame = make_frame(4, 2, 4, 4, &pixels, false);
    let mut renderer = HalfBlockRenderer::new();
    let mut first = Vec::new();
    let mut second = Vec::new();
    renderer.render(&frame, &mut first).unwrap();
    renderer.render(&frame, &mut second).unwrap();
    assert_eq!(first, second);
}

// ── Kitty renderer ──────────────────────────────────────────────────────────

#[test]
fn kitty_transmits_in_protocol_sized_chunks() {
    // 32x32 RGBA is 4096 bytes: one full 3072-byte chunk and one remainder.
    let pixels = solid_pixels(32, 32, [0x63, 0x46, 0xE6]);
    let frame = make_frame(8, 4, 32, 32, &pixels, false);
    let mut out = Vec::new();
    KittyRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b_Ga=T,f=32,s=32,v=32,t=d,i=1,p=1,c=8,r=4,C=1,q=2,z=-1,m=1;"));
    assert!(s.contains("\x1b_Gm=0;"));
    assert_eq!(s.matches("\x1b_G").count(), 2);

    let first_payload = s
        .split("m=1;")
        .nth(1)
        .and_then(|rest| rest.split("\x1b\\").next())
        .unwrap();
    assert_eq!(first_payload.len(), 4096);
}

#[test]
fn kitty_overlay_deletes_the_image() {
    let pixels = solid_pixels(32, 32, [0, 0, 0]);
    let mut frame = make_frame(40, 4, 32, 32, &pixels, false);
    frame.overlay = Some("Scroll Canvas Keys\nq quit");
    let mut out = Vec::new();
    KittyRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b_Ga=d,d=I,i=1\x1b\\"));
    assert!(!s.contains("a=T"));
}

// ── Renderer selection ──────────────────────────────────────────────────────

#[test]
fn renderers_report_their_pixel_density() {
    let ascii = make_renderer(RendererMode::Ascii);
    let half = make_renderer(RendererMode::HalfBlock);
    let kitty = make_renderer(RendererMode::Kitty);
    assert_eq!(ascii.name(), "ascii");
    assert_eq!(half.name(), "halfblock");
    assert_eq!(kitty.name(), "kitty");
    assert_eq!(pixel_dims(&*ascii, 80, 20), (80, 20));
    assert_eq!(pixel_dims(&*half, 80, 20), (80, 40));
    assert_eq!(pixel_dims(&*kitty, 80, 20), (320, 160));
}
