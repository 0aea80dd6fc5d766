use crate::capability::probe_runtime;
use crate::config::Config;
use crate::host::HostEnv;
use crate::page::{Page, PageOptions};
use crate::render::{make_renderer, pixel_dims, wrap_chars, Frame, Renderer};
use crate::terminal::TerminalGuard;
use crate::visual::particles::FieldParams;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use std::io::BufWriter;
use std::time::{Duration, Instant};

const ARROW_STEP: f32 = 80.0;
const WHEEL_STEP: f32 = 120.0;
const PAGE_STEP: f32 = 0.9;

/// Pixel and logical dimensions of the visual area for one terminal size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub visual_rows: u16,
    pub pixel_ratio: f32,
    pub logical_width: f32,
    pub logical_height: f32,
}

impl Viewport {
    pub fn measure(cfg: &Config, renderer: &dyn Renderer, size: (u16, u16), hud_rows: u16) -> Self {
        let (cols, rows) = size;
        let visual_rows = rows.saturating_sub(hud_rows).max(1);
        let (pixel_width, pixel_height) = pixel_dims(renderer, cols, visual_rows);
        let pixel_ratio = cfg.device_pixel_ratio(pixel_width, renderer.cols_per_cell());
        Self {
            pixel_width,
            pixel_height,
            visual_rows,
            pixel_ratio,
            logical_width: pixel_width as f32 / pixel_ratio,
            logical_height: pixel_height as f32 / pixel_ratio,
        }
    }

    /// Logical position of the center of a terminal cell.
    pub fn cell_to_logical(&self, cols: u16, col: u16, row: u16) -> (f32, f32) {
        let x = (col as f32 + 0.5) / cols.max(1) as f32 * self.logical_width;
        let y = (row as f32 + 0.5) / self.visual_rows.max(1) as f32 * self.logical_height;
        (x, y)
    }
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let mut report = probe_runtime(&cfg);
    for note in report.notes() {
        log::info!("capability: {note}");
    }

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer = make_renderer(report.renderer);

    let mut last_size = crossterm::terminal::size().context("get terminal size")?;
    if last_size.1 < 2 || last_size.0 < 4 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }

    let mut show_hud = true;
    let mut show_help = false;
    let mut viewport = Viewport::measure(
        &cfg,
        &*renderer,
        last_size,
        hud_rows_for_size(last_size, show_hud),
    );
    report.note_viewport(viewport.logical_width);

    let options = PageOptions {
        env: HostEnv {
            viewport_width: viewport.logical_width,
            viewport_height: viewport.logical_height,
            pixel_ratio: viewport.pixel_ratio,
            reduced_motion: report.reduced_motion,
        },
        field: FieldParams {
            rows: cfg.particle_rows,
            cols: cfg.particle_cols,
            ..FieldParams::default()
        },
        seed: cfg.seed,
        ..PageOptions::default()
    };
    let mut page = Page::new(options, report.shader_backend());
    if cfg.autoplay {
        page.toggle_autoplay(cfg.autoplay_speed);
    }

    let mut pixels: Vec<u8> = Vec::new();
    let mut last_frame = Instant::now();
    let mut fps = FpsCounter::new();
    let mut last_page_ms = 0.0f32;
    let mut last_render_ms = 0.0f32;
    let probe_label = report.status_label();

    loop {
        let now = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    if handle_key(
                        k.code,
                        k.modifiers,
                        &mut page,
                        cfg.autoplay_speed,
                        &mut show_hud,
                        &mut show_help,
                    ) {
                        log::info!("quit requested");
                        return Ok(());
                    }
                }
                Event::Mouse(m) => match m.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        if m.row < viewport.visual_rows {
                            let (x, y) = viewport.cell_to_logical(last_size.0, m.column, m.row);
                            page.pointer_move(x, y);
                        }
                    }
                    MouseEventKind::ScrollDown => page.scroll_by(WHEEL_STEP),
                    MouseEventKind::ScrollUp => page.scroll_by(-WHEEL_STEP),
                    _ => {}
                },
                Event::Resize(c, r) => last_size = (c, r),
                _ => {}
            }
        }

        // Resize events can be missed in some terminals.
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
        }

        let (term_cols, term_rows) = last_size;
        let status = page.status();
        let hud = if show_hud {
            build_wrapped_hud(
                term_cols as usize,
                &status.summary(),
                renderer.name(),
                &probe_label,
                fps.fps(),
                last_page_ms,
                last_render_ms,
            )
        } else {
            String::new()
        };
        let hud_rows = hud_rows_for_text(term_rows, show_hud, &hud);

        let next = Viewport::measure(&cfg, &*renderer, last_size, hud_rows);
        if next != viewport {
            viewport = next;
            page.resize(viewport.logical_width, viewport.logical_height, viewport.pixel_ratio);
        }

        let dt = now.duration_since(last_frame).as_secs_f32().max(1e-6);
        last_frame = now;

        let page_start = Instant::now();
        page.frame(dt);
        page.composite(viewport.pixel_width, viewport.pixel_height, &mut pixels);
        last_page_ms = page_start.elapsed().as_secs_f32() * 1000.0;

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows: viewport.visual_rows,
            pixel_width: viewport.pixel_width,
            pixel_height: viewport.pixel_height,
            pixels_rgba: &pixels,
            hud: &hud,
            hud_rows,
            overlay: show_help.then(help_popup_text),
            sync_updates: cfg.sync_updates,
        };

        let render_start = Instant::now();
        renderer.render(&frame, &mut out)?;
        last_render_ms = render_start.elapsed().as_secs_f32() * 1000.0;

        fps.tick();

        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

fn handle_key(
    code: KeyCode,
    mods: KeyModifiers,
    page: &mut Page,
    autoplay_speed: f32,
    show_hud: &mut bool,
    show_help: &mut bool,
) -> bool {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return true;
    }
    let viewport_height = page.layout().viewport_height;

    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Down | KeyCode::Char('j') => page.scroll_by(ARROW_STEP),
        KeyCode::Up | KeyCode::Char('k') => page.scroll_by(-ARROW_STEP),
        KeyCode::PageDown | KeyCode::Char(' ') => page.scroll_by(viewport_height * PAGE_STEP),
        KeyCode::PageUp => page.scroll_by(-viewport_height * PAGE_STEP),
        KeyCode::Home => page.scroll_to(0.0),
        KeyCode::End => page.scroll_to(page.layout().limit()),
        KeyCode::Char('a') | KeyCode::Char('A') => {
            let on = page.toggle_autoplay(autoplay_speed);
            log::info!("autoplay {}", if on { "on" } else { "off" });
        }
        KeyCode::Char('m') | KeyCode::Char('M') => {
            let on = !page.host().env().reduced_motion;
            page.set_reduced_motion(on);
            log::info!("reduced motion {}", if on { "on" } else { "off" });
        }
        KeyCode::Char('h') | KeyCode::Char('H') => *show_hud = !*show_hud,
        KeyCode::Char('?') | KeyCode::F(1) => *show_help = !*show_help,
        _ => {}
    }
    false
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud || size.1 <= 1 {
        return 0;
    }
    (size.1 - 1).min(3)
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    (hud.lines().count() as u16).min(term_rows.saturating_sub(1))
}

fn build_wrapped_hud(
    cols: usize,
    page_summary: &str,
    renderer_name: &str,
    probe_label: &str,
    fps: f32,
    page_ms: f32,
    render_ms: f32,
) -> String {
    let logical_lines = [
        page_summary.to_string(),
        format!(
            "Renderer: {renderer_name} | Probe: {probe_label} | FPS: {fps:>4.1} | ms(P/R): {page_ms:>4.1}/{render_ms:>4.1}"
        ),
        "Keys: up/down/pgup/pgdn/wheel scroll | home/end | a autoplay | m reduced motion | h HUD | ? help | q quit".to_string(),
    ];
    logical_lines
        .iter()
        .flat_map(|line| wrap_chars(line, cols))
        .collect::<Vec<_>>()
        .join("\n")
}

fn help_popup_text() -> &'static str {
    "Scroll Canvas Keys\n\
up/down or j/k  scroll a little\n\
pgup/pgdn or space  scroll one screen\n\
mouse wheel  scroll\n\
home/end  jump to top/bottom\n\
mouse move  steer the gradient warp\n\
a  toggle autoplay\n\
m  toggle reduced motion (remounts the gradient)\n\
h  show/hide HUD\n\
? or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
