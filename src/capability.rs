use crate::config::{Config, GradientEngine, RendererMode};
use crate::visual::gradient::MIN_SHADER_VIEWPORT_WIDTH;
use crate::visual::shader::{ShaderBackend, SoftwareBackend, UnavailableBackend};

#[derive(Debug, Clone)]
pub struct CapabilityReport {
    pub auto_probe: bool,
    pub requested_renderer: RendererMode,
    pub requested_gradient: GradientEngine,
    pub renderer: RendererMode,
    pub gradient: GradientEngine,
    pub reduced_motion: bool,
    notes: Vec<String>,
}

impl CapabilityReport {
    pub fn changed(&self) -> bool {
        self.renderer != self.requested_renderer || self.gradient != self.requested_gradient
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Records that the page viewport is too narrow for the animated gradient.
    pub fn note_viewport(&mut self, viewport_width: f32) {
        if viewport_width < MIN_SHADER_VIEWPORT_WIDTH && self.gradient == GradientEngine::Shader {
            self.push_note(format!(
                "viewport {viewport_width:.0} units wide (< {MIN_SHADER_VIEWPORT_WIDTH:.0}); gradient will be static"
            ));
        }
    }

    pub fn status_label(&self) -> String {
        let motion = if self.reduced_motion { ", reduced motion" } else { "" };
        if !self.auto_probe {
            return format!(
                "off (renderer={:?}, gradient={:?}{motion})",
                self.renderer, self.gradient
            );
        }
        if self.changed() {
            return format!(
                "fallback ren {:?}->{:?}, grad {:?}->{:?}{motion}",
                self.requested_renderer, self.renderer, self.requested_gradient, self.gradient
            );
        }
        format!("ok ren={:?}, grad={:?}{motion}", self.renderer, self.gradient)
    }

    /// Backend the gradient asks for a shader context.
    pub fn shader_backend(&self) -> Box<dyn ShaderBackend> {
        match self.gradient {
            GradientEngine::Shader => Box::new(SoftwareBackend),
            GradientEngine::Static => {
                Box::new(UnavailableBackend::new("static gradient selected"))
            }
        }
    }
}

pub fn probe_runtime(cfg: &Config) -> CapabilityReport {
    probe_runtime_with(cfg, |key| std::env::var(key).ok())
}

/// Same as [`probe_runtime`], reading the environment through `lookup`.
pub fn probe_runtime_with(
    cfg: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> CapabilityReport {
    let reduced_motion =
        cfg.reduced_motion || env_flag(&lookup, "SCROLL_CANVAS_REDUCED_MOTION").unwrap_or(false);
    let mut report = CapabilityReport {
        auto_probe: cfg.auto_probe,
        requested_renderer: cfg.renderer,
        requested_gradient: cfg.gradient,
        renderer: cfg.renderer,
        gradient: cfg.gradient,
        reduced_motion,
        notes: Vec::new(),
    };

    if reduced_motion {
        report.push_note("reduced motion requested; gradient will be static");
    }

    if !cfg.auto_probe {
        report.push_note("capability probe disabled by --auto-probe=false");
        return report;
    }

    if cfg.renderer == RendererMode::Kitty && !kitty_graphics_available(&lookup) {
        report.renderer = RendererMode::HalfBlock;
        report.push_note(
            "kitty graphics unavailable in this terminal; falling back to half-block renderer",
        );
    }

    if cfg.gradient == GradientEngine::Shader {
        if env_flag(&lookup, "SCROLL_CANVAS_DISABLE_SHADER").unwrap_or(false) {
            report.gradient = GradientEngine::Static;
            report.push_note("shader disabled by SCROLL_CANVAS_DISABLE_SHADER");
        } else if !truecolor_available(&lookup) && report.renderer != RendererMode::Kitty {
            report.gradient = GradientEngine::Static;
            report.push_note("terminal lacks truecolor; using static gradient");
        }
    }

    if report.notes.is_empty() {
        report.push_note("probe selected requested renderer/gradient with no fallback");
    }

    report
}

fn env_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let v = lookup(key)?;
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn truecolor_available(lookup: &impl Fn(&str) -> Option<String>) -> bool {
    let colorterm = lookup("COLORTERM").unwrap_or_default().to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return true;
    }
    // Terminals that speak the kitty protocol all render 24-bit color.
    kitty_graphics_available(lookup)
}

fn kitty_graphics_available(lookup: &impl Fn(&str) -> Option<String>) -> bool {
    if let Some(forced) = env_flag(lookup, "SCROLL_CANVAS_FORCE_KITTY") {
        return forced;
    }

    if lookup("KITTY_WINDOW_ID").is_some() {
        return true;
    }

    let term = lookup("TERM").unwrap_or_default().to_ascii_lowercase();
    if term.contains("kitty") {
        return true;
    }

    let term_program = lookup("TERM_PROGRAM").unwrap_or_default().to_ascii_lowercase();
    term_program.contains("ghostty") || term_program.contains("kitty")
}
