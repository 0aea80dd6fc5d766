use std::time::Instant;

use anyhow::Result;
use scroll_canvas::surface::RasterSurface;
use scroll_canvas::visual::gradient::{GradientParams, GradientProgram, GradientUniforms};
use scroll_canvas::visual::marquee::{CouplerParams, TrackLayout, VelocityCoupler};
use scroll_canvas::visual::particles::{FieldParams, ParticleField};
use scroll_canvas::visual::shader::{ShaderBackend, SoftwareBackend};

const TARGET_MS: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Particles,
    Gradient,
    Marquee,
    All,
}

struct Args {
    mode: Mode,
    frames: usize,
    w: f32,
    h: f32,
    ratio: f32,
    rows: usize,
    cols: usize,
    seed: u64,
    max_ms: Option<f64>,
}

fn parse_args() -> Args {
    let mut args = Args {
        mode: Mode::All,
        frames: 240,
        w: 800.0,
        h: 450.0,
        ratio: 1.0,
        rows: 3,
        cols: 5,
        seed: 7,
        max_ms: None,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--mode", Some("particles")) => args.mode = Mode::Particles,
            ("--mode", Some("gradient")) => args.mode = Mode::Gradient,
            ("--mode", Some("marquee")) => args.mode = Mode::Marquee,
            ("--mode", Some("all")) => args.mode = Mode::All,
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<f32>() {
                    args.w = n.max(1.0);
                }
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<f32>() {
                    args.h = n.max(1.0);
                }
            }
            ("--ratio", Some(x)) => {
                if let Ok(n) = x.parse::<f32>() {
                    args.ratio = n;
                }
            }
            ("--rows", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.rows = n.max(1);
                }
            }
            ("--cols", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.cols = n.max(1);
                }
            }
            ("--seed", Some(x)) => {
                if let Ok(n) = x.parse::<u64>() {
                    args.seed = n;
                }
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = Some(v.max(0.01));
                }
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    args
}

/// Mean and 95th percentile of per-frame milliseconds.
fn summarize(samples: &mut [f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    samples.sort_by(|a, b| a.total_cmp(b));
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let idx = ((samples.len() as f64 * 0.95).ceil() as usize).clamp(1, samples.len()) - 1;
    (mean, samples[idx])
}

/// Progress sweeping 0 -> 1 -> 0 over the run, like scrolling through the pin and back.
fn sweep(frame: usize, frames: usize) -> f32 {
    let t = frame as f32 / frames.max(1) as f32;
    1.0 - (2.0 * t - 1.0).abs()
}

fn bench_particles(args: &Args) -> Result<Vec<f64>> {
    let params = FieldParams {
        rows: args.rows,
        cols: args.cols,
        ..FieldParams::default()
    };
    let mut field = ParticleField::with_seed(params, args.seed);
    field.initialize(args.w, args.h);
    let mut surface = RasterSurface::acquire(args.w, args.h, args.ratio)
        .ok_or_else(|| anyhow::anyhow!("empty surface {}x{}", args.w, args.h))?;

    let mut samples = Vec::with_capacity(args.frames);
    for f in 0..args.frames {
        let p = sweep(f, args.frames);
        let start = Instant::now();
        surface.clear();
        field.advance(p);
        field.render(&mut surface, p);
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    Ok(samples)
}

fn bench_gradient(args: &Args) -> Result<Vec<f64>> {
    let mut ctx = SoftwareBackend.create_context(args.w, args.h, args.ratio)?;
    let program = GradientProgram::new(GradientParams::default());
    let mut uniforms = GradientUniforms::default();
    uniforms.set_pointer(0.8, 0.3);

    let mut samples = Vec::with_capacity(args.frames);
    for f in 0..args.frames {
        let start = Instant::now();
        uniforms.step(f as f32 / 60.0, program.params().mouse_ease);
        let u = uniforms;
        ctx.draw(&|x, y| program.shade(x, y, &u))?;
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    ctx.release();
    Ok(samples)
}

fn bench_marquee(args: &Args) -> Result<Vec<f64>> {
    let band = 96.0;
    let track = TrackLayout::standard(band);
    let mut coupler = VelocityCoupler::new(CouplerParams::default());
    let mut surface = RasterSurface::acquire(args.w, band, args.ratio)
        .ok_or_else(|| anyhow::anyhow!("empty surface {}x{}", args.w, band))?;

    let mut samples = Vec::with_capacity(args.frames);
    for f in 0..args.frames {
        if f % 10 == 0 {
            coupler.sample_velocity(sweep(f, args.frames) * 2400.0);
        }
        let start = Instant::now();
        let offset = coupler.advance(track.half_width());
        track.draw(&mut surface, offset);
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    Ok(samples)
}

fn report(name: &str, mut samples: Vec<f64>, max_ms: Option<f64>) -> bool {
    let (mean, p95) = summarize(&mut samples);
    let verdict = if p95 <= TARGET_MS { "within" } else { "over" };
    println!(
        "{:<10} {:>8.3} ms mean  {:>8.3} ms p95  ({} {:.1} ms budget, {} frames)",
        name,
        mean,
        p95,
        verdict,
        TARGET_MS,
        samples.len()
    );
    match max_ms {
        Some(limit) if p95 > limit => {
            eprintln!("  {name}: p95 {p95:.3} ms > --max-ms {limit:.3}");
            false
        }
        _ => true,
    }
}

fn main() -> Result<()> {
    let args = parse_args();
    println!(
        "frame budget: surface={}x{} ratio={} grid={}x{} frames={}",
        args.w, args.h, args.ratio, args.cols, args.rows, args.frames
    );

    let mut ok = true;
    if matches!(args.mode, Mode::Particles | Mode::All) {
        ok &= report("particles", bench_particles(&args)?, args.max_ms);
    }
    if matches!(args.mode, Mode::Gradient | Mode::All) {
        ok &= report("gradient", bench_gradient(&args)?, args.max_ms);
    }
    if matches!(args.mode, Mode::Marquee | Mode::All) {
        ok &= report("marquee", bench_marquee(&args)?, args.max_ms);
    }

    if !ok {
        anyhow::bail!("frame budget exceeded");
    }
    Ok(())
}
