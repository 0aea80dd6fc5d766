use proptest::prelude::*;
use scroll_canvas::host::{Host, HostEnv};
use scroll_canvas::surface::{RasterSurface, Sizing};
use scroll_canvas::visual::particles::{
    advance_particles, connection_opacity, decay_progress, decay_start, generate,
    render_particles, resilience_at, FieldParams, ParticleCanvas, ParticleField,
};
use std::cell::Cell;
use std::rc::Rc;

fn field_800x450(seed: u64) -> ParticleField {
    let mut field = ParticleField::with_seed(FieldParams::default(), seed);
    field.initialize(800.0, 450.0);
    field
}

fn alpha_sum(surface: &RasterSurface) -> u64 {
    surface.pixels().chunks_exact(4).map(|p| p[3] as u64).sum()
}

// ── Layout ──────────────────────────────────────────────────────────────────

#[test]
fn grid_has_rows_times_cols_particles() {
    let field = field_800x450(1);
    assert_eq!(field.particles().len(), 15);
    assert!(field.particles().iter().all(|p| p.opacity == 1.0));
}

#[test]
fn resilience_is_highest_at_center_and_lowest_at_corners() {
    assert!((resilience_at(400.0, 225.0, 800.0, 450.0) - 1.0).abs() < 1e-6);
    assert!((resilience_at(0.0, 0.0, 800.0, 450.0) - 0.1).abs() < 1e-6);
    assert!((resilience_at(800.0, 450.0, 800.0, 450.0) - 0.1).abs() < 1e-6);
    let mid = resilience_at(600.0, 225.0, 800.0, 450.0);
    assert!(mid > 0.1 && mid < 1.0);
}

#[test]
fn reinitialize_keeps_count_and_resilience() {
    let mut field = ParticleField::with_seed(FieldParams::default(), 99);
    let first: Vec<f32> = field
        .initialize(800.0, 450.0)
        .iter()
        .map(|p| p.resilience)
        .collect();
    let second: Vec<f32> = field
        .initialize(800.0, 450.0)
        .iter()
        .map(|p| p.resilience)
        .collect();
    assert_eq!(first.len(), second.len());
    assert_eq!(first, second);
}

#[test]
fn single_cell_grid_sits_in_the_middle_of_the_span() {
    let params = FieldParams {
        rows: 1,
        cols: 1,
        jitter_x: 0.0,
        jitter_y: 0.0,
        ..FieldParams::default()
    };
    let mut rng = fastrand::Rng::with_seed(3);
    let particles = generate(&params, 800.0, 450.0, &mut rng);
    assert_eq!(particles.len(), 1);
    let p = particles[0];
    assert!((p.x - (800.0 * 0.12 + 0.5 * 800.0 * 0.76)).abs() < 1e-3);
    assert!((p.y - (450.0 * 0.15 + 0.5 * 450.0 * 0.70)).abs() < 1e-3);
}

#[test]
fn same_seed_generates_same_field() {
    let a = field_800x450(42);
    let b = field_800x450(42);
    assert_eq!(a.particles(), b.particles());
}

// ── Decay ───────────────────────────────────────────────────────────────────

#[test]
fn decay_start_scales_resilience() {
    assert!((decay_start(1.0) - 0.6).abs() < 1e-6);
    assert!((decay_start(0.1) - 0.06).abs() < 1e-6);
    assert_eq!(decay_progress(1.0, 0.6), 0.0);
    assert!((decay_progress(1.0, 1.0) - 1.0).abs() < 1e-6);
}

#[test]
fn end_to_end_dissolve_over_a_5x3_grid() {
    let mut field = field_800x450(11);

    field.advance(0.0);
    assert!(field.particles().iter().all(|p| p.opacity == 1.0));

    for p in field.particles() {
        if p.resilience < 0.5 {
            assert!(p.decay_progress(0.3) > 0.0, "outer particle should be decaying");
        }
        if p.resilience > 0.9 {
            assert_eq!(p.decay_progress(0.3), 0.0, "center particle should be intact");
        }
    }

    field.advance(1.0);
    assert!(field.particles().iter().all(|p| p.opacity == 0.0));
}

#[test]
fn reversing_progress_recovers_opacity_gradually() {
    let mut field = field_800x450(5);
    field.advance(1.0);
    field.advance(0.0);
    for p in field.particles() {
        assert!((p.opacity - 0.02).abs() < 1e-6);
    }
    for _ in 0..60 {
        field.advance(0.0);
    }
    assert!(field.particles().iter().all(|p| p.opacity == 1.0));
}

#[test]
fn resting_particles_ease_back_home() {
    let mut field = field_800x450(8);
    for _ in 0..30 {
        field.advance(0.95);
    }
    let moved = field
        .particles()
        .iter()
        .map(|p| (p.x - p.origin_x).hypot(p.y - p.origin_y))
        .fold(0.0f32, f32::max);
    assert!(moved > 1.0);
    for _ in 0..400 {
        field.advance(0.0);
    }
    for p in field.particles() {
        assert!((p.x - p.origin_x).abs() < 0.05 && (p.y - p.origin_y).abs() < 0.05);
    }
}

#[test]
fn out_of_range_progress_is_clamped() {
    let mut a = field_800x450(21);
    let mut b = field_800x450(21);
    a.advance(7.5);
    b.advance(1.0);
    assert_eq!(a.particles(), b.particles());

    let mut c = field_800x450(21);
    c.advance(f32::NAN);
    assert!(c.particles().iter().all(|p| p.opacity == 1.0));
}

// ── Rendering ───────────────────────────────────────────────────────────────

#[test]
fn connection_opacity_vanishes_past_two_thirds() {
    assert!((connection_opacity(0.0) - 0.07).abs() < 1e-6);
    assert!(connection_opacity(0.5) > 0.0);
    assert_eq!(connection_opacity(0.7), 0.0);
    assert_eq!(connection_opacity(1.0), 0.0);
}

#[test]
fn render_draws_discs_at_rest_and_nothing_when_dissolved() {
    let mut field = field_800x450(13);
    let mut surface = RasterSurface::acquire(800.0, 450.0, 1.0).expect("surface");

    field.advance(0.0);
    field.render(&mut surface, 0.0);
    let lit = alpha_sum(&surface);
    assert!(lit > 0);
    let p = field.particles()[7];
    let center = surface
        .pixel(p.x.round() as usize, p.y.round() as usize)
        .expect("in bounds");
    assert!(center[3] > 128);

    surface.clear();
    field.advance(1.0);
    field.render(&mut surface, 1.0);
    assert_eq!(alpha_sum(&surface), 0);
}

#[test]
fn close_neighbors_get_a_connecting_line() {
    let params = FieldParams {
        rows: 2,
        cols: 1,
        jitter_x: 0.0,
        jitter_y: 0.0,
        ..FieldParams::default()
    };
    // 80 units tall: the two lattice points sit 56 apart, inside the 70-unit link distance.
    // 201 wide puts the column on a pixel center.
    let mut rng = fastrand::Rng::with_seed(1);
    let mut particles = generate(&params, 201.0, 80.0, &mut rng);
    advance_particles(&mut particles, 0.0, 1);
    let mut with_link = RasterSurface::acquire(201.0, 80.0, 1.0).expect("surface");
    render_particles(&mut with_link, &particles, 0.0, &params);

    let mid_x = particles[0].x.floor() as usize;
    let mid_y = ((particles[0].y + particles[1].y) * 0.5).round() as usize;
    let px = with_link.pixel(mid_x, mid_y).expect("in bounds");
    assert!(px[3] > 0, "midpoint between linked particles should be painted");

    let mut faded = RasterSurface::acquire(201.0, 80.0, 1.0).expect("surface");
    render_particles(&mut faded, &particles, 0.8, &params);
    assert_eq!(faded.pixel(mid_x, mid_y).expect("in bounds")[3], 0);
}

// ── Host lifecycle ──────────────────────────────────────────────────────────

#[test]
fn canvas_reads_progress_each_tick_and_stops_after_unmount() {
    let mut host = Host::new(HostEnv {
        viewport_width: 800.0,
        viewport_height: 450.0,
        ..HostEnv::default()
    });
    let progress = Rc::new(Cell::new(0.0f32));
    let reads = Rc::new(Cell::new(0u32));
    let (p, r) = (Rc::clone(&progress), Rc::clone(&reads));
    let canvas = ParticleCanvas::mount(
        &host,
        Sizing::Viewport,
        FieldParams::default(),
        fastrand::Rng::with_seed(4),
        move || {
            r.set(r.get() + 1);
            p.get()
        },
    )
    .expect("mounted");

    host.tick(1.0 / 60.0);
    host.tick(1.0 / 60.0);
    assert_eq!(reads.get(), 2);
    assert!(canvas.with_surface(|s| alpha_sum(s)) > 0);

    progress.set(1.0);
    host.tick(1.0 / 60.0);
    assert_eq!(canvas.with_surface(|s| alpha_sum(s)), 0);

    canvas.unmount();
    host.tick(1.0 / 60.0);
    assert_eq!(reads.get(), 3);
    assert_eq!(host.ticker().listener_count(), 0);
    assert_eq!(host.events().listener_count(), 0);
}

#[test]
fn canvas_regenerates_on_resize() {
    let mut host = Host::new(HostEnv {
        viewport_width: 800.0,
        viewport_height: 450.0,
        ..HostEnv::default()
    });
    let canvas = ParticleCanvas::mount(
        &host,
        Sizing::Viewport,
        FieldParams::default(),
        fastrand::Rng::with_seed(4),
        || 0.0,
    )
    .expect("mounted");
    assert_eq!(canvas.with_field(|f| f.size()), (800.0, 450.0));

    host.resize(1200.0, 600.0, 1.0);
    assert_eq!(canvas.with_field(|f| f.size()), (1200.0, 600.0));
    assert_eq!(canvas.with_field(|f| f.particles().len()), 15);
    assert_eq!(canvas.with_surface(|s| s.pixel_size()), (1200, 600));

    // Half the logical size at twice the ratio keeps the device buffer as is.
    host.resize(600.0, 300.0, 2.0);
    assert_eq!(canvas.with_surface(|s| s.pixel_size()), (1200, 600));
    assert_eq!(canvas.with_surface(|s| s.logical_size()), (600.0, 300.0));
    assert_eq!(canvas.with_field(|f| f.size()), (600.0, 300.0));
    assert!(canvas.with_field(|f| f
        .particles()
        .iter()
        .all(|p| p.origin_x <= 600.0 && p.origin_y <= 300.0)));
}

#[test]
fn canvas_declines_to_mount_without_a_surface() {
    let host = Host::new(HostEnv {
        viewport_width: 0.0,
        viewport_height: 450.0,
        ..HostEnv::default()
    });
    let canvas = ParticleCanvas::mount(
        &host,
        Sizing::Viewport,
        FieldParams::default(),
        fastrand::Rng::with_seed(4),
        || 0.0,
    );
    assert!(canvas.is_none());
    assert_eq!(host.ticker().listener_count(), 0);
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn opacity_and_size_stay_bounded(
        seed in any::<u64>(),
        w in 1.0f32..2000.0,
        h in 1.0f32..2000.0,
        steps in proptest::collection::vec(-0.5f32..1.5, 1..40),
    ) {
        let mut field = ParticleField::with_seed(FieldParams::default(), seed);
        field.initialize(w, h);
        for p in steps {
            field.advance(p);
            for pt in field.particles() {
                prop_assert!((0.0..=1.0).contains(&pt.opacity));
                prop_assert!(pt.size >= 0.0 && pt.size.is_finite());
            }
        }
    }

    #[test]
    fn opacity_never_rises_during_a_forward_sweep(
        seed in any::<u64>(),
        mut marks in proptest::collection::vec(0.0f32..=1.0, 2..30),
    ) {
        marks.sort_by(|a, b| a.total_cmp(b));
        let mut field = ParticleField::with_seed(FieldParams::default(), seed);
        field.initialize(800.0, 450.0);
        field.advance(marks[0]);
        let mut prev: Vec<f32> = field.particles().iter().map(|p| p.opacity).collect();
        for &p in &marks[1..] {
            field.advance(p);
            for (pt, before) in field.particles().iter().zip(&prev) {
                if pt.decay_progress(p) > 0.0 {
                    prop_assert!(pt.opacity <= *before + 1e-6);
                }
            }
            prev = field.particles().iter().map(|p| p.opacity).collect();
        }
    }

    #[test]
    fn less_resilient_particles_start_decaying_first(
        r1 in 0.1f32..1.0,
        r2 in 0.1f32..1.0,
    ) {
        prop_assume!(r2 - r1 > 1e-4);
        prop_assert!(decay_start(r1) < decay_start(r2));
        let probe = (decay_start(r1) + decay_start(r2)) * 0.5;
        prop_assert!(decay_progress(r1, probe) > 0.0);
        prop_assert_eq!(decay_progress(r2, probe), 0.0);
    }

    #[test]
    fn reinitialize_is_idempotent_in_count_and_resilience(
        seed in any::<u64>(),
        w in 1.0f32..3000.0,
        h in 1.0f32..3000.0,
    ) {
        let mut field = ParticleField::with_seed(FieldParams::default(), seed);
        let a: Vec<f32> = field.initialize(w, h).iter().map(|p| p.resilience).collect();
        let b: Vec<f32> = field.initialize(w, h).iter().map(|p| p.resilience).collect();
        prop_assert_eq!(a, b);
    }
}
