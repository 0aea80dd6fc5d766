use proptest::prelude::*;
use scroll_canvas::host::{Host, HostEnv};
use scroll_canvas::visual::marquee::{
    CouplerParams, MarqueeBand, TrackLayout, VelocityCoupler, MARQUEE_WORDS, TRACK_COPIES,
};

fn coupler() -> VelocityCoupler {
    VelocityCoupler::new(CouplerParams::default())
}

// ── Multiplier ──────────────────────────────────────────────────────────────

#[test]
fn target_multiplier_is_clamped_between_one_and_five() {
    let c = coupler();
    assert_eq!(c.target_multiplier(0.0), 1.0);
    assert!((c.target_multiplier(400.0) - 2.0).abs() < 1e-6);
    assert!((c.target_multiplier(-800.0) - 3.0).abs() < 1e-6);
    assert_eq!(c.target_multiplier(1.0e9), 5.0);
    assert_eq!(c.target_multiplier(f32::NAN), 1.0);
}

#[test]
fn multiplier_decays_three_percent_of_the_gap_per_frame() {
    let mut c = coupler();
    c.sample_velocity(1600.0);
    assert_eq!(c.multiplier(), 5.0);
    c.advance(1000.0);
    assert!((c.multiplier() - (5.0 - 4.0 * 0.03)).abs() < 1e-5);
}

#[test]
fn samples_between_frames_keep_only_the_latest() {
    let mut c = coupler();
    c.sample_velocity(2000.0);
    c.sample_velocity(400.0);
    c.sample_velocity(0.0);
    c.sample_velocity(800.0);
    assert!((c.multiplier() - 3.0).abs() < 1e-6);
}

#[test]
fn idle_track_moves_at_base_speed() {
    let mut c = coupler();
    for _ in 0..10 {
        c.advance(1000.0);
    }
    assert!((c.position() + 6.0).abs() < 1e-4);
    assert_eq!(c.multiplier(), 1.0);
}

#[test]
fn position_wraps_at_half_the_track() {
    let mut c = VelocityCoupler::new(CouplerParams {
        base_speed: 4.0,
        ..CouplerParams::default()
    });
    for _ in 0..3 {
        c.advance(10.0);
    }
    // -12 wraps back by one half-width.
    assert!((c.position() + 2.0).abs() < 1e-5);
}

#[test]
fn fast_scroll_crosses_the_track_faster() {
    let mut idle = coupler();
    let mut boosted = coupler();
    for _ in 0..30 {
        boosted.sample_velocity(2400.0);
        idle.advance(1.0e6);
        boosted.advance(1.0e6);
    }
    assert!(boosted.position() < idle.position() * 4.0);
}

// ── Track ───────────────────────────────────────────────────────────────────

#[test]
fn track_repeats_the_word_set() {
    let track = TrackLayout::standard(96.0);
    assert_eq!(track.items().len(), MARQUEE_WORDS.len() * TRACK_COPIES);
    for (i, item) in track.items().iter().enumerate() {
        assert_eq!(item.word, MARQUEE_WORDS[i % MARQUEE_WORDS.len()]);
    }
    let half = track.half_width();
    let second_half = &track.items()[track.items().len() / 2];
    assert!((second_half.x - half).abs() < 1e-3);
}

#[test]
fn band_follows_scroll_velocity_and_stops_after_unmount() {
    let mut host = Host::new(HostEnv {
        viewport_width: 800.0,
        viewport_height: 450.0,
        pixel_ratio: 0.5,
        ..HostEnv::default()
    });
    let band = MarqueeBand::mount(&host, 96.0, CouplerParams::default()).expect("mounted");
    host.scroll(120.0, 1200.0);
    assert!((band.coupler().multiplier() - 4.0).abs() < 1e-6);

    host.tick(1.0 / 60.0);
    assert!(band.coupler().position() < 0.0);
    let painted = band.with_surface(|s| s.pixels().chunks_exact(4).all(|p| p[3] == 255));
    assert!(painted);

    band.unmount();
    assert_eq!(host.ticker().listener_count(), 0);
    assert_eq!(host.events().listener_count(), 0);
    host.tick(1.0 / 60.0);
    host.scroll(0.0, 4000.0);
}

#[test]
fn band_surface_follows_viewport_width() {
    let mut host = Host::new(HostEnv {
        viewport_width: 800.0,
        viewport_height: 450.0,
        pixel_ratio: 0.5,
        ..HostEnv::default()
    });
    let band = MarqueeBand::mount(&host, 96.0, CouplerParams::default()).expect("mounted");
    assert_eq!(band.with_surface(|s| s.pixel_size()), (400, 48));
    host.resize(1200.0, 600.0, 0.5);
    assert_eq!(band.with_surface(|s| s.pixel_size()), (600, 48));
    assert!(band.track_width() > 0.0);
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn position_stays_within_half_width(
        half in 1.0f32..5000.0,
        velocities in proptest::collection::vec(prop::option::of(-10_000.0f32..10_000.0), 1..300),
    ) {
        let mut c = coupler();
        for v in velocities {
            if let Some(v) = v {
                c.sample_velocity(v);
            }
            let pos = c.advance(half);
            prop_assert!(pos.abs() < half);
        }
    }

    #[test]
    fn multiplier_stays_in_range_and_decays_monotonically(
        v in -10_000.0f32..10_000.0,
        frames in 1usize..200,
    ) {
        let mut c = coupler();
        c.sample_velocity(v);
        let mut prev = c.multiplier();
        prop_assert!((1.0..=5.0).contains(&prev));
        for _ in 0..frames {
            c.advance(100.0);
            let m = c.multiplier();
            prop_assert!(m >= 1.0 && m <= prev);
            prev = m;
        }
    }
}
