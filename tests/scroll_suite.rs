use proptest::prelude::*;
use scroll_canvas::host::{Host, HostEnv};
use scroll_canvas::progress::{PinRange, ScrollProgressDriver, PIN_FACTOR};
use scroll_canvas::scroll::{ease_out_expo, SmoothScroll, SCROLL_DURATION};

// ── Smooth scroll ───────────────────────────────────────────────────────────

#[test]
fn easing_starts_near_zero_and_lands_on_one() {
    assert!((ease_out_expo(0.0) - 0.001).abs() < 1e-6);
    assert_eq!(ease_out_expo(1.0), 1.0);
    assert!((ease_out_expo(0.5) - 0.96975).abs() < 1e-4);
    assert!(ease_out_expo(0.2) < ease_out_expo(0.3));
}

#[test]
fn scroll_to_eases_and_settles_after_the_duration() {
    let mut s = SmoothScroll::new(1000.0);
    s.scroll_to(500.0);
    assert!(s.is_animating());

    assert!(s.update(SCROLL_DURATION * 0.5));
    assert!((s.offset() - 484.875).abs() < 0.01);
    assert!(s.velocity() > 0.0);

    s.update(SCROLL_DURATION * 0.5);
    assert_eq!(s.offset(), 500.0);
    assert!(!s.is_animating());
    assert!(!s.update(0.016));
    assert_eq!(s.velocity(), 0.0);
}

#[test]
fn targets_are_clamped_to_the_page() {
    let mut s = SmoothScroll::new(1000.0);
    s.scroll_to(5000.0);
    assert_eq!(s.target(), 1000.0);
    s.scroll_by(-100.0);
    assert_eq!(s.target(), 900.0);
    s.scroll_to(-50.0);
    assert_eq!(s.target(), 0.0);
    s.scroll_to(f32::NAN);
    assert_eq!(s.target(), 0.0);
}

#[test]
fn scrolling_up_reports_negative_velocity() {
    let mut s = SmoothScroll::new(1000.0);
    s.jump_to(800.0);
    assert_eq!(s.velocity(), 0.0);
    s.scroll_to(200.0);
    s.update(0.1);
    assert!(s.velocity() < 0.0);
}

#[test]
fn shrinking_the_page_clamps_the_offset() {
    let mut s = SmoothScroll::new(1000.0);
    s.jump_to(900.0);
    s.set_limit(400.0);
    assert_eq!(s.offset(), 400.0);
    assert_eq!(s.target(), 400.0);
    s.set_limit(f32::INFINITY);
    assert_eq!(s.limit(), 0.0);
}

#[test]
fn autoplay_runs_at_constant_speed_and_loops_to_top() {
    let mut s = SmoothScroll::new(100.0);
    s.set_autoplay(Some(50.0));
    assert!(s.update(1.0));
    assert_eq!(s.offset(), 50.0);
    assert!((s.velocity() - 50.0).abs() < 1e-4);

    assert!(s.update(1.0));
    assert_eq!(s.offset(), 0.0);
    assert_eq!(s.velocity(), 0.0);

    s.set_autoplay(None);
    assert!(!s.update(1.0));
}

#[test]
fn autoplay_ignores_non_positive_speeds() {
    let mut s = SmoothScroll::new(100.0);
    s.set_autoplay(Some(0.0));
    assert_eq!(s.autoplay(), None);
    s.set_autoplay(Some(-3.0));
    assert_eq!(s.autoplay(), None);
}

// ── Pin range ───────────────────────────────────────────────────────────────

#[test]
fn pinned_range_spans_the_pin_factor() {
    let r = PinRange::pinned(450.0, 450.0, PIN_FACTOR);
    assert_eq!(r.start, 450.0);
    assert_eq!(r.end, 1575.0);
    assert_eq!(r.progress_at(0.0), 0.0);
    assert_eq!(r.progress_at(450.0), 0.0);
    assert!((r.progress_at(1012.5) - 0.5).abs() < 1e-6);
    assert_eq!(r.progress_at(1575.0), 1.0);
    assert_eq!(r.progress_at(9000.0), 1.0);
    assert_eq!(r.progress_at(f32::NAN), 0.0);
}

#[test]
fn degenerate_range_is_a_step() {
    let r = PinRange::new(100.0, 100.0);
    assert_eq!(r.progress_at(99.0), 0.0);
    assert_eq!(r.progress_at(100.0), 1.0);
    let inverted = PinRange::new(100.0, 50.0);
    assert_eq!(inverted.progress_at(75.0), 0.0);
}

// ── Driver ──────────────────────────────────────────────────────────────────

#[test]
fn driver_publishes_to_every_handle() {
    let driver = ScrollProgressDriver::new(PinRange::new(100.0, 200.0));
    let handle = driver.handle();
    let getter = driver.getter();
    assert_eq!(driver.progress(), 0.0);

    assert_eq!(driver.update(150.0), 0.5);
    assert_eq!(handle.get(), 0.5);
    assert_eq!(getter(), 0.5);
    assert_eq!(driver.clone().progress(), 0.5);
}

#[test]
fn new_range_is_applied_to_the_last_offset() {
    let driver = ScrollProgressDriver::new(PinRange::new(100.0, 200.0));
    driver.update(150.0);
    driver.set_range(PinRange::new(0.0, 300.0));
    assert!((driver.progress() - 0.5).abs() < 1e-6);

    driver.update(f32::NAN);
    assert!((driver.progress() - 0.5).abs() < 1e-6);
}

#[test]
fn attached_driver_follows_host_scroll_until_dropped() {
    let host = Host::new(HostEnv::default());
    let driver = ScrollProgressDriver::new(PinRange::new(0.0, 400.0));
    let sub = driver.attach(&host);

    host.scroll(100.0, 0.0);
    assert!((driver.progress() - 0.25).abs() < 1e-6);
    host.pointer_move(10.0, 10.0);
    assert!((driver.progress() - 0.25).abs() < 1e-6);

    drop(sub);
    host.scroll(400.0, 0.0);
    assert!((driver.progress() - 0.25).abs() < 1e-6);
    assert_eq!(host.events().listener_count(), 0);
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn progress_is_bounded_and_monotonic(
        start in -1000.0f32..1000.0,
        span in 0.0f32..5000.0,
        a in -10_000.0f32..10_000.0,
        b in -10_000.0f32..10_000.0,
    ) {
        let r = PinRange::new(start, start + span);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let p_lo = r.progress_at(lo);
        let p_hi = r.progress_at(hi);
        prop_assert!((0.0..=1.0).contains(&p_lo));
        prop_assert!((0.0..=1.0).contains(&p_hi));
        prop_assert!(p_lo <= p_hi);
    }

    #[test]
    fn offset_never_leaves_the_page(
        limit in 0.0f32..5000.0,
        moves in proptest::collection::vec((-3000.0f32..3000.0, 0.0f32..0.5), 1..60),
    ) {
        let mut s = SmoothScroll::new(limit);
        for (delta, dt) in moves {
            s.scroll_by(delta);
            s.update(dt);
            prop_assert!(s.offset() >= 0.0 && s.offset() <= limit);
        }
    }
}
