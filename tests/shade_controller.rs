use kiosk_shade::anim::SLIDE_DURATION;
use kiosk_shade::gesture::SwipeConfig;
use kiosk_shade::shade::ShadeController;
use kiosk_shade::system::{MockSettingsBackend, MockSettingsHandle, SettingsService};
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_millis(5000);

fn controller_with(
    brightness: Option<u8>,
    volume: Option<u8>,
) -> (ShadeController, MockSettingsHandle) {
    let (backend, handle) = MockSettingsBackend::new();
    handle.set_brightness_reading(brightness);
    handle.set_volume_reading(volume);
    let service = SettingsService::with_backend(Box::new(backend));
    let controller = ShadeController::new(SwipeConfig::default(), TIMEOUT, service);
    (controller, handle)
}

/// The fetch crosses a worker thread; poll until its result lands.
fn wait_initialized(controller: &mut ShadeController, now: Instant) {
    for _ in 0..200 {
        controller.tick(now);
        if controller.is_initialized() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("settings fetch never completed");
}

fn wait_for<F: FnMut() -> bool>(mut predicate: F) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition never became true");
}

#[test]
fn swipe_open_fetches_settings() {
    let (mut controller, _handle) = controller_with(Some(42), Some(17));
    let now = Instant::now();

    controller.touch_start(10.0, now);
    controller.touch_move(80.0, now);
    assert!(controller.is_open());
    controller.touch_end(now);

    assert!(controller.is_open());
    wait_initialized(&mut controller, now);
    assert_eq!(controller.brightness(), 42);
    assert_eq!(controller.volume(), 17);
}

#[test]
fn read_failures_fall_back_to_defaults() {
    let (mut controller, _handle) = controller_with(None, None);
    let now = Instant::now();

    controller.show(now);
    wait_initialized(&mut controller, now);
    assert!(controller.is_open());
    assert_eq!(controller.brightness(), 50);
    assert_eq!(controller.volume(), 50);
}

#[test]
fn read_failures_are_independent() {
    let (mut controller, _handle) = controller_with(Some(80), None);
    let now = Instant::now();

    controller.show(now);
    wait_initialized(&mut controller, now);
    assert_eq!(controller.brightness(), 80);
    assert_eq!(controller.volume(), 50);
}

#[test]
fn changes_apply_optimistically_and_push() {
    let (mut controller, handle) = controller_with(Some(50), Some(50));
    let now = Instant::now();

    controller.show(now);
    controller.set_volume(30, now);
    assert_eq!(controller.volume(), 30);
    wait_for(|| handle.volume_pushes() == vec![30]);
}

#[test]
fn push_failure_keeps_optimistic_value() {
    let (mut controller, handle) = controller_with(Some(50), Some(50));
    handle.fail_writes(true);
    let now = Instant::now();

    controller.show(now);
    controller.set_brightness(70, now);
    assert_eq!(controller.brightness(), 70);
    std::thread::sleep(Duration::from_millis(50));
    assert!(handle.brightness_pushes().is_empty());
    assert_eq!(controller.brightness(), 70);
}

#[test]
fn brightness_never_goes_fully_dark() {
    let (mut controller, handle) = controller_with(Some(50), Some(50));
    let now = Instant::now();

    controller.show(now);
    controller.set_brightness(0, now);
    assert_eq!(controller.brightness(), 5);
    wait_for(|| handle.brightness_pushes() == vec![5]);
}

#[test]
fn inactivity_timer_dismisses_at_deadline() {
    let (mut controller, _handle) = controller_with(Some(50), Some(50));
    let t0 = Instant::now();

    controller.show(t0);
    controller.tick(t0 + Duration::from_millis(4999));
    assert!(controller.is_open());

    controller.tick(t0 + TIMEOUT);
    assert!(!controller.is_open());
}

#[test]
fn interaction_rearms_timer_from_last_touch() {
    let (mut controller, _handle) = controller_with(Some(50), Some(50));
    let t0 = Instant::now();

    controller.show(t0);
    controller.set_volume(60, t0 + Duration::from_secs(3));

    // The deadline armed at activation (t0 + 5s) has passed; the re-armed
    // one has not.
    controller.tick(t0 + Duration::from_millis(5500));
    assert!(controller.is_open());

    // Exactly five seconds after the last interaction it fires.
    controller.tick(t0 + Duration::from_secs(3) + TIMEOUT);
    assert!(!controller.is_open());
}

#[test]
fn pointer_down_on_control_counts_as_activity() {
    let (mut controller, _handle) = controller_with(Some(50), Some(50));
    let t0 = Instant::now();

    controller.show(t0);
    controller.note_interaction(t0 + Duration::from_secs(4));

    controller.tick(t0 + Duration::from_millis(5500));
    assert!(controller.is_open());
    controller.tick(t0 + Duration::from_secs(4) + TIMEOUT);
    assert!(!controller.is_open());
}

#[test]
fn dismiss_keeps_cached_values_for_reopen() {
    let (mut controller, handle) = controller_with(Some(80), Some(20));
    let now = Instant::now();

    controller.show(now);
    wait_initialized(&mut controller, now);
    controller.dismiss(now);
    assert!(!controller.is_open());

    // Next activation reads fresh values, but the cache renders instantly
    // while that round-trip is in flight.
    handle.set_brightness_reading(Some(35));
    controller.show(now);
    assert_eq!(controller.brightness(), 80);
    wait_for(|| {
        controller.tick(now);
        controller.brightness() == 35
    });
}

#[test]
fn apps_screen_replaces_shade_and_suppresses_gestures() {
    let (mut controller, _handle) = controller_with(Some(50), Some(50));
    let t0 = Instant::now();

    controller.show(t0);
    controller.open_apps(t0);
    assert!(controller.apps_open());

    // Gesture input is ignored wholesale while the apps screen is up.
    controller.touch_start(10.0, t0);
    assert!(!controller.is_dragging());
    controller.touch_move(200.0, t0);
    controller.touch_end(t0);
    assert!(controller.is_open());
    assert!(controller.apps_open());

    // So is the inactivity deadline.
    controller.tick(t0 + Duration::from_secs(60));
    assert!(controller.is_open());

    // Its close action exits to fully closed, not back to the shade.
    controller.close_apps(t0 + Duration::from_secs(61));
    assert!(!controller.apps_open());
    assert!(!controller.is_open());
}

#[test]
fn apps_screen_requires_open_shade() {
    let (mut controller, _handle) = controller_with(Some(50), Some(50));
    let now = Instant::now();

    controller.open_apps(now);
    assert!(!controller.apps_open());
}

#[test]
fn drag_tracks_finger_then_settles_with_easing() {
    let (mut controller, _handle) = controller_with(Some(50), Some(50));
    let t0 = Instant::now();

    controller.touch_start(10.0, t0);
    controller.touch_move(110.0, t0);
    // 1:1 while the finger is down.
    assert_eq!(controller.visual_progress(t0), 0.5);

    controller.touch_move(150.0, t0);
    controller.touch_end(t0);
    // Settling starts from the release position, not a snap.
    assert_eq!(controller.visual_progress(t0), 0.7);
    let mid = controller.visual_progress(t0 + SLIDE_DURATION / 2);
    assert!(mid > 0.7 && mid < 1.0);
    assert_eq!(controller.visual_progress(t0 + SLIDE_DURATION), 1.0);
}

#[test]
fn timer_fire_uses_the_dismissal_path() {
    let (mut controller, _handle) = controller_with(Some(50), Some(50));
    let t0 = Instant::now();

    controller.show(t0);
    let fire = t0 + TIMEOUT;
    controller.tick(fire);
    assert!(!controller.is_open());
    // The panel eases out from fully open rather than vanishing.
    let mid = controller.visual_progress(fire + SLIDE_DURATION / 2);
    assert!(mid > 0.0 && mid < 1.0);
    assert_eq!(controller.visual_progress(fire + SLIDE_DURATION), 0.0);
}
