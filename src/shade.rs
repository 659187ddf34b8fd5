use crate::anim::SlideAnimation;
use crate::gesture::{SwipeConfig, SwipeEvent, SwipeTracker};
use crate::system::{FetchedSettings, SettingsService};
use std::time::{Duration, Instant};

/// Substituted for a brightness or volume reading that failed.
const FALLBACK_LEVEL: u8 = 50;

/// The system shade: swipe recognizer output bound to the panel, the
/// inactivity deadline, the cached brightness/volume pair, and the
/// quick-launch sub-state.
///
/// All time-sensitive operations take an explicit `now` so behavior is
/// deterministic under test. Everything here runs on the UI thread; the
/// settings backend is only ever reached through the worker owned by
/// [`SettingsService`].
pub struct ShadeController {
    tracker: SwipeTracker,
    service: SettingsService,
    dismiss_after: Duration,
    /// Single outstanding deadline; re-arming is a plain assignment so a
    /// stale timer can never coexist with the fresh one.
    deadline: Option<Instant>,
    brightness: u8,
    volume: u8,
    initialized: bool,
    apps_open: bool,
    anim: Option<SlideAnimation>,
}

impl ShadeController {
    pub fn new(config: SwipeConfig, dismiss_after: Duration, service: SettingsService) -> Self {
        Self {
            tracker: SwipeTracker::new(config),
            service,
            dismiss_after,
            deadline: None,
            brightness: FALLBACK_LEVEL,
            volume: FALLBACK_LEVEL,
            initialized: false,
            apps_open: false,
            anim: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.tracker.is_active()
    }

    pub fn is_dragging(&self) -> bool {
        self.tracker.is_dragging()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn apps_open(&self) -> bool {
        self.apps_open
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Panel open-ness as rendered: raw drag progress while the finger is
    /// down, the easing curve after release, the resting value otherwise.
    pub fn visual_progress(&self, now: Instant) -> f32 {
        if self.tracker.is_dragging() {
            return self.tracker.progress();
        }
        if let Some(anim) = &self.anim {
            return anim.value(now);
        }
        self.tracker.progress()
    }

    pub fn touch_start(&mut self, y: f32, _now: Instant) {
        if self.apps_open {
            return;
        }
        self.tracker.touch_start(y);
        if self.tracker.is_dragging() {
            // The finger owns the panel; any settle animation is stale.
            self.anim = None;
        }
    }

    pub fn touch_move(&mut self, y: f32, now: Instant) {
        if self.apps_open {
            return;
        }
        let event = self.tracker.touch_move(y);
        self.handle_event(event, now);
    }

    pub fn touch_end(&mut self, now: Instant) {
        if self.apps_open {
            return;
        }
        if !self.tracker.is_dragging() {
            return;
        }
        let from = self.tracker.progress();
        let event = self.tracker.touch_end();
        self.handle_event(event, now);
        self.settle_from(from, now);
        // Releasing a gesture on a panel that stays open is activity too;
        // without this a long drag could expire the shade on release.
        if self.tracker.is_active() {
            self.arm_deadline(now);
        }
    }

    /// Open without a gesture (keyboard toggle).
    pub fn show(&mut self, now: Instant) {
        if self.apps_open {
            return;
        }
        let from = self.visual_progress(now);
        let event = self.tracker.show();
        self.handle_event(event, now);
        self.settle_from(from, now);
    }

    /// Close the shade; used by swipe-up commit, the backdrop tap, the
    /// keyboard toggle, and the inactivity timer alike. No-op when closed.
    pub fn dismiss(&mut self, now: Instant) {
        let from = self.visual_progress(now);
        let event = self.tracker.dismiss();
        self.handle_event(event, now);
        self.settle_from(from, now);
    }

    /// A pointer-down on a control counts as activity even if it does not
    /// change a value.
    pub fn note_interaction(&mut self, now: Instant) {
        if self.tracker.is_active() && !self.apps_open {
            self.arm_deadline(now);
        }
    }

    /// Optimistic: the cached value changes immediately, the push happens
    /// on the worker, and a push failure is logged without rollback.
    pub fn set_brightness(&mut self, level: u8, now: Instant) {
        let level = level.clamp(5, 100);
        self.brightness = level;
        self.service.push_brightness(level);
        self.arm_deadline(now);
    }

    pub fn set_volume(&mut self, level: u8, now: Instant) {
        let level = level.min(100);
        self.volume = level;
        self.service.push_volume(level);
        self.arm_deadline(now);
    }

    /// Enter the quick-launch screen. Only reachable from the open shade;
    /// suspends the inactivity deadline and suppresses gesture handling
    /// until closed.
    pub fn open_apps(&mut self, _now: Instant) {
        if !self.tracker.is_active() || self.apps_open {
            return;
        }
        self.apps_open = true;
        self.deadline = None;
    }

    /// The quick-launch screen's own close action; exits to the closed
    /// state, not back to the open shade.
    pub fn close_apps(&mut self, now: Instant) {
        if !self.apps_open {
            return;
        }
        self.apps_open = false;
        self.dismiss(now);
        // The panel was hidden behind the apps screen; no slide-out.
        self.anim = None;
    }

    /// Once-per-frame upkeep: drain fetch results and fire the deadline.
    pub fn tick(&mut self, now: Instant) {
        while let Some(fetched) = self.service.poll_fetched() {
            self.apply_fetched(fetched);
        }
        if self.anim.map_or(false, |anim| anim.is_finished(now)) {
            self.anim = None;
        }
        if let Some(deadline) = self.deadline {
            if now >= deadline
                && self.tracker.is_active()
                && !self.tracker.is_dragging()
                && !self.apps_open
            {
                tracing::debug!("inactivity timeout, dismissing shade");
                self.dismiss(now);
            }
        }
    }

    /// How soon the next repaint is needed, if at all. `Some(0)` while a
    /// drag or settle animation is live.
    pub fn repaint_hint(&self, now: Instant) -> Option<Duration> {
        if self.tracker.is_dragging() {
            return Some(Duration::ZERO);
        }
        if let Some(anim) = &self.anim {
            if !anim.is_finished(now) {
                return Some(Duration::ZERO);
            }
        }
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    fn handle_event(&mut self, event: Option<SwipeEvent>, now: Instant) {
        match event {
            Some(SwipeEvent::Activated) => {
                self.service.request_fetch();
                self.arm_deadline(now);
            }
            Some(SwipeEvent::Dismissed) => {
                self.deadline = None;
            }
            None => {}
        }
    }

    fn apply_fetched(&mut self, fetched: FetchedSettings) {
        self.brightness = fetched.brightness.unwrap_or(FALLBACK_LEVEL);
        self.volume = fetched.volume.unwrap_or(FALLBACK_LEVEL);
        self.initialized = true;
    }

    fn arm_deadline(&mut self, now: Instant) {
        self.deadline = Some(now + self.dismiss_after);
    }

    fn settle_from(&mut self, from: f32, now: Instant) {
        let target = self.tracker.progress();
        if (from - target).abs() < f32::EPSILON {
            self.anim = None;
        } else {
            self.anim = Some(SlideAnimation::new(from, target, now));
        }
    }
}
