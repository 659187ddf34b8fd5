/// Tuning for the top-edge swipe gesture. Distances are in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    /// Distance from the top edge within which a touch can start an opening gesture.
    pub edge_threshold: f32,
    /// Downward travel that commits an opening gesture before release.
    pub activation_distance: f32,
    /// Travel mapped onto the full progress range 0..=1.
    pub max_overlay_height: f32,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 40.0,
            activation_distance: 60.0,
            max_overlay_height: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeEvent {
    Activated,
    Dismissed,
}

/// Recognizes the swipe-down-to-open / swipe-up-to-dismiss gesture of the
/// system shade from a stream of vertical touch coordinates.
///
/// Feed it `touch_start`/`touch_move`/`touch_end`; read back
/// `is_active`/`progress`/`is_dragging`. Whenever no drag is in flight,
/// `progress` is exactly 0.0 or 1.0 and agrees with `is_active`.
/// Only the first touch point owns a gesture; additional concurrent
/// touches are ignored rather than disambiguated.
#[derive(Debug)]
pub struct SwipeTracker {
    config: SwipeConfig,
    active: bool,
    progress: f32,
    armed: bool,
    start_y: f32,
    was_active: bool,
}

impl SwipeTracker {
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            active: false,
            progress: 0.0,
            armed: false,
            start_y: 0.0,
            was_active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_dragging(&self) -> bool {
        self.armed
    }

    /// Accept a touch as the start of a gesture when it lands within
    /// `edge_threshold` of the top edge (shade closed) or anywhere on the
    /// panel (shade open, drag-to-dismiss). Anything else is ignored.
    ///
    /// The open/closed state is snapshotted here; the snapshot, not the
    /// live state, decides how the rest of the sequence is interpreted.
    pub fn touch_start(&mut self, y: f32) {
        if self.armed {
            return;
        }
        if self.active {
            self.armed = true;
            self.start_y = y;
            self.was_active = true;
        } else if y <= self.config.edge_threshold {
            self.armed = true;
            self.start_y = y;
            self.was_active = false;
        }
    }

    /// Track finger travel. Progress follows raw pixel delta 1:1 so the
    /// panel stays attached to the finger; no time component.
    ///
    /// An opening drag flips the shade active the instant it travels
    /// `activation_distance`, mid-drag, while the drag keeps going.
    pub fn touch_move(&mut self, y: f32) -> Option<SwipeEvent> {
        if !self.armed {
            return None;
        }
        let delta = y - self.start_y;
        if self.was_active {
            // Dismiss gesture: only upward travel counts.
            if delta < 0.0 {
                self.progress = (1.0 + delta / self.config.max_overlay_height).clamp(0.0, 1.0);
            }
            None
        } else {
            // Open gesture: only downward travel counts.
            if delta <= 0.0 {
                return None;
            }
            self.progress = (delta / self.config.max_overlay_height).clamp(0.0, 1.0);
            if delta >= self.config.activation_distance && !self.active {
                self.active = true;
                return Some(SwipeEvent::Activated);
            }
            None
        }
    }

    /// Resolve the gesture at release. Release-time progress is
    /// authoritative: past 0.5 an opening gesture commits open, below 0.5
    /// a dismiss gesture commits closed, anything else snaps back to the
    /// state the gesture started from.
    pub fn touch_end(&mut self) -> Option<SwipeEvent> {
        if !self.armed {
            return None;
        }
        self.armed = false;
        let was_active = self.was_active;
        self.was_active = false;

        if self.progress > 0.5 && !was_active {
            self.settle(true)
        } else if self.progress < 0.5 && was_active {
            self.settle(false)
        } else {
            self.settle(was_active)
        }
    }

    /// Open the shade without a gesture (keyboard toggle, tests).
    pub fn show(&mut self) -> Option<SwipeEvent> {
        self.armed = false;
        self.was_active = false;
        self.settle(true)
    }

    /// Close the shade without a gesture. No-op when already closed.
    pub fn dismiss(&mut self) -> Option<SwipeEvent> {
        self.armed = false;
        self.was_active = false;
        self.settle(false)
    }

    fn settle(&mut self, open: bool) -> Option<SwipeEvent> {
        let previously = self.active;
        self.active = open;
        self.progress = if open { 1.0 } else { 0.0 };
        match (previously, open) {
            (false, true) => Some(SwipeEvent::Activated),
            (true, false) => Some(SwipeEvent::Dismissed),
            _ => None,
        }
    }
}
