//! Activation-edge tracking. A detector's raw per-tick boolean is never
//! logged directly — it must first clear a grace window (either a frame
//! count or a wall-clock duration), and even then only the false→true
//! transition of that filtered signal produces an activation (§8 property
//! "a WarningLog entry is created at most once per activation, not per
//! frame").

use chrono::{DateTime, Utc};

/// Sustains a raw boolean over a fixed number of consecutive `true` ticks
/// before activating. Used for frame-counted detectors (`LOW_CONCENTRATION`)
/// and for zero-grace detectors by passing `required_frames = 1`.
#[derive(Debug, Clone)]
pub struct FrameSustainTracker {
    required_frames: u32,
    consecutive: u32,
    active: bool,
}

impl FrameSustainTracker {
    pub fn new(required_frames: u32) -> Self {
        Self {
            required_frames: required_frames.max(1),
            consecutive: 0,
            active: false,
        }
    }

    /// Feeds one raw observation. Returns `true` exactly on the tick where
    /// the filtered signal transitions from inactive to active.
    pub fn observe(&mut self, raw: bool) -> bool {
        if !raw {
            self.consecutive = 0;
            self.active = false;
            return false;
        }
        self.consecutive += 1;
        if self.consecutive >= self.required_frames && !self.active {
            self.active = true;
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Sustains a raw boolean over a wall-clock duration before activating.
/// Used for time-based detectors (`NO_PERSON`, `EXCESSIVE_NOISE`,
/// `MULTIPLE_SPEAKERS`). The caller supplies `now` explicitly so this stays
/// deterministic and testable without real sleeps.
#[derive(Debug, Clone)]
pub struct DurationSustainTracker {
    required: chrono::Duration,
    sustained_since: Option<DateTime<Utc>>,
    active: bool,
}

impl DurationSustainTracker {
    pub fn new(required: chrono::Duration) -> Self {
        Self {
            required,
            sustained_since: None,
            active: false,
        }
    }

    pub fn observe(&mut self, raw: bool, now: DateTime<Utc>) -> bool {
        if !raw {
            self.sustained_since = None;
            self.active = false;
            return false;
        }
        let start = *self.sustained_since.get_or_insert(now);
        let sustained = now.signed_duration_since(start) >= self.required;
        if sustained && !self.active {
            self.active = true;
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_tracker_fires_once_per_edge() {
        let mut tracker = FrameSustainTracker::new(3);
        let stream = [false, true, true, true, true, false, true, true, true];
        let mut activations = 0;
        for raw in stream {
            if tracker.observe(raw) {
                activations += 1;
            }
        }
        // Two sustained runs of >=3 trues -> exactly two activations.
        assert_eq!(activations, 2);
    }

    #[test]
    fn frame_tracker_zero_grace_fires_on_every_edge() {
        let mut tracker = FrameSustainTracker::new(1);
        let stream = [false, true, true, false, true, false, false, true];
        let edges = stream.windows(2).filter(|w| !w[0] && w[1]).count() + usize::from(stream[0]);
        let mut activations = 0;
        for raw in stream {
            if tracker.observe(raw) {
                activations += 1;
            }
        }
        assert_eq!(activations, edges);
    }

    #[test]
    fn frame_tracker_never_reactivates_while_sustained() {
        let mut tracker = FrameSustainTracker::new(1);
        assert!(tracker.observe(true));
        assert!(!tracker.observe(true));
        assert!(!tracker.observe(true));
        assert!(!tracker.observe(false));
        assert!(tracker.observe(true));
    }

    #[test]
    fn duration_tracker_requires_sustained_window() {
        let base = Utc::now();
        let mut tracker = DurationSustainTracker::new(chrono::Duration::seconds(30));
        assert!(!tracker.observe(true, base));
        assert!(!tracker.observe(true, base + chrono::Duration::seconds(10)));
        assert!(!tracker.observe(true, base + chrono::Duration::seconds(29)));
        assert!(tracker.observe(true, base + chrono::Duration::seconds(31)));
        // Stays active but doesn't re-fire.
        assert!(!tracker.observe(true, base + chrono::Duration::seconds(40)));
    }

    #[test]
    fn duration_tracker_resets_on_false() {
        let base = Utc::now();
        let mut tracker = DurationSustainTracker::new(chrono::Duration::seconds(30));
        assert!(!tracker.observe(true, base));
        assert!(!tracker.observe(false, base + chrono::Duration::seconds(20)));
        assert!(!tracker.observe(true, base + chrono::Duration::seconds(40)));
        assert!(tracker.observe(true, base + chrono::Duration::seconds(71)));
    }
}
