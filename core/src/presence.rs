//! Room-level presence summary
//!
//! Independent of target identity: answers "is anyone here, since when, and
//! which zones are occupied". Fed with the raw target count of each frame and
//! with the sensor's zone occupancy reports. Transitions are logged at `info`;
//! steady state is re-logged only on movement or after a quiet interval.

use radartrack_types::{Detection, Millis, Position};
use tracing::info;

use crate::radar::ZONE_COUNT;

/// Lead target must move further than this between frames to count as moved
pub const MOVEMENT_THRESHOLD_M: f32 = 0.05;

/// Steady-state target log interval
pub const TARGET_LOG_INTERVAL_MS: Millis = 5_000;

/// Steady-state zone log interval
pub const ZONE_LOG_INTERVAL_MS: Millis = 30_000;

/// Targets listed individually per log line
const LOGGED_TARGETS: usize = 3;

/// Person presence transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    PersonDetected { at: Millis },
    PersonLeft { present_for: Millis },
}

/// Coarse motion of a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Moving,
    Slow,
    Still,
}

#[derive(Debug, Clone, Default)]
pub struct PresenceMonitor {
    person_detected: bool,
    first_detection_at: Millis,
    last_count: usize,
    last_position: Position,
    last_target_log_at: Millis,
    stationary_count: u32,

    zones: [bool; ZONE_COUNT],
    last_zone_log_at: Millis,
}

impl PresenceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from one frame of detections. Returns the presence transition,
    /// if any.
    pub fn update_targets(&mut self, detections: &[Detection], now: Millis) -> Option<PresenceEvent> {
        let count = detections.len();
        let count_changed = count != self.last_count;
        self.last_count = count;

        let Some(lead) = detections.first() else {
            if count_changed && self.person_detected {
                let present_for = self.duration(now);
                self.person_detected = false;
                info!(present_for_s = present_for / 1000, "Person left");
                return Some(PresenceEvent::PersonLeft { present_for });
            }
            return None;
        };

        let position = lead.position();
        let movement = position.distance_to(&self.last_position);
        let moved = movement > MOVEMENT_THRESHOLD_M || count_changed;
        self.last_position = position;

        let mut event = None;
        if !self.person_detected {
            self.person_detected = true;
            self.first_detection_at = now;
            info!(at = now, "Person detected");
            event = Some(PresenceEvent::PersonDetected { at: now });
        }

        if moved || now.saturating_sub(self.last_target_log_at) > TARGET_LOG_INTERVAL_MS {
            if moved {
                self.stationary_count = 0;
            } else {
                self.stationary_count += 1;
            }
            Self::log_targets(detections, movement);
            self.last_target_log_at = now;
        }

        event
    }

    /// Update from a zone occupancy report. Returns true if any zone changed.
    pub fn update_zones(&mut self, zones: [bool; ZONE_COUNT], now: Millis) -> bool {
        let changed = zones != self.zones;
        self.zones = zones;

        if changed || now.saturating_sub(self.last_zone_log_at) > ZONE_LOG_INTERVAL_MS {
            let occupied = self.occupied_zones();
            if occupied > 0 {
                let map: String = zones
                    .iter()
                    .enumerate()
                    .map(|(i, &on)| if on { char::from(b'0' + i as u8) } else { '-' })
                    .collect();
                info!(occupied, zones = %map, "Zones occupied");
            }
            self.last_zone_log_at = now;
        }

        changed
    }

    pub fn person_present(&self) -> bool {
        self.person_detected
    }

    /// Time since the current person was first detected, or 0 if nobody is here
    pub fn duration(&self, now: Millis) -> Millis {
        if !self.person_detected {
            return 0;
        }
        now.saturating_sub(self.first_detection_at)
    }

    pub fn zones(&self) -> [bool; ZONE_COUNT] {
        self.zones
    }

    pub fn occupied_zones(&self) -> usize {
        self.zones.iter().filter(|&&on| on).count()
    }

    /// Logged updates in a row without movement
    pub fn stationary_count(&self) -> u32 {
        self.stationary_count
    }

    fn log_targets(detections: &[Detection], lead_movement: f32) {
        let motion = |detection: &Detection, movement: f32| {
            if detection.velocity != 0.0 {
                Motion::Moving
            } else if movement > MOVEMENT_THRESHOLD_M {
                Motion::Slow
            } else {
                Motion::Still
            }
        };

        for (i, detection) in detections.iter().take(LOGGED_TARGETS).enumerate() {
            let movement = if i == 0 { lead_movement } else { 0.0 };
            let p = detection.position();
            info!(
                index = i + 1,
                x = p.x,
                y = p.y,
                z = p.z,
                range = p.range(),
                motion = ?motion(detection, movement),
                "Target"
            );
        }
        if detections.len() > LOGGED_TARGETS {
            info!(more = detections.len() - LOGGED_TARGETS, "More targets");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32) -> Detection {
        Detection::new(x, 1.0, 0.0)
    }

    #[test]
    fn test_first_detection_reports_person_detected() {
        let mut monitor = PresenceMonitor::new();
        assert_eq!(monitor.update_targets(&[], 0), None);

        let event = monitor.update_targets(&[det(0.0)], 100);
        assert_eq!(event, Some(PresenceEvent::PersonDetected { at: 100 }));
        assert!(monitor.person_present());

        // Still present, no new transition
        assert_eq!(monitor.update_targets(&[det(0.0), det(2.0)], 200), None);
        assert_eq!(monitor.duration(1_100), 1_000);
    }

    #[test]
    fn test_empty_frame_reports_person_left_with_duration() {
        let mut monitor = PresenceMonitor::new();
        monitor.update_targets(&[det(0.0)], 1_000);
        monitor.update_targets(&[det(0.01)], 2_000);

        let event = monitor.update_targets(&[], 4_500);
        assert_eq!(event, Some(PresenceEvent::PersonLeft { present_for: 3_500 }));
        assert!(!monitor.person_present());
        assert_eq!(monitor.duration(5_000), 0);

        // Already gone
        assert_eq!(monitor.update_targets(&[], 5_000), None);
    }

    #[test]
    fn test_stationary_count_grows_only_without_movement() {
        let mut monitor = PresenceMonitor::new();
        monitor.update_targets(&[det(0.0)], 0);
        assert_eq!(monitor.stationary_count(), 0);

        // Quiet interval elapses with the target in place
        monitor.update_targets(&[det(0.01)], TARGET_LOG_INTERVAL_MS + 1);
        assert_eq!(monitor.stationary_count(), 1);

        monitor.update_targets(&[det(0.5)], TARGET_LOG_INTERVAL_MS + 2);
        assert_eq!(monitor.stationary_count(), 0);
    }

    #[test]
    fn test_zone_changes_are_detected() {
        let mut monitor = PresenceMonitor::new();
        assert!(!monitor.update_zones([false; ZONE_COUNT], 0));

        assert!(monitor.update_zones([true, false, false, true], 100));
        assert_eq!(monitor.occupied_zones(), 2);
        assert!(!monitor.update_zones([true, false, false, true], 200));

        assert!(monitor.update_zones([false, false, false, true], 300));
        assert_eq!(monitor.zones(), [false, false, false, true]);
    }
}
