//! Tracked target state
//!
//! A `Target` is the registry's record of one identified object: where it was
//! last seen, what the sensor reported about it, and its trail. Targets are
//! only created and mutated by the tracker; presentation layers see them
//! through `TargetView` (borrowed) or `TargetSnapshot` (owned).

use radartrack_types::{Detection, Millis, Position, TargetId, TargetSnapshot};

use super::TARGET_COLORS;
use super::trail::{TrailBuffer, TrailLimit};

/// Deterministic display color for a target id (0xRRGGBB)
pub fn target_color(id: TargetId) -> u32 {
    TARGET_COLORS[(id % TARGET_COLORS.len() as u64) as usize]
}

#[derive(Debug, Clone)]
pub struct Target {
    pub id: TargetId,

    /// 0xRRGGBB, fixed for the target's lifetime
    pub color: u32,

    // ─── Latest observation ─────────────────────────────────────────────────
    pub last_position: Position,
    pub velocity: f32,
    pub cluster_id: i32,

    /// Timestamp of the last frame this target was matched in
    pub last_seen_at: Millis,

    /// Matched in the current (or most recently swept) frame
    pub active: bool,

    pub trail: TrailBuffer,
}

impl Target {
    pub(crate) fn new(id: TargetId, detection: &Detection, now: Millis, limit: TrailLimit) -> Self {
        Self {
            id,
            color: target_color(id),
            last_position: detection.position(),
            velocity: detection.velocity,
            cluster_id: detection.cluster_id,
            last_seen_at: now,
            active: true,
            trail: TrailBuffer::new(limit),
        }
    }

    /// Apply a matched detection
    pub(crate) fn observe(&mut self, detection: &Detection, now: Millis) {
        self.last_position = detection.position();
        self.velocity = detection.velocity;
        self.cluster_id = detection.cluster_id;
        self.last_seen_at = now;
        self.active = true;
        self.trail.append(self.last_position);
    }

    /// Milliseconds since last match (zero if the clock went backwards)
    pub fn unseen_for(&self, now: Millis) -> Millis {
        now.saturating_sub(self.last_seen_at)
    }

    pub fn color_hex(&self) -> String {
        format!("#{:06x}", self.color)
    }

    pub fn view(&self) -> TargetView<'_> {
        TargetView { target: self }
    }
}

/// Read-only view of a live target.
///
/// Borrowed from the registry; valid only until the next frame is applied.
/// Use [`TargetView::to_snapshot`] to keep the state across frames.
#[derive(Debug, Clone, Copy)]
pub struct TargetView<'a> {
    target: &'a Target,
}

impl<'a> TargetView<'a> {
    pub fn id(&self) -> TargetId {
        self.target.id
    }

    pub fn position(&self) -> Position {
        self.target.last_position
    }

    pub fn velocity(&self) -> f32 {
        self.target.velocity
    }

    pub fn cluster_id(&self) -> i32 {
        self.target.cluster_id
    }

    pub fn color(&self) -> u32 {
        self.target.color
    }

    pub fn active(&self) -> bool {
        self.target.active
    }

    pub fn trail(&self) -> impl ExactSizeIterator<Item = &'a Position> + Clone + use<'a> {
        let target: &'a Target = self.target;
        target.trail.iter()
    }

    pub fn trail_len(&self) -> usize {
        self.target.trail.len()
    }

    pub fn to_snapshot(&self) -> TargetSnapshot {
        let t = self.target;
        TargetSnapshot {
            id: t.id,
            x: t.last_position.x,
            y: t.last_position.y,
            z: t.last_position.z,
            velocity: t.velocity,
            cluster_id: t.cluster_id,
            color: t.color,
            active: t.active,
            trail: t.trail.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_cycles_through_palette() {
        assert_eq!(target_color(1), 0xff9800);
        assert_eq!(target_color(10), 0x4fc3f7);
        assert_eq!(target_color(11), target_color(1));
    }

    #[test]
    fn test_observe_overwrites_latest_fields() {
        let first = Detection::new(0.0, 0.0, 0.0).with_velocity(1.0).with_cluster(4);
        let mut target = Target::new(7, &first, 100, TrailLimit::default());
        assert!(target.trail.is_empty());

        let next = Detection::new(0.1, 0.0, 0.0).with_velocity(0.0).with_cluster(5);
        target.active = false;
        target.observe(&next, 250);

        assert!(target.active);
        assert_eq!(target.last_position, Position::new(0.1, 0.0, 0.0));
        assert_eq!(target.velocity, 0.0);
        assert_eq!(target.cluster_id, 5);
        assert_eq!(target.last_seen_at, 250);
        assert_eq!(target.trail.len(), 1);
    }

    #[test]
    fn test_unseen_for_saturates() {
        let target = Target::new(1, &Detection::default(), 500, TrailLimit::default());
        assert_eq!(target.unseen_for(800), 300);
        assert_eq!(target.unseen_for(100), 0);
    }

    #[test]
    fn test_view_snapshot_copies_trail() {
        let mut target = Target::new(2, &Detection::new(1.0, 2.0, 3.0), 0, TrailLimit::default());
        target.observe(&Detection::new(1.0, 2.0, 3.0), 0);
        let snap = target.view().to_snapshot();
        assert_eq!(snap.id, 2);
        assert_eq!(snap.color, 0x4caf50);
        assert_eq!(snap.trail, vec![Position::new(1.0, 2.0, 3.0)]);
        assert_eq!(target.color_hex(), "#4caf50");
    }
}
