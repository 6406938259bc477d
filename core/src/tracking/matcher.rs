//! Detection-to-target association
//!
//! A `FrameMatcher` decides, for every detection in a frame, whether it is an
//! existing target that moved or a new target. The matcher drives registry
//! creates and updates; staleness cleanup is left to the caller's sweep.
//!
//! `GreedyMatcher` is the nearest-neighbour strategy used by the tracker.
//! Detections are handled in input order and each claims the closest
//! unclaimed target within `MATCH_DISTANCE_M`. The result depends on input
//! order and is not a minimum-cost assignment: when two detections are near the
//! same target, the first one wins it.

use hashbrown::HashSet;
use radartrack_types::{Detection, Millis, TargetId};

use super::registry::TargetRegistry;
use super::{MATCH_DISTANCE_M, TrackerError};

/// Outcome for a single detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Matched to an existing target
    Updated(TargetId),
    /// Started a new target, possibly evicting the oldest one
    Created {
        id: TargetId,
        evicted: Option<TargetId>,
    },
}

impl Assignment {
    pub fn id(&self) -> TargetId {
        match self {
            Assignment::Updated(id) => *id,
            Assignment::Created { id, .. } => *id,
        }
    }
}

/// Associations for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameAssociation {
    /// One entry per input detection, in input order
    pub assignments: Vec<Assignment>,
    /// Every id updated or created this frame
    pub active_ids: HashSet<TargetId>,
}

/// Association strategy.
///
/// Implementations must produce exactly one assignment per detection and must
/// only touch the registry through `create_target` / `update_target`.
pub trait FrameMatcher: Send + Sync {
    fn associate(
        &mut self,
        detections: &[Detection],
        registry: &mut TargetRegistry,
        now: Millis,
    ) -> Result<FrameAssociation, TrackerError>;
}

/// Order-dependent nearest-neighbour matcher
#[derive(Debug, Clone, Copy)]
pub struct GreedyMatcher {
    /// Matches must be strictly closer than this (meters)
    pub max_distance: f32,
}

impl Default for GreedyMatcher {
    fn default() -> Self {
        Self {
            max_distance: MATCH_DISTANCE_M,
        }
    }
}

impl GreedyMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closest live target not yet claimed this frame.
    ///
    /// Scans in ascending id order and only replaces the best candidate on a
    /// strictly smaller distance, so ties go to the lowest id.
    fn closest(
        &self,
        detection: &Detection,
        registry: &TargetRegistry,
        claimed: &HashSet<TargetId>,
    ) -> Option<TargetId> {
        let position = detection.position();
        let mut best: Option<(TargetId, f32)> = None;

        for target in registry.iter() {
            if claimed.contains(&target.id) {
                continue;
            }
            let distance = position.distance_to(&target.last_position);
            if distance >= self.max_distance {
                continue;
            }
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((target.id, distance));
            }
        }

        best.map(|(id, _)| id)
    }
}

impl FrameMatcher for GreedyMatcher {
    fn associate(
        &mut self,
        detections: &[Detection],
        registry: &mut TargetRegistry,
        now: Millis,
    ) -> Result<FrameAssociation, TrackerError> {
        let mut claimed: HashSet<TargetId> = HashSet::new();
        let mut association = FrameAssociation {
            assignments: Vec::with_capacity(detections.len()),
            active_ids: HashSet::with_capacity(detections.len()),
        };

        for detection in detections {
            // Targets created earlier in this frame are candidates too; only
            // matched targets are claimed.
            let assignment = match self.closest(detection, registry, &claimed) {
                Some(id) => {
                    registry.update_target(id, detection, now)?;
                    claimed.insert(id);
                    Assignment::Updated(id)
                }
                None => {
                    let created = registry.create_target(detection, now);
                    Assignment::Created {
                        id: created.id,
                        evicted: created.evicted,
                    }
                }
            };
            association.active_ids.insert(assignment.id());
            association.assignments.push(assignment);
        }

        Ok(association)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::TrailLimit;

    fn det(x: f32, y: f32, z: f32) -> Detection {
        Detection::new(x, y, z)
    }

    fn registry_with(positions: &[(f32, f32, f32)]) -> TargetRegistry {
        let mut registry = TargetRegistry::new(TrailLimit::default());
        for &(x, y, z) in positions {
            registry.create_target(&det(x, y, z), 0);
        }
        registry
    }

    #[test]
    fn test_picks_nearest_candidate() {
        let mut registry = registry_with(&[(0.0, 0.0, 0.0), (0.3, 0.0, 0.0)]);
        let mut matcher = GreedyMatcher::new();

        let result = matcher
            .associate(&[det(0.25, 0.0, 0.0)], &mut registry, 100)
            .unwrap();

        assert_eq!(result.assignments, vec![Assignment::Updated(2)]);
        assert!(result.active_ids.contains(&2));
        assert!(!result.active_ids.contains(&1));
    }

    #[test]
    fn test_match_distance_is_strict() {
        let mut registry = registry_with(&[(0.0, 0.0, 0.0)]);
        let mut matcher = GreedyMatcher::new();

        let result = matcher
            .associate(&[det(0.5, 0.0, 0.0)], &mut registry, 100)
            .unwrap();

        assert_eq!(
            result.assignments,
            vec![Assignment::Created {
                id: 2,
                evicted: None
            }]
        );
    }

    #[test]
    fn test_equal_distance_goes_to_lowest_id() {
        let mut registry = registry_with(&[(-0.2, 0.0, 0.0), (0.2, 0.0, 0.0)]);
        let mut matcher = GreedyMatcher::new();

        let result = matcher
            .associate(&[det(0.0, 0.0, 0.0)], &mut registry, 100)
            .unwrap();

        assert_eq!(result.assignments, vec![Assignment::Updated(1)]);
    }

    #[test]
    fn test_first_detection_in_input_order_claims_target() {
        let mut registry = registry_with(&[(0.0, 0.0, 0.0)]);
        let mut matcher = GreedyMatcher::new();

        // The second detection is closer, but the first one is processed first
        let frame = [det(0.3, 0.0, 0.0), det(0.05, 0.0, 0.0)];
        let result = matcher.associate(&frame, &mut registry, 100).unwrap();

        assert_eq!(result.assignments[0], Assignment::Updated(1));
        assert!(matches!(result.assignments[1], Assignment::Created { id: 2, .. }));
    }

    #[test]
    fn test_target_created_this_frame_is_a_candidate() {
        let mut registry = TargetRegistry::default();
        let mut matcher = GreedyMatcher::new();

        let frame = [det(1.0, 1.0, 1.0), det(1.1, 1.0, 1.0)];
        let result = matcher.associate(&frame, &mut registry, 0).unwrap();

        assert_eq!(
            result.assignments,
            vec![
                Assignment::Created {
                    id: 1,
                    evicted: None
                },
                Assignment::Updated(1)
            ]
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(1).unwrap().trail.len(), 2);
    }

    #[test]
    fn test_empty_frame_produces_no_assignments() {
        let mut registry = registry_with(&[(0.0, 0.0, 0.0)]);
        let result = GreedyMatcher::new()
            .associate(&[], &mut registry, 100)
            .unwrap();
        assert!(result.assignments.is_empty());
        assert!(result.active_ids.is_empty());
    }
}
