//! Frame-synchronous target tracker
//!
//! `TargetTracker` is the single owner of tracking state. Each call to
//! `process_frame` associates one complete frame of detections, applies the
//! resulting creates and updates, and sweeps stale targets before returning.
//! Nothing suspends mid-frame, so readers that go through `&self` between
//! calls always see a fully applied frame.

use radartrack_types::{Detection, Millis, TargetSnapshot};
use tracing::{debug, info, warn};

use super::matcher::{Assignment, FrameMatcher, GreedyMatcher};
use super::registry::{Removal, RemovalReason, TargetRegistry};
use super::target::TargetView;
use super::trail::TrailLimit;
use super::TrackerError;

/// What happened while applying one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// One entry per input detection, in input order
    pub assignments: Vec<Assignment>,
    /// Capacity evictions followed by sweep removals
    pub removals: Vec<Removal>,
}

impl FrameReport {
    pub fn created(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments
            .iter()
            .filter(|a| matches!(a, Assignment::Created { .. }))
    }
}

pub struct TargetTracker {
    registry: TargetRegistry,
    matcher: Box<dyn FrameMatcher>,
    frames_processed: u64,
    last_frame_at: Option<Millis>,
}

impl std::fmt::Debug for TargetTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetTracker")
            .field("registry", &self.registry)
            .field("frames_processed", &self.frames_processed)
            .field("last_frame_at", &self.last_frame_at)
            .finish_non_exhaustive()
    }
}

impl Default for TargetTracker {
    fn default() -> Self {
        Self::new(TrailLimit::default())
    }
}

impl TargetTracker {
    /// Tracker using the greedy nearest-neighbour matcher
    pub fn new(trail_limit: TrailLimit) -> Self {
        Self::with_matcher(trail_limit, Box::new(GreedyMatcher::new()))
    }

    /// Tracker with a custom association strategy
    pub fn with_matcher(trail_limit: TrailLimit, matcher: Box<dyn FrameMatcher>) -> Self {
        Self {
            registry: TargetRegistry::new(trail_limit),
            matcher,
            frames_processed: 0,
            last_frame_at: None,
        }
    }

    /// Associate, apply and sweep one complete frame.
    ///
    /// `now` must not go backwards between calls.
    pub fn process_frame(
        &mut self,
        detections: &[Detection],
        now: Millis,
    ) -> Result<FrameReport, TrackerError> {
        if let Some(previous) = self.last_frame_at
            && now < previous
        {
            warn!(previous, now, "Frame timestamp went backwards");
        }

        let association = self
            .matcher
            .associate(detections, &mut self.registry, now)?;

        let mut removals = Vec::new();
        for assignment in &association.assignments {
            match *assignment {
                Assignment::Updated(id) => {
                    debug!(id, "Updated target");
                }
                Assignment::Created { id, evicted } => {
                    if let Some(evicted) = evicted {
                        info!(id = evicted, "Removed oldest target to stay within capacity");
                        removals.push(Removal {
                            id: evicted,
                            reason: RemovalReason::Capacity,
                        });
                    }
                    if let Some(target) = self.registry.get(id) {
                        let p = target.last_position;
                        debug!(id, x = p.x, y = p.y, z = p.z, "Created new target");
                    }
                }
            }
        }

        let swept = self.registry.sweep(now, &association.active_ids);
        for removal in &swept {
            match removal.reason {
                RemovalReason::Stale => info!(id = removal.id, "Removed stale target"),
                RemovalReason::EmptyTrail => info!(id = removal.id, "Removed empty target"),
                RemovalReason::Capacity => {}
            }
        }
        removals.extend(swept);

        self.frames_processed += 1;
        self.last_frame_at = Some(now);

        Ok(FrameReport {
            assignments: association.assignments,
            removals,
        })
    }

    /// Change the trail limit. Out-of-range values are clamped to the maximum.
    pub fn set_trail_limit(&mut self, requested: usize) -> TrailLimit {
        let limit = match TrailLimit::checked(requested) {
            Ok(limit) => limit,
            Err(err) => {
                warn!(%err, "Clamping trail limit");
                TrailLimit::clamped(requested)
            }
        };
        self.registry.set_trail_limit(limit);
        limit
    }

    pub fn trail_limit(&self) -> TrailLimit {
        self.registry.trail_limit()
    }

    /// Borrowed view of every live target, ascending id order
    pub fn snapshot(&self) -> impl Iterator<Item = TargetView<'_>> + Clone {
        self.registry.snapshot()
    }

    /// Owned copy of every live target, safe to keep across frames
    pub fn snapshots(&self) -> Vec<TargetSnapshot> {
        self.registry.snapshot().map(|view| view.to_snapshot()).collect()
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn last_frame_at(&self) -> Option<Millis> {
        self.last_frame_at
    }
}
