//! Target registry
//!
//! Owns every live target and enforces the two removal policies:
//!
//! - **Capacity**: at most `MAX_TARGETS` live targets. Creating one more
//!   evicts the oldest-inserted target, regardless of activity.
//! - **Staleness**: `sweep` removes unmatched targets that have not been seen
//!   for longer than `STALE_TIMEOUT_MS`, or whose trail is empty.
//!
//! Targets are stored in a `BTreeMap` so iteration is always in ascending id
//! order. A separate FIFO of ids records insertion order for capacity
//! eviction, independent of recency.

use std::collections::{BTreeMap, VecDeque};

use hashbrown::HashSet;
use radartrack_types::{Detection, Millis, TargetId};

use super::target::{Target, TargetView};
use super::trail::TrailLimit;
use super::{MAX_TARGETS, STALE_TIMEOUT_MS, TrackerError};

/// Why a target left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Oldest-inserted target evicted to make room for a new one
    Capacity,
    /// Unmatched for longer than the stale timeout
    Stale,
    /// Unmatched with nothing in its trail
    EmptyTrail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub id: TargetId,
    pub reason: RemovalReason,
}

/// Result of `create_target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Created {
    pub id: TargetId,
    /// Target evicted to stay within capacity, if any
    pub evicted: Option<TargetId>,
}

#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: BTreeMap<TargetId, Target>,

    /// Ids in insertion order, oldest at the front
    insertion_order: VecDeque<TargetId>,

    /// Next id to hand out. Only ever increases.
    next_id: TargetId,

    trail_limit: TrailLimit,
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new(TrailLimit::default())
    }
}

impl TargetRegistry {
    pub fn new(trail_limit: TrailLimit) -> Self {
        Self {
            targets: BTreeMap::new(),
            insertion_order: VecDeque::with_capacity(MAX_TARGETS),
            next_id: 1,
            trail_limit,
        }
    }

    /// Create a target from an unmatched detection.
    ///
    /// The detection's position becomes the first trail sample.
    pub fn create_target(&mut self, detection: &Detection, now: Millis) -> Created {
        let id = self.next_id;
        self.next_id += 1;

        let evicted = if self.targets.len() >= MAX_TARGETS {
            self.evict_oldest()
        } else {
            None
        };

        let mut target = Target::new(id, detection, now, self.trail_limit);
        target.trail.append(target.last_position);

        self.targets.insert(id, target);
        self.insertion_order.push_back(id);

        Created { id, evicted }
    }

    /// Apply a matched detection to an existing target
    pub fn update_target(
        &mut self,
        id: TargetId,
        detection: &Detection,
        now: Millis,
    ) -> Result<(), TrackerError> {
        let target = self
            .targets
            .get_mut(&id)
            .ok_or(TrackerError::NotFound { id })?;
        target.observe(detection, now);
        Ok(())
    }

    /// End-of-frame cleanup.
    ///
    /// Targets in `active_ids` are marked active. Every other target is either
    /// removed (stale or empty trail) or kept as inactive. Returns removals in
    /// ascending id order.
    pub fn sweep(&mut self, now: Millis, active_ids: &HashSet<TargetId>) -> Vec<Removal> {
        let mut removals = Vec::new();

        for (id, target) in self.targets.iter_mut() {
            if active_ids.contains(id) {
                target.active = true;
                continue;
            }
            target.active = false;

            if target.unseen_for(now) > STALE_TIMEOUT_MS {
                removals.push(Removal {
                    id: *id,
                    reason: RemovalReason::Stale,
                });
            } else if target.trail.is_empty() {
                removals.push(Removal {
                    id: *id,
                    reason: RemovalReason::EmptyTrail,
                });
            }
        }

        for removal in &removals {
            self.remove(removal.id);
        }

        removals
    }

    /// Apply a new trail limit to future samples and, retroactively, to every
    /// live target in ascending id order.
    pub fn set_trail_limit(&mut self, limit: TrailLimit) {
        self.trail_limit = limit;
        for target in self.targets.values_mut() {
            target.trail.set_limit(limit);
        }
    }

    pub fn trail_limit(&self) -> TrailLimit {
        self.trail_limit
    }

    /// Live targets in ascending id order.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn snapshot(&self) -> impl Iterator<Item = TargetView<'_>> + Clone {
        self.targets.values().map(Target::view)
    }

    /// Live targets with their last positions, ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Target> + Clone {
        self.targets.values()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(&id)
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.targets.contains_key(&id)
    }

    pub fn live_ids(&self) -> Vec<TargetId> {
        self.targets.keys().copied().collect()
    }

    /// Ids oldest-inserted first
    pub fn insertion_order(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.insertion_order.iter().copied()
    }

    /// The id the next created target will receive
    pub fn next_id(&self) -> TargetId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn evict_oldest(&mut self) -> Option<TargetId> {
        while let Some(oldest) = self.insertion_order.pop_front() {
            if self.targets.remove(&oldest).is_some() {
                return Some(oldest);
            }
        }
        None
    }

    fn remove(&mut self, id: TargetId) {
        self.targets.remove(&id);
        self.insertion_order.retain(|&queued| queued != id);
    }
}
