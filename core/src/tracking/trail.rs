//! Bounded per-target position history
//!
//! A `TrailBuffer` keeps the most recent positions of one target, oldest
//! first. Consecutive duplicate samples are dropped so a stationary target
//! does not flood its trail, and the buffer never grows past its limit.

use std::collections::VecDeque;

use radartrack_types::Position;

use super::{MAX_TRAIL_LENGTH, TrackerError};

/// Trail length bound, always within `[0, MAX_TRAIL_LENGTH]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrailLimit(usize);

impl TrailLimit {
    pub const MAX: TrailLimit = TrailLimit(MAX_TRAIL_LENGTH);

    /// Clamp any requested length into the valid range
    pub fn clamped(requested: usize) -> Self {
        Self(requested.min(MAX_TRAIL_LENGTH))
    }

    /// Reject out-of-range lengths instead of clamping
    pub fn checked(requested: usize) -> Result<Self, TrackerError> {
        if requested > MAX_TRAIL_LENGTH {
            return Err(TrackerError::InvalidConfiguration {
                requested,
                max: MAX_TRAIL_LENGTH,
            });
        }
        Ok(Self(requested))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for TrailLimit {
    fn default() -> Self {
        Self::clamped(radartrack_types::DEFAULT_TRAIL_LIMIT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrailBuffer {
    positions: VecDeque<Position>,
    limit: TrailLimit,
}

impl TrailBuffer {
    pub fn new(limit: TrailLimit) -> Self {
        Self {
            positions: VecDeque::with_capacity(limit.get()),
            limit,
        }
    }

    /// Record a position. Returns false if it repeated the last sample.
    pub fn append(&mut self, position: Position) -> bool {
        if self.positions.back() == Some(&position) {
            return false;
        }
        self.positions.push_back(position);
        self.trim();
        true
    }

    /// Change the limit, dropping the oldest samples that no longer fit
    pub fn set_limit(&mut self, limit: TrailLimit) {
        self.limit = limit;
        self.trim();
    }

    pub fn limit(&self) -> TrailLimit {
        self.limit
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn last(&self) -> Option<&Position> {
        self.positions.back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Position> + Clone {
        self.positions.iter()
    }

    pub fn to_vec(&self) -> Vec<Position> {
        self.positions.iter().copied().collect()
    }

    fn trim(&mut self) {
        while self.positions.len() > self.limit.get() {
            self.positions.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32) -> Position {
        Position::new(x, 0.0, 0.0)
    }

    #[test]
    fn test_append_skips_repeated_sample() {
        let mut trail = TrailBuffer::new(TrailLimit::clamped(10));
        assert!(trail.append(p(1.0)));
        assert!(!trail.append(p(1.0)));
        assert_eq!(trail.len(), 1);

        // Only the most recent sample counts as a duplicate
        assert!(trail.append(p(2.0)));
        assert!(trail.append(p(1.0)));
        assert_eq!(trail.len(), 3);
    }

    #[test]
    fn test_append_drops_oldest_past_limit() {
        let mut trail = TrailBuffer::new(TrailLimit::clamped(3));
        for i in 0..5 {
            trail.append(p(i as f32));
        }
        let xs: Vec<f32> = trail.iter().map(|pos| pos.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_set_limit_trims_retroactively() {
        let mut trail = TrailBuffer::new(TrailLimit::clamped(10));
        for i in 0..8 {
            trail.append(p(i as f32));
        }
        trail.set_limit(TrailLimit::clamped(2));
        assert_eq!(trail.to_vec(), vec![p(6.0), p(7.0)]);

        // Raising the limit does not bring anything back
        trail.set_limit(TrailLimit::clamped(50));
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn test_zero_limit_stores_nothing() {
        let mut trail = TrailBuffer::new(TrailLimit::clamped(0));
        trail.append(p(1.0));
        assert!(trail.is_empty());
        assert_eq!(trail.last(), None);
    }

    #[test]
    fn test_limit_clamps_to_max() {
        assert_eq!(TrailLimit::clamped(1000).get(), MAX_TRAIL_LENGTH);
        assert_eq!(TrailLimit::clamped(100).get(), 100);
        assert_eq!(
            TrailLimit::checked(101),
            Err(TrackerError::InvalidConfiguration {
                requested: 101,
                max: MAX_TRAIL_LENGTH
            })
        );
        assert_eq!(TrailLimit::checked(0).map(TrailLimit::get), Ok(0));
    }

    #[test]
    fn test_clear() {
        let mut trail = TrailBuffer::new(TrailLimit::default());
        trail.append(p(1.0));
        trail.append(p(2.0));
        trail.clear();
        assert!(trail.is_empty());
        assert_eq!(trail.limit(), TrailLimit::default());
    }
}
