//! Shared types for radartrack
//!
//! This crate contains the serializable types that cross crate boundaries:
//! detections coming in from the sensor transport, target snapshots going out
//! to presentation layers, and the persisted application configuration.
//!
//! Wire field names follow the sensor bridge's JSON stream
//! (`{"x":..,"y":..,"z":..,"v":..,"c":..}`), so these types can be fed straight
//! from `serde_json` without an intermediate representation.

use serde::{Deserialize, Serialize};

/// Identity assigned to a tracked target. Strictly increasing, never reused.
pub type TargetId = u64;

/// Timestamps and durations in milliseconds.
pub type Millis = u64;

/// Default number of trail samples kept per target.
pub const DEFAULT_TRAIL_LIMIT: usize = 50;

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// A point in sensor space, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance from the sensor origin
    pub fn range(&self) -> f32 {
        self.distance_to(&Position::default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detections (input)
// ─────────────────────────────────────────────────────────────────────────────

/// One anonymous detection reported by the sensor for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Doppler velocity (sensor units)
    #[serde(rename = "v", default)]
    pub velocity: f32,
    /// Sensor-side cluster identifier
    #[serde(rename = "c", default)]
    pub cluster_id: i32,
}

impl Detection {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            velocity: 0.0,
            cluster_id: 0,
        }
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_cluster(mut self, cluster_id: i32) -> Self {
        self.cluster_id = cluster_id;
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshots (output)
// ─────────────────────────────────────────────────────────────────────────────

/// Owned, observable state of one tracked target.
///
/// Produced once per frame for presentation layers. The trail is a copy, so a
/// snapshot can be retained across frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub id: TargetId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(rename = "v")]
    pub velocity: f32,
    #[serde(rename = "c")]
    pub cluster_id: i32,
    /// 0xRRGGBB
    pub color: u32,
    /// Matched in the most recent frame. Inactive targets are shown as "lost".
    pub active: bool,
    /// Oldest first
    pub trail: Vec<Position>,
}

impl TargetSnapshot {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }

    /// CSS-style color string, e.g. `#4fc3f7`
    pub fn color_hex(&self) -> String {
        format!("#{:06x}", self.color)
    }

    /// Moving targets are active ones with a non-zero doppler reading
    pub fn is_moving(&self) -> bool {
        self.active && self.velocity != 0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration.
///
/// Persistence (load/save) is provided by radartrack-core via the
/// `AppConfigExt` trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Trail samples kept per target. Values above the hard maximum are clamped.
    #[serde(default = "default_trail_limit")]
    pub trail_limit: usize,

    /// Frame spacing used when replaying a raw capture that carries no timestamps.
    #[serde(default = "default_replay_frame_interval_ms")]
    pub replay_frame_interval_ms: Millis,

    /// Print every N-th snapshot during replay.
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: usize,
}

fn default_trail_limit() -> usize {
    DEFAULT_TRAIL_LIMIT
}

fn default_replay_frame_interval_ms() -> Millis {
    100
}

fn default_snapshot_every() -> usize {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trail_limit: default_trail_limit(),
            replay_frame_interval_ms: default_replay_frame_interval_ms(),
            snapshot_every: default_snapshot_every(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_reads_short_wire_names() {
        let det: Detection =
            serde_json::from_str(r#"{"x":1.5,"y":-0.25,"z":0.5,"v":3,"c":7}"#).unwrap();
        assert_eq!(det.position(), Position::new(1.5, -0.25, 0.5));
        assert_eq!(det.velocity, 3.0);
        assert_eq!(det.cluster_id, 7);
    }

    #[test]
    fn test_detection_velocity_and_cluster_are_optional() {
        let det: Detection = serde_json::from_str(r#"{"x":0,"y":0,"z":1}"#).unwrap();
        assert_eq!(det.velocity, 0.0);
        assert_eq!(det.cluster_id, 0);
    }

    #[test]
    fn test_snapshot_serializes_presentation_fields() {
        let snap = TargetSnapshot {
            id: 3,
            x: 0.0,
            y: 1.0,
            z: 0.0,
            velocity: 0.0,
            cluster_id: 2,
            color: 0xe91e63,
            active: false,
            trail: vec![Position::new(0.0, 1.0, 0.0)],
        };
        let value = serde_json::to_value(&snap).unwrap();
        for key in ["id", "x", "y", "z", "v", "c", "color", "active", "trail"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(snap.color_hex(), "#e91e63");
        assert!(!snap.is_moving());
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: AppConfig = toml::from_str("trail_limit = 30").unwrap();
        assert_eq!(config.trail_limit, 30);
        assert_eq!(config.replay_frame_interval_ms, 100);
        assert_eq!(config.snapshot_every, 1);

        let empty: AppConfig = toml::from_str("").unwrap();
        assert_eq!(empty, AppConfig::default());
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(1.0, 1.0, 1.0);
        assert!((a.distance_to(&b) - 3f32.sqrt()).abs() < 1e-6);
        assert!((Position::new(3.0, 4.0, 0.0).range() - 5.0).abs() < 1e-6);
    }
}
