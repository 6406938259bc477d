//! Target identity tracking
//!
//! This module turns a stream of anonymous per-frame detections into a stable
//! set of identified targets:
//! - **Trail**: bounded, duplicate-free position history per target
//! - **Registry**: target lifetime, ids, capacity and staleness rules
//! - **Matcher**: per-frame association of detections to targets
//! - **Tracker**: owns the registry and runs one frame at a time
//!
//! # Per-frame flow
//!
//! ```text
//!   detections ──▶ FrameMatcher ──▶ create / update ──▶ TargetRegistry
//!                                                           │
//!                                                     sweep(now, active)
//!                                                           │
//!                                                           ▼
//!                                                snapshot() ──▶ renderer
//! ```
//!
//! # Target lifecycle
//!
//! `Created → Active ⇄ Inactive → Removed`. Re-acquiring an inactive target
//! keeps its id, color and trail. Removed ids are never reused.

mod error;
mod matcher;
mod registry;
mod target;
mod trail;
mod tracker;


pub use error::TrackerError;
pub use matcher::{Assignment, FrameAssociation, FrameMatcher, GreedyMatcher};
pub use registry::{Created, Removal, RemovalReason, TargetRegistry};
pub use target::{Target, TargetView, target_color};
pub use trail::{TrailBuffer, TrailLimit};
pub use tracker::{FrameReport, TargetTracker};

use radartrack_types::Millis;

/// Live target capacity
pub const MAX_TARGETS: usize = 20;

/// Hard upper bound on any trail limit
pub const MAX_TRAIL_LENGTH: usize = 100;

/// Detections must be strictly closer than this to match a target (meters)
pub const MATCH_DISTANCE_M: f32 = 0.5;

/// Unmatched targets older than this are removed on sweep
pub const STALE_TIMEOUT_MS: Millis = 5000;

/// Target display palette, indexed by `id % len`
pub const TARGET_COLORS: [u32; 10] = [
    0x4fc3f7, 0xff9800, 0x4caf50, 0xe91e63, 0x9c27b0, 0x00bcd4, 0xffeb3b, 0xff5722, 0x795548,
    0x607d8b,
];
