pub mod config;
pub mod ingest;
pub mod presence;
pub mod radar;
pub mod service;
pub mod tracking;

// Re-exports for convenience
pub use config::{AppConfig, AppConfigExt, ConfigError};
pub use ingest::{IngestError, StreamMessage, TimedFrame, parse_message, read_replay};
pub use presence::{PresenceEvent, PresenceMonitor};
pub use radar::{ControlCommand, FrameError, FrameStats, RawFrame, StreamDecoder, decode_targets};
pub use service::{ServiceCommand, ServiceError, ServiceHandle, TrackingService};
pub use tracking::{
    Assignment, FrameMatcher, FrameReport, GreedyMatcher, TargetRegistry, TargetTracker,
    TargetView, TrackerError, TrailBuffer, TrailLimit,
};

pub use radartrack_types::{Detection, Millis, Position, TargetId, TargetSnapshot};
