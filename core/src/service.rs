//! Tracking service - owns the tracker on a background task
//!
//! Architecture:
//! - SharedState: Arc-wrapped published snapshot readable from any task
//! - ServiceHandle: For sending frames and commands + reading shared state
//! - TrackingService: Background task that applies commands in arrival order
//!
//! The tracker itself is never shared. Each command is applied to completion
//! before the next is received, and the snapshot is replaced in one write, so
//! readers only ever see whole frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use radartrack_types::{Millis, TargetSnapshot};
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info};

use crate::ingest::TimedFrame;
use crate::tracking::TargetTracker;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("tracking service is no longer running")]
    Closed,
}

impl<T> From<mpsc::error::SendError<T>> for ServiceError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        ServiceError::Closed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared State
// ─────────────────────────────────────────────────────────────────────────────

/// Last published tracker state
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub targets: Vec<TargetSnapshot>,
    pub frames_processed: u64,
    pub last_frame_at: Option<Millis>,
    pub trail_limit: usize,
}

/// State shared between the service and its handles
pub struct SharedState {
    pub published: RwLock<Published>,
    pub running: AtomicBool,
}

impl SharedState {
    fn new(published: Published) -> Self {
        Self {
            published: RwLock::new(published),
            running: AtomicBool::new(true),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to communicate with the tracking service and query state
#[derive(Clone)]
pub struct ServiceHandle {
    cmd_tx: mpsc::Sender<ServiceCommand>,
    shared: Arc<SharedState>,
}

impl ServiceHandle {
    /// Queue one complete frame
    pub async fn push_frame(&self, frame: TimedFrame) -> Result<(), ServiceError> {
        self.cmd_tx.send(ServiceCommand::Frame(frame)).await?;
        Ok(())
    }

    pub async fn set_trail_limit(&self, limit: usize) -> Result<(), ServiceError> {
        self.cmd_tx.send(ServiceCommand::SetTrailLimit(limit)).await?;
        Ok(())
    }

    /// Ask the service to stop after the commands already queued
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.cmd_tx.send(ServiceCommand::Shutdown).await?;
        Ok(())
    }

    /// Targets as of the last fully applied frame
    pub async fn snapshot(&self) -> Vec<TargetSnapshot> {
        self.shared.published.read().await.targets.clone()
    }

    pub async fn frames_processed(&self) -> u64 {
        self.shared.published.read().await.frames_processed
    }

    pub async fn published(&self) -> Published {
        self.shared.published.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Messages sent to the service from handles
#[derive(Debug)]
pub enum ServiceCommand {
    Frame(TimedFrame),
    SetTrailLimit(usize),
    Shutdown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracking Service
// ─────────────────────────────────────────────────────────────────────────────

/// Tracker loop that runs in a background task
pub struct TrackingService {
    tracker: TargetTracker,
    shared: Arc<SharedState>,
    cmd_rx: mpsc::Receiver<ServiceCommand>,
}

impl TrackingService {
    /// Create a new tracking service and return a handle to communicate with it
    pub fn new(tracker: TargetTracker) -> (Self, ServiceHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

        let shared = Arc::new(SharedState::new(Self::capture(&tracker)));
        let service = Self {
            tracker,
            shared: shared.clone(),
            cmd_rx,
        };
        let handle = ServiceHandle { cmd_tx, shared };

        (service, handle)
    }

    /// Run the service event loop until shutdown or every handle is dropped
    pub async fn run(mut self) {
        info!("Tracking service started");
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                ServiceCommand::Frame(frame) => {
                    match self.tracker.process_frame(&frame.data, frame.t) {
                        Ok(report) => {
                            debug!(
                                t = frame.t,
                                detections = frame.data.len(),
                                removed = report.removals.len(),
                                "Applied frame"
                            );
                        }
                        // Creates applied before the failure are still live
                        Err(err) => error!(%err, t = frame.t, "Failed to apply frame"),
                    }
                    self.publish().await;
                }
                ServiceCommand::SetTrailLimit(limit) => {
                    let applied = self.tracker.set_trail_limit(limit);
                    info!(limit = applied.get(), "Trail limit updated");
                    self.publish().await;
                }
                ServiceCommand::Shutdown => break,
            }
        }
        self.shared.running.store(false, Ordering::SeqCst);
        info!(
            frames = self.tracker.frames_processed(),
            "Tracking service stopped"
        );
    }

    fn capture(tracker: &TargetTracker) -> Published {
        Published {
            targets: tracker.snapshots(),
            frames_processed: tracker.frames_processed(),
            last_frame_at: tracker.last_frame_at(),
            trail_limit: tracker.trail_limit().get(),
        }
    }

    async fn publish(&mut self) {
        let published = Self::capture(&self.tracker);
        *self.shared.published.write().await = published;
    }
}
