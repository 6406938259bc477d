//! Application configuration
//!
//! Re-exports the shared `AppConfig` and adds persistence through `confy`
//! plus a builder for a tracker configured from it.

pub use radartrack_types::AppConfig;

use thiserror::Error;
use tracing::warn;

use crate::tracking::{TargetTracker, TrailLimit};

const APP_NAME: &str = "radartrack";
const CONFIG_NAME: &str = "config";

/// Errors during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[source] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),
}

// ─────────────────────────────────────────────────────────────────────────────
// AppConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for AppConfig persistence
pub trait AppConfigExt: Sized {
    /// Stored config, or defaults if it cannot be read
    fn load() -> Self;
    fn try_load() -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn tracker(&self) -> TargetTracker;
}

impl AppConfigExt for AppConfig {
    fn load() -> Self {
        Self::try_load().unwrap_or_else(|err| {
            warn!(%err, "Using default configuration");
            Self::default()
        })
    }

    fn try_load() -> Result<Self, ConfigError> {
        confy::load(APP_NAME, CONFIG_NAME).map_err(ConfigError::Load)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn tracker(&self) -> TargetTracker {
        let limit = TrailLimit::checked(self.trail_limit).unwrap_or_else(|err| {
            warn!(%err, "Clamping configured trail limit");
            TrailLimit::clamped(self.trail_limit)
        });
        TargetTracker::new(limit)
    }
}
