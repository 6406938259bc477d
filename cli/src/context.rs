use std::sync::Arc;

use chrono::{DateTime, Local};
use radartrack_core::{AppConfig, AppConfigExt, Millis, TargetTracker};
use tokio::sync::{Mutex, RwLock};

/// Millisecond clock for interactive frames.
///
/// Follows wall time since the REPL started, plus whatever has been skipped
/// with `advance`. Never goes backwards.
#[derive(Debug)]
pub struct ReplClock {
    started: DateTime<Local>,
    skipped: Millis,
    last: Millis,
}

impl ReplClock {
    pub fn new() -> Self {
        Self {
            started: Local::now(),
            skipped: 0,
            last: 0,
        }
    }

    pub fn now(&mut self) -> Millis {
        let elapsed = (Local::now() - self.started).num_milliseconds().max(0) as Millis;
        self.last = self.last.max(elapsed + self.skipped);
        self.last
    }

    /// Move at least `ms` past the last time handed out
    pub fn skip(&mut self, ms: Millis) -> Millis {
        let floor = self.last + ms;
        self.skipped += ms;
        self.last = self.now().max(floor);
        self.last
    }

    /// Pin the clock to an explicit frame time. An earlier time than the
    /// last one handed out is raised to it.
    pub fn set(&mut self, at: Millis) -> Millis {
        self.last = self.last.max(at);
        self.last
    }

    pub fn started(&self) -> DateTime<Local> {
        self.started
    }
}

impl Default for ReplClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds all shared state for the interactive session.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<RwLock<AppConfig>>,
    pub tracker: Arc<RwLock<TargetTracker>>,
    pub clock: Arc<Mutex<ReplClock>>,
}

impl CliContext {
    pub fn new(config: AppConfig) -> Self {
        let tracker = config.tracker();
        Self {
            config: Arc::new(RwLock::new(config)),
            tracker: Arc::new(RwLock::new(tracker)),
            clock: Arc::new(Mutex::new(ReplClock::new())),
        }
    }
}
