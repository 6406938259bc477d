use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Write};
use std::time::Instant;

use radartrack_core::radar::{MessageType, decode_point_cloud, decode_presence, decode_zones};
use radartrack_core::{
    AppConfig, AppConfigExt, Detection, Millis, PresenceMonitor, StreamDecoder, TargetSnapshot,
    TargetTracker, TimedFrame, TrackingService, decode_targets, read_replay,
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::CliContext;

/// UART-sized reads when replaying a raw capture
const CAPTURE_CHUNK: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_json_line(t: Millis, targets: &[TargetSnapshot]) -> Result<(), String> {
    let line = json!({ "t": t, "targets": targets });
    writeln!(std::io::stdout(), "{line}").map_err(|e| e.to_string())
}

fn print_table(targets: &[TargetSnapshot]) {
    if targets.is_empty() {
        println!("No targets");
        return;
    }

    println!(
        "{:<6} {:<8} {:>8} {:>8} {:>8} {:>7} {:>6}  State",
        "Id", "Color", "X", "Y", "Z", "V", "Trail"
    );
    println!("{}", "-".repeat(70));
    for target in targets {
        let state = if !target.active {
            "lost"
        } else if target.is_moving() {
            "moving"
        } else {
            "still"
        };
        println!(
            "{:<6} {:<8} {:>8.2} {:>8.2} {:>8.2} {:>7.1} {:>6}  {}",
            target.id,
            target.color_hex(),
            target.x,
            target.y,
            target.z,
            target.velocity,
            target.trail.len(),
            state
        );
    }
}

/// Parse `x,y,z[,v[,c]]`
pub fn parse_point(raw: &str) -> Result<Detection, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if !(3..=5).contains(&parts.len()) {
        return Err(format!("expected x,y,z[,v[,c]], got '{raw}'"));
    }

    let coord = |i: usize| {
        parts[i]
            .parse::<f32>()
            .map_err(|e| format!("invalid coordinate '{}': {e}", parts[i]))
    };
    let mut detection = Detection::new(coord(0)?, coord(1)?, coord(2)?);
    if let Some(v) = parts.get(3) {
        detection = detection.with_velocity(
            v.parse()
                .map_err(|e| format!("invalid velocity '{v}': {e}"))?,
        );
    }
    if let Some(c) = parts.get(4) {
        detection = detection.with_cluster(
            c.parse()
                .map_err(|e| format!("invalid cluster id '{c}': {e}"))?,
        );
    }
    Ok(detection)
}

// ─────────────────────────────────────────────────────────────────────────────
// Batch Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Feed a newline-delimited recording through the tracker
pub fn replay(path: &str, every: Option<usize>, config: &AppConfig) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("failed to open {path}: {e}"))?;
    let every = every.unwrap_or(config.snapshot_every).max(1);
    let mut tracker = config.tracker();

    let started = Instant::now();
    let mut seen = BTreeSet::new();
    let mut peak = 0;
    let mut last_t = 0;

    for frame in read_replay(BufReader::new(file)) {
        let frame = frame.map_err(|e| e.to_string())?;
        let report = tracker
            .process_frame(&frame.data, frame.t)
            .map_err(|e| e.to_string())?;

        seen.extend(report.assignments.iter().map(|a| a.id()));
        peak = peak.max(tracker.registry().len());
        last_t = frame.t;

        if tracker.frames_processed() % every as u64 == 0 {
            print_json_line(frame.t, &tracker.snapshots())?;
        }
    }

    info!(
        frames = tracker.frames_processed(),
        targets = seen.len(),
        peak,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Replay finished"
    );
    eprintln!(
        "replayed {} frames ({} ms of capture) in {}ms: {} targets seen, peak {} live",
        tracker.frames_processed(),
        last_t,
        started.elapsed().as_millis(),
        seen.len(),
        peak
    );
    Ok(())
}

/// Stream-decode a raw sensor capture and track its target reports
pub async fn decode(path: &str, interval_ms: Option<u64>, config: &AppConfig) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {path}: {e}"))?;
    let interval = interval_ms.unwrap_or(config.replay_frame_interval_ms);

    let (service, handle) = TrackingService::new(config.tracker());
    let task = tokio::spawn(service.run());

    let mut decoder = StreamDecoder::new();
    let mut presence = PresenceMonitor::new();
    let mut index: Millis = 0;
    for chunk in bytes.chunks(CAPTURE_CHUNK) {
        decoder.push(chunk);
        while let Some(result) = decoder.next_frame() {
            let frame = match result {
                Ok(frame) => frame,
                Err(_) => continue,
            };

            match frame.message() {
                MessageType::TargetPosition => match decode_targets(&frame.payload) {
                    Ok(detections) => {
                        let now = index * interval;
                        presence.update_targets(&detections, now);
                        handle
                            .push_frame(TimedFrame::new(now, detections))
                            .await
                            .map_err(|e| e.to_string())?;
                        index += 1;
                    }
                    Err(err) => warn!(%err, "Skipping malformed target report"),
                },
                MessageType::Presence => match decode_presence(&frame.payload) {
                    Ok(zones) => {
                        presence.update_zones(zones, index * interval);
                    }
                    Err(err) => warn!(%err, "Skipping malformed presence report"),
                },
                MessageType::PointCloud => {
                    if let Ok(points) = decode_point_cloud(&frame.payload) {
                        debug!(points = points.len(), "Point cloud");
                    }
                }
                MessageType::DetectionZones | MessageType::InterferenceZones => {
                    if let Ok(zones) = decode_zones(&frame.payload) {
                        let configured = zones.iter().filter(|z| !z.is_empty()).count();
                        info!(kind = ?frame.message(), configured, "Zone report");
                    }
                }
                other => debug!(?other, "Ignoring report"),
            }
        }
    }

    handle.shutdown().await.map_err(|e| e.to_string())?;
    task.await.map_err(|e| e.to_string())?;

    print_table(&handle.snapshot().await);

    let stats = decoder.stats();
    println!(
        "\n{} bytes, {} frames ({} target, {} presence), {} rejected, {} bytes skipped",
        stats.bytes,
        stats.frames,
        stats.target_frames,
        stats.presence_frames,
        stats.rejected,
        stats.discarded_bytes
    );
    println!("tracked {} frames", handle.frames_processed().await);

    let end = index.saturating_sub(1) * interval;
    if presence.person_present() {
        println!(
            "person present for {}s, {} zones occupied",
            presence.duration(end) / 1000,
            presence.occupied_zones()
        );
    } else {
        println!("nobody present, {} zones occupied", presence.occupied_zones());
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Interactive Commands
// ─────────────────────────────────────────────────────────────────────────────

fn apply(tracker: &mut TargetTracker, detections: &[Detection], now: Millis) -> Result<(), String> {
    let report = tracker
        .process_frame(detections, now)
        .map_err(|e| e.to_string())?;

    for assignment in &report.assignments {
        println!("{:?}", assignment);
    }
    for removal in &report.removals {
        println!("Removed {} ({:?})", removal.id, removal.reason);
    }
    Ok(())
}

pub async fn frame(ctx: &CliContext, at: Option<Millis>, points: &[String]) -> Result<(), String> {
    let detections = points
        .iter()
        .map(|p| parse_point(p))
        .collect::<Result<Vec<_>, _>>()?;

    let now = {
        let mut clock = ctx.clock.lock().await;
        match at {
            Some(at) => clock.set(at),
            None => clock.now(),
        }
    };
    if let Some(at) = at
        && at < now
    {
        println!("--at {at}ms is before the last frame, using {now}ms");
    }

    let mut tracker = ctx.tracker.write().await;
    println!("t={now}ms, {} detections", detections.len());
    apply(&mut tracker, &detections, now)
}

pub async fn advance(ctx: &CliContext, ms: Millis) -> Result<(), String> {
    let now = ctx.clock.lock().await.skip(ms);
    let mut tracker = ctx.tracker.write().await;
    println!("t={now}ms, empty frame");
    apply(&mut tracker, &[], now)
}

pub async fn set_trail_limit(ctx: &CliContext, limit: usize) -> Result<(), String> {
    let applied = ctx.tracker.write().await.set_trail_limit(limit);

    let mut config = ctx.config.write().await;
    config.trail_limit = applied.get();
    config.save().map_err(|e| e.to_string())?;

    println!("Trail limit set to {}", applied.get());
    Ok(())
}

pub async fn show_snapshot(ctx: &CliContext) {
    let tracker = ctx.tracker.read().await;
    print_table(&tracker.snapshots());
    println!(
        "\n{} frames processed, last at {}",
        tracker.frames_processed(),
        tracker
            .last_frame_at()
            .map(|t| format!("{t}ms"))
            .unwrap_or_else(|| "-".to_string())
    );
}

pub async fn show_config(ctx: &CliContext) {
    let config = ctx.config.read().await;
    let started = ctx.clock.lock().await.started();
    println!("trail_limit              = {}", config.trail_limit);
    println!("replay_frame_interval_ms = {}", config.replay_frame_interval_ms);
    println!("snapshot_every           = {}", config.snapshot_every);
    println!("session started          = {}", started.format("%Y-%m-%d %H:%M:%S"));
}

pub fn exit() {
    println!("quitting...");
}
