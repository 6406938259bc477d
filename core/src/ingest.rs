//! Frame ingestion from the JSON transport
//!
//! Two input shapes are supported:
//! - live event messages, one JSON object per event, tagged on `"type"`
//! - recorded sessions, newline-delimited `{"t": <ms>, "data": [...]}` frames
//!
//! Only `target` messages carry detections. The other message kinds are kept
//! as opaque JSON so callers can forward them without the tracker caring.

use std::io::{self, BufRead, Lines};

use radartrack_types::{Detection, Millis};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid JSON on line {line}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read input")]
    Io(#[from] io::Error),

    #[error("frame on line {line} goes back in time ({current} ms after {previous} ms)")]
    OutOfOrder {
        line: usize,
        previous: Millis,
        current: Millis,
    },
}

/// One event from the sensor's push stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Connected,
    Target {
        data: Vec<Detection>,
    },
    Presence {
        #[serde(default)]
        data: Value,
    },
    DetectionZones {
        #[serde(default)]
        data: Value,
    },
    InterferenceZones {
        #[serde(default)]
        data: Value,
    },
    Config {
        #[serde(default)]
        data: Value,
    },
}

impl StreamMessage {
    /// Detections if this is a target frame
    pub fn detections(&self) -> Option<&[Detection]> {
        match self {
            StreamMessage::Target { data } => Some(data),
            _ => None,
        }
    }
}

pub fn parse_message(raw: &str) -> Result<StreamMessage, IngestError> {
    serde_json::from_str(raw).map_err(|source| IngestError::Json { line: 1, source })
}

/// A complete detection frame stamped with its capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedFrame {
    pub t: Millis,
    #[serde(default)]
    pub data: Vec<Detection>,
}

impl TimedFrame {
    pub fn new(t: Millis, data: Vec<Detection>) -> Self {
        Self { t, data }
    }
}

/// Iterator over the frames of a newline-delimited recording
pub struct ReplayReader<R> {
    lines: Lines<R>,
    line: usize,
    last_t: Option<Millis>,
}

impl<R: BufRead> Iterator for ReplayReader<R> {
    type Item = Result<TimedFrame, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next()? {
                Ok(raw) => raw,
                Err(err) => return Some(Err(err.into())),
            };
            self.line += 1;

            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let frame: TimedFrame = match serde_json::from_str(trimmed) {
                Ok(frame) => frame,
                Err(source) => {
                    return Some(Err(IngestError::Json {
                        line: self.line,
                        source,
                    }));
                }
            };

            if let Some(previous) = self.last_t
                && frame.t < previous
            {
                return Some(Err(IngestError::OutOfOrder {
                    line: self.line,
                    previous,
                    current: frame.t,
                }));
            }
            self.last_t = Some(frame.t);
            return Some(Ok(frame));
        }
    }
}

/// Read a recorded session. Blank lines are skipped; errors carry the
/// 1-based line number.
pub fn read_replay<R: BufRead>(reader: R) -> ReplayReader<R> {
    ReplayReader {
        lines: reader.lines(),
        line: 0,
        last_t: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_message() {
        let msg = parse_message(
            r#"{"type":"target","data":[{"x":0.5,"y":1.0,"z":0.2,"v":3,"c":1},{"x":2,"y":0,"z":0}]}"#,
        )
        .unwrap();

        let detections = msg.detections().unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].velocity, 3.0);
        assert_eq!(detections[0].cluster_id, 1);
        assert_eq!(detections[1].velocity, 0.0);
    }

    #[test]
    fn test_parse_non_target_messages() {
        let presence = parse_message(r#"{"type":"presence","data":{"zone1":1}}"#).unwrap();
        assert!(matches!(presence, StreamMessage::Presence { .. }));
        assert!(presence.detections().is_none());

        let connected = parse_message(r#"{"type":"connected"}"#).unwrap();
        assert_eq!(connected, StreamMessage::Connected);
    }

    #[test]
    fn test_parse_unknown_type_is_error() {
        assert!(matches!(
            parse_message(r#"{"type":"pointcloud","data":[]}"#),
            Err(IngestError::Json { .. })
        ));
    }

    #[test]
    fn test_read_replay_skips_blank_lines() {
        let input = "{\"t\":0,\"data\":[{\"x\":0,\"y\":0,\"z\":0}]}\n\n  \n{\"t\":100}\n";
        let frames: Vec<TimedFrame> = read_replay(input.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data.len(), 1);
        assert_eq!(frames[1], TimedFrame::new(100, Vec::new()));
    }

    #[test]
    fn test_read_replay_reports_line_numbers() {
        let input = "{\"t\":0,\"data\":[]}\n\n{not json}\n";
        let results: Vec<_> = read_replay(input.as_bytes()).collect();

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(IngestError::Json { line: 3, .. })));
    }

    #[test]
    fn test_read_replay_rejects_decreasing_timestamps() {
        let input = "{\"t\":200,\"data\":[]}\n{\"t\":100,\"data\":[]}\n{\"t\":200,\"data\":[]}\n";
        let results: Vec<_> = read_replay(input.as_bytes()).collect();

        assert!(matches!(
            results[1],
            Err(IngestError::OutOfOrder {
                line: 2,
                previous: 200,
                current: 100
            })
        ));
        assert!(results[2].is_ok(), "equal timestamps are allowed");
    }
}
