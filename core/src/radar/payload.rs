//! Payload decoders for sensor reports

use radartrack_types::{Detection, Position};

use super::FrameError;

/// Bytes per target record: x, y, z (f32) then velocity, cluster (i32)
pub const TARGET_RECORD_LEN: usize = 20;

/// Bytes per point-cloud record: cluster (i32) then x, y, z, speed (f32)
pub const CLOUD_RECORD_LEN: usize = 20;

/// Zones reported by presence and zone messages
pub const ZONE_COUNT: usize = 4;

/// Bytes per zone box: six f32 bounds
pub const ZONE_RECORD_LEN: usize = 24;

/// Axis-aligned zone box in meters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Zone {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl Zone {
    /// Unconfigured zones are reported as all zeros
    pub fn is_empty(&self) -> bool {
        *self == Zone::default()
    }
}

fn require(payload: &[u8], needed: usize) -> Result<(), FrameError> {
    if payload.len() < needed {
        return Err(FrameError::Truncated {
            needed,
            available: payload.len(),
        });
    }
    Ok(())
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_bits(read_u32(bytes, offset))
}

/// Decode a target-position report into one frame of detections.
///
/// A non-positive count is an empty frame. Trailing bytes past the declared
/// count are ignored.
pub fn decode_targets(payload: &[u8]) -> Result<Vec<Detection>, FrameError> {
    require(payload, 4)?;
    let count = read_i32(payload, 0);
    if count <= 0 {
        return Ok(Vec::new());
    }

    let count = count as usize;
    require(payload, 4 + TARGET_RECORD_LEN * count)?;

    let detections = payload[4..4 + TARGET_RECORD_LEN * count]
        .chunks_exact(TARGET_RECORD_LEN)
        .map(|record| {
            Detection::new(
                read_f32(record, 0),
                read_f32(record, 4),
                read_f32(record, 8),
            )
            .with_velocity(read_i32(record, 12) as f32)
            .with_cluster(read_i32(record, 16))
        })
        .collect();

    Ok(detections)
}

/// One raw reflection from a point-cloud report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudPoint {
    pub cluster_id: i32,
    pub position: Position,
    /// Radial speed in m/s
    pub speed: f32,
}

/// Decode a point-cloud report. Same count and truncation rules as
/// `decode_targets`, but the cluster index leads each record.
pub fn decode_point_cloud(payload: &[u8]) -> Result<Vec<CloudPoint>, FrameError> {
    require(payload, 4)?;
    let count = read_i32(payload, 0);
    if count <= 0 {
        return Ok(Vec::new());
    }

    let count = count as usize;
    require(payload, 4 + CLOUD_RECORD_LEN * count)?;

    let points = payload[4..4 + CLOUD_RECORD_LEN * count]
        .chunks_exact(CLOUD_RECORD_LEN)
        .map(|record| CloudPoint {
            cluster_id: read_i32(record, 0),
            position: Position::new(
                read_f32(record, 4),
                read_f32(record, 8),
                read_f32(record, 12),
            ),
            speed: read_f32(record, 16),
        })
        .collect();

    Ok(points)
}

/// Per-zone occupancy flags
pub fn decode_presence(payload: &[u8]) -> Result<[bool; ZONE_COUNT], FrameError> {
    require(payload, 4 * ZONE_COUNT)?;
    let mut zones = [false; ZONE_COUNT];
    for (i, zone) in zones.iter_mut().enumerate() {
        *zone = read_u32(payload, i * 4) != 0;
    }
    Ok(zones)
}

/// Detection or interference zone boxes
pub fn decode_zones(payload: &[u8]) -> Result<[Zone; ZONE_COUNT], FrameError> {
    require(payload, ZONE_RECORD_LEN * ZONE_COUNT)?;
    let mut zones = [Zone::default(); ZONE_COUNT];
    for (i, zone) in zones.iter_mut().enumerate() {
        let base = i * ZONE_RECORD_LEN;
        *zone = Zone {
            x_min: read_f32(payload, base),
            x_max: read_f32(payload, base + 4),
            y_min: read_f32(payload, base + 8),
            y_max: read_f32(payload, base + 12),
            z_min: read_f32(payload, base + 16),
            z_max: read_f32(payload, base + 20),
        };
    }
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_payload(targets: &[(f32, f32, f32, i32, i32)]) -> Vec<u8> {
        let mut out = (targets.len() as i32).to_le_bytes().to_vec();
        for &(x, y, z, v, c) in targets {
            out.extend_from_slice(&x.to_le_bytes());
            out.extend_from_slice(&y.to_le_bytes());
            out.extend_from_slice(&z.to_le_bytes());
            out.extend_from_slice(&v.to_le_bytes());
            out.extend_from_slice(&c.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_targets_reads_each_record() {
        let payload = target_payload(&[(0.5, 1.25, -0.5, 3, 7), (2.0, 0.0, 1.0, 0, -1)]);
        let detections = decode_targets(&payload).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0], Detection::new(0.5, 1.25, -0.5).with_velocity(3.0).with_cluster(7));
        assert_eq!(detections[1].cluster_id, -1);
        assert_eq!(detections[1].velocity, 0.0);
    }

    #[test]
    fn test_decode_targets_non_positive_count_is_empty() {
        assert!(decode_targets(&0i32.to_le_bytes()).unwrap().is_empty());
        assert!(decode_targets(&(-3i32).to_le_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_targets_truncated() {
        let mut payload = target_payload(&[(0.0, 0.0, 0.0, 0, 0), (1.0, 0.0, 0.0, 0, 0)]);
        payload.truncate(30);

        assert_eq!(
            decode_targets(&payload),
            Err(FrameError::Truncated {
                needed: 44,
                available: 30
            })
        );
        assert!(matches!(
            decode_targets(&[0, 0]),
            Err(FrameError::Truncated { needed: 4, .. })
        ));
    }

    #[test]
    fn test_decode_point_cloud_reads_cluster_first() {
        let mut payload = 2i32.to_le_bytes().to_vec();
        for (cluster, x, y, z, speed) in [(4i32, 0.5f32, 1.0f32, 0.0f32, -0.25f32), (-1, 2.0, 2.0, 1.0, 0.0)] {
            payload.extend_from_slice(&cluster.to_le_bytes());
            for v in [x, y, z, speed] {
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }

        let points = decode_point_cloud(&payload).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].cluster_id, 4);
        assert_eq!(points[0].position, Position::new(0.5, 1.0, 0.0));
        assert_eq!(points[0].speed, -0.25);
        assert_eq!(points[1].cluster_id, -1);

        assert!(matches!(
            decode_point_cloud(&payload[..30]),
            Err(FrameError::Truncated { needed: 44, available: 30 })
        ));
        assert!(decode_point_cloud(&0i32.to_le_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_presence_flags() {
        let mut payload = Vec::new();
        for flag in [1u32, 0, 0, 5] {
            payload.extend_from_slice(&flag.to_le_bytes());
        }
        assert_eq!(decode_presence(&payload).unwrap(), [true, false, false, true]);
        assert!(decode_presence(&payload[..12]).is_err());
    }

    #[test]
    fn test_decode_zones_reads_bounds() {
        let mut payload = vec![0u8; ZONE_RECORD_LEN * ZONE_COUNT];
        for (i, bound) in [-1.0f32, 1.0, 0.0, 2.0, 0.0, 2.5].iter().enumerate() {
            payload[i * 4..i * 4 + 4].copy_from_slice(&bound.to_le_bytes());
        }

        let zones = decode_zones(&payload).unwrap();
        assert_eq!(zones[0].x_min, -1.0);
        assert_eq!(zones[0].z_max, 2.5);
        assert!(!zones[0].is_empty());
        assert!(zones[1].is_empty());
    }
}
