//! TinyFrame framing used by the HLK-LD6002 sensor
//!
//! ```text
//! ┌─────┬───────┬────────┬─────────┬────────────┬──────────────┬────────────┐
//! │ SOF │ ID    │ LEN    │ TYPE    │ HEAD_CKSUM │ DATA[LEN]    │ DATA_CKSUM │
//! │ 0x01│ u16 BE│ u16 BE │ u16 BE  │ u8         │ little-endian│ u8         │
//! └─────┴───────┴────────┴─────────┴────────────┴──────────────┴────────────┘
//! ```
//!
//! Both checksums are the inverted XOR of the bytes they cover.

use super::FrameError;

pub const START_OF_FRAME: u8 = 0x01;

/// SOF through header checksum
pub const HEADER_LEN: usize = 8;

/// Header plus data checksum, no payload
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;

/// Largest frame the decoder will buffer
pub const MAX_FRAME_LEN: usize = 1152;

/// Message type for host → sensor control commands
pub const CFG_HUMAN_DETECTION_3D: u16 = 0x0201;

/// Inverted XOR of all bytes
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Total frame length implied by a header's LEN field.
///
/// `header` must hold at least the first 5 bytes.
pub fn declared_frame_len(header: &[u8]) -> usize {
    let data_len = u16::from_be_bytes([header[3], header[4]]) as usize;
    HEADER_LEN + data_len + 1
}

/// Report types sent by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    TargetPosition,
    PointCloud,
    Presence,
    InterferenceZones,
    DetectionZones,
    HoldDelay,
    Sensitivity,
    TriggerSpeed,
    ZRange,
    InstallSite,
    LowPowerMode,
    LowPowerTime,
    WorkingMode,
    Other(u16),
}

impl MessageType {
    pub fn from_u16(raw: u16) -> Self {
        match raw {
            0x0A04 => Self::TargetPosition,
            0x0A08 => Self::PointCloud,
            0x0A0A => Self::Presence,
            0x0A0B => Self::InterferenceZones,
            0x0A0C => Self::DetectionZones,
            0x0A0D => Self::HoldDelay,
            0x0A0E => Self::Sensitivity,
            0x0A0F => Self::TriggerSpeed,
            0x0A10 => Self::ZRange,
            0x0A11 => Self::InstallSite,
            0x0A12 => Self::LowPowerMode,
            0x0A13 => Self::LowPowerTime,
            0x0A14 => Self::WorkingMode,
            other => Self::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::TargetPosition => 0x0A04,
            Self::PointCloud => 0x0A08,
            Self::Presence => 0x0A0A,
            Self::InterferenceZones => 0x0A0B,
            Self::DetectionZones => 0x0A0C,
            Self::HoldDelay => 0x0A0D,
            Self::Sensitivity => 0x0A0E,
            Self::TriggerSpeed => 0x0A0F,
            Self::ZRange => 0x0A10,
            Self::InstallSite => 0x0A11,
            Self::LowPowerMode => 0x0A12,
            Self::LowPowerTime => 0x0A13,
            Self::WorkingMode => 0x0A14,
            Self::Other(raw) => raw,
        }
    }
}

/// Control commands, sent as an `i32` LE argument of `CFG_HUMAN_DETECTION_3D`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ControlCommand {
    AutoGenerateInterferenceZone = 0x01,
    GetZones = 0x02,
    ClearInterferenceZone = 0x03,
    ResetDetectionZone = 0x04,
    GetHoldDelay = 0x05,
    EnablePointCloud = 0x06,
    DisablePointCloud = 0x07,
    EnableTargetDisplay = 0x08,
    DisableTargetDisplay = 0x09,
    SetSensitivityLow = 0x0A,
    SetSensitivityMedium = 0x0B,
    SetSensitivityHigh = 0x0C,
    GetSensitivity = 0x0D,
    SetTriggerSpeedSlow = 0x0E,
    SetTriggerSpeedMedium = 0x0F,
    SetTriggerSpeedFast = 0x10,
    GetTriggerSpeed = 0x11,
    GetZAxisRange = 0x12,
    SetInstallTopMounted = 0x13,
    SetInstallSideMounted = 0x14,
    GetInstallMethod = 0x15,
    EnableLowPowerMode = 0x16,
    DisableLowPowerMode = 0x17,
    GetLowPowerMode = 0x18,
    GetLowPowerSleepTime = 0x19,
    ResetNoPersonState = 0x1A,
}

impl ControlCommand {
    /// Commands the host sends after the sensor settles
    pub const STARTUP: [ControlCommand; 4] = [
        ControlCommand::EnableTargetDisplay,
        ControlCommand::GetSensitivity,
        ControlCommand::GetTriggerSpeed,
        ControlCommand::GetInstallMethod,
    ];

    pub fn to_frame(self) -> RawFrame {
        RawFrame::new(CFG_HUMAN_DETECTION_3D, (self as i32).to_le_bytes().to_vec())
    }
}

/// A validated frame with its payload still encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub id: u16,
    pub msg_type: u16,
    pub payload: Vec<u8>,
}

impl RawFrame {
    pub fn new(msg_type: u16, payload: Vec<u8>) -> Self {
        Self {
            id: 0,
            msg_type,
            payload,
        }
    }

    pub fn message(&self) -> MessageType {
        MessageType::from_u16(self.msg_type)
    }

    /// Validate and split one complete frame
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(FrameError::TooShort {
                len: bytes.len(),
                min: MIN_FRAME_LEN,
            });
        }
        if bytes[0] != START_OF_FRAME {
            return Err(FrameError::BadStartOfFrame { found: bytes[0] });
        }

        let computed = checksum(&bytes[..HEADER_LEN - 1]);
        let received = bytes[HEADER_LEN - 1];
        if computed != received {
            return Err(FrameError::HeaderChecksum { computed, received });
        }

        let expected = declared_frame_len(bytes);
        if bytes.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let payload = &bytes[HEADER_LEN..expected - 1];
        if !payload.is_empty() {
            let computed = checksum(payload);
            let received = bytes[expected - 1];
            if computed != received {
                return Err(FrameError::DataChecksum { computed, received });
            }
        }

        Ok(Self {
            id: u16::from_be_bytes([bytes[1], bytes[2]]),
            msg_type: u16::from_be_bytes([bytes[5], bytes[6]]),
            payload: payload.to_vec(),
        })
    }

    /// Serialize with both checksums. The data checksum byte is always
    /// written, so the result has exactly `declared_frame_len` bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_FRAME_LEN + self.payload.len());
        out.push(START_OF_FRAME);
        out.extend_from_slice(&self.id.to_be_bytes());
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.msg_type.to_be_bytes());
        out.push(checksum(&out));
        out.extend_from_slice(&self.payload);
        out.push(checksum(&self.payload));
        out
    }
}
