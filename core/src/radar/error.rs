//! Error types for the radar wire codec

use thiserror::Error;

/// Errors while validating or decoding a sensor frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("invalid start of frame byte 0x{found:02X}")]
    BadStartOfFrame { found: u8 },

    #[error("header checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    HeaderChecksum { computed: u8, received: u8 },

    #[error("frame length mismatch: got {actual} bytes, header declares {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("data checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    DataChecksum { computed: u8, received: u8 },

    #[error("declared frame of {len} bytes exceeds buffer of {max}")]
    Oversized { len: usize, max: usize },

    #[error("payload truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
}
