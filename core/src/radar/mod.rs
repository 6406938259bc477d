//! HLK-LD6002 radar wire codec
//!
//! Decodes the sensor's TinyFrame UART stream into detection batches that
//! can be handed to the tracker as complete frames:
//!
//! ```text
//!   UART bytes ──▶ StreamDecoder ──▶ RawFrame ──▶ decode_targets ──▶ Vec<Detection>
//!                                        │
//!                                        └──▶ decode_presence / decode_zones / decode_point_cloud
//! ```
//!
//! Host commands go the other way through `ControlCommand::to_frame`.

mod error;
mod frame;
mod payload;
mod stream;

pub use error::FrameError;
pub use frame::{
    CFG_HUMAN_DETECTION_3D, ControlCommand, HEADER_LEN, MAX_FRAME_LEN, MIN_FRAME_LEN,
    MessageType, RawFrame, START_OF_FRAME, checksum, declared_frame_len,
};
pub use payload::{
    CLOUD_RECORD_LEN, CloudPoint, TARGET_RECORD_LEN, ZONE_COUNT, Zone, decode_point_cloud,
    decode_presence, decode_targets, decode_zones,
};
pub use stream::{FrameStats, StreamDecoder};
