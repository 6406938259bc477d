//! Incremental frame reassembly over a UART byte stream
//!
//! Bytes arrive in arbitrary chunks. The decoder buffers them, skips to the
//! next start-of-frame byte, waits until the declared frame length is
//! available and hands back one validated frame at a time. Any framing
//! failure drops the leading SOF byte and resynchronises on the next one.

use memchr::memchr;
use tracing::{trace, warn};

use super::FrameError;
use super::frame::{
    HEADER_LEN, MAX_FRAME_LEN, MessageType, RawFrame, START_OF_FRAME, checksum,
    declared_frame_len,
};

/// Header bytes needed to read the LEN field
const LEN_FIELD_END: usize = 5;

/// Counters kept across the lifetime of a decoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub bytes: u64,
    pub frames: u64,
    pub target_frames: u64,
    pub presence_frames: u64,
    pub rejected: u64,
    pub discarded_bytes: u64,
}

#[derive(Debug, Default)]
pub struct StreamDecoder {
    buf: Vec<u8>,
    stats: FrameStats,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.stats.bytes += bytes.len() as u64;
        self.buf.extend_from_slice(bytes);
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Bytes waiting for the rest of a frame
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Next complete frame, or `None` until more bytes are pushed.
    ///
    /// An `Err` reports one rejected frame; call again to continue.
    pub fn next_frame(&mut self) -> Option<Result<RawFrame, FrameError>> {
        match memchr(START_OF_FRAME, &self.buf) {
            Some(0) => {}
            Some(start) => self.discard(start),
            None => {
                let len = self.buf.len();
                self.discard(len);
                return None;
            }
        }

        if self.buf.len() < LEN_FIELD_END {
            return None;
        }
        let frame_len = declared_frame_len(&self.buf);
        if frame_len > MAX_FRAME_LEN {
            return Some(Err(self.reject(FrameError::Oversized {
                len: frame_len,
                max: MAX_FRAME_LEN,
            })));
        }

        if self.buf.len() < HEADER_LEN {
            return None;
        }
        let computed = checksum(&self.buf[..HEADER_LEN - 1]);
        let received = self.buf[HEADER_LEN - 1];
        if computed != received {
            return Some(Err(self.reject(FrameError::HeaderChecksum { computed, received })));
        }

        if self.buf.len() < frame_len {
            return None;
        }

        let result = RawFrame::parse(&self.buf[..frame_len]);
        match result {
            Ok(frame) => {
                self.buf.drain(..frame_len);
                self.stats.frames += 1;
                match frame.message() {
                    MessageType::TargetPosition => self.stats.target_frames += 1,
                    MessageType::Presence => self.stats.presence_frames += 1,
                    _ => {}
                }
                trace!(msg_type = frame.msg_type, len = frame.payload.len(), "Decoded frame");
                Some(Ok(frame))
            }
            Err(err) => Some(Err(self.reject(err))),
        }
    }

    fn discard(&mut self, count: usize) {
        self.buf.drain(..count);
        self.stats.discarded_bytes += count as u64;
    }

    /// Drop the SOF byte so the next search starts past this frame
    fn reject(&mut self, err: FrameError) -> FrameError {
        warn!(%err, "Rejected radar frame");
        self.discard(1);
        self.stats.rejected += 1;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::super::ControlCommand;
    use super::*;

    fn target_frame() -> Vec<u8> {
        let mut payload = 1i32.to_le_bytes().to_vec();
        for v in [0.5f32, 1.0, 0.25] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        payload.extend_from_slice(&0i32.to_le_bytes());
        payload.extend_from_slice(&2i32.to_le_bytes());
        RawFrame::new(MessageType::TargetPosition.as_u16(), payload).encode()
    }

    fn drain(decoder: &mut StreamDecoder) -> Vec<Result<RawFrame, FrameError>> {
        std::iter::from_fn(|| decoder.next_frame()).collect()
    }

    #[test]
    fn test_frame_split_across_pushes() {
        let bytes = target_frame();
        let mut decoder = StreamDecoder::new();

        decoder.push(&bytes[..3]);
        assert!(decoder.next_frame().is_none());
        decoder.push(&bytes[3..10]);
        assert!(decoder.next_frame().is_none());
        decoder.push(&bytes[10..]);

        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame.message(), MessageType::TargetPosition);
        assert_eq!(decoder.buffered(), 0);
        assert_eq!(decoder.stats().target_frames, 1);
    }

    #[test]
    fn test_garbage_before_frame_is_discarded() {
        let mut decoder = StreamDecoder::new();
        decoder.push(&[0xAA, 0xBB, 0xCC]);
        decoder.push(&target_frame());

        let results = drain(&mut decoder);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
        assert_eq!(decoder.stats().discarded_bytes, 3);
    }

    #[test]
    fn test_resync_after_bad_header_checksum() {
        let mut corrupt = target_frame();
        corrupt[7] ^= 0x5A;
        let good = ControlCommand::GetSensitivity.to_frame().encode();

        let mut decoder = StreamDecoder::new();
        decoder.push(&corrupt);
        decoder.push(&good);

        let frames: Vec<RawFrame> = drain(&mut decoder).into_iter().filter_map(Result::ok).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, vec![0x0D, 0, 0, 0]);
        assert!(decoder.stats().rejected >= 1);
    }

    #[test]
    fn test_bad_data_checksum_is_rejected() {
        let mut bytes = target_frame();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let mut decoder = StreamDecoder::new();
        decoder.push(&bytes);
        let first = decoder.next_frame().unwrap();

        assert!(matches!(first, Err(FrameError::DataChecksum { .. })));
        assert_eq!(decoder.stats().rejected, 1);
    }

    #[test]
    fn test_oversized_declared_length_resyncs() {
        let mut decoder = StreamDecoder::new();
        decoder.push(&[START_OF_FRAME, 0x00, 0x00, 0xFF, 0xFF]);
        decoder.push(&target_frame());

        let results = drain(&mut decoder);
        assert!(matches!(results[0], Err(FrameError::Oversized { .. })));
        assert!(results.last().unwrap().is_ok());
        assert_eq!(decoder.stats().frames, 1);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut stream = target_frame();
        stream.extend(target_frame());
        stream.extend(ControlCommand::EnableTargetDisplay.to_frame().encode());

        let mut decoder = StreamDecoder::new();
        decoder.push(&stream);
        let results = drain(&mut decoder);

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(Result::is_ok));
        let stats = decoder.stats();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.target_frames, 2);
        assert_eq!(stats.bytes, stream.len() as u64);
    }
}
