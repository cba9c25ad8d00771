//! Streaming WAL frame iterator.

use crate::error::{EngineError, EngineResult};
use crate::record::{Record, LEN_PREFIX_SIZE, PAYLOAD_HEADER_SIZE};
use keeldb_storage::StorageBackend;

/// A streaming iterator over WAL frames.
///
/// Reads the 4-byte length prefix into a stack buffer, then the payload
/// it announces, one frame at a time; replay memory is bounded by the
/// largest single frame, not the log size.
///
/// Yields `(offset, record)` pairs. Iteration ends cleanly when the log
/// ends at a frame boundary. A log ending inside a frame is a truncated
/// tail: fatal under the strict policy, a clean end under `tolerant_tail`.
/// A malformed frame is fatal under either policy (see [`crate::wal`]).
pub struct FrameIter<'a> {
    backend: &'a dyn StorageBackend,
    total_size: u64,
    offset: u64,
    tolerant_tail: bool,
    finished: bool,
}

impl<'a> FrameIter<'a> {
    /// Creates an iterator over the whole log.
    pub fn new(backend: &'a dyn StorageBackend, tolerant_tail: bool) -> Self {
        Self {
            backend,
            total_size: backend.size(),
            offset: 0,
            tolerant_tail,
            finished: false,
        }
    }

    /// Handles a log that ends inside a frame.
    fn truncated_tail(&mut self, what: &str, frame_offset: u64) -> EngineResult<Option<(u64, Record)>> {
        self.finished = true;
        if self.tolerant_tail {
            Ok(None)
        } else {
            Err(EngineError::corrupt_wal(format!(
                "log ends inside {what} of frame at offset {frame_offset}"
            )))
        }
    }

    fn read_next_frame(&mut self) -> EngineResult<Option<(u64, Record)>> {
        if self.finished || self.offset == self.total_size {
            self.finished = true;
            return Ok(None);
        }

        let frame_offset = self.offset;
        let remaining = self.total_size - self.offset;

        if remaining < LEN_PREFIX_SIZE as u64 {
            return self.truncated_tail("the length prefix", frame_offset);
        }

        let mut prefix = [0u8; LEN_PREFIX_SIZE];
        self.backend.read_at(self.offset, &mut prefix)?;
        let payload_len = u64::from(u32::from_be_bytes(prefix));

        // A partial write can only shorten a frame, so an impossible
        // payload length is corruption, not truncation.
        if payload_len < PAYLOAD_HEADER_SIZE as u64 {
            self.finished = true;
            return Err(EngineError::corrupt_wal(format!(
                "frame at offset {frame_offset} claims a {payload_len} byte payload, minimum is {PAYLOAD_HEADER_SIZE}"
            )));
        }

        if remaining - (LEN_PREFIX_SIZE as u64) < payload_len {
            return self.truncated_tail("the payload", frame_offset);
        }

        let mut payload = vec![0u8; payload_len as usize];
        self.backend
            .read_at(self.offset + LEN_PREFIX_SIZE as u64, &mut payload)?;

        let record = match Record::decode_payload(&payload) {
            Ok(record) => record,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        self.offset += LEN_PREFIX_SIZE as u64 + payload_len;
        Ok(Some((frame_offset, record)))
    }
}

impl Iterator for FrameIter<'_> {
    type Item = EngineResult<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next_frame() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
