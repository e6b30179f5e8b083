//! Length-prefixed FRAME reassembly from a continuous byte stream.

use bytes::Bytes;
use screenlink_core::protocol::FRAME_WORD;
use screenlink_core::{Frame, ProtocolError};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ClientError;

/// Upper bound on a declared frame size (64 MiB). Anything larger is a
/// protocol error, not an allocation attempt.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Reassembles FRAME messages from a stream where any read may return
/// fewer bytes than asked for.
///
/// `read_exact` does the short-read accumulation: a buffer counts as
/// complete only once exactly N bytes have arrived, however many reads
/// that takes, and EOF mid-buffer is an error. One reader lives exactly
/// as long as one connection — it is dropped, partial state and all, when
/// the state machine reconnects.
pub struct FrameReader<R> {
    reader: R,
    max_frame_len: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_frame_len(reader, DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(reader: R, max_frame_len: usize) -> Self {
        Self {
            reader,
            max_frame_len,
        }
    }

    /// Read the next FRAME message.
    ///
    /// - `Ok(Some(Frame::Blank))` — size field `< 0`, no payload bytes
    /// - `Ok(None)` — size field `== 0`, no payload, no event
    /// - `Ok(Some(Frame::Payload(..)))` — size field `> 0`, full payload
    /// - `Err(..)` — closed stream, short read, bad magic or absurd size;
    ///   always fatal for the connection
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ClientError> {
        let mut magic = [0u8; FRAME_WORD.len()];
        self.reader.read_exact(&mut magic).await?;
        if &magic[..] != FRAME_WORD {
            // No resync scan is defined for a desynchronised stream; the
            // caller tears the connection down and reconnects.
            return Err(ProtocolError::BadMagic { expected: "FRAME" }.into());
        }

        let mut size_buf = [0u8; 4];
        self.reader.read_exact(&mut size_buf).await?;
        let size = i32::from_le_bytes(size_buf);

        if size < 0 {
            return Ok(Some(Frame::Blank));
        }
        if size == 0 {
            return Ok(None);
        }
        if size as usize > self.max_frame_len {
            return Err(ProtocolError::FrameTooLarge {
                size,
                max: self.max_frame_len,
            }
            .into());
        }

        let mut payload = vec![0u8; size as usize];
        self.reader.read_exact(&mut payload).await?;
        Ok(Some(Frame::Payload(Bytes::from(payload))))
    }
}
