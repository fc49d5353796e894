use dmxprims_serial::{DmxTransport, MAX_FRAME_LEN};
use tracing::trace;

use crate::error::Result;
use crate::start_code::StartCode;

/// Polls a [`DmxTransport`] for incoming bytes.
///
/// DMX512 gives no length field, so nothing here reassembles frames: each
/// successful poll hands back exactly what the driver had queued. The first
/// byte of a chunk is only a start code if the chunk follows a BREAK.
pub struct FrameReader<T> {
    inner: T,
    buf: [u8; MAX_FRAME_LEN],
    chunks: u64,
}

impl<T: DmxTransport> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: [0u8; MAX_FRAME_LEN],
            chunks: 0,
        }
    }

    /// One non-blocking read. `Ok(None)` when the line is quiet.
    pub fn poll(&mut self) -> Result<Option<&[u8]>> {
        let n = self.inner.read_frame(&mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.chunks = self.chunks.saturating_add(1);
        trace!(len = n, chunks = self.chunks, "chunk received");
        Ok(Some(&self.buf[..n]))
    }

    /// Chunks received so far.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Classify a received chunk by its first byte.
pub fn classify(chunk: &[u8]) -> Option<StartCode> {
    chunk.first().copied().map(StartCode::from)
}
