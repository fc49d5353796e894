use crate::error::Result;

/// A DMX512 line: BREAK generation plus raw byte I/O.
///
/// This is the seam every higher layer is written against. [`SerialPort`]
/// is the one concrete implementation per target; tests substitute
/// recording or loopback transports.
///
/// Receivers take `&mut self`: a line is driven by one thread of control at
/// a time. Callers that want a dedicated output thread move the transport
/// into it.
///
/// [`SerialPort`]: crate::SerialPort
pub trait DmxTransport {
    /// Signal the start of a frame: BREAK, then Mark-After-Break.
    ///
    /// Does not transmit data. Timing precision is platform dependent and
    /// never reported as an error.
    fn send_break(&mut self) -> Result<()>;

    /// Write up to 513 bytes (start code + 512 slots) onto the line.
    ///
    /// Returns the number of bytes accepted, which may be short, including
    /// zero when the driver buffer is full. Does not send a BREAK.
    fn write(&mut self, frame: &[u8]) -> Result<usize>;

    /// Read whatever bytes are queued, without blocking.
    ///
    /// Returns `Ok(0)` when nothing is available. No frame alignment is
    /// attempted.
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Release the underlying device. Further calls fail with `Closed`.
    fn close(&mut self);

    /// Whether the line is still open.
    fn is_open(&self) -> bool;
}

impl<T: DmxTransport + ?Sized> DmxTransport for Box<T> {
    fn send_break(&mut self) -> Result<()> {
        (**self).send_break()
    }

    fn write(&mut self, frame: &[u8]) -> Result<usize> {
        (**self).write(frame)
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_frame(buf)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
