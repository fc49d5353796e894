//! Test doubles for `DmxTransport`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use dmxprims_serial::{DmxTransport, Result, SerialError};

/// One observable line event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineEvent {
    Break,
    Data(Vec<u8>),
}

/// Records every BREAK and accepted byte run. Writes can be capped to force
/// partial counts; queued input is handed out by `read_frame`.
#[derive(Default, Clone)]
pub(crate) struct RecordingTransport {
    pub(crate) events: Arc<Mutex<Vec<LineEvent>>>,
    pub(crate) write_cap: Option<usize>,
    pub(crate) input: VecDeque<Vec<u8>>,
    pub(crate) fail_writes: bool,
    pub(crate) closed: bool,
}

impl RecordingTransport {
    pub(crate) fn events(&self) -> Vec<LineEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Bytes between consecutive BREAKs, one entry per frame.
    pub(crate) fn frames(&self) -> Vec<Vec<u8>> {
        let mut frames: Vec<Vec<u8>> = Vec::new();
        for event in self.events() {
            match event {
                LineEvent::Break => frames.push(Vec::new()),
                LineEvent::Data(bytes) => {
                    if let Some(last) = frames.last_mut() {
                        last.extend_from_slice(&bytes);
                    }
                }
            }
        }
        frames
    }
}

impl DmxTransport for RecordingTransport {
    fn send_break(&mut self) -> Result<()> {
        if self.closed {
            return Err(SerialError::Closed);
        }
        self.events.lock().unwrap().push(LineEvent::Break);
        Ok(())
    }

    fn write(&mut self, frame: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(SerialError::Closed);
        }
        if self.fail_writes {
            return Err(SerialError::Io(std::io::Error::other("line fault")));
        }
        let n = self.write_cap.map_or(frame.len(), |cap| cap.min(frame.len()));
        if n > 0 {
            self.events
                .lock()
                .unwrap()
                .push(LineEvent::Data(frame[..n].to_vec()));
        }
        Ok(n)
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(SerialError::Closed);
        }
        let Some(mut chunk) = self.input.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.input.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_open(&self) -> bool {
        !self.closed
    }
}
