use dmxprims_serial::MAX_FRAME_LEN;

use crate::error::{FrameError, Result};
use crate::start_code::{self, StartCode};

/// Slots in a full universe.
pub const SLOT_COUNT: usize = MAX_FRAME_LEN - 1;

/// A start code followed by up to 512 slots.
///
/// Slots are 1-indexed: slot 0 is the start code and cannot be addressed
/// through the slot setters. The buffer is always 513 bytes; only the first
/// `1 + slot_count` go on the wire, so short frames (for faster refresh) are
/// supported.
#[derive(Clone, PartialEq, Eq)]
pub struct DmxFrame {
    buf: [u8; MAX_FRAME_LEN],
    slot_count: usize,
}

impl DmxFrame {
    /// A full 512-slot frame with every slot at zero.
    pub fn new(start_code: u8) -> Self {
        let mut buf = [0u8; MAX_FRAME_LEN];
        buf[0] = start_code;
        Self {
            buf,
            slot_count: SLOT_COUNT,
        }
    }

    /// A frame carrying `slot_count` zeroed slots.
    pub fn with_slots(start_code: u8, slot_count: usize) -> Result<Self> {
        if slot_count > SLOT_COUNT {
            return Err(FrameError::TooLong {
                len: slot_count + 1,
                max: MAX_FRAME_LEN,
            });
        }
        let mut frame = Self::new(start_code);
        frame.slot_count = slot_count;
        Ok(frame)
    }

    /// Copy a wire-format buffer (start code first).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (&code, slots) = bytes.split_first().ok_or(FrameError::Empty)?;
        let mut frame = Self::with_slots(code, slots.len())?;
        frame.buf[1..bytes.len()].copy_from_slice(slots);
        Ok(frame)
    }

    pub fn start_code(&self) -> StartCode {
        StartCode::from(self.buf[0])
    }

    pub fn set_start_code(&mut self, code: impl Into<u8>) {
        self.buf[0] = code.into();
    }

    /// Number of slots transmitted after the start code.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Value at 1-based `slot`, or `None` outside the active range.
    pub fn slot(&self, slot: usize) -> Option<u8> {
        (1..=self.slot_count).contains(&slot).then(|| self.buf[slot])
    }

    /// Set 1-based `slot`.
    pub fn set_slot(&mut self, slot: usize, value: u8) -> Result<()> {
        self.check_slot(slot)?;
        self.buf[slot] = value;
        Ok(())
    }

    /// Set consecutive slots starting at 1-based `first`.
    ///
    /// All-or-nothing: nothing is written if any slot would fall outside
    /// the active range.
    pub fn set_slots(&mut self, first: usize, values: &[u8]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.check_slot(first)?;
        self.check_slot(first + values.len() - 1)?;
        self.buf[first..first + values.len()].copy_from_slice(values);
        Ok(())
    }

    /// The active slots, slot 1 first.
    pub fn slots(&self) -> &[u8] {
        &self.buf[1..=self.slot_count]
    }

    /// Zero every slot, keeping the start code.
    pub fn blackout(&mut self) {
        self.buf[1..].fill(0);
    }

    /// Wire bytes: start code plus active slots.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Wire length in bytes.
    pub fn len(&self) -> usize {
        1 + self.slot_count
    }

    /// Never true: a frame always carries its start code.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot == 0 || slot > self.slot_count {
            return Err(FrameError::SlotOutOfRange {
                slot,
                max: self.slot_count,
            });
        }
        Ok(())
    }
}

impl Default for DmxFrame {
    fn default() -> Self {
        Self::new(start_code::NULL)
    }
}

impl AsRef<[u8]> for DmxFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for DmxFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.slots().iter().filter(|&&v| v != 0).count();
        f.debug_struct("DmxFrame")
            .field("start_code", &self.start_code())
            .field("slot_count", &self.slot_count)
            .field("non_zero_slots", &lit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_is_full_universe() {
        let frame = DmxFrame::default();
        assert_eq!(frame.len(), 513);
        assert_eq!(frame.slot_count(), 512);
        assert_eq!(frame.start_code(), StartCode::Null);
        assert!(frame.slots().iter().all(|&v| v == 0));
    }

    #[test]
    fn slot_zero_is_reserved_for_start_code() {
        let mut frame = DmxFrame::default();
        let err = frame.set_slot(0, 255).unwrap_err();
        assert!(matches!(err, FrameError::SlotOutOfRange { slot: 0, .. }));
        assert_eq!(frame.as_bytes()[0], start_code::NULL);
    }

    #[test]
    fn slots_are_one_indexed() {
        let mut frame = DmxFrame::default();
        frame.set_slot(1, 255).unwrap();
        frame.set_slot(512, 7).unwrap();
        assert_eq!(frame.as_bytes()[1], 255);
        assert_eq!(frame.as_bytes()[512], 7);
        assert_eq!(frame.slot(1), Some(255));
        assert_eq!(frame.slot(513), None);
        assert!(frame.set_slot(513, 1).is_err());
    }

    #[test]
    fn short_frame_limits_wire_bytes() {
        let mut frame = DmxFrame::with_slots(start_code::NULL, 1).unwrap();
        frame.set_slot(1, 0xFF).unwrap();
        assert_eq!(frame.as_bytes(), &[0x00, 0xFF]);
        assert!(frame.set_slot(2, 1).is_err());
        assert!(DmxFrame::with_slots(start_code::NULL, 513).is_err());
    }

    #[test]
    fn from_bytes_copies_wire_layout() {
        let frame = DmxFrame::from_bytes(&[0xCC, 1, 2, 3]).unwrap();
        assert_eq!(frame.start_code(), StartCode::Rdm);
        assert_eq!(frame.slots(), &[1, 2, 3]);
        assert!(matches!(DmxFrame::from_bytes(&[]), Err(FrameError::Empty)));
        assert!(matches!(
            DmxFrame::from_bytes(&[0u8; 514]),
            Err(FrameError::TooLong { len: 514, .. })
        ));
    }

    #[test]
    fn set_slots_is_all_or_nothing() {
        let mut frame = DmxFrame::with_slots(start_code::NULL, 4).unwrap();
        frame.set_slots(2, &[10, 20, 30]).unwrap();
        assert_eq!(frame.slots(), &[0, 10, 20, 30]);

        let err = frame.set_slots(3, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, FrameError::SlotOutOfRange { slot: 5, max: 4 }));
        assert_eq!(frame.slots(), &[0, 10, 20, 30]);
    }

    #[test]
    fn blackout_keeps_start_code() {
        let mut frame = DmxFrame::new(start_code::TEXT);
        frame.set_slots(1, &[9; 16]).unwrap();
        frame.blackout();
        assert_eq!(frame.start_code(), StartCode::Text);
        assert!(frame.slots().iter().all(|&v| v == 0));
    }
}
