//! Start codes (ANSI E1.11 byte 0).
//!
//! Receivers that only understand lighting data must ignore any frame whose
//! start code is not [`NULL`].

/// Dimmer / lighting level data.
pub const NULL: u8 = 0x00;

/// ASCII text packet.
pub const TEXT: u8 = 0x17;

/// Test packet.
pub const TEST: u8 = 0x55;

/// UTF-8 text packet.
pub const UTF8_TEXT: u8 = 0x90;

/// Manufacturer-specific packet, prefixed with an ESTA manufacturer ID.
pub const MANUFACTURER: u8 = 0x91;

/// Remote Device Management (ANSI E1.20).
pub const RDM: u8 = 0xCC;

/// System Information Packet.
pub const SYSTEM_INFORMATION: u8 = 0xCF;

/// A start code, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartCode {
    Null,
    Text,
    Test,
    Utf8Text,
    Manufacturer,
    Rdm,
    SystemInformation,
    /// Anything else: reserved or vendor defined.
    Alternate(u8),
}

impl StartCode {
    /// The raw byte.
    pub fn value(self) -> u8 {
        match self {
            Self::Null => NULL,
            Self::Text => TEXT,
            Self::Test => TEST,
            Self::Utf8Text => UTF8_TEXT,
            Self::Manufacturer => MANUFACTURER,
            Self::Rdm => RDM,
            Self::SystemInformation => SYSTEM_INFORMATION,
            Self::Alternate(code) => code,
        }
    }

    /// Human-readable payload type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "DMX Lighting Data",
            Self::Text => "Text Packet",
            Self::Test => "Test Packet",
            Self::Utf8Text => "UTF-8 Text Packet",
            Self::Manufacturer => "Manufacturer Specific",
            Self::Rdm => "RDM",
            Self::SystemInformation => "System Information",
            Self::Alternate(_) => "Alternate / Vendor",
        }
    }

    /// Whether this is ordinary lighting data.
    pub fn is_lighting_data(self) -> bool {
        self == Self::Null
    }
}

impl From<u8> for StartCode {
    fn from(code: u8) -> Self {
        match code {
            NULL => Self::Null,
            TEXT => Self::Text,
            TEST => Self::Test,
            UTF8_TEXT => Self::Utf8Text,
            MANUFACTURER => Self::Manufacturer,
            RDM => Self::Rdm,
            SYSTEM_INFORMATION => Self::SystemInformation,
            other => Self::Alternate(other),
        }
    }
}

impl From<StartCode> for u8 {
    fn from(code: StartCode) -> Self {
        code.value()
    }
}

impl std::fmt::Display for StartCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_codes() {
        assert_eq!(StartCode::from(0x00), StartCode::Null);
        assert_eq!(StartCode::from(0xCC), StartCode::Rdm);
        assert_eq!(StartCode::from(0x17), StartCode::Text);
        assert_eq!(StartCode::from(0xCF), StartCode::SystemInformation);
        assert_eq!(StartCode::from(0x42), StartCode::Alternate(0x42));
    }

    #[test]
    fn value_inverts_classification() {
        for code in 0..=u8::MAX {
            assert_eq!(StartCode::from(code).value(), code);
        }
    }

    #[test]
    fn display_includes_hex() {
        assert_eq!(StartCode::Rdm.to_string(), "RDM (0xCC)");
        assert_eq!(StartCode::Null.to_string(), "DMX Lighting Data (0x00)");
        assert!(StartCode::Null.is_lighting_data());
        assert!(!StartCode::Alternate(0x01).is_lighting_data());
    }
}
