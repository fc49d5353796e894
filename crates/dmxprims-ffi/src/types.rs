use std::os::raw::c_int;

/// Status codes returned through the C ABI.
///
/// Every failure is negative so it never collides with a handle or a byte
/// count.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmxResult {
    Ok = 0,
    /// Device missing, busy, permission denied, or line settings rejected.
    OpenFailed = -1,
    /// OS-level read or write failure.
    IoFailed = -2,
    /// Handle never issued, or already closed.
    InvalidHandle = -3,
    /// Null pointer, negative length, or length over 513.
    InvalidArgument = -4,
    Internal = -99,
}

impl DmxResult {
    pub(crate) fn code(self) -> c_int {
        self as c_int
    }
}

pub const DMX_OK: c_int = DmxResult::Ok as c_int;
pub const DMX_ERR_OPEN: c_int = DmxResult::OpenFailed as c_int;
pub const DMX_ERR_IO: c_int = DmxResult::IoFailed as c_int;
pub const DMX_ERR_INVALID_HANDLE: c_int = DmxResult::InvalidHandle as c_int;
pub const DMX_ERR_INVALID_ARGUMENT: c_int = DmxResult::InvalidArgument as c_int;
pub const DMX_ERR_INTERNAL: c_int = DmxResult::Internal as c_int;

/// Largest `length` accepted by `dmx_write`.
pub const DMX_MAX_FRAME_LEN: c_int = dmxprims_serial::MAX_FRAME_LEN as c_int;
