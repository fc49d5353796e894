use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};

use dmxprims_serial::SerialError;

use crate::types::DmxResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> c_int {
    set_error_message(message);
    DmxResult::InvalidArgument.code()
}

pub(crate) fn set_invalid_handle(handle: c_int) -> c_int {
    set_error_message(format!("handle {handle} is not open"));
    DmxResult::InvalidHandle.code()
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_serial_error(err: &SerialError) -> c_int {
    set_error_message(err.to_string());
    let result = match err {
        SerialError::Open { .. } | SerialError::Configure { .. } => DmxResult::OpenFailed,
        SerialError::Io(_) => DmxResult::IoFailed,
        SerialError::Closed => DmxResult::InvalidHandle,
        SerialError::FrameTooLong { .. } | SerialError::InvalidTiming { .. } => {
            DmxResult::InvalidArgument
        }
    };
    result.code()
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}
