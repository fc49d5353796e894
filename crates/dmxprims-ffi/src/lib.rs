//! dmxprims-ffi: C-ABI exports for the DMX512 serial line.
//!
//! Handles are positive integers; every failure is a negative `DMX_ERR_*`
//! code with a message available from [`dmx_last_error`] on the same thread.

mod args;
mod error;
mod port;
mod registry;
mod types;

use std::panic::AssertUnwindSafe;

pub use port::{
    dmx_close, dmx_open, dmx_open_with_timing, dmx_read_frame, dmx_send_break, dmx_write,
};
pub use types::{
    DmxResult, DMX_ERR_INTERNAL, DMX_ERR_INVALID_ARGUMENT, DMX_ERR_INVALID_HANDLE, DMX_ERR_IO,
    DMX_ERR_OPEN, DMX_MAX_FRAME_LEN, DMX_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Message for the most recent failure on this thread, or an empty string.
///
/// The pointer stays valid until the next `dmx_*` call on the same thread.
#[no_mangle]
pub extern "C" fn dmx_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    #[test]
    fn last_error_returns_non_null_pointer() {
        error::clear_error_state();
        let ptr = dmx_last_error();
        assert!(!ptr.is_null());

        // SAFETY: dmx_last_error returns a pointer to a thread-local CString.
        let text = unsafe { CStr::from_ptr(ptr).to_str().unwrap() };
        assert!(text.is_empty());
    }

    #[test]
    fn panics_are_contained() {
        let rc = ffi_boundary(DMX_ERR_INTERNAL, || panic!("boom"));
        assert_eq!(rc, DMX_ERR_INTERNAL);
        // SAFETY: dmx_last_error returns a pointer to a thread-local CString.
        let text = unsafe { CStr::from_ptr(dmx_last_error()) };
        assert_eq!(text.to_str().unwrap(), "panic across FFI boundary");
    }

    #[test]
    fn sentinels_are_negative_and_distinct() {
        let codes = [
            DMX_ERR_OPEN,
            DMX_ERR_IO,
            DMX_ERR_INVALID_HANDLE,
            DMX_ERR_INVALID_ARGUMENT,
            DMX_ERR_INTERNAL,
        ];
        assert!(codes.iter().all(|&c| c < 0));
        for (i, a) in codes.iter().enumerate() {
            assert!(codes[i + 1..].iter().all(|b| a != b));
        }
        assert_eq!(DMX_OK, 0);
        assert_eq!(DMX_MAX_FRAME_LEN, 513);
    }
}
