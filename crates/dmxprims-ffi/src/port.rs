use std::os::raw::{c_char, c_int, c_uint};

use dmxprims_serial::{BreakTiming, DmxTransport, SerialPort};

use crate::args::{bytes_arg, bytes_mut_arg, len_arg, required_str_arg};
use crate::error::{clear_error_state, map_serial_error, set_invalid_handle};
use crate::ffi_boundary;
use crate::types::DmxResult;

fn count(n: usize) -> c_int {
    // Both directions are capped by the caller's c_int length.
    c_int::try_from(n).unwrap_or(c_int::MAX)
}

fn open_port(port: &str, timing: BreakTiming) -> c_int {
    match SerialPort::open_with_timing(port, timing) {
        Ok(port) => crate::registry::register(port),
        Err(err) => map_serial_error(&err),
    }
}

/// Open and configure a DMX512 line.
///
/// Returns a handle (>= 1) or a negative `DMX_ERR_*` sentinel.
///
/// # Safety
/// `port` must be null or a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dmx_open(port: *const c_char) -> c_int {
    ffi_boundary(DmxResult::Internal.code(), || {
        clear_error_state();
        // SAFETY: Caller guarantees pointer validity.
        let Some(port) = (unsafe { required_str_arg(port, "port") }) else {
            return DmxResult::InvalidArgument.code();
        };
        open_port(port, BreakTiming::default())
    })
}

/// Open a DMX512 line with explicit BREAK and Mark-After-Break durations.
///
/// # Safety
/// `port` must be null or a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dmx_open_with_timing(
    port: *const c_char,
    break_us: c_uint,
    mab_us: c_uint,
) -> c_int {
    ffi_boundary(DmxResult::Internal.code(), || {
        clear_error_state();
        // SAFETY: Caller guarantees pointer validity.
        let Some(port) = (unsafe { required_str_arg(port, "port") }) else {
            return DmxResult::InvalidArgument.code();
        };
        let timing = match BreakTiming::from_micros(u64::from(break_us), u64::from(mab_us)) {
            Ok(timing) => timing,
            Err(err) => return map_serial_error(&err),
        };
        open_port(port, timing)
    })
}

/// Signal BREAK then Mark-After-Break on the line.
///
/// Returns nothing; failures are recorded for `dmx_last_error`.
#[no_mangle]
pub extern "C" fn dmx_send_break(handle: c_int) {
    ffi_boundary((), || {
        clear_error_state();
        match crate::registry::with_port(handle, |port| port.send_break()) {
            Some(Ok(())) => {}
            Some(Err(err)) => {
                let _ = map_serial_error(&err);
            }
            None => {
                let _ = set_invalid_handle(handle);
            }
        }
    });
}

/// Write `length` bytes (at most 513) to the line.
///
/// Returns bytes accepted, which may be fewer than `length`, or a negative
/// sentinel.
///
/// # Safety
/// If `length > 0`, `data` must be non-null and readable for `length` bytes.
#[no_mangle]
pub unsafe extern "C" fn dmx_write(handle: c_int, data: *const u8, length: c_int) -> c_int {
    ffi_boundary(DmxResult::Internal.code(), || {
        clear_error_state();
        let Some(len) = len_arg(length, "length") else {
            return DmxResult::InvalidArgument.code();
        };
        // SAFETY: Caller guarantees `data` is readable for `length` bytes.
        let Some(bytes) = (unsafe { bytes_arg(data, len, "data") }) else {
            return DmxResult::InvalidArgument.code();
        };
        match crate::registry::with_port(handle, |port| port.write(bytes)) {
            Some(Ok(n)) => count(n),
            Some(Err(err)) => map_serial_error(&err),
            None => set_invalid_handle(handle),
        }
    })
}

/// One non-blocking read into `buffer`.
///
/// Returns bytes read (0 when nothing is queued) or a negative sentinel.
///
/// # Safety
/// If `max_length > 0`, `buffer` must be non-null and writable for
/// `max_length` bytes.
#[no_mangle]
pub unsafe extern "C" fn dmx_read_frame(handle: c_int, buffer: *mut u8, max_length: c_int) -> c_int {
    ffi_boundary(DmxResult::Internal.code(), || {
        clear_error_state();
        let Some(len) = len_arg(max_length, "max_length") else {
            return DmxResult::InvalidArgument.code();
        };
        // SAFETY: Caller guarantees `buffer` is writable for `max_length` bytes.
        let Some(buf) = (unsafe { bytes_mut_arg(buffer, len, "buffer") }) else {
            return DmxResult::InvalidArgument.code();
        };
        match crate::registry::with_port(handle, |port| port.read_frame(buf)) {
            Some(Ok(n)) => count(n),
            Some(Err(err)) => map_serial_error(&err),
            None => set_invalid_handle(handle),
        }
    })
}

/// Release the line. The handle is invalid afterwards.
///
/// Closing an unknown or already-closed handle is recorded as
/// `DMX_ERR_INVALID_HANDLE` and otherwise ignored.
#[no_mangle]
pub extern "C" fn dmx_close(handle: c_int) {
    ffi_boundary((), || {
        clear_error_state();
        if crate::registry::take_port(handle, |port| port.close()).is_none() {
            let _ = set_invalid_handle(handle);
        }
    });
}
