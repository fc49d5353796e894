use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use crate::error;

/// Convert a required C string argument into UTF-8 `&str`.
///
/// # Safety
/// `value` must be null or point to a valid NUL-terminated C string.
pub(crate) unsafe fn required_str_arg<'a>(value: *const c_char, name: &str) -> Option<&'a str> {
    if value.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null"));
        return None;
    }

    let as_cstr = {
        // SAFETY: The caller guarantees `value` points to a valid NUL-terminated C string.
        unsafe { CStr::from_ptr(value) }
    };

    match as_cstr.to_str() {
        Ok(v) => Some(v),
        Err(_) => {
            let _ = error::set_invalid_argument(format!("{name} must be valid UTF-8"));
            None
        }
    }
}

/// Validate a C length argument.
pub(crate) fn len_arg(len: c_int, name: &str) -> Option<usize> {
    match usize::try_from(len) {
        Ok(len) => Some(len),
        Err(_) => {
            let _ = error::set_invalid_argument(format!("{name} cannot be negative (got {len})"));
            None
        }
    }
}

/// Convert a byte pointer + length into a slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` bytes.
pub(crate) unsafe fn bytes_arg<'a>(data: *const u8, len: usize, name: &str) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when len > 0"));
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Convert a writable byte pointer + capacity into a mutable slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null, writable for `len` bytes, and not
/// aliased for the duration of the call.
pub(crate) unsafe fn bytes_mut_arg<'a>(
    data: *mut u8,
    len: usize,
    name: &str,
) -> Option<&'a mut [u8]> {
    if len == 0 {
        return Some(&mut []);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when len > 0"));
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts_mut(data, len) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_length_is_rejected() {
        assert_eq!(len_arg(-1, "length"), None);
        assert_eq!(len_arg(513, "length"), Some(513));
    }

    #[test]
    fn null_with_zero_length_is_empty() {
        // SAFETY: zero length never dereferences the pointer.
        let slice = unsafe { bytes_arg(std::ptr::null(), 0, "data") };
        assert_eq!(slice, Some(&[][..]));
        // SAFETY: null with non-zero length is rejected before dereference.
        let slice = unsafe { bytes_arg(std::ptr::null(), 4, "data") };
        assert!(slice.is_none());
    }
}
