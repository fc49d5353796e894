//! Win32 communications backend.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::windows::fs::OpenOptionsExt;
use std::os::windows::io::AsRawHandle;

use tracing::debug;
use windows_sys::Win32::Devices::Communication::{
    ClearCommBreak, GetCommState, SetCommBreak, SetCommState, SetCommTimeouts, COMMTIMEOUTS, DCB,
    NOPARITY, TWOSTOPBITS,
};
use windows_sys::Win32::Storage::FileSystem::FlushFileBuffers;

use crate::port::BAUD_RATE;

/// `fBinary` bit of `DCB::_bitfield`. Every other flag left clear disables
/// parity checking, DTR/RTS handshaking and XON/XOFF.
const DCB_BINARY: u32 = 0x0000_0001;

const DEVICE_NAMESPACE: &str = r"\\.\";

/// Upper bound on a single `WriteFile`. A full 513-slot frame takes about
/// 23ms on the wire, so a write still pending after this has stalled.
const WRITE_TIMEOUT_MS: u32 = 50;

/// Open exclusively for read/write.
pub(crate) fn open_device(port: &str) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .share_mode(0)
        .open(device_path(port))
}

/// `COM10` and above only resolve through the device namespace.
fn device_path(port: &str) -> String {
    if port.starts_with(DEVICE_NAMESPACE) {
        port.to_string()
    } else {
        format!("{DEVICE_NAMESPACE}{port}")
    }
}

/// Apply 250000 8N2, no flow control, and immediate-return reads.
pub(crate) fn configure(file: &File) -> io::Result<()> {
    let handle = file.as_raw_handle();

    // SAFETY: DCB is a plain C struct; all-zero is a valid bit pattern.
    let mut dcb: DCB = unsafe { std::mem::zeroed() };
    dcb.DCBlength = std::mem::size_of::<DCB>() as u32;

    // SAFETY: `handle` is owned by `file`; `dcb` is writable with DCBlength set.
    cvt(unsafe { GetCommState(handle, &mut dcb) })?;

    dcb.BaudRate = BAUD_RATE;
    dcb.ByteSize = 8;
    dcb.Parity = NOPARITY;
    dcb.StopBits = TWOSTOPBITS;
    dcb._bitfield = DCB_BINARY;

    // SAFETY: as above.
    cvt(unsafe { SetCommState(handle, &dcb) })?;

    let timeouts = line_timeouts();
    // SAFETY: `handle` is owned by `file`; `timeouts` is fully initialized.
    cvt(unsafe { SetCommTimeouts(handle, &timeouts) })?;

    debug!(baud = BAUD_RATE, "applied DCB line settings");
    Ok(())
}

/// MAXDWORD interval with zero read totals: ReadFile returns at once with
/// whatever is buffered. Writes give up after `WRITE_TIMEOUT_MS` and report
/// what was transmitted, so a stalled line surfaces as a short write.
fn line_timeouts() -> COMMTIMEOUTS {
    COMMTIMEOUTS {
        ReadIntervalTimeout: u32::MAX,
        ReadTotalTimeoutMultiplier: 0,
        ReadTotalTimeoutConstant: 0,
        WriteTotalTimeoutMultiplier: 0,
        WriteTotalTimeoutConstant: WRITE_TIMEOUT_MS,
    }
}

/// Wait until the driver has transmitted everything queued.
pub(crate) fn drain(file: &File) -> io::Result<()> {
    // SAFETY: `handle` is owned by `file`.
    cvt(unsafe { FlushFileBuffers(file.as_raw_handle()) })
}

/// Drive TX to space.
pub(crate) fn set_break(file: &File) -> io::Result<()> {
    // SAFETY: `handle` is owned by `file`.
    cvt(unsafe { SetCommBreak(file.as_raw_handle()) })
}

/// Release TX to mark.
pub(crate) fn clear_break(file: &File) -> io::Result<()> {
    // SAFETY: `handle` is owned by `file`.
    cvt(unsafe { ClearCommBreak(file.as_raw_handle()) })
}

fn cvt(ok: i32) -> io::Result<()> {
    if ok == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
