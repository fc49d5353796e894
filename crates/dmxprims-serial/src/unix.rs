//! termios backend for Linux, macOS and the BSDs.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use tracing::debug;

use crate::port::BAUD_RATE;

/// Open read/write, non-blocking, without becoming the controlling terminal.
pub(crate) fn open_device(port: &str) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
        .open(port)
}

/// Apply raw 250000 8N2 with no flow control.
#[cfg(target_os = "linux")]
pub(crate) fn configure(file: &File) -> io::Result<()> {
    // Input speed field of c_cflag; zero means "same as output".
    const CIBAUD: libc::tcflag_t = libc::CBAUD << 16;

    let fd = file.as_raw_fd();
    // SAFETY: termios2 is a plain C struct; all-zero is a valid bit pattern.
    let mut tio: libc::termios2 = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is open for the lifetime of `file`, `tio` is a valid
    // writable termios2 for TCGETS2.
    cvt(unsafe { libc::ioctl(fd, libc::TCGETS2, &mut tio) })?;

    set_raw_8n2(
        &mut tio.c_iflag,
        &mut tio.c_oflag,
        &mut tio.c_lflag,
        &mut tio.c_cflag,
    );
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = 0;
    tio.c_cflag &= !(libc::CBAUD | CIBAUD);
    tio.c_cflag |= libc::BOTHER;
    tio.c_ispeed = BAUD_RATE;
    tio.c_ospeed = BAUD_RATE;

    // SAFETY: as above, `tio` is fully initialized.
    cvt(unsafe { libc::ioctl(fd, libc::TCSETS2, &tio) })?;

    // TCSETS2 succeeds even when the driver rounds or drops part of the
    // request, so read the settings back.
    // SAFETY: as above.
    cvt(unsafe { libc::ioctl(fd, libc::TCGETS2, &mut tio) })?;
    debug!(
        ospeed = tio.c_ospeed,
        ispeed = tio.c_ispeed,
        "applied termios2 line settings"
    );
    if tio.c_cflag & libc::CBAUD != libc::BOTHER {
        return Err(rejected(format!(
            "driver did not accept a custom baud rate (CBAUD {:#o})",
            tio.c_cflag & libc::CBAUD
        )));
    }
    verify_line(tio.c_cflag, Some(tio.c_ospeed))
}

/// Apply raw 250000 8N2 with no flow control.
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(crate) fn configure(file: &File) -> io::Result<()> {
    // _IOW('T', 2, speed_t)
    const IOSSIOSPEED: libc::c_ulong = 0x8008_5402;

    let fd = file.as_raw_fd();
    let mut tio = get_termios(fd)?;
    set_raw_8n2(
        &mut tio.c_iflag,
        &mut tio.c_oflag,
        &mut tio.c_lflag,
        &mut tio.c_cflag,
    );
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = 0;
    // SAFETY: `fd` is open and `tio` was produced by tcgetattr.
    cvt(unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) })?;

    let speed = BAUD_RATE as libc::speed_t;
    // SAFETY: IOSSIOSPEED reads one speed_t from the pointer.
    cvt(unsafe { libc::ioctl(fd, IOSSIOSPEED, &speed) })?;
    debug!(speed = BAUD_RATE, "applied termios line settings via IOSSIOSPEED");

    // IOSSIOSPEED fails outright on an unsupported rate; the termios speed
    // fields do not report it, so only the framing bits are checked here.
    let applied = get_termios(fd)?;
    verify_line(applied.c_cflag, None)
}

/// Apply raw 250000 8N2 with no flow control.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "ios")))]
pub(crate) fn configure(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();
    let mut tio = get_termios(fd)?;
    set_raw_8n2(
        &mut tio.c_iflag,
        &mut tio.c_oflag,
        &mut tio.c_lflag,
        &mut tio.c_cflag,
    );
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = 0;
    // SAFETY: `tio` was produced by tcgetattr; BSD speed_t is numeric.
    cvt(unsafe { libc::cfsetspeed(&mut tio, BAUD_RATE as libc::speed_t) })?;
    // SAFETY: `fd` is open and `tio` is fully initialized.
    cvt(unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) })?;

    let applied = get_termios(fd)?;
    // SAFETY: `applied` was produced by tcgetattr.
    let ospeed = unsafe { libc::cfgetospeed(&applied) };
    debug!(ospeed, "applied termios line settings");
    verify_line(applied.c_cflag, Some(ospeed as u32))
}

#[cfg(not(target_os = "linux"))]
fn get_termios(fd: libc::c_int) -> io::Result<libc::termios> {
    // SAFETY: termios is a plain C struct; all-zero is a valid bit pattern.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };
    // SAFETY: `fd` is open and `tio` is writable.
    cvt(unsafe { libc::tcgetattr(fd, &mut tio) })?;
    Ok(tio)
}

/// Raw mode plus 8 data bits, no parity, 2 stop bits.
///
/// A received BREAK reads as a 0x00 byte (IGNBRK, BRKINT and PARMRK clear).
fn set_raw_8n2(
    iflag: &mut libc::tcflag_t,
    oflag: &mut libc::tcflag_t,
    lflag: &mut libc::tcflag_t,
    cflag: &mut libc::tcflag_t,
) {
    *iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY
        | libc::INPCK);
    *oflag &= !libc::OPOST;
    *lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    *cflag &= !(libc::CSIZE | libc::PARENB | libc::CRTSCTS);
    *cflag |= libc::CS8 | libc::CSTOPB | libc::CLOCAL | libc::CREAD;
}

/// Check the settings the driver reports against 8N2 at [`BAUD_RATE`].
///
/// `ospeed` is `None` where the platform cannot report a custom rate.
fn verify_line(cflag: libc::tcflag_t, ospeed: Option<u32>) -> io::Result<()> {
    if let Some(ospeed) = ospeed {
        if ospeed != BAUD_RATE {
            return Err(rejected(format!(
                "driver applied {ospeed} baud instead of {BAUD_RATE}"
            )));
        }
    }
    if cflag & libc::CSIZE != libc::CS8 {
        return Err(rejected("driver did not apply 8 data bits"));
    }
    if cflag & libc::PARENB != 0 {
        return Err(rejected("driver left parity enabled"));
    }
    if cflag & libc::CSTOPB == 0 {
        return Err(rejected("driver did not apply 2 stop bits"));
    }
    Ok(())
}

fn rejected(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, message.into())
}

/// Wait until every queued byte has left the UART.
pub(crate) fn drain(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();
    loop {
        // SAFETY: `fd` is open for the lifetime of `file`.
        match cvt(unsafe { libc::tcdrain(fd) }) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Drive TX to space.
pub(crate) fn set_break(file: &File) -> io::Result<()> {
    // SAFETY: TIOCSBRK takes no argument; `fd` is open.
    cvt(unsafe { libc::ioctl(file.as_raw_fd(), libc::TIOCSBRK) })
}

/// Release TX to mark.
pub(crate) fn clear_break(file: &File) -> io::Result<()> {
    // SAFETY: TIOCCBRK takes no argument; `fd` is open.
    cvt(unsafe { libc::ioctl(file.as_raw_fd(), libc::TIOCCBRK) })
}

fn cvt(rc: libc::c_int) -> io::Result<()> {
    if rc == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
