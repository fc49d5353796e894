//! Loopback tests over a pseudo-terminal pair.
//!
//! The slave side is opened through `SerialPort` like a real adapter; the
//! master side plays the wire.

#![cfg(target_os = "linux")]

use std::ffi::CStr;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::time::{Duration, Instant};

use dmxprims_serial::{DmxTransport, SerialError, SerialPort, BAUD_RATE, MAX_FRAME_LEN};

struct Pty {
    master: File,
    slave_path: String,
}

fn open_pty() -> Pty {
    // SAFETY: plain libc calls on a descriptor owned by this function; the
    // name buffer outlives ptsname_r.
    unsafe {
        let fd = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
        assert!(fd >= 0, "posix_openpt failed");
        assert_eq!(libc::grantpt(fd), 0);
        assert_eq!(libc::unlockpt(fd), 0);

        let mut name = [0 as libc::c_char; 128];
        assert_eq!(libc::ptsname_r(fd, name.as_mut_ptr(), name.len()), 0);
        let slave_path = CStr::from_ptr(name.as_ptr())
            .to_str()
            .expect("pts path should be utf-8")
            .to_string();

        let flags = libc::fcntl(fd, libc::F_GETFL);
        assert_eq!(libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK), 0);

        Pty {
            master: File::from_raw_fd(fd),
            slave_path,
        }
    }
}

/// Read exactly `len` bytes from the master, failing after `timeout`.
fn read_master(master: &mut File, len: usize, timeout: Duration) -> Vec<u8> {
    let start = Instant::now();
    let mut out = Vec::with_capacity(len);
    let mut chunk = [0u8; 1024];
    while out.len() < len {
        let want = (len - out.len()).min(chunk.len());
        match master.read(&mut chunk[..want]) {
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                assert!(
                    start.elapsed() < timeout,
                    "timed out with {} of {len} bytes",
                    out.len()
                );
                std::thread::sleep(Duration::from_millis(1));
            }
            Err(err) => panic!("master read failed: {err}"),
        }
    }
    out
}

fn master_is_quiet(master: &mut File) -> bool {
    std::thread::sleep(Duration::from_millis(20));
    let mut byte = [0u8; 1];
    matches!(master.read(&mut byte), Err(err) if err.kind() == ErrorKind::WouldBlock)
}

#[test]
fn idle_port_reads_zero() {
    let pty = open_pty();
    let mut port = SerialPort::open(&pty.slave_path).expect("pty slave should open");

    let mut buf = [0u8; MAX_FRAME_LEN];
    assert_eq!(port.read_frame(&mut buf).unwrap(), 0);
    drop(pty);
}

#[test]
fn open_applies_250k_8n2() {
    let pty = open_pty();
    let _port = SerialPort::open(&pty.slave_path).expect("pty slave should open");

    // Line settings belong to the tty, so a second descriptor sees them.
    let observer = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
        .open(&pty.slave_path)
        .expect("pty slave should reopen");
    // SAFETY: termios2 is a plain C struct; all-zero is a valid bit pattern.
    let mut tio: libc::termios2 = unsafe { std::mem::zeroed() };
    // SAFETY: `observer` is open and `tio` is writable.
    let rc = unsafe { libc::ioctl(observer.as_raw_fd(), libc::TCGETS2, &mut tio) };
    assert_eq!(rc, 0, "TCGETS2 failed: {}", std::io::Error::last_os_error());

    assert_eq!(tio.c_ospeed, BAUD_RATE);
    assert_eq!(tio.c_ispeed, BAUD_RATE);
    assert_eq!(tio.c_cflag & libc::CBAUD, libc::BOTHER);
    assert_eq!(tio.c_cflag & libc::CSIZE, libc::CS8);
    assert_ne!(tio.c_cflag & libc::CSTOPB, 0);
    assert_eq!(tio.c_cflag & libc::PARENB, 0);
    assert_eq!(tio.c_lflag & (libc::ICANON | libc::ECHO), 0);
    assert_eq!(tio.c_oflag & libc::OPOST, 0);
}

#[test]
fn empty_write_returns_zero() {
    let pty = open_pty();
    let mut port = SerialPort::open(&pty.slave_path).unwrap();
    assert_eq!(port.write(&[]).unwrap(), 0);
}

#[test]
fn consecutive_frames_differ_only_in_changed_slot() {
    let mut pty = open_pty();
    let mut port = SerialPort::open(&pty.slave_path).unwrap();

    port.send_break().unwrap();
    assert_eq!(port.write(&[0x00, 0x00]).unwrap(), 2);
    let first = read_master(&mut pty.master, 2, Duration::from_secs(2));

    port.send_break().unwrap();
    assert_eq!(port.write(&[0x00, 0xFF]).unwrap(), 2);
    let second = read_master(&mut pty.master, 2, Duration::from_secs(2));

    assert_eq!(first, vec![0x00, 0x00]);
    assert_eq!(second, vec![0x00, 0xFF]);
    assert_eq!(first[0], second[0]);
    assert_ne!(first[1], second[1]);
}

#[test]
fn full_frame_write_stays_within_length() {
    let mut pty = open_pty();
    let mut port = SerialPort::open(&pty.slave_path).unwrap();

    let mut buffer = vec![0xEEu8; 600];
    for (i, byte) in buffer.iter_mut().take(MAX_FRAME_LEN).enumerate() {
        *byte = (i % 251) as u8;
    }
    buffer[0] = 0x00;

    port.send_break().unwrap();
    let written = port.write(&buffer[..MAX_FRAME_LEN]).unwrap();
    assert!(written > 0 && written <= MAX_FRAME_LEN);

    let seen = read_master(&mut pty.master, written, Duration::from_secs(2));
    assert_eq!(seen.as_slice(), &buffer[..written]);
    assert!(!seen.contains(&0xEE));
    assert!(master_is_quiet(&mut pty.master));
}

#[test]
fn oversized_write_is_rejected_before_io() {
    let mut pty = open_pty();
    let mut port = SerialPort::open(&pty.slave_path).unwrap();

    let err = port.write(&[0u8; MAX_FRAME_LEN + 1]).unwrap_err();
    assert!(matches!(
        err,
        SerialError::FrameTooLong { len: 514, max: 513 }
    ));
    assert!(master_is_quiet(&mut pty.master));
}

#[test]
fn bytes_from_wire_arrive_in_order() {
    let mut pty = open_pty();
    let mut port = SerialPort::open(&pty.slave_path).unwrap();

    let sent: Vec<u8> = [0xCC].into_iter().chain(1..=64u8).collect();
    pty.master.write_all(&sent).unwrap();

    let start = Instant::now();
    let mut received = Vec::new();
    let mut buf = [0u8; MAX_FRAME_LEN];
    while received.len() < sent.len() {
        let n = port.read_frame(&mut buf).unwrap();
        received.extend_from_slice(&buf[..n]);
        if n == 0 {
            assert!(start.elapsed() < Duration::from_secs(2), "loopback timed out");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    assert_eq!(received, sent);
    assert_eq!(port.read_frame(&mut buf).unwrap(), 0);
}

#[test]
fn operations_after_close_report_closed() {
    let pty = open_pty();
    let mut port = SerialPort::open(&pty.slave_path).unwrap();
    assert!(port.is_open());

    port.close();
    assert!(!port.is_open());

    let mut buf = [0u8; 8];
    assert!(matches!(port.send_break(), Err(SerialError::Closed)));
    assert!(matches!(port.write(&[0x00, 0x01]), Err(SerialError::Closed)));
    assert!(matches!(port.write(&[]), Err(SerialError::Closed)));
    assert!(matches!(
        port.read_frame(&mut buf),
        Err(SerialError::Closed)
    ));

    // Second close is tolerated.
    port.close();
    assert!(!port.is_open());
}
