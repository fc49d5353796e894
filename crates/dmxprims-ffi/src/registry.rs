//! Process-wide table of open ports keyed by integer handle.
//!
//! C callers hold plain integers, never pointers, so a stale or forged
//! handle is looked up and rejected instead of dereferenced.

use std::collections::BTreeMap;
use std::os::raw::c_int;
use std::sync::{Arc, Mutex, MutexGuard};

use dmxprims_serial::SerialPort;

pub(crate) type Shared<P> = Arc<Mutex<P>>;

struct Registry<P> {
    next: c_int,
    entries: BTreeMap<c_int, Shared<P>>,
}

impl<P> Registry<P> {
    const fn new() -> Self {
        Self {
            next: 1,
            entries: BTreeMap::new(),
        }
    }

    /// Ids are never handed out twice while live; the counter wraps back
    /// to 1 after `c_int::MAX`.
    fn insert(&mut self, value: P) -> c_int {
        while self.entries.contains_key(&self.next) {
            self.advance();
        }
        let handle = self.next;
        self.advance();
        self.entries.insert(handle, Arc::new(Mutex::new(value)));
        handle
    }

    fn get(&self, handle: c_int) -> Option<Shared<P>> {
        self.entries.get(&handle).cloned()
    }

    fn remove(&mut self, handle: c_int) -> Option<Shared<P>> {
        self.entries.remove(&handle)
    }

    fn advance(&mut self) {
        self.next = self.next.checked_add(1).unwrap_or(1);
    }
}

static PORTS: Mutex<Registry<SerialPort>> = Mutex::new(Registry::new());

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Store an open port and return its handle (always >= 1).
pub(crate) fn register(port: SerialPort) -> c_int {
    lock(&PORTS).insert(port)
}

/// Run `f` against the port behind `handle`, or `None` if it is not open.
///
/// The table lock is released before `f` runs, so a slow BREAK on one port
/// does not stall calls on another.
pub(crate) fn with_port<T>(handle: c_int, f: impl FnOnce(&mut SerialPort) -> T) -> Option<T> {
    let port = lock(&PORTS).get(handle)?;
    let mut guard = lock(&port);
    Some(f(&mut guard))
}

/// Remove `handle` from the table and run `f` on the port it named.
///
/// `None` if the handle was not open. Calls already holding the port finish
/// before `f` runs.
pub(crate) fn take_port<T>(handle: c_int, f: impl FnOnce(&mut SerialPort) -> T) -> Option<T> {
    let port = lock(&PORTS).remove(handle)?;
    let mut guard = lock(&port);
    Some(f(&mut guard))
}
