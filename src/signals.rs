//! Scoped suppression of user-entered signals.
//!
//! While the session plugin owns the terminal, Ctrl-C, Ctrl-\ and Ctrl-Z must
//! reach the plugin without killing or stopping this process. A
//! [`SignalGuard`] sets those signals to "ignore" and restores the recorded
//! dispositions when dropped, so every exit path (including `?` and panics)
//! puts the process back the way it was.

use std::io;

#[cfg(unix)]
const USER_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGQUIT, libc::SIGTSTP];

#[cfg(windows)]
const USER_SIGNALS: [libc::c_int; 1] = [libc::SIGINT];

#[cfg(unix)]
type Disposition = libc::sigaction;

#[cfg(windows)]
type Disposition = libc::sighandler_t;

/// Signals ignored for the lifetime of a [`SignalGuard`].
#[must_use]
pub const fn user_signals() -> &'static [libc::c_int] {
    &USER_SIGNALS
}

/// Ignores user-entered signals until dropped.
#[must_use = "signals are restored as soon as the guard is dropped"]
pub struct SignalGuard {
    saved: Vec<(libc::c_int, Disposition)>,
}

impl SignalGuard {
    /// Sets every user-entered signal to "ignore", recording the previous
    /// dispositions.
    ///
    /// # Errors
    ///
    /// Returns the OS error when a disposition cannot be changed. Signals
    /// already changed before the failure are restored before returning.
    pub fn ignore_user_signals() -> io::Result<Self> {
        let mut guard = Self {
            saved: Vec::with_capacity(USER_SIGNALS.len()),
        };
        for signal in USER_SIGNALS {
            let previous = ignore(signal)?;
            guard.saved.push((signal, previous));
        }
        Ok(guard)
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        for (signal, previous) in self.saved.drain(..).rev() {
            restore(signal, &previous);
        }
    }
}

#[cfg(unix)]
fn ignore(signal: libc::c_int) -> io::Result<Disposition> {
    // SAFETY: `sigaction` is plain data; an all-zero value is a valid empty
    // action that is fully initialised before use.
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    action.sa_sigaction = libc::SIG_IGN;
    // SAFETY: `sa_mask` points to memory owned by `action`.
    unsafe { libc::sigemptyset(&raw mut action.sa_mask) };

    // SAFETY: as above; the kernel overwrites it with the previous action.
    let mut previous: libc::sigaction = unsafe { std::mem::zeroed() };
    // SAFETY: both pointers reference live, initialised `sigaction` values.
    let rc = unsafe { libc::sigaction(signal, &raw const action, &raw mut previous) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(previous)
}

#[cfg(unix)]
fn restore(signal: libc::c_int, previous: &Disposition) {
    // SAFETY: `previous` was filled in by `sigaction` for this signal.
    unsafe { libc::sigaction(signal, previous, std::ptr::null_mut()) };
}

#[cfg(windows)]
fn ignore(signal: libc::c_int) -> io::Result<Disposition> {
    // SAFETY: SIG_IGN is a valid handler for every supported signal.
    Ok(unsafe { libc::signal(signal, libc::SIG_IGN) })
}

#[cfg(windows)]
fn restore(signal: libc::c_int, previous: &Disposition) {
    // SAFETY: `previous` was returned by `signal` for this signal.
    unsafe { libc::signal(signal, *previous) };
}
