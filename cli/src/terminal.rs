//! Raw keyboard input from the controlling terminal.

use std::io;
use std::os::fd::{AsFd, AsRawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitcomp_emulator::keys::{ExitFlag, KeyError, KeySource};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{
    tcgetattr, tcsetattr, LocalFlags, SetArg, SpecialCharacterIndices, Termios,
};
use signal_hook::consts::{SIGINT, SIGWINCH};
use signal_hook::SigId;
use tracing::{debug, warn};

/// How long a blocking read waits before looking at the signal flags again
const POLL_INTERVAL_MS: u16 = 100;

fn key_error(errno: Errno) -> KeyError {
    if errno == Errno::EINTR {
        KeyError::Interrupted
    } else {
        io::Error::from(errno).into()
    }
}

/// Standard input, unbuffered, without echo nor line editing.
///
/// While it lives, `SIGINT` raises the exit flag and terminal resizes
/// interrupt blocking reads. The terminal settings and the signal handlers
/// are restored when dropped.
pub(crate) struct RawTerminal {
    original: Termios,
    exit: ExitFlag,
    resized: Arc<AtomicBool>,
    signals: Vec<SigId>,
}

impl RawTerminal {
    /// Switch the terminal to raw input.
    ///
    /// # Errors
    ///
    /// Fails if the standard input is not a terminal, or if the signal
    /// handlers can't be installed.
    pub fn new(exit: ExitFlag) -> io::Result<Self> {
        let stdin = io::stdin();
        let original = tcgetattr(&stdin)?;

        let mut raw = original.clone();
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        tcsetattr(&stdin, SetArg::TCSANOW, &raw)?;
        debug!("Terminal switched to raw input");

        let mut terminal = Self {
            original,
            exit,
            resized: Arc::new(AtomicBool::new(false)),
            signals: Vec::with_capacity(2),
        };
        // From here on, failures give the terminal back through drop
        let interrupt = Arc::clone(terminal.exit.as_atomic());
        terminal
            .signals
            .push(signal_hook::flag::register(SIGINT, interrupt)?);
        let resized = Arc::clone(&terminal.resized);
        terminal
            .signals
            .push(signal_hook::flag::register(SIGWINCH, resized)?);
        debug!("Signal handlers installed");

        Ok(terminal)
    }

    /// Whether a key is waiting
    fn wait(timeout: PollTimeout) -> Result<bool, KeyError> {
        let stdin = io::stdin();
        let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
        let ready = poll(&mut fds, timeout).map_err(key_error)?;
        Ok(ready > 0)
    }

    fn read_byte() -> Result<u8, KeyError> {
        let mut buf = [0_u8; 1];
        match nix::unistd::read(io::stdin().as_raw_fd(), &mut buf) {
            Ok(0) => Err(KeyError::EndOfInput),
            Ok(_) => Ok(buf[0]),
            Err(errno) => Err(key_error(errno)),
        }
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        for id in self.signals.drain(..) {
            signal_hook::low_level::unregister(id);
        }

        if let Err(errno) = tcsetattr(&io::stdin(), SetArg::TCSANOW, &self.original) {
            let e = io::Error::from(errno);
            warn!(error = &e as &dyn std::error::Error, "Could not restore the terminal");
        }
    }
}

impl KeySource for RawTerminal {
    /// Signals are only looked at every few milliseconds: a pending exit or
    /// resize ends the wait as an interrupted read.
    fn read_key(&mut self) -> Result<u8, KeyError> {
        loop {
            if self.exit.is_requested() || self.resized.swap(false, Ordering::SeqCst) {
                return Err(KeyError::Interrupted);
            }

            if Self::wait(PollTimeout::from(POLL_INTERVAL_MS))? {
                return Self::read_byte();
            }
        }
    }

    fn poll_key(&mut self) -> Result<Option<u8>, KeyError> {
        if Self::wait(PollTimeout::ZERO)? {
            Self::read_byte().map(Some)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_error_test() {
        assert!(matches!(key_error(Errno::EINTR), KeyError::Interrupted));
        match key_error(Errno::EIO) {
            KeyError::Io(e) => assert_eq!(e.raw_os_error(), Some(Errno::EIO as i32)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
