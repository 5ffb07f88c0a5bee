//! Keyboard input.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum KeyError {
    /// The read was interrupted by a signal before a key came in
    #[error("interrupted")]
    Interrupted,

    /// No more keys will ever come
    #[error("end of input")]
    EndOfInput,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A source of single-byte key presses
pub trait KeySource {
    /// Wait for the next key.
    ///
    /// # Errors
    ///
    /// Fails if the read got interrupted or if the input is exhausted.
    fn read_key(&mut self) -> Result<u8, KeyError>;

    /// Get the next key if one is already available, without waiting.
    ///
    /// # Errors
    ///
    /// Fails if the input is exhausted.
    fn poll_key(&mut self) -> Result<Option<u8>, KeyError>;
}

impl<K: KeySource + ?Sized> KeySource for &mut K {
    fn read_key(&mut self) -> Result<u8, KeyError> {
        (**self).read_key()
    }

    fn poll_key(&mut self) -> Result<Option<u8>, KeyError> {
        (**self).poll_key()
    }
}

/// Process-wide request to quit, shared between the signal handler and the
/// loops.
#[derive(Debug, Clone, Default)]
pub struct ExitFlag(Arc<AtomicBool>);

impl ExitFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The underlying flag, for signal handlers to raise
    #[must_use]
    pub fn as_atomic(&self) -> &Arc<AtomicBool> {
        &self.0
    }
}

/// Why a blocking read gave up
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("exit requested")]
    ExitRequested,

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Wait for a key, retrying reads interrupted by signals.
///
/// The exit flag is checked before every read, so no key gets read once the
/// exit was requested. After an interrupted read, `on_interrupt` gets called
/// so that the screen can be redrawn (terminal resizes interrupt reads too).
/// Reaching the end of the input requests the exit.
///
/// # Errors
///
/// Returns [`ReadError::ExitRequested`] once the exit flag is set.
pub fn read_key_retrying<K, F>(
    keys: &mut K,
    exit: &ExitFlag,
    mut on_interrupt: F,
) -> Result<u8, ReadError>
where
    K: KeySource + ?Sized,
    F: FnMut(),
{
    loop {
        if exit.is_requested() {
            return Err(ReadError::ExitRequested);
        }

        match keys.read_key() {
            Ok(key) => return Ok(key),
            Err(KeyError::Interrupted) => {
                if exit.is_requested() {
                    return Err(ReadError::ExitRequested);
                }
                debug!("Read interrupted, retrying");
                on_interrupt();
            }
            Err(KeyError::EndOfInput) => {
                exit.request();
                return Err(ReadError::ExitRequested);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// What a [`ScriptedKeys`] source yields, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedKey {
    /// A key press
    Key(u8),

    /// A poll that finds no key waiting
    Idle,

    /// A read interrupted by a signal
    Interrupt,
}

/// A key source replaying a fixed script, for tests and batch runs.
///
/// Blocking reads skip over idle entries. Once the script is exhausted, every
/// read fails with [`KeyError::EndOfInput`] and polls find nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    script: VecDeque<ScriptedKey>,
}

impl ScriptedKeys {
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = ScriptedKey>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    pub fn push(&mut self, key: ScriptedKey) {
        self.script.push_back(key);
    }

    /// Entries not consumed yet
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl KeySource for ScriptedKeys {
    fn read_key(&mut self) -> Result<u8, KeyError> {
        loop {
            match self.script.pop_front() {
                Some(ScriptedKey::Key(key)) => return Ok(key),
                Some(ScriptedKey::Idle) => {}
                Some(ScriptedKey::Interrupt) => return Err(KeyError::Interrupted),
                None => return Err(KeyError::EndOfInput),
            }
        }
    }

    fn poll_key(&mut self) -> Result<Option<u8>, KeyError> {
        match self.script.pop_front() {
            Some(ScriptedKey::Key(key)) => Ok(Some(key)),
            Some(ScriptedKey::Idle) | None => Ok(None),
            Some(ScriptedKey::Interrupt) => Err(KeyError::Interrupted),
        }
    }
}
