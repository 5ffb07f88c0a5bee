//! Running a program over a disposable copy of the memory.
//!
//! A run snapshots the memory, then steps the processor at a fixed tick rate
//! until it halts or the user cancels with escape. Any other key pauses the
//! run until the next key press. Whatever happened, the memory and the
//! processor are restored when the run ends.
//!
//! The loop is cooperative: each tick is a processor step, a sleep, then a
//! non-blocking look at the keyboard.

use std::time::Duration;

use parse_display::Display;
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{DEFAULT_TICK, ESCAPE};
use crate::keys::{read_key_retrying, ExitFlag, KeyError, KeySource, ReadError};
use crate::processor::{Processor, StepOutcome};
use crate::session::Session;
use crate::view::Renderer;
use crate::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[display(style = "lowercase")]
pub enum ExecutionState {
    /// The user is editing
    #[default]
    Idle,

    /// A program is being executed
    Running,

    /// The user cancelled the run, the memory is about to be restored
    Cancelling,
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The whole program should stop now. The memory was not restored.
    #[error("exit requested")]
    ExitRequested,

    #[error("keyboard error: {0}")]
    Key(#[from] KeyError),
}

impl From<ReadError> for ExecutionError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::ExitRequested => Self::ExitRequested,
            ReadError::Key(e) => Self::Key(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Minimum duration between two processor steps
    pub tick: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { tick: DEFAULT_TICK }
    }
}

/// Paces the ticks
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadClock;

impl Clock for ThreadClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Doesn't sleep, only counts the time it should have slept
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InstantClock {
    pub elapsed: Duration,
}

impl Clock for InstantClock {
    fn sleep(&mut self, duration: Duration) {
        self.elapsed += duration;
    }
}

/// The devices the interactive loops talk to
#[derive(Debug)]
pub struct Peripherals<K, R, C> {
    pub keys: K,
    pub renderer: R,
    pub clock: C,
}

impl<K, R, C> Peripherals<K, R, C> {
    #[must_use]
    pub fn new(keys: K, renderer: R, clock: C) -> Self {
        Self {
            keys,
            renderer,
            clock,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum RunEnd {
    Halted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub end: RunEnd,

    /// Number of processor steps
    pub ticks: usize,

    /// Words sent to the output port, in order
    pub outputs: Vec<Word>,
}

/// What the keyboard asks between two ticks
enum TickControl {
    Continue,
    Cancel,
}

/// Drives runs of the session's processor
#[derive(Debug, Default, Clone)]
pub struct Executor {
    config: ExecutionConfig,
}

impl Executor {
    #[must_use]
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Run the program, then restore the memory and reset the processor.
    ///
    /// When the program halts, the final state stays on screen until a key is
    /// pressed. A cancelled run skips that wait.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::ExitRequested`] as soon as the exit flag is
    /// seen, without restoring anything. Fails on keyboard errors, once the
    /// memory is restored.
    ///
    /// # Panics
    ///
    /// Panics if the session is already running.
    #[tracing::instrument(skip_all, fields(execution = session.executions))]
    pub fn run<P, K, R, C>(
        &self,
        session: &mut Session<P>,
        io: &mut Peripherals<K, R, C>,
    ) -> Result<RunSummary, ExecutionError>
    where
        P: Processor,
        K: KeySource,
        R: Renderer,
        C: Clock,
    {
        assert_eq!(session.state, ExecutionState::Idle, "a run is already going on");

        info!("Starting execution");
        let saved = session.memory.clone();
        session.state = ExecutionState::Running;

        let mut ticks = 0;
        let mut outputs = Vec::new();
        let res = self.drive(session, io, &mut ticks, &mut outputs);

        // Nothing is worth restoring when the whole program is about to end
        if let Err(ExecutionError::ExitRequested) = res {
            return Err(ExecutionError::ExitRequested);
        }

        session.memory = saved;
        session.processor.reset();
        session.state = ExecutionState::Idle;
        session.executions += 1;
        session.redraw(&mut io.renderer);

        let end = res?;
        info!(%end, ticks, "Execution finished");
        Ok(RunSummary {
            end,
            ticks,
            outputs,
        })
    }

    /// Step the processor until it halts or the run gets cancelled, then wait
    /// for the key dismissing a halted run
    fn drive<P, K, R, C>(
        &self,
        session: &mut Session<P>,
        io: &mut Peripherals<K, R, C>,
        ticks: &mut usize,
        outputs: &mut Vec<Word>,
    ) -> Result<RunEnd, ExecutionError>
    where
        P: Processor,
        K: KeySource,
        R: Renderer,
        C: Clock,
    {
        let end = loop {
            // Output is only pending for the tick that produced it
            session.memory.clear_output();
            let outcome = session.processor.step(&mut session.memory);
            *ticks += 1;

            if session.memory.output_pending() {
                let output = session.memory.output();
                info!(%output, "Output");
                outputs.push(output);
            }
            session.redraw(&mut io.renderer);

            if outcome == StepOutcome::Halted {
                break RunEnd::Halted;
            }

            io.clock.sleep(self.config.tick);

            match Self::check_keys(session, io)? {
                TickControl::Continue => {}
                TickControl::Cancel => break RunEnd::Cancelled,
            }
        };

        match end {
            RunEnd::Halted => {
                debug!(ticks = *ticks, "Program halted, waiting for a key");
                read_key_retrying(&mut io.keys, session.exit_flag(), || {
                    session.redraw(&mut io.renderer);
                })?;
            }
            RunEnd::Cancelled => {
                debug!(ticks = *ticks, "Execution cancelled");
                session.state = ExecutionState::Cancelling;
            }
        }

        Ok(end)
    }

    /// Look at the keyboard between two ticks, pausing on any key but escape
    fn check_keys<P, K, R, C>(
        session: &Session<P>,
        io: &mut Peripherals<K, R, C>,
    ) -> Result<TickControl, ExecutionError>
    where
        P: Processor,
        K: KeySource,
        R: Renderer,
    {
        let exit: &ExitFlag = session.exit_flag();
        if exit.is_requested() {
            return Err(ExecutionError::ExitRequested);
        }

        let key = match io.keys.poll_key() {
            Ok(Some(key)) => key,
            Ok(None) => return Ok(TickControl::Continue),
            Err(KeyError::Interrupted) => {
                return if exit.is_requested() {
                    Err(ExecutionError::ExitRequested)
                } else {
                    Ok(TickControl::Continue)
                };
            }
            Err(KeyError::EndOfInput) => {
                exit.request();
                return Err(ExecutionError::ExitRequested);
            }
            Err(e) => return Err(e.into()),
        };

        if key == ESCAPE {
            return Ok(TickControl::Cancel);
        }

        debug!(key, "Execution paused");
        let key = read_key_retrying(&mut io.keys, exit, || {
            session.redraw(&mut io.renderer);
        })?;
        if key == ESCAPE {
            Ok(TickControl::Cancel)
        } else {
            Ok(TickControl::Continue)
        }
    }
}
