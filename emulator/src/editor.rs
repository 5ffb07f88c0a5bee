//! The modal key dispatcher of the interactive editor.
//!
//! Every key press maps to exactly one cursor operation, mode change or
//! command. Commands that need the outside world (running, saving, changing
//! the view) are handed back to [`edit`], which owns the loop.

use tracing::{debug, info, warn};

use crate::constants::{ADDRESS_BIT, ESCAPE, WORD_SIZE};
use crate::execution::{Clock, ExecutionError, Executor, Peripherals};
use crate::keys::{read_key_retrying, KeyError, KeySource, ReadError};
use crate::persistence::{save_to_current_file, save_to_new_file, Storage};
use crate::processor::Processor;
use crate::session::Session;
use crate::view::Renderer;
use crate::word::{AddressSpace, Word};

const ENTER: u8 = b'\n';
const TAB: u8 = b'\t';

/// What the next key press means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,

    /// A `2` was pressed, the next key may be the end of a shift+arrow
    /// sequence
    Shift,

    /// The next key is written as a character
    InsertChar,

    /// Digits are accumulated into a number
    InsertNumber { value: usize },
}

/// Actions the editor can't do on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    SaveToNewFile,
    SaveToCurrentFile,
    SwitchView,
}

#[derive(Debug, Default, Clone)]
pub struct Editor {
    mode: Mode,
}

impl Editor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Apply a key press to the session
    pub fn handle_key<P: Processor>(
        &mut self,
        key: u8,
        session: &mut Session<P>,
    ) -> Option<Command> {
        match std::mem::take(&mut self.mode) {
            Mode::Normal => self.dispatch(key, session),
            Mode::Shift => {
                Self::process_input_with_shift(key, session);
                None
            }
            Mode::InsertChar => {
                Self::insert_char(key, session);
                None
            }
            Mode::InsertNumber { value } => {
                self.insert_number(key, value, session);
                None
            }
        }
    }

    fn process_input_with_shift<P>(key: u8, session: &mut Session<P>) {
        match key {
            b'A' => session.cursor.move_byte_up(&mut session.memory),
            b'B' => session.cursor.move_byte_down(&mut session.memory),
            _ => {}
        }
    }

    fn insert_char<P>(key: u8, session: &mut Session<P>) {
        if key == ESCAPE {
            return;
        }
        session.cursor.set_word(&mut session.memory, Word::from(key));
        session.cursor.increase_y();
    }

    /// The most recent digit becomes the least significant one. Only the low
    /// bits of the number are kept once it no longer fits in a word.
    fn insert_number<P>(&mut self, key: u8, value: usize, session: &mut Session<P>) {
        if !key.is_ascii_digit() {
            debug!(value, "Leaving number insertion");
            return;
        }

        let value = (value * 10 + usize::from(key - b'0')) % (1 << WORD_SIZE);
        session
            .cursor
            .set_word(&mut session.memory, Word::from_int_wrapping(value));
        self.mode = Mode::InsertNumber { value };
    }

    fn engage_insert_mode<P>(&mut self, mode: Mode, session: &Session<P>) {
        if session.cursor.address_space() == AddressSpace::Data {
            self.mode = mode;
        }
    }

    #[allow(clippy::match_same_arms)]
    fn dispatch<P: Processor>(&mut self, key: u8, session: &mut Session<P>) -> Option<Command> {
        let cursor = &mut session.cursor;
        let memory = &mut session.memory;

        match key {
            ENTER => return Some(Command::Run),

            // Modes
            b'2' => self.mode = Mode::Shift,
            b'i' => self.engage_insert_mode(Mode::InsertChar, session),
            b'I' => self.engage_insert_mode(Mode::InsertNumber { value: 0 }, session),

            b'v' => return Some(Command::SwitchView),
            b's' => return Some(Command::SaveToNewFile),
            b'S' => return Some(Command::SaveToCurrentFile),

            // Basic movement. Uppercase letters end arrow escape sequences.
            b'k' | b'A' => cursor.decrease_y(),
            b'j' | b'B' => cursor.increase_y(),
            b'l' | b'C' => cursor.increase_x(),
            b'h' | b'D' => cursor.decrease_x(),
            b't' | TAB => cursor.switch_address_space(),

            // Advanced movement
            b'H' | b'g' | b'^' => cursor.set_bit_index(0),
            b'F' | b'G' | b'$' => cursor.set_bit_index(WORD_SIZE - 1),
            b'o' => {
                cursor.increase_y();
                cursor.set_bit_index(0);
            }
            b'e' => cursor.go_to_end_of_word(),
            b'b' => cursor.go_to_beginning_of_word(),
            b'w' => cursor.go_to_beginning_of_next_word(),
            b'a' => cursor.set_bit_index(ADDRESS_BIT),
            b'z' | b'Z' | b'T' => cursor.go_to_instructions_address(&session.processor),

            // Basic manipulation. `3`, `5` and `6` end the delete, page up
            // and page down sequences.
            b' ' => cursor.switch_bit(memory),
            b'3' => cursor.erase_byte(memory),
            b'K' | b'5' => cursor.move_byte_up(memory),
            b'J' | b'6' => cursor.move_byte_down(memory),

            // Advanced manipulation
            b'f' => {
                cursor.set_bit(memory, true);
                cursor.increase_x();
            }
            b'd' => {
                cursor.set_bit(memory, false);
                cursor.increase_x();
            }
            b'x' => {
                cursor.erase_byte(memory);
                cursor.set_bit_index(0);
            }

            _ => {}
        }

        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("keyboard error: {0}")]
    Key(#[from] KeyError),
}

/// Run the editor until the exit flag gets set.
///
/// # Errors
///
/// Fails if the keyboard can't be read. Failed saves are only logged.
pub fn edit<P, K, R, C, S>(
    session: &mut Session<P>,
    io: &mut Peripherals<K, R, C>,
    executor: &Executor,
    storage: &mut S,
) -> Result<(), EditorError>
where
    P: Processor,
    K: KeySource,
    R: Renderer,
    C: Clock,
    S: Storage + ?Sized,
{
    let mut editor = Editor::new();
    session.redraw(&mut io.renderer);

    loop {
        let read = read_key_retrying(&mut io.keys, session.exit_flag(), || {
            session.redraw(&mut io.renderer);
        });
        let key = match read {
            Ok(key) => key,
            Err(ReadError::ExitRequested) => break,
            Err(ReadError::Key(e)) => return Err(e.into()),
        };

        match editor.handle_key(key, session) {
            None => {}
            Some(Command::Run) => match executor.run(session, io) {
                Ok(summary) => debug!(?summary, "Run summary"),
                Err(ExecutionError::ExitRequested) => break,
                Err(ExecutionError::Key(e)) => return Err(e.into()),
            },
            Some(Command::SaveToNewFile) => match save_to_new_file(session, storage) {
                Ok(path) => info!(%path, "Saved to a new file"),
                Err(e) => warn!(error = &e as &dyn std::error::Error, "Could not save"),
            },
            Some(Command::SaveToCurrentFile) => match save_to_current_file(session, storage) {
                Ok(path) => info!(%path, "Saved"),
                Err(e) => warn!(error = &e as &dyn std::error::Error, "Could not save"),
            },
            Some(Command::SwitchView) => session.switch_view(&mut io.renderer),
        }

        session.redraw(&mut io.renderer);
    }

    info!("Leaving the editor");
    Ok(())
}
