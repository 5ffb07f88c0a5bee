//! The two memory banks of the computer and its output port.

use nom::{
    branch::alt,
    character::complete::{char, line_ending},
    combinator::{all_consuming, map, opt, value},
    multi::count,
    sequence::terminated,
    Finish, IResult, Offset,
};
use thiserror::Error;
use tracing::debug;

use crate::constants::{RAM_SIZE, WORD_SIZE};
use crate::word::{Address, AddressSpace, Word};

/// Holds the words of both address spaces, and the memory-mapped input and
/// output registers.
///
/// Writing to the last address of either address space does not store the
/// word: it is routed to the output register instead, and the slot keeps its
/// previous value. Reading it from a program with [`MemoryBank::read`] gives
/// the word presented on the input port.
#[derive(Clone, PartialEq, Eq)]
pub struct MemoryBank {
    code: [Word; RAM_SIZE],
    data: [Word; RAM_SIZE],
    input: Word,
    output: Word,
    output_pending: bool,
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self {
            code: [Word::ZERO; RAM_SIZE],
            data: [Word::ZERO; RAM_SIZE],
            input: Word::ZERO,
            output: Word::ZERO,
            output_pending: false,
        }
    }
}

impl std::fmt::Debug for MemoryBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBank")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("output_pending", &self.output_pending)
            .finish_non_exhaustive()
    }
}

impl MemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn space(&self, space: AddressSpace) -> &[Word; RAM_SIZE] {
        match space {
            AddressSpace::Code => &self.code,
            AddressSpace::Data => &self.data,
        }
    }

    fn space_mut(&mut self, space: AddressSpace) -> &mut [Word; RAM_SIZE] {
        match space {
            AddressSpace::Code => &mut self.code,
            AddressSpace::Data => &mut self.data,
        }
    }

    /// Read the word stored at an address
    #[must_use]
    pub fn get(&self, address: Address) -> Word {
        self.space(address.space)[address.index()]
    }

    /// Read a word the way a program does.
    ///
    /// On the last address of a space, this is the word presented on the
    /// input port rather than the content of the slot.
    #[must_use]
    pub fn read(&self, address: Address) -> Word {
        if address.is_last() {
            debug!(space = %address.space, input = %self.input, "Input");
            self.input
        } else {
            self.get(address)
        }
    }

    /// Write a word.
    ///
    /// On the last address of a space, the word goes to the output register
    /// and the output is marked as pending.
    pub fn set(&mut self, address: Address, word: Word) {
        if address.is_last() {
            self.assign_to_last_address(address.space, word);
        } else {
            self.store(address, word);
        }
    }

    /// Write a word into its slot, bypassing the output port.
    ///
    /// This is what editing goes through: the user can still see and change
    /// the content of the last cell.
    pub fn store(&mut self, address: Address, word: Word) {
        self.space_mut(address.space)[address.index()] = word;
    }

    fn assign_to_last_address(&mut self, space: AddressSpace, word: Word) {
        debug!(%space, %word, "Output");
        self.output = word;
        self.output_pending = true;
    }

    /// Exchange the content of two slots of the same address space
    pub(crate) fn swap(&mut self, space: AddressSpace, a: usize, b: usize) {
        self.space_mut(space).swap(a, b);
    }

    #[must_use]
    pub fn words(&self, space: AddressSpace) -> &[Word] {
        self.space(space)
    }

    /// The last word sent to the output port
    #[must_use]
    pub fn output(&self) -> Word {
        self.output
    }

    /// Whether a word was sent to the output port since the last
    /// acknowledgment
    #[must_use]
    pub fn output_pending(&self) -> bool {
        self.output_pending
    }

    /// Acknowledge the output. The last output word stays readable.
    pub fn clear_output(&mut self) {
        self.output_pending = false;
    }

    /// The word presented on the input port
    #[must_use]
    pub fn input(&self) -> Word {
        self.input
    }

    /// Present a word on the input port, for the next reads of a program
    pub fn set_input(&mut self, word: Word) {
        self.input = word;
    }

    /// Flatten both address spaces into a string of `0` and `1`.
    ///
    /// Each word is on its own line, and a blank line separates the code
    /// space from the data space. This is the format of saved files, and the
    /// exact inverse of the [`std::str::FromStr`] implementation.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(2 * RAM_SIZE * (WORD_SIZE + 1) + 1);
        for (i, space) in AddressSpace::ALL.into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for word in self.space(space) {
                out.push_str(&word.to_string());
                out.push('\n');
            }
        }
        out
    }
}

/// Error while reading a serialized memory bank
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid memory content at offset {offset}: {message}")]
pub struct ParseMemoryError {
    /// Byte offset of the failure in the input
    pub offset: usize,
    pub message: String,
}

fn parse_word(input: &str) -> IResult<&str, Word> {
    let bit = alt((value(false, char('0')), value(true, char('1'))));
    let (rest, bits) = count(bit, WORD_SIZE)(input)?;
    // `count` always yields exactly `WORD_SIZE` bits
    let word = Word::try_from(bits.as_slice()).map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Count))
    })?;
    Ok((rest, word))
}

fn parse_space(input: &str) -> IResult<&str, Vec<Word>> {
    count(terminated(parse_word, line_ending), RAM_SIZE)(input)
}

fn parse_last_space(input: &str) -> IResult<&str, Vec<Word>> {
    let (rest, mut words) = count(terminated(parse_word, line_ending), RAM_SIZE - 1)(input)?;
    let (rest, last) = terminated(parse_word, opt(line_ending))(rest)?;
    words.push(last);
    Ok((rest, words))
}

fn parse_memory(input: &str) -> IResult<&str, MemoryBank> {
    let (rest, code) = parse_space(input)?;
    let (rest, _) = line_ending(rest)?;
    map(parse_last_space, move |data| {
        let mut memory = MemoryBank::default();
        memory.code.copy_from_slice(&code);
        memory.data.copy_from_slice(&data);
        memory
    })(rest)
}

impl std::str::FromStr for MemoryBank {
    type Err = ParseMemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, memory) = all_consuming(parse_memory)(s)
            .finish()
            .map_err(|e| ParseMemoryError {
                offset: s.offset(e.input),
                message: format!("expected {WORD_SIZE} bits per line ({:?})", e.code),
            })?;
        Ok(memory)
    }
}
