//! The editing position, and every edit the user can make to the memory.

use tracing::trace;

use crate::constants::{ADDRESS_BIT, LAST_ADDRESS, WORD_SIZE};
use crate::memory::MemoryBank;
use crate::processor::Processor;
use crate::word::{Address, AddressSpace, Word};

/// Where the tokens of a word start, for the word-wise movements.
///
/// The first bit always starts a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLayout {
    starts: Word,
}

impl Default for TokenLayout {
    /// An instruction: an opcode, then an address
    fn default() -> Self {
        Self::new(Word::ZERO.with_bit(ADDRESS_BIT, true))
    }
}

impl TokenLayout {
    /// Each set bit of `starts` marks the first bit of a token
    #[must_use]
    pub fn new(starts: Word) -> Self {
        Self {
            starts: starts.with_bit(0, true),
        }
    }

    #[must_use]
    pub fn is_start(&self, bit: usize) -> bool {
        self.starts.bit(bit)
    }

    /// First bit of the token containing `bit`
    fn start_of(&self, bit: usize) -> usize {
        (0..=bit).rev().find(|&i| self.is_start(i)).unwrap_or(0)
    }

    /// Last bit of the token containing `bit`
    fn end_of(&self, bit: usize) -> usize {
        self.next_start(bit).map_or(WORD_SIZE - 1, |next| next - 1)
    }

    /// First bit of the token following the one containing `bit`
    fn next_start(&self, bit: usize) -> Option<usize> {
        (bit + 1..WORD_SIZE).find(|&i| self.is_start(i))
    }
}

/// A position in one of the memory banks.
///
/// The cursor does not own any memory: edits are applied to the bank given
/// to each operation. Movements stop at the edges, they never wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    space: AddressSpace,
    word: usize,
    bit: usize,
    tokens: TokenLayout,
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new(TokenLayout::default())
    }
}

impl Cursor {
    #[must_use]
    pub fn new(tokens: TokenLayout) -> Self {
        Self {
            space: AddressSpace::Code,
            word: 0,
            bit: 0,
            tokens,
        }
    }

    #[must_use]
    pub fn address_space(&self) -> AddressSpace {
        self.space
    }

    #[must_use]
    pub fn word_index(&self) -> usize {
        self.word
    }

    #[must_use]
    pub fn bit_index(&self) -> usize {
        self.bit
    }

    #[must_use]
    pub fn address(&self) -> Address {
        Address::new(self.space, self.word)
    }

    /// The word under the cursor
    #[must_use]
    pub fn word(&self, memory: &MemoryBank) -> Word {
        memory.get(self.address())
    }

    /// Move one bit to the right
    pub fn increase_x(&mut self) {
        if self.bit < WORD_SIZE - 1 {
            self.bit += 1;
        }
    }

    /// Move one bit to the left
    pub fn decrease_x(&mut self) {
        self.bit = self.bit.saturating_sub(1);
    }

    /// Move one word down
    pub fn increase_y(&mut self) {
        if self.word < LAST_ADDRESS {
            self.word += 1;
        }
    }

    /// Move one word up
    pub fn decrease_y(&mut self) {
        self.word = self.word.saturating_sub(1);
    }

    pub fn switch_address_space(&mut self) {
        self.space = self.space.other();
    }

    /// # Panics
    ///
    /// Panics if `bit` is not lower than `WORD_SIZE`.
    pub fn set_bit_index(&mut self, bit: usize) {
        assert!(bit < WORD_SIZE, "bit index {bit} out of range");
        self.bit = bit;
    }

    /// Jump to the last bit of the token following the cursor
    pub fn go_to_end_of_word(&mut self) {
        if self.bit < WORD_SIZE - 1 {
            self.bit = self.tokens.end_of(self.bit + 1);
        }
    }

    /// Jump to the first bit of the token preceding the cursor
    pub fn go_to_beginning_of_word(&mut self) {
        if self.bit > 0 {
            self.bit = self.tokens.start_of(self.bit - 1);
        }
    }

    /// Jump to the next token, continuing on the next word after the last one
    pub fn go_to_beginning_of_next_word(&mut self) {
        if let Some(next) = self.tokens.next_start(self.bit) {
            self.bit = next;
        } else {
            self.increase_y();
            self.bit = 0;
        }
    }

    /// Jump to the instruction the program counter points to
    pub fn go_to_instructions_address<P: Processor + ?Sized>(&mut self, processor: &P) {
        let pc = processor.pc();
        self.space = pc.space;
        self.word = pc.index();
        trace!(address = %pc, "Cursor moved to the program counter");
    }

    /// Flip the bit under the cursor
    pub fn switch_bit(&self, memory: &mut MemoryBank) {
        let word = self.word(memory);
        let bit = word.bit(self.bit);
        memory.store(self.address(), word.with_bit(self.bit, !bit));
    }

    pub fn set_bit(&self, memory: &mut MemoryBank, value: bool) {
        let word = self.word(memory);
        memory.store(self.address(), word.with_bit(self.bit, value));
    }

    /// Replace the whole word under the cursor
    pub fn set_word(&self, memory: &mut MemoryBank, word: Word) {
        memory.store(self.address(), word);
    }

    /// Clear the word under the cursor
    pub fn erase_byte(&self, memory: &mut MemoryBank) {
        memory.store(self.address(), Word::ZERO);
    }

    /// Swap the word under the cursor with the one above, and follow it
    pub fn move_byte_up(&mut self, memory: &mut MemoryBank) {
        if self.word == 0 {
            return;
        }
        memory.swap(self.space, self.word, self.word - 1);
        self.word -= 1;
    }

    /// Swap the word under the cursor with the one below, and follow it
    pub fn move_byte_down(&mut self, memory: &mut MemoryBank) {
        if self.word == LAST_ADDRESS {
            return;
        }
        memory.swap(self.space, self.word, self.word + 1);
        self.word += 1;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::constants::RAM_SIZE;
    use crate::processor::{Processor, Sequencer};

    fn word(value: usize) -> Word {
        Word::from_int(value).unwrap()
    }

    #[test]
    fn horizontal_bounds_test() {
        let mut cursor = Cursor::default();
        cursor.decrease_x();
        assert_eq!(cursor.bit_index(), 0);

        for _ in 0..WORD_SIZE * 2 {
            cursor.increase_x();
        }
        assert_eq!(cursor.bit_index(), WORD_SIZE - 1);
        // Never spills onto the next word
        assert_eq!(cursor.word_index(), 0);
    }

    #[test]
    fn vertical_bounds_test() {
        let mut cursor = Cursor::default();
        cursor.set_bit_index(3);
        cursor.decrease_y();
        assert_eq!(cursor.word_index(), 0);

        for _ in 0..RAM_SIZE * 2 {
            cursor.increase_y();
        }
        assert_eq!(cursor.word_index(), RAM_SIZE - 1);
        assert_eq!(cursor.bit_index(), 3);
    }

    #[test]
    fn switch_address_space_test() {
        let mut cursor = Cursor::default();
        cursor.increase_y();
        cursor.increase_x();
        cursor.switch_address_space();
        assert_eq!(cursor.address(), Address::new(AddressSpace::Data, 1));
        assert_eq!(cursor.bit_index(), 1);
        cursor.switch_address_space();
        assert_eq!(cursor.address_space(), AddressSpace::Code);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn set_bit_index_out_of_range_test() {
        Cursor::default().set_bit_index(WORD_SIZE);
    }

    #[test]
    fn token_jumps_test() {
        let mut cursor = Cursor::default();

        cursor.go_to_end_of_word();
        assert_eq!(cursor.bit_index(), 3);
        cursor.go_to_end_of_word();
        assert_eq!(cursor.bit_index(), 7);
        cursor.go_to_end_of_word();
        assert_eq!(cursor.bit_index(), 7);

        cursor.go_to_beginning_of_word();
        assert_eq!(cursor.bit_index(), 4);
        cursor.go_to_beginning_of_word();
        assert_eq!(cursor.bit_index(), 0);
        cursor.go_to_beginning_of_word();
        assert_eq!(cursor.bit_index(), 0);

        cursor.set_bit_index(2);
        cursor.go_to_beginning_of_next_word();
        assert_eq!((cursor.word_index(), cursor.bit_index()), (0, 4));
        cursor.go_to_beginning_of_next_word();
        assert_eq!((cursor.word_index(), cursor.bit_index()), (1, 0));
    }

    #[test]
    fn custom_token_layout_test() {
        // Tokens at bits 0..2, 2..5 and 5..8
        let layout = TokenLayout::new(word(0b0010_0100));
        let mut cursor = Cursor::new(layout);
        cursor.go_to_beginning_of_next_word();
        assert_eq!(cursor.bit_index(), 2);
        cursor.go_to_end_of_word();
        assert_eq!(cursor.bit_index(), 4);
        cursor.go_to_beginning_of_next_word();
        assert_eq!(cursor.bit_index(), 5);
        cursor.go_to_beginning_of_word();
        assert_eq!(cursor.bit_index(), 2);
    }

    #[test]
    fn go_to_instructions_address_test() {
        let mut memory = MemoryBank::new();
        let mut sequencer = Sequencer::default();
        for _ in 0..5 {
            sequencer.step(&mut memory);
        }

        let mut cursor = Cursor::default();
        cursor.switch_address_space();
        cursor.set_bit_index(6);
        cursor.go_to_instructions_address(&sequencer);
        assert_eq!(cursor.address(), Address::new(AddressSpace::Code, 5));
        assert_eq!(cursor.bit_index(), 6);
    }

    #[test]
    fn bit_edit_test() {
        let mut memory = MemoryBank::new();
        let mut cursor = Cursor::default();
        cursor.switch_address_space();
        cursor.set_word(&mut memory, word(0b0000_0101));

        cursor.switch_bit(&mut memory);
        assert_eq!(cursor.word(&memory), word(0b1000_0101));
        cursor.switch_bit(&mut memory);
        assert_eq!(cursor.word(&memory), word(0b0000_0101));

        cursor.set_bit_index(7);
        cursor.set_bit(&mut memory, false);
        assert_eq!(cursor.word(&memory), word(0b0000_0100));
        cursor.set_bit(&mut memory, true);
        cursor.set_bit(&mut memory, true);
        assert_eq!(cursor.word(&memory), word(0b0000_0101));

        cursor.erase_byte(&mut memory);
        assert!(cursor.word(&memory).is_zero());
        // The code space is untouched
        assert!(memory.words(AddressSpace::Code).iter().all(Word::is_zero));
    }

    #[test]
    fn edit_last_address_test() {
        let mut memory = MemoryBank::new();
        let mut cursor = Cursor::default();
        for _ in 0..RAM_SIZE {
            cursor.increase_y();
        }
        cursor.switch_bit(&mut memory);
        // Editing stores the word, it does not trigger the output
        assert_eq!(cursor.word(&memory), word(0b1000_0000));
        assert!(!memory.output_pending());
    }

    #[test]
    fn move_byte_test() {
        let mut memory = MemoryBank::new();
        let mut cursor = Cursor::default();
        cursor.set_word(&mut memory, word(1));
        cursor.increase_y();
        cursor.set_word(&mut memory, word(2));

        cursor.move_byte_up(&mut memory);
        assert_eq!(cursor.word_index(), 0);
        assert_eq!(memory.words(AddressSpace::Code)[..2], [word(2), word(1)]);

        cursor.move_byte_down(&mut memory);
        assert_eq!(cursor.word_index(), 1);
        assert_eq!(memory.words(AddressSpace::Code)[..2], [word(1), word(2)]);
    }

    #[test]
    fn move_byte_at_edges_test() {
        let mut memory = MemoryBank::new();
        let mut cursor = Cursor::default();
        cursor.set_word(&mut memory, word(9));
        let before = memory.clone();

        cursor.move_byte_up(&mut memory);
        assert_eq!(memory, before);
        assert_eq!(cursor.word_index(), 0);

        for _ in 0..RAM_SIZE {
            cursor.increase_y();
        }
        cursor.set_word(&mut memory, word(3));
        let before = memory.clone();
        cursor.move_byte_down(&mut memory);
        assert_eq!(memory, before);
        assert_eq!(cursor.word_index(), RAM_SIZE - 1);
    }
}
