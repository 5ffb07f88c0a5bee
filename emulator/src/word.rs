//! Fixed-width bit vectors, used both as memory words and as addresses.
//!
//! Bit 0 is the most significant bit, which is also the leftmost bit on
//! screen and in saved files.

use parse_display::Display;
use thiserror::Error;

use crate::constants::{ADDRESS_SIZE, LAST_ADDRESS, RAM_SIZE, WORD_SIZE};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WordError {
    #[error("expected {expected} bits, got {got}")]
    InvalidWidth { expected: usize, got: usize },

    #[error("value {value} does not fit in {width} bits")]
    Overflow { value: usize, width: usize },
}

/// A binary number of exactly `N` bits
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bits<const N: usize>([bool; N]);

/// The unit of storage of the memory banks
pub type Word = Bits<WORD_SIZE>;

/// The raw bits of an address
pub type AddressBits = Bits<ADDRESS_SIZE>;

impl<const N: usize> Default for Bits<N> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const N: usize> Bits<N> {
    /// All bits cleared
    pub const ZERO: Self = Self([false; N]);

    /// Number of bits
    pub const WIDTH: usize = N;

    #[must_use]
    pub const fn new(bits: [bool; N]) -> Self {
        Self(bits)
    }

    /// Encode an unsigned number.
    ///
    /// # Errors
    ///
    /// Fails if the value needs more than `N` bits.
    pub fn from_int(value: usize) -> Result<Self, WordError> {
        if N < usize::BITS as usize && value >> N != 0 {
            return Err(WordError::Overflow { value, width: N });
        }

        Ok(Self::from_int_wrapping(value))
    }

    /// Encode an unsigned number, keeping only its `N` least significant bits
    #[must_use]
    pub fn from_int_wrapping(value: usize) -> Self {
        let mut bits = [false; N];
        for (i, bit) in bits.iter_mut().enumerate() {
            let shift = N - 1 - i;
            *bit = shift < usize::BITS as usize && (value >> shift) & 1 == 1;
        }
        Self(bits)
    }

    /// Decode as an unsigned number
    #[must_use]
    pub fn to_int(&self) -> usize {
        self.0
            .iter()
            .fold(0, |acc, &bit| (acc << 1) | usize::from(bit))
    }

    /// Read a single bit.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not lower than `N`.
    #[must_use]
    pub fn bit(&self, index: usize) -> bool {
        assert!(index < N, "bit index {index} out of range for a {N}-bit word");
        self.0[index]
    }

    /// Copy of this word with a single bit replaced.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not lower than `N`.
    #[must_use]
    pub fn with_bit(mut self, index: usize, value: bool) -> Self {
        assert!(index < N, "bit index {index} out of range for a {N}-bit word");
        self.0[index] = value;
        self
    }

    #[must_use]
    pub fn bits(&self) -> &[bool; N] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// Whether every bit is cleared
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|bit| !bit)
    }
}

impl<const N: usize> From<[bool; N]> for Bits<N> {
    fn from(bits: [bool; N]) -> Self {
        Self(bits)
    }
}

impl<const N: usize> TryFrom<&[bool]> for Bits<N> {
    type Error = WordError;

    fn try_from(value: &[bool]) -> Result<Self, Self::Error> {
        let bits: [bool; N] = value.try_into().map_err(|_| WordError::InvalidWidth {
            expected: N,
            got: value.len(),
        })?;
        Ok(Self(bits))
    }
}

impl From<u8> for Word {
    fn from(byte: u8) -> Self {
        Self::from_int_wrapping(byte.into())
    }
}

impl<const N: usize> std::fmt::Display for Bits<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl<const N: usize> std::fmt::Debug for Bits<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0b{self}")
    }
}

/// One of the two memory banks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(style = "UPPERCASE")]
pub enum AddressSpace {
    /// Holds the instructions
    Code,

    /// Holds the operands and the state of the program
    Data,
}

impl AddressSpace {
    pub const ALL: [AddressSpace; 2] = [AddressSpace::Code, AddressSpace::Data];

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Code => Self::Data,
            Self::Data => Self::Code,
        }
    }
}

/// A word index qualified by its address space.
///
/// Its bits can only hold values in `[0, RAM_SIZE)`, so an address is never
/// out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub space: AddressSpace,
    bits: AddressBits,
}

impl Address {
    /// # Panics
    ///
    /// Panics if `index` is not lower than `RAM_SIZE`.
    #[must_use]
    pub fn new(space: AddressSpace, index: usize) -> Self {
        assert!(
            index < RAM_SIZE,
            "address {index} out of range for a {RAM_SIZE}-word bank"
        );
        Self {
            space,
            bits: AddressBits::from_int_wrapping(index),
        }
    }

    /// Address formed by the least significant bits of a word
    #[must_use]
    pub fn from_word(space: AddressSpace, word: &Word) -> Self {
        Self {
            space,
            bits: AddressBits::from_int_wrapping(word.to_int()),
        }
    }

    /// The last word of an address space
    #[must_use]
    pub fn last(space: AddressSpace) -> Self {
        Self::new(space, LAST_ADDRESS)
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.bits.to_int()
    }

    #[must_use]
    pub fn bits(&self) -> AddressBits {
        self.bits
    }

    /// Whether this is the output sentinel of its address space
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index() == LAST_ADDRESS
    }

    /// The following address, wrapping to the first one
    #[must_use]
    pub fn wrapping_next(&self) -> Self {
        Self {
            space: self.space,
            bits: AddressBits::from_int_wrapping(self.index() + 1),
        }
    }

    /// The preceding address, wrapping to the last one
    #[must_use]
    pub fn wrapping_prev(&self) -> Self {
        Self {
            space: self.space,
            bits: AddressBits::from_int_wrapping(self.index() + RAM_SIZE - 1),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.space, self.index())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn int_conversion_test() {
        let word = Word::from_int(5).unwrap();
        assert_eq!(word.to_string(), "00000101");
        assert_eq!(word.to_int(), 5);
        assert_eq!(Word::from_int(255).unwrap().to_string(), "11111111");
        assert_eq!(Word::from(b'A').to_int(), 65);
    }

    #[test]
    fn overflow_test() {
        assert_eq!(
            Word::from_int(256),
            Err(WordError::Overflow {
                value: 256,
                width: 8
            })
        );
        assert_eq!(Word::from_int_wrapping(256), Word::ZERO);
        assert_eq!(Word::from_int_wrapping(0x1_23).to_int(), 0x23);
        assert!(AddressBits::from_int(16).is_err());
    }

    #[test]
    fn with_bit_test() {
        let word = Word::from_int(5).unwrap();
        let flipped = word.with_bit(0, true);
        assert_eq!(flipped.to_string(), "10000101");
        // The original is left untouched
        assert_eq!(word.to_string(), "00000101");
        assert!(flipped.bit(0));
        assert!(!flipped.bit(1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn with_bit_out_of_range_test() {
        let _ = Word::ZERO.with_bit(WORD_SIZE, true);
    }

    #[test]
    fn width_test() {
        let bits = [true; 7];
        assert_eq!(
            Word::try_from(&bits[..]),
            Err(WordError::InvalidWidth {
                expected: 8,
                got: 7
            })
        );
        let bits = [true, false, false, false, false, false, false, true];
        assert_eq!(Word::try_from(&bits[..]).unwrap().to_int(), 0b1000_0001);
    }

    #[test]
    fn address_test() {
        let word = Word::from_int(0b1010_0011).unwrap();
        let address = Address::from_word(AddressSpace::Data, &word);
        assert_eq!(address.index(), 0b0011);
        assert_eq!(address.to_string(), "DATA[3]");

        let last = Address::last(AddressSpace::Code);
        assert!(last.is_last());
        assert_eq!(last.wrapping_next().index(), 0);
        assert_eq!(Address::new(AddressSpace::Code, 0).wrapping_prev(), last);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn address_out_of_range_test() {
        let _ = Address::new(AddressSpace::Data, RAM_SIZE);
    }

    #[test]
    fn address_space_test() {
        assert_eq!(AddressSpace::Code.other(), AddressSpace::Data);
        assert_eq!(AddressSpace::Data.other(), AddressSpace::Code);
        assert_eq!(AddressSpace::Code.to_string(), "CODE");
    }
}
