use std::time::Duration;

/// Number of bits in a memory word
pub const WORD_SIZE: usize = 8;

/// Number of words in each address space
pub const RAM_SIZE: usize = 16;

/// Number of bits needed to address a word of an address space
pub const ADDRESS_SIZE: usize = 4;

/// Index of the last word of an address space, which is wired to the output port
pub const LAST_ADDRESS: usize = RAM_SIZE - 1;

/// Default duration of an execution tick, in milliseconds
pub const FQ: u64 = 300;

/// Default duration of an execution tick
pub const DEFAULT_TICK: Duration = Duration::from_millis(FQ);

/// Byte sent by the terminal for the escape key
pub const ESCAPE: u8 = 27;

/// Prefix of the files created when saving without a current file
pub const SAVE_FILE_NAME: &str = "saved-ram-";

/// First bit of the address part of an instruction word
pub(crate) const ADDRESS_BIT: usize = WORD_SIZE - ADDRESS_SIZE;

const _: () = assert!(1 << ADDRESS_SIZE == RAM_SIZE);
