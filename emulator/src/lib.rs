//! Emulation of a tiny computer with two banks of bit-addressable memory,
//! and the interactive editor driving it.

#![forbid(unsafe_code)]

pub mod constants;
pub mod cursor;
pub mod editor;
pub mod execution;
pub mod keys;
pub mod memory;
pub mod persistence;
pub mod processor;
pub mod session;
pub mod view;
pub mod word;

pub use self::{
    cursor::Cursor,
    editor::{edit, Editor},
    execution::{ExecutionConfig, Executor, Peripherals},
    memory::MemoryBank,
    processor::{Processor, Sequencer},
    session::Session,
    word::{Address, AddressSpace, Word},
};
