//! The contract between the execution loop and the processor.

use tracing::debug;

use crate::memory::MemoryBank;
use crate::word::{Address, AddressSpace};

/// Result of a single processor cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The program can go on
    Continue,

    /// The program reached its end
    Halted,
}

/// Something that advances the computation one cycle at a time.
pub trait Processor {
    /// Execute one fetch/decode/execute cycle against the memory.
    ///
    /// Loads go through [`MemoryBank::read`] and stores through
    /// [`MemoryBank::set`], so that the last address acts as the I/O port.
    fn step(&mut self, memory: &mut MemoryBank) -> StepOutcome;

    /// Go back to the initial state
    fn reset(&mut self);

    /// Address of the next instruction
    fn pc(&self) -> Address;
}

impl<P: Processor + ?Sized> Processor for Box<P> {
    fn step(&mut self, memory: &mut MemoryBank) -> StepOutcome {
        (**self).step(memory)
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn pc(&self) -> Address {
        (**self).pc()
    }
}

/// A processor without an instruction set.
///
/// It walks through the code space one word per cycle and halts when the
/// program counter reaches the last address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequencer {
    pc: Address,
    cycles: usize,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            pc: Address::new(AddressSpace::Code, 0),
            cycles: 0,
        }
    }
}

impl Sequencer {
    /// Number of cycles executed since the last reset
    #[must_use]
    pub fn cycles(&self) -> usize {
        self.cycles
    }
}

impl Processor for Sequencer {
    #[tracing::instrument(skip(self, memory), fields(pc = %self.pc), level = "trace")]
    fn step(&mut self, memory: &mut MemoryBank) -> StepOutcome {
        if self.pc.is_last() {
            return StepOutcome::Halted;
        }

        let instruction = memory.read(self.pc);
        debug!(%instruction, "Executing instruction");
        self.pc = self.pc.wrapping_next();
        self.cycles += 1;

        if self.pc.is_last() {
            StepOutcome::Halted
        } else {
            StepOutcome::Continue
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn pc(&self) -> Address {
        self.pc
    }
}
