//! State shared by the editor and the execution loop for the lifetime of the
//! program.

use camino::Utf8PathBuf;

use crate::cursor::Cursor;
use crate::execution::ExecutionState;
use crate::keys::ExitFlag;
use crate::memory::MemoryBank;
use crate::processor::Processor;
use crate::view::{Frame, Renderer, View};

/// Everything the user works on.
///
/// Only one of the editor and the execution loop holds it at any time.
#[derive(Debug)]
pub struct Session<P> {
    pub memory: MemoryBank,
    pub cursor: Cursor,
    pub processor: P,
    pub view: View,

    /// File the memory was loaded from or last saved to as the current file
    pub current_file: Option<Utf8PathBuf>,

    /// Number of runs since startup
    pub executions: usize,

    pub(crate) state: ExecutionState,
    exit: ExitFlag,
}

impl<P: Processor> Session<P> {
    #[must_use]
    pub fn new(memory: MemoryBank, processor: P, exit: ExitFlag) -> Self {
        Self {
            memory,
            cursor: Cursor::default(),
            processor,
            view: View::default(),
            current_file: None,
            executions: 0,
            state: ExecutionState::Idle,
            exit,
        }
    }

    #[must_use]
    pub fn with_view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    #[must_use]
    pub fn with_current_file(mut self, path: Utf8PathBuf) -> Self {
        self.current_file = Some(path);
        self
    }

    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    #[must_use]
    pub fn exit_flag(&self) -> &ExitFlag {
        &self.exit
    }

    /// Snapshot of what should be on screen
    #[must_use]
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            memory: &self.memory,
            cursor: &self.cursor,
            pc: self.processor.pc(),
            output: self.memory.output(),
            output_pending: self.memory.output_pending(),
            state: self.state,
            view: self.view,
        }
    }

    pub fn redraw<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        renderer.redraw(&self.frame());
    }

    /// Select the next view
    pub fn switch_view<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        self.view = self.view.next();
        renderer.view_changed(self.view);
    }
}
