//! What the renderers get to see.

use parse_display::{Display, FromStr};

use crate::cursor::Cursor;
use crate::execution::ExecutionState;
use crate::memory::MemoryBank;
use crate::word::{Address, Word};

/// Layout used to draw the computer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr)]
#[display(style = "lowercase")]
pub enum View {
    /// Both address spaces side by side
    Compact2D,

    /// Address spaces stacked, with address labels
    #[default]
    Full3D,

    /// Like [`View::Full3D`], drawn with lights instead of digits
    Full3DAlt,
}

impl View {
    /// The view selected after this one
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Full3D => Self::Full3DAlt,
            Self::Full3DAlt => Self::Compact2D,
            Self::Compact2D => Self::Full3D,
        }
    }

    /// Width of a drawing, in characters
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Compact2D => 24,
            Self::Full3D | Self::Full3DAlt => 20,
        }
    }

    /// Height of a drawing, in lines
    #[must_use]
    pub const fn height(self) -> usize {
        match self {
            Self::Compact2D => 19,
            Self::Full3D | Self::Full3DAlt => 37,
        }
    }
}

/// A read-only snapshot of everything a renderer may draw
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub memory: &'a MemoryBank,
    pub cursor: &'a Cursor,
    pub pc: Address,
    pub output: Word,
    pub output_pending: bool,
    pub state: ExecutionState,
    pub view: View,
}

/// Draws frames, notified each time the state changes
pub trait Renderer {
    fn redraw(&mut self, frame: &Frame<'_>);

    /// Called when another view gets selected, before the next redraw
    fn view_changed(&mut self, _view: View) {}
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn redraw(&mut self, frame: &Frame<'_>) {
        (**self).redraw(frame);
    }

    fn view_changed(&mut self, view: View) {
        (**self).view_changed(view);
    }
}
