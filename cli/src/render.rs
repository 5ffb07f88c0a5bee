//! Draws the computer as text, with ANSI styling.

use std::io::Write;

use anstyle::{AnsiColor, Style};
use bitcomp_emulator::constants::RAM_SIZE;
use bitcomp_emulator::execution::ExecutionState;
use bitcomp_emulator::view::{Frame, Renderer, View};
use bitcomp_emulator::{Address, AddressSpace, Word};
use tracing::warn;

const CURSOR: Style = Style::new().invert();
const PC: Style = Style::new().bold();
const OUTPUT: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)));

fn styled(text: &str, style: Style, enabled: bool) -> String {
    if enabled {
        format!("{}{text}{}", style.render(), style.render_reset())
    } else {
        text.to_owned()
    }
}

fn glyph(bit: bool, view: View) -> char {
    match (view, bit) {
        (View::Full3DAlt, true) => '*',
        (View::Full3DAlt, false) => '.',
        (_, true) => '1',
        (_, false) => '0',
    }
}

/// Draw a word, highlighting one of its bits
fn draw_word(word: Word, view: View, cursor: Option<usize>, colors: bool) -> String {
    word.iter()
        .enumerate()
        .map(|(i, bit)| {
            let glyph = glyph(bit, view).to_string();
            if cursor == Some(i) {
                styled(&glyph, CURSOR, colors)
            } else {
                glyph
            }
        })
        .collect()
}

/// Lines of a frame. The cursor is only visible with colors, and never
/// during a run.
pub(crate) fn draw(frame: &Frame<'_>, colors: bool, with_cursor: bool) -> Vec<String> {
    let running = frame.state != ExecutionState::Idle;
    let with_cursor = with_cursor && !running;

    let cell = |space: AddressSpace, index: usize| {
        let word = frame.memory.words(space)[index];
        let cursor = frame.cursor;
        let under_cursor =
            with_cursor && cursor.address_space() == space && cursor.word_index() == index;
        draw_word(
            word,
            frame.view,
            under_cursor.then_some(cursor.bit_index()),
            colors,
        )
    };

    // DATA word addressed by the instruction under the program counter
    let operand = (frame.pc.space == AddressSpace::Code)
        .then(|| Address::from_word(AddressSpace::Data, &frame.memory.get(frame.pc)));

    let marker = |space: AddressSpace, index: usize| {
        let pointed = match space {
            AddressSpace::Code => frame.pc.space == space && frame.pc.index() == index,
            AddressSpace::Data => operand.is_some_and(|address| address.index() == index),
        };
        if running && pointed {
            styled(">", PC, colors)
        } else {
            " ".to_owned()
        }
    };

    let output = {
        let word = draw_word(frame.output, frame.view, None, colors);
        if frame.output_pending {
            format!("{} <", styled(&word, OUTPUT, colors))
        } else {
            word
        }
    };

    let mut lines = Vec::with_capacity(frame.view.height());
    match frame.view {
        View::Compact2D => {
            lines.push("    CODE       DATA".to_owned());
            for i in 0..RAM_SIZE {
                lines.push(format!(
                    "{}{i:>2} {} {} {}",
                    marker(AddressSpace::Code, i),
                    cell(AddressSpace::Code, i),
                    marker(AddressSpace::Data, i),
                    cell(AddressSpace::Data, i),
                ));
            }
            lines.push(String::new());
            lines.push(format!("OUT {output}"));
        }
        View::Full3D | View::Full3DAlt => {
            for space in AddressSpace::ALL {
                if space == AddressSpace::Data {
                    lines.push(String::new());
                }
                lines.push(space.to_string());
                for i in 0..RAM_SIZE {
                    lines.push(format!("{}{i:>2} | {}", marker(space, i), cell(space, i)));
                }
            }
            lines.push(String::new());
            lines.push(format!("OUTPUT {output}"));
        }
    }
    lines
}

/// Writes frames to a terminal, or to any other output
#[derive(Debug)]
pub(crate) struct TextRenderer<W: Write> {
    out: W,
    colors: bool,

    /// Whether to redraw in place and show the cursor, as a full-screen
    /// application
    fullscreen: bool,
}

impl<W: Write> TextRenderer<W> {
    /// Takes over the whole terminal
    pub fn fullscreen(mut out: W, colors: bool) -> Self {
        // Hide the terminal cursor and clear the screen
        if let Err(e) = write!(out, "\x1b[?25l\x1b[2J") {
            warn!(error = &e as &dyn std::error::Error, "Could not set up the screen");
        }
        Self {
            out,
            colors,
            fullscreen: true,
        }
    }

    /// Prints frames one after the other
    pub fn inline(out: W, colors: bool) -> Self {
        Self {
            out,
            colors,
            fullscreen: false,
        }
    }

    fn write_frame(&mut self, frame: &Frame<'_>) -> std::io::Result<()> {
        if self.fullscreen {
            write!(self.out, "\x1b[H")?;
        }
        // Clear what is left of longer lines from the previous frame
        let clear = if self.fullscreen { "\x1b[K" } else { "" };
        for line in draw(frame, self.colors, self.fullscreen) {
            writeln!(self.out, "{line}{clear}")?;
        }
        if self.fullscreen {
            write!(self.out, "\x1b[J")?;
        }
        self.out.flush()
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn redraw(&mut self, frame: &Frame<'_>) {
        if let Err(e) = self.write_frame(frame) {
            warn!(error = &e as &dyn std::error::Error, "Could not draw");
        }
    }

    fn view_changed(&mut self, _view: View) {
        if self.fullscreen {
            if let Err(e) = write!(self.out, "\x1b[2J") {
                warn!(error = &e as &dyn std::error::Error, "Could not clear the screen");
            }
        }
    }
}

impl<W: Write> Drop for TextRenderer<W> {
    fn drop(&mut self) {
        if self.fullscreen {
            // Give the cursor back
            let _ = write!(self.out, "\x1b[?25h");
            let _ = self.out.flush();
        }
    }
}
