use std::time::Duration;

use bitcomp_emulator::constants::FQ;
use bitcomp_emulator::execution::ThreadClock;
use bitcomp_emulator::keys::ExitFlag;
use bitcomp_emulator::persistence::NativeStorage;
use bitcomp_emulator::view::View;
use bitcomp_emulator::{
    edit, ExecutionConfig, Executor, MemoryBank, Peripherals, Sequencer, Session, Word,
};
use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};
use tracing::{debug, info};

use super::load_memory;
use crate::render::TextRenderer;
use crate::terminal::RawTerminal;

#[derive(Parser, Debug)]
pub struct EditOpt {
    /// Memory file to start from. Starts with an empty memory if missing
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Option<Utf8PathBuf>,

    /// Layout used to draw the computer
    #[clap(long, default_value_t = View::default())]
    view: View,

    /// Duration of an execution tick, in milliseconds
    #[clap(long, default_value_t = FQ)]
    tick: u64,

    /// Value read by the program from the last address of a bank
    #[clap(long, default_value_t = 0)]
    input_port: u8,
}

impl EditOpt {
    pub fn exec(self, colors: bool) -> anyhow::Result<()> {
        let mut storage = NativeStorage::from_env()?;
        let mut memory = match &self.input {
            Some(path) => load_memory(&storage, path)?,
            None => MemoryBank::new(),
        };
        memory.set_input(Word::from(self.input_port));

        let mut session =
            Session::new(memory, Sequencer::default(), ExitFlag::new()).with_view(self.view);
        if let Some(path) = self.input {
            session = session.with_current_file(path);
        }

        let executor = Executor::new(ExecutionConfig {
            tick: Duration::from_millis(self.tick),
        });
        debug!(config = ?executor.config(), "Starting the editor");

        let keys = RawTerminal::new(session.exit_flag().clone())?;
        let renderer = TextRenderer::fullscreen(std::io::stdout(), colors);
        let mut io = Peripherals::new(keys, renderer, ThreadClock);
        edit(&mut session, &mut io, &executor, &mut storage)?;

        // Give the terminal back before saying goodbye
        drop(io);
        info!(executions = session.executions, "Bye");
        Ok(())
    }
}
