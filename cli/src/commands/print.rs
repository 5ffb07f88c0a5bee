use bitcomp_emulator::keys::ExitFlag;
use bitcomp_emulator::persistence::NativeStorage;
use bitcomp_emulator::view::View;
use bitcomp_emulator::{Sequencer, Session};
use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};

use super::load_memory;
use crate::render::TextRenderer;

#[derive(Parser, Debug)]
pub struct PrintOpt {
    /// Memory file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Layout used to draw the computer
    #[clap(long, default_value_t = View::default())]
    view: View,
}

impl PrintOpt {
    pub fn exec(&self, colors: bool) -> anyhow::Result<()> {
        let storage = NativeStorage::from_env()?;
        let memory = load_memory(&storage, &self.input)?;

        let session = Session::new(memory, Sequencer::default(), ExitFlag::new())
            .with_view(self.view);
        let mut renderer = TextRenderer::inline(std::io::stdout().lock(), colors);
        session.redraw(&mut renderer);

        Ok(())
    }
}
