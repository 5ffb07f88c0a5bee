use std::process::exit;

use bitcomp_emulator::persistence::{load, PersistenceError, Storage};
use bitcomp_emulator::MemoryBank;
use camino::Utf8Path;
use tracing::info;

mod completion;
mod edit;
mod print;

#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Edit and run a memory bank in the terminal
    Edit(self::edit::EditOpt),

    /// Draw a memory bank once
    Print(self::print::PrintOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self, colors: bool) -> anyhow::Result<()> {
        match self {
            Self::Edit(opt) => opt.exec(colors),
            Self::Print(opt) => opt.exec(colors),
            Self::Completion(opt) => opt.exec(),
        }
    }
}

/// Load a memory file, pointing at the faulty line when it can't be parsed
fn load_memory<S: Storage>(storage: &S, path: &Utf8Path) -> anyhow::Result<MemoryBank> {
    info!(%path, "Reading memory");
    match load(storage, path) {
        Ok(memory) => Ok(memory),
        Err(PersistenceError::Parse {
            path,
            content,
            inner,
        }) => {
            let labels = vec![miette::LabeledSpan::new(
                Some(inner.message.clone()),
                inner.offset,
                0,
            )];
            let report = miette::miette!(labels = labels, "Failed to load {path}")
                .with_source_code(content);
            eprintln!("{report:?}");
            exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
