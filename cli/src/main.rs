#![forbid(unsafe_code)]

use std::io::IsTerminal;
use std::process::exit;

use clap::{ArgAction, ArgGroup, Parser};
use tracing::error;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;
mod render;
mod terminal;

use crate::commands::Subcommand;

#[derive(Parser)]
#[clap(version, author, about, group = ArgGroup::new("format"))]
struct Opt {
    /// Increase the level of verbosity. Can be used multiple times.
    #[clap(short, long, action = ArgAction::Count, global(true))]
    verbose: u8,

    /// Force colored output. Default is to check if the output is a tty
    #[clap(short = 'c', long, global(true), group = "format")]
    color: bool,

    /// Force non-colored output. Default is to check if the output is a tty
    #[clap(short = 'C', long, global(true), group = "format")]
    no_color: bool,

    /// Use JSON output for log messages
    #[clap(short, long, global(true), group = "format")]
    json: bool,

    #[clap(subcommand)]
    command: Subcommand,
}

impl Opt {
    const fn log_filter(&self) -> &'static str {
        // Logs share the terminal with the editor, keep them quiet by default
        match self.verbose {
            0 => "warn",
            1 => "bitcomp_emulator=debug,bitcomp_cli=debug,info",
            2 => "bitcomp_emulator=trace,bitcomp_cli=trace,info",
            3..=u8::MAX => "trace",
        }
    }

    fn should_use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            std::io::stdout().is_terminal()
        }
    }

    fn filter_layer(&self) -> EnvFilter {
        // Parse log level from env
        EnvFilter::try_from_default_env()
            // or infer from args
            .unwrap_or_else(|_| EnvFilter::new(self.log_filter()))
    }
}

fn main() {
    // First, parse the arguments
    let opt = Opt::parse();
    let colors = opt.should_use_colors();

    // Then, setup the tracing formatter for logging and instrumentation.
    // Logs go to stderr, so that they can be kept away from the drawing
    let registry = tracing_subscriber::Registry::default().with(opt.filter_layer());

    if opt.json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .without_time()
            .with_ansi(opt.color || (std::io::stderr().is_terminal() && !opt.no_color))
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    }

    // And run the command
    let res = opt.command.exec(colors);
    if let Err(e) = res {
        error!("{:#}", e);
        exit(1);
    }
}
