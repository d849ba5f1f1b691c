//! Objaverse subset selection and bookkeeping entry point

mod batcher;
mod catalog;
mod commands;
mod completion;
mod error;
mod filter;
mod settings;
mod splitter;
mod uid_list;

use clap::Parser;
use settings::CliArgs;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    commands::run(args.command)
}
