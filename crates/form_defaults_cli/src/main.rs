mod cli;
mod commands;
mod config;
mod logging;
mod merge;

use clap::Parser;
use cli::Cli;
use color_eyre::eyre::{Result, WrapErr};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    logging::init(args.debug)?;

    let mut engine_config =
        config::load(args.config.as_deref()).wrap_err("loading engine configuration")?;
    if args.debug {
        engine_config.show_debug = true;
    }
    if let Some(tag) = args.loop_tag {
        engine_config.loop_tag = tag;
    }

    commands::run(args.cmd, engine_config)
}
