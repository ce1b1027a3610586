mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{columns, derive, gwr, publish};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    match &cli.command {
        Commands::Columns(args) => columns::run(&cli, args),
        Commands::Gwr(args) => gwr::run(&cli, args),
        Commands::Derive(args) => derive::run(&cli, args),
        Commands::Publish(args) => publish::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
