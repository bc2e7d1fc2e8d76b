use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};

use console::Console;

mod console;

/// Build, combine and query finite automata from a line oriented console.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Options {
    /// Read commands from this file instead of standard input
    #[arg(long)]
    script: Option<PathBuf>,
    /// Do not print a prompt
    #[arg(short, long)]
    quiet: bool,
    /// Raise log verbosity, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    let default_filter = match options.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let stdout = io::stdout();
    let mut console = Console::new(stdout.lock());
    match &options.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            console.run(BufReader::new(file), false)?;
        }
        None => console.run(io::stdin().lock(), !options.quiet)?,
    }
    Ok(())
}
