use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use figprov::git;
use figprov::meta;

#[derive(Parser, Debug)]
#[command(
    name = "figprov",
    version,
    about = "Read the git provenance embedded in a saved figure (.png or .pdf)"
)]
struct Cli {
    /// Figure file to inspect
    #[arg(value_name = "FILE")]
    path: Option<PathBuf>,

    /// Print the embedded working-tree diff instead of the summary
    #[arg(short, long)]
    diff: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let Some(path) = cli.path else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let Some(info) = meta::read_info(&path)? else {
        println!("Couldn't get info for file: {}", path.display());
        return Ok(());
    };

    if cli.diff {
        match info.get(git::KEY_DIFF) {
            Some(diff) => print!("{diff}"),
            None => println!("No diff embedded in file: {}", path.display()),
        }
        return Ok(());
    }

    for (key, value) in &info {
        if key == git::KEY_DIFF {
            let lines = value.lines().count();
            println!("{key:<12}: <{lines} line diff — rerun with --diff to print it>");
        } else {
            println!("{key:<12}: {value}");
        }
    }

    Ok(())
}
