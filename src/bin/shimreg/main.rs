//! shimreg CLI - inspect shim tables and evaluate requests against them

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::GlobalOpts;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("shimreg=debug")
    } else {
        EnvFilter::new("shimreg=info")
    };

    // Logs go to stderr so `--json` output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    let global = GlobalOpts {
        table: cli.table,
        color: !cli.no_color,
    };

    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &global),
        Commands::List(args) => commands::list::execute(args, &global),
        Commands::Dispatch(args) => commands::dispatch::execute(args, &global),
        Commands::Unblock(args) => commands::unblock::execute(args, &global),
        Commands::Options(args) => commands::options::execute(args, &global),
        Commands::Explain(args) => commands::explain::execute(args, &global),
        Commands::Simulate(args) => commands::simulate::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
