mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod prompt;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: config::Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "conform", &mut io::stdout());
        return Ok(());
    }

    let (config, source) = config::Config::load(cli.config.as_deref())?;
    if let Some(source) = source {
        log::info!("Using config {}", source.display());
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
    };

    match cli.command {
        Command::Migrate(cmd) => commands::migrate::run(&ctx, cmd),
        Command::Scaffold(args) => commands::scaffold::run(&ctx, &args),
        Command::Catalog(cmd) => commands::catalog::run(&ctx, cmd),
        Command::Completions { .. } => Ok(()),
    }
}
