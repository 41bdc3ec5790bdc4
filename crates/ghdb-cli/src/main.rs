//! # ghdb CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ghdb_cli::remote::{run_remote, GithubArgs, RemoteCommand};
use ghdb_cli::token::{run_token, TokenArgs};

/// ghdb operator CLI.
#[derive(Parser, Debug)]
#[command(name = "ghdb", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode or decode link tokens.
    Token(TokenArgs),

    /// Create or repair the service entity and print its config.
    Init(GithubArgs),

    /// Service config operations.
    Config(ConfigArgs),

    /// Link index operations.
    Links(LinksArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the service config.
    Show(GithubArgs),
}

#[derive(Args, Debug)]
struct LinksArgs {
    #[command(subcommand)]
    command: LinksCommand,
}

#[derive(Subcommand, Debug)]
enum LinksCommand {
    /// Print every recorded link.
    List(GithubArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Token(args) => run_token(args),
        Commands::Init(args) => run_remote(RemoteCommand::Init, args),
        Commands::Config(ConfigArgs {
            command: ConfigCommand::Show(args),
        }) => run_remote(RemoteCommand::ConfigShow, args),
        Commands::Links(LinksArgs {
            command: LinksCommand::List(args),
        }) => run_remote(RemoteCommand::LinksList, args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
