//! jdostate
//!
//! Command-line introspection of the JDO lifecycle state machine.
//!
//! # Commands
//!
//! - `states` - List every lifecycle state with its flags
//! - `matrix` - Outcome of every operation from every state
//! - `simulate` - Drive a sample object through a session
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use commands::TxArgs;
use tracing_subscriber::EnvFilter;

/// JDO lifecycle state machine tools.
#[derive(Parser)]
#[command(name = "jdostate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every lifecycle state with its flags
    States {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Apply every operation to every state and show the outcome
    Matrix {
        #[command(flatten)]
        tx: TxArgs,

        /// Show the controller calls made by each transition
        #[arg(short, long)]
        calls: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Drive a sample object through a session over an in-memory datastore
    Simulate {
        /// Comma-separated steps, e.g. `persist,commit,begin,read:name`
        #[arg(short, long, value_delimiter = ',', required = true)]
        ops: Vec<String>,

        #[command(flatten)]
        tx: TxArgs,

        /// Continue after a failing step
        #[arg(short, long)]
        keep_going: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::States { format } => {
            commands::states::run(&format)?;
        }
        Commands::Matrix { tx, calls, format } => {
            let (options, active) = tx.resolve()?;
            commands::matrix::run(options, active, calls, &format)?;
        }
        Commands::Simulate {
            ops,
            tx,
            keep_going,
            format,
        } => {
            let (options, active) = tx.resolve()?;
            commands::simulate::run(&ops, options, active, keep_going, &format)?;
        }
        Commands::Version => {
            println!("jdostate v{}", env!("CARGO_PKG_VERSION"));
            println!("JDO Core v{}", jdo_core::VERSION);
        }
    }

    Ok(())
}
