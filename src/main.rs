//! quorumsig CLI
//!
//! Collects M-of-N threshold signatures through a coordinating relay and
//! assembles the verifier-ready signed transaction.

use clap::{Parser, Subcommand};
use quorumsig::cli::commands::{
    cmd_cancel, cmd_create, cmd_finalize, cmd_keygen, cmd_list, cmd_sign, cmd_status,
};
use quorumsig::cli::AppContext;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quorumsig")]
#[command(version = "0.1.0")]
#[command(about = "Threshold signature collection and credential assembly", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "quorumsig.json")]
    config: PathBuf,

    /// Hex-encoded private key file (overrides the config)
    #[arg(short, long)]
    key_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new signing key pair
    Keygen {
        /// Output file for the private key
        #[arg(short, long, default_value = "signer.key")]
        out: PathBuf,
    },

    /// Register a pending transaction as the first signer
    Create {
        /// Group alias address
        #[arg(short, long)]
        alias: String,

        /// Hex-encoded unsigned transaction
        #[arg(short, long)]
        unsigned_tx: String,

        /// Hex-encoded output-owner structure
        #[arg(short, long)]
        output_owners: String,

        /// Optional hex metadata stored with the pending object
        #[arg(short, long)]
        metadata: Option<String>,

        /// Days until expiration (config default when omitted)
        #[arg(short, long)]
        expires_in_days: Option<i64>,
    },

    /// List pending transactions for an alias
    List {
        /// Group alias address
        #[arg(short, long)]
        alias: String,
    },

    /// Add this signer's signature to a pending transaction
    Sign {
        /// Group alias address
        #[arg(short, long)]
        alias: String,

        /// Pending transaction id (newest when omitted)
        #[arg(short, long)]
        id: Option<String>,
    },

    /// Show workflow states of pending transactions
    Status {
        /// Group alias address
        #[arg(short, long)]
        alias: String,
    },

    /// Assemble the signed transaction and optionally issue it
    Finalize {
        /// Group alias address
        #[arg(short, long)]
        alias: String,

        /// Pending transaction id (newest when omitted)
        #[arg(short, long)]
        id: Option<String>,

        /// Address whose signature the metadata blob carries
        #[arg(short, long)]
        metadata_signer: Option<String>,

        /// Issue through the relay after assembling
        #[arg(long)]
        issue: bool,
    },

    /// Cancel a pending transaction
    Cancel {
        /// Pending transaction id
        #[arg(short, long)]
        id: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> quorumsig::cli::CliResult<()> {
    // Keygen needs no key or network configuration
    if let Commands::Keygen { out } = &cli.command {
        return cmd_keygen(out);
    }

    let ctx = AppContext::load(&cli.config, cli.key_file.as_deref())?;

    match &cli.command {
        Commands::Keygen { .. } => unreachable!("handled above"),
        Commands::Create {
            alias,
            unsigned_tx,
            output_owners,
            metadata,
            expires_in_days,
        } => {
            cmd_create(
                &ctx,
                alias,
                unsigned_tx,
                output_owners,
                metadata.as_deref(),
                *expires_in_days,
            )
            .await
        }
        Commands::List { alias } => cmd_list(&ctx, alias).await,
        Commands::Sign { alias, id } => cmd_sign(&ctx, alias, id.as_deref()).await,
        Commands::Status { alias } => cmd_status(&ctx, alias).await,
        Commands::Finalize {
            alias,
            id,
            metadata_signer,
            issue,
        } => {
            cmd_finalize(
                &ctx,
                alias,
                id.as_deref(),
                metadata_signer.as_deref(),
                *issue,
            )
            .await
        }
        Commands::Cancel { id } => cmd_cancel(&ctx, id).await,
    }
}
