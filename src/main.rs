//! Mintgate - Ledger command orchestrator for the Elohim asset-token lifecycle
//!
//! "Well done, good and faithful servant" - Matthew 25:21

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mintgate::{
    client::HttpLedgerClient,
    config::Args,
    protocol::TokenOrchestrator,
};

#[derive(Parser, Debug)]
#[command(name = "mintgate")]
#[command(about = "Drive the asset-token lifecycle on the ledger")]
struct Cli {
    #[command(flatten)]
    args: Args,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new instrument as the admin
    CreateInstrument {
        name: String,
        symbol: String,
        #[arg(default_value = "2")]
        decimals: u32,
    },
    /// Propose a mint to an owner (first half of an issue)
    Mint {
        instrument_id: String,
        owner: String,
        amount: u64,
    },
    /// Accept a pending mint proposal as the owner
    Accept {
        proposal_id: String,
        owner: String,
    },
    /// Transfer from a holding to a recipient
    Transfer {
        holding_id: String,
        owner: String,
        recipient: String,
        amount: u64,
    },
    /// Propose destruction of a holding as its owner
    ProposeBurn {
        holding_id: String,
        owner: String,
    },
    /// Accept a pending burn proposal as the admin
    AcceptBurn { proposal_id: String },
    /// List holdings and total balance for a party
    Holdings {
        owner: String,
        #[arg(long)]
        instrument_id: Option<String>,
    },
    /// List pending mint and burn proposals visible to a party
    Proposals { party: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let args = cli.args;

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mintgate={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let directory = args.directory()?;
    let registry = args.registry()?;
    let signer = args.signer()?;
    let ledger = Arc::new(HttpLedgerClient::new(args.request_timeout_ms)?);

    info!("======================================");
    info!("  Mintgate - Ledger Orchestrator");
    info!("======================================");
    info!("Admin party: {}", args.admin_party);
    info!("Participants: {}", directory.participant_count());
    info!("Write package: {}", registry.write_package());
    info!("Read packages: {}", registry.read_packages().len());
    info!("Timeout: {}ms", args.request_timeout_ms);
    info!("======================================");

    let orchestrator = TokenOrchestrator::new(
        args.admin_party.clone(),
        args.application_id.clone(),
        signer,
        directory,
        registry,
        ledger,
    );

    let output = match cli.command {
        Command::CreateInstrument {
            name,
            symbol,
            decimals,
        } => serde_json::to_value(
            orchestrator
                .create_instrument(&name, &symbol, decimals)
                .await?,
        )?,
        Command::Mint {
            instrument_id,
            owner,
            amount,
        } => serde_json::to_value(orchestrator.mint(&instrument_id, &owner, amount).await?)?,
        Command::Accept { proposal_id, owner } => {
            serde_json::to_value(orchestrator.accept_proposal(&proposal_id, &owner).await?)?
        }
        Command::Transfer {
            holding_id,
            owner,
            recipient,
            amount,
        } => serde_json::to_value(
            orchestrator
                .transfer(&holding_id, &owner, &recipient, amount)
                .await?,
        )?,
        Command::ProposeBurn { holding_id, owner } => {
            serde_json::to_value(orchestrator.propose_burn(&holding_id, &owner).await?)?
        }
        Command::AcceptBurn { proposal_id } => serde_json::to_value(
            orchestrator
                .accept_burn(&proposal_id, &args.admin_party)
                .await?,
        )?,
        Command::Holdings {
            owner,
            instrument_id,
        } => serde_json::to_value(
            orchestrator
                .query()
                .holdings(&owner, instrument_id.as_deref())
                .await?,
        )?,
        Command::Proposals { party } => {
            serde_json::to_value(orchestrator.query().pending_proposals(&party).await?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
