//! CLI command handlers
//!
//! Thin orchestration over the signing session: every command is one
//! restartable step of the coordination workflow.

use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::crypto::{Address, KeyPair};
use crate::multisig::SignatureContribution;
use crate::node::NodeClient;
use crate::relay::{PendingTx, RelayClient};
use crate::workflow::SigningSession;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application context: configuration plus the local signer's key
pub struct AppContext {
    pub config: Config,
    pub keypair: KeyPair,
}

impl AppContext {
    /// Load configuration and the signer's key
    pub fn load(config_path: &Path, key_file: Option<&Path>) -> CliResult<Self> {
        let config = Config::load_or_default(config_path)?;

        let key_path = key_file
            .map(PathBuf::from)
            .or_else(|| config.key_file.clone())
            .ok_or("no key file configured; pass --key-file or set keyFile in the config")?;

        let hex_key = std::fs::read_to_string(&key_path)?;
        let keypair = KeyPair::from_private_key_hex(hex_key.trim())?;

        Ok(Self { config, keypair })
    }

    /// Build a signing session from this context
    pub fn session(&self) -> CliResult<SigningSession<NodeClient>> {
        let relay =
            RelayClient::with_timeout(&self.config.relay_url, self.config.request_timeout_secs)?;
        let node =
            NodeClient::with_timeout(&self.config.node_url, self.config.request_timeout_secs)?;

        Ok(
            SigningSession::new(relay, node, self.keypair.clone())
                .with_max_depth(self.config.max_resolution_depth),
        )
    }
}

/// Generate a new key pair and write the private key to a file
pub fn cmd_keygen(out: &Path) -> CliResult<()> {
    let keypair = KeyPair::generate();
    std::fs::write(out, keypair.private_key_hex())?;

    println!("✅ Key pair generated");
    println!("   📁 Private key file: {:?}", out);
    println!("   🔑 Public key: {}", keypair.public_key_hex());
    println!("   🏠 Address: {}", keypair.address());
    Ok(())
}

/// Register a pending transaction at the relay as the first signer
pub async fn cmd_create(
    ctx: &AppContext,
    alias: &str,
    unsigned_tx_hex: &str,
    output_owners_hex: &str,
    metadata_hex: Option<&str>,
    expires_in_days: Option<i64>,
) -> CliResult<()> {
    let alias: Address = alias.parse()?;
    let unsigned_tx = hex::decode(unsigned_tx_hex)?;
    let output_owners = hex::decode(output_owners_hex)?;
    let metadata = metadata_hex.map(hex::decode).transpose()?;

    let days = expires_in_days.unwrap_or(ctx.config.tx_expiration_days);
    let expiration = Utc::now() + Duration::days(days);

    let session = ctx.session()?;
    let pending = session
        .create(
            &alias,
            &unsigned_tx,
            &output_owners,
            metadata.as_deref(),
            Some(expiration),
        )
        .await?;

    println!("✅ Pending transaction registered");
    print_pending(&pending);
    Ok(())
}

/// List pending transactions for an alias
pub async fn cmd_list(ctx: &AppContext, alias: &str) -> CliResult<()> {
    let alias: Address = alias.parse()?;
    let session = ctx.session()?;
    let pending = session.list_pending(&alias).await?;

    if pending.is_empty() {
        println!("No pending transactions for {}", alias);
        return Ok(());
    }

    println!("📋 {} pending transaction(s) for {}", pending.len(), alias);
    for tx in &pending {
        print_pending(tx);
    }
    Ok(())
}

/// Contribute this signer's signature to a pending transaction
pub async fn cmd_sign(ctx: &AppContext, alias: &str, id: Option<&str>) -> CliResult<()> {
    let alias: Address = alias.parse()?;
    let session = ctx.session()?;

    let pending = select_pending(&session, &alias, id).await?;
    let updated = session.add_signature(&pending).await?;

    println!("✅ Signature added");
    print_pending(&updated);
    Ok(())
}

/// Show the workflow state of pending transactions for an alias
pub async fn cmd_status(ctx: &AppContext, alias: &str) -> CliResult<()> {
    let alias: Address = alias.parse()?;
    let session = ctx.session()?;

    let pending = session.list_pending(&alias).await?;
    if pending.is_empty() {
        println!("No pending transactions for {}", alias);
        return Ok(());
    }

    for tx in &pending {
        let state = session.status(tx).await?;
        println!(
            "{}  {}  {}/{} signed",
            tx.id,
            state,
            tx.signed_count(),
            tx.owners.len()
        );
    }
    Ok(())
}

/// Assemble the signed transaction and optionally issue it
pub async fn cmd_finalize(
    ctx: &AppContext,
    alias: &str,
    id: Option<&str>,
    metadata_signer: Option<&str>,
    issue: bool,
) -> CliResult<()> {
    let alias: Address = alias.parse()?;
    let session = ctx.session()?;

    let pending = select_pending(&session, &alias, id).await?;

    // A signature carried in the metadata blob can be fed into the store as
    // an extra contribution once its signer is named
    let mut extra: Vec<SignatureContribution> = Vec::new();
    if let Some(signer) = metadata_signer {
        let address: Address = signer.parse()?;
        extra.push(SigningSession::<NodeClient>::metadata_contribution(
            &pending, address,
        )?);
    }

    let signed_tx = session.finalize(&pending, &extra).await?;
    println!("✅ Signed transaction assembled ({} bytes)", signed_tx.len());

    if issue {
        let tx_id = session.issue(&signed_tx).await?;
        println!("🚀 Issued! Ledger transaction id: {}", tx_id);
    } else {
        println!("{}", hex::encode(&signed_tx));
    }
    Ok(())
}

/// Cancel a pending transaction
pub async fn cmd_cancel(ctx: &AppContext, id: &str) -> CliResult<()> {
    let session = ctx.session()?;
    session.cancel(id).await?;
    println!("✅ Pending transaction {} cancelled", id);
    Ok(())
}

async fn select_pending(
    session: &SigningSession<NodeClient>,
    alias: &Address,
    id: Option<&str>,
) -> CliResult<PendingTx> {
    let pending = session.list_pending(alias).await?;
    let selected = match id {
        Some(id) => pending.into_iter().find(|tx| tx.id == id),
        None => pending.into_iter().next(),
    };
    selected.ok_or_else(|| format!("no matching pending transaction for {}", alias).into())
}

fn print_pending(tx: &PendingTx) {
    println!("   🆔 {}", tx.id);
    println!(
        "      alias {}  threshold {}  {}/{} signed",
        tx.alias,
        tx.threshold,
        tx.signed_count(),
        tx.owners.len()
    );
    if let Some(expiration) = tx.expiration {
        println!("      expires {}", expiration);
    }
    if tx.is_issued() {
        println!("      issued as {}", tx.transaction_id);
    }
}
