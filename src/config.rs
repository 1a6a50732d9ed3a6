//! Configuration for Mintgate
//!
//! CLI arguments and environment variable handling using clap.
//! Everything here is parsed once at startup and converted into the
//! read-only structs the orchestrator is constructed with; there is no
//! ambient global state.

use clap::Parser;

use crate::auth::TokenSigner;
use crate::client::ParticipantDirectory;
use crate::types::{MintgateError, Result, SchemaRegistry};

/// Mintgate - Ledger command orchestrator for the Elohim asset-token lifecycle
///
/// "Well done, good and faithful servant" - Matthew 25:21
#[derive(Parser, Debug, Clone)]
#[command(name = "mintgate")]
#[command(about = "Ledger command orchestrator for the asset-token lifecycle")]
pub struct Args {
    /// Participant endpoints as name=url pairs
    /// e.g. "alpha=http://alpha:7575,beta=http://beta:7575"
    #[arg(long, env = "PARTICIPANTS", value_delimiter = ',')]
    pub participants: Vec<String>,

    /// Party hosting as party=participant pairs
    /// e.g. "Admin::1220abc=alpha,Owner::1220fed=beta"
    #[arg(long, env = "PARTY_HOSTS", value_delimiter = ',')]
    pub party_hosts: Vec<String>,

    /// The admin (issuer) party operations act as by default
    #[arg(long, env = "ADMIN_PARTY")]
    pub admin_party: String,

    /// Application id stamped on every command
    #[arg(long, env = "APPLICATION_ID", default_value = "mintgate")]
    pub application_id: String,

    /// Shared secret for ledger token signing (required)
    #[arg(long, env = "LEDGER_SECRET")]
    pub ledger_secret: Option<String>,

    /// Token expiry in seconds
    #[arg(long, env = "TOKEN_EXPIRY_SECONDS", default_value = "3600")]
    pub token_expiry_seconds: u64,

    /// Schema version (package id) new commands are built against
    #[arg(long, env = "WRITE_PACKAGE")]
    pub write_package: String,

    /// Every schema version ever deployed, for reads
    /// The write package is always included
    #[arg(long, env = "READ_PACKAGES", value_delimiter = ',')]
    pub read_packages: Vec<String>,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.participants.is_empty() {
            return Err(MintgateError::Config(
                "At least one participant endpoint is required".into(),
            ));
        }
        if self.party_hosts.is_empty() {
            return Err(MintgateError::Config(
                "At least one party=participant mapping is required".into(),
            ));
        }
        if self.write_package.is_empty() {
            return Err(MintgateError::Config(
                "WRITE_PACKAGE is required".into(),
            ));
        }
        // Parsing the pairs is the real validation
        self.directory()?;
        self.signer()?;
        Ok(())
    }

    /// Build the participant routing table from the name=url and
    /// party=participant pairs
    pub fn directory(&self) -> Result<ParticipantDirectory> {
        let mut directory = ParticipantDirectory::new();
        for pair in &self.participants {
            let (name, url) = split_pair(pair, "participant (name=url)")?;
            directory.add_participant(name, url);
        }
        for pair in &self.party_hosts {
            let (party, participant) = split_pair(pair, "party host (party=participant)")?;
            directory.host_party(party, participant)?;
        }
        Ok(directory)
    }

    /// Build the schema version registry
    pub fn registry(&self) -> Result<SchemaRegistry> {
        SchemaRegistry::new(self.write_package.clone(), self.read_packages.clone())
    }

    /// Build the token signer
    pub fn signer(&self) -> Result<TokenSigner> {
        let secret = self
            .ledger_secret
            .clone()
            .ok_or_else(|| MintgateError::Config("LEDGER_SECRET is required".into()))?;
        TokenSigner::new(secret, self.token_expiry_seconds)
    }
}

fn split_pair<'a>(pair: &'a str, what: &str) -> Result<(&'a str, &'a str)> {
    match pair.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() && !v.trim().is_empty() => {
            Ok((k.trim(), v.trim()))
        }
        _ => Err(MintgateError::Config(format!(
            "Invalid {} pair: '{}'",
            what, pair
        ))),
    }
}
