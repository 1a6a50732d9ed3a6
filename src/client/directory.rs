//! Participant routing
//!
//! Parties are partitioned across participant nodes, and every command must
//! go to the participant hosting the acting party. The ledger gives no
//! server-side hint of "wrong endpoint" - submitting via the wrong
//! participant fails remotely as an authorization error - so the directory
//! is the only routing authority this side of the wire.

use std::collections::HashMap;

use crate::types::{MintgateError, Result};

/// A named remote participant endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub base_url: String,
}

/// Read-only party-to-participant routing table, built once at startup
#[derive(Debug, Clone, Default)]
pub struct ParticipantDirectory {
    participants: HashMap<String, Participant>,
    hosting: HashMap<String, String>,
}

impl ParticipantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant endpoint
    pub fn add_participant(&mut self, name: impl Into<String>, base_url: impl Into<String>) {
        let name = name.into();
        let base_url = base_url.into();
        self.participants.insert(
            name.clone(),
            Participant {
                name,
                base_url: base_url.trim_end_matches('/').to_string(),
            },
        );
    }

    /// Record which participant hosts a party
    pub fn host_party(&mut self, party: impl Into<String>, participant: impl Into<String>) -> Result<()> {
        let party = party.into();
        let participant = participant.into();
        if !self.participants.contains_key(&participant) {
            return Err(MintgateError::Config(format!(
                "Unknown participant '{}' for party {}",
                participant, party
            )));
        }
        self.hosting.insert(party, participant);
        Ok(())
    }

    /// The participant hosting a party. Unknown parties are a configuration
    /// error, not a remote call.
    pub fn participant_for(&self, party: &str) -> Result<&Participant> {
        let name = self.hosting.get(party).ok_or_else(|| {
            MintgateError::Config(format!("No participant configured for party {}", party))
        })?;
        self.participants.get(name).ok_or_else(|| {
            MintgateError::Config(format!("Participant '{}' has no endpoint", name))
        })
    }

    /// Look up a participant by name
    pub fn participant(&self, name: &str) -> Result<&Participant> {
        self.participants.get(name).ok_or_else(|| {
            MintgateError::Config(format!("Unknown participant '{}'", name))
        })
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}
