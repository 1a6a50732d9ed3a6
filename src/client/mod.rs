//! Ledger transport
//!
//! Provides:
//! - `ParticipantDirectory`: party to participant routing
//! - `LedgerApi`: the transport seam the orchestrator and query layer call
//! - `HttpLedgerClient`: the reqwest implementation

pub mod directory;
pub mod http;

pub use directory::{Participant, ParticipantDirectory};
pub use http::HttpLedgerClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::command::SubmitRequest;
use crate::types::{Result, TemplateId};

/// Body for the active-contracts query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveContractsRequest {
    pub filter: ContractFilter,
    pub verbose: bool,
    #[serde(rename = "asOfOffset")]
    pub as_of_offset: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractFilter {
    #[serde(rename = "byParty")]
    pub by_party: HashMap<String, TemplateFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFilter {
    pub templates: Vec<TemplateId>,
}

impl ActiveContractsRequest {
    /// Current active contracts visible to one party, filtered to templates
    pub fn by_party(party: &str, templates: Vec<TemplateId>) -> Self {
        let mut by_party = HashMap::new();
        by_party.insert(party.to_string(), TemplateFilter { templates });
        Self {
            filter: ContractFilter { by_party },
            verbose: false,
            as_of_offset: None,
        }
    }
}

/// One active contract as returned by the query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveContract {
    #[serde(rename = "contractId")]
    pub contract_id: String,
    #[serde(rename = "templateId")]
    pub template_id: String,
    pub payload: Map<String, Value>,
}

/// The ledger command/query surface.
///
/// One awaited round trip per call, bounded by a client-side timeout. No
/// automatic retries: a resubmitted command needs a fresh idempotency key,
/// which is a caller decision.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Submit a command and wait synchronously for its outcome document
    async fn submit_and_wait(
        &self,
        participant: &Participant,
        token: &str,
        request: &SubmitRequest,
    ) -> Result<Value>;

    /// Query the active-contract set at one participant
    async fn active_contracts(
        &self,
        participant: &Participant,
        token: &str,
        request: &ActiveContractsRequest,
    ) -> Result<Vec<ActiveContract>>;
}
