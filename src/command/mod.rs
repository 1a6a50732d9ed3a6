//! Command building for the ledger submit API
//!
//! Assembles create/exercise request bodies. Every build allocates a fresh
//! command id (the ledger's idempotency key): the remote treats a duplicate
//! key as a duplicate submission, not a retry, so a retried attempt must go
//! through the builder again to pick up a new key.
//!
//! Argument maps are not schema-validated locally; invalid arguments surface
//! only as a remote rejection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::TemplateId;

/// A single create or exercise instruction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerCommand {
    Create {
        #[serde(rename = "templateId")]
        template_id: TemplateId,
        arguments: Map<String, Value>,
    },
    Exercise {
        #[serde(rename = "templateId")]
        template_id: TemplateId,
        #[serde(rename = "contractId")]
        contract_id: String,
        choice: String,
        arguments: Map<String, Value>,
    },
}

/// A complete, not-yet-submitted command body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "applicationId")]
    pub application_id: String,
    /// Idempotency key, unique per logical attempt
    #[serde(rename = "commandId")]
    pub command_id: String,
    #[serde(rename = "actAs")]
    pub act_as: Vec<String>,
    #[serde(rename = "readAs", default, skip_serializing_if = "Vec::is_empty")]
    pub read_as: Vec<String>,
    pub commands: Vec<LedgerCommand>,
}

/// Builds submit bodies for a fixed application id
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    application_id: String,
}

impl CommandBuilder {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
        }
    }

    /// Build a create command for one new contract
    pub fn create(
        &self,
        act_as: &[String],
        read_as: &[String],
        template_id: TemplateId,
        arguments: Map<String, Value>,
    ) -> SubmitRequest {
        self.request(
            act_as,
            read_as,
            vec![LedgerCommand::Create {
                template_id,
                arguments,
            }],
        )
    }

    /// Build an exercise command against an existing contract
    pub fn exercise(
        &self,
        act_as: &[String],
        read_as: &[String],
        template_id: TemplateId,
        contract_id: &str,
        choice: &str,
        arguments: Map<String, Value>,
    ) -> SubmitRequest {
        self.request(
            act_as,
            read_as,
            vec![LedgerCommand::Exercise {
                template_id,
                contract_id: contract_id.to_string(),
                choice: choice.to_string(),
                arguments,
            }],
        )
    }

    fn request(
        &self,
        act_as: &[String],
        read_as: &[String],
        commands: Vec<LedgerCommand>,
    ) -> SubmitRequest {
        SubmitRequest {
            application_id: self.application_id.clone(),
            // Fresh key per logical attempt. Reusing a key would make the
            // ledger treat a retry as a duplicate submission.
            command_id: Uuid::new_v4().to_string(),
            act_as: act_as.to_vec(),
            read_as: read_as.to_vec(),
            commands,
        }
    }
}
