//! Proposal protocol and public operations
//!
//! Two parties hosted on different participants cannot jointly authorize a
//! single atomic transaction, so issue and burn run as a two-phase
//! propose/accept protocol: the initiating party creates a Proposal contract
//! it signs alone and the counter-party observes, then the counter-party
//! exercises the accept choice from its own participant. The protocol is
//! always used for mint and burn, even when both parties happen to share a
//! participant. Transfers need only the sender's signature and stay
//! single-step.
//!
//! States: Initiated -> ProposalPending -> Accepted. There is no enforced
//! expiry: an unaccepted proposal stays queryable and is surfaced to
//! operators as pending, never auto-cancelled.

pub mod templates;

use serde::Serialize;
use serde_json::Map;
use std::sync::Arc;
use tracing::info;

use crate::auth::TokenSigner;
use crate::client::{LedgerApi, ParticipantDirectory};
use crate::command::CommandBuilder;
use crate::query::ActiveStateQuery;
use crate::resolver::{resolve_created, update_id};
use crate::types::{MintgateError, Result, SchemaRegistry};

/// Lifecycle of a two-phase operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProposalState {
    Initiated,
    Pending,
    Accepted,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentReceipt {
    pub instrument_id: String,
    pub update_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MintReceipt {
    pub proposal_id: String,
    pub instrument_id: String,
    pub owner: String,
    pub amount: u64,
    pub state: ProposalState,
    pub update_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptReceipt {
    pub holding_id: String,
    pub state: ProposalState,
    pub update_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub recipient_holding_id: String,
    /// Present when the transfer split the holding and change came back
    pub change_holding_id: Option<String>,
    pub amount: u64,
    pub update_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BurnProposalReceipt {
    pub proposal_id: String,
    pub holding_id: String,
    pub state: ProposalState,
    pub update_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BurnReceipt {
    /// The archived proposal; accepting a burn creates nothing
    pub proposal_id: String,
    pub state: ProposalState,
    pub update_id: Option<String>,
}

/// The ledger command orchestrator: builds, signs, routes and submits every
/// public operation, and resolves the contracts they create.
///
/// Stateless between calls; all registries are read-only after construction.
pub struct TokenOrchestrator {
    admin: String,
    builder: CommandBuilder,
    signer: TokenSigner,
    directory: ParticipantDirectory,
    registry: SchemaRegistry,
    ledger: Arc<dyn LedgerApi>,
    query: ActiveStateQuery,
}

impl TokenOrchestrator {
    pub fn new(
        admin: impl Into<String>,
        application_id: impl Into<String>,
        signer: TokenSigner,
        directory: ParticipantDirectory,
        registry: SchemaRegistry,
        ledger: Arc<dyn LedgerApi>,
    ) -> Self {
        let query = ActiveStateQuery::new(
            signer.clone(),
            directory.clone(),
            registry.clone(),
            Arc::clone(&ledger),
        );
        Self {
            admin: admin.into(),
            builder: CommandBuilder::new(application_id),
            signer,
            directory,
            registry,
            ledger,
            query,
        }
    }

    /// The active-state query surface, typically consulted after each
    /// mutating operation to refresh observable balances.
    pub fn query(&self) -> &ActiveStateQuery {
        &self.query
    }

    /// Create a new instrument definition as the admin
    pub async fn create_instrument(
        &self,
        name: &str,
        symbol: &str,
        decimals: u32,
    ) -> Result<InstrumentReceipt> {
        let template = templates::instrument(self.registry.write_package());
        let request = self.builder.create(
            std::slice::from_ref(&self.admin),
            &[],
            template.clone(),
            templates::instrument_args(&self.admin, name, symbol, decimals),
        );

        let outcome = self.submit(&self.admin, &[], &request).await?;
        let resolved = resolve_created(&outcome, &template, &Map::new())?;

        info!(instrument_id = %resolved.contract_id, symbol, "Instrument created");
        Ok(InstrumentReceipt {
            instrument_id: resolved.contract_id,
            update_id: update_id(&outcome),
        })
    }

    /// First half of an issue: the admin proposes a mint to the owner.
    /// The proposal is signed by the admin alone and observed by the owner;
    /// nothing is held until the owner accepts.
    pub async fn mint(
        &self,
        instrument_id: &str,
        owner: &str,
        amount: u64,
    ) -> Result<MintReceipt> {
        let template = templates::mint_proposal(self.registry.write_package());
        let request = self.builder.create(
            std::slice::from_ref(&self.admin),
            &[],
            template.clone(),
            templates::mint_proposal_args(&self.admin, owner, instrument_id, amount),
        );

        let outcome = self.submit(&self.admin, &[], &request).await?;
        let resolved = resolve_created(&outcome, &template, &Map::new())?;

        info!(
            proposal_id = %resolved.contract_id,
            owner,
            amount,
            "Mint proposed, awaiting owner acceptance"
        );
        Ok(MintReceipt {
            proposal_id: resolved.contract_id,
            instrument_id: instrument_id.to_string(),
            owner: owner.to_string(),
            amount,
            state: ProposalState::Pending,
            update_id: update_id(&outcome),
        })
    }

    /// Second half of an issue: the owner accepts the mint proposal from its
    /// own participant. The token reads as the admin so the proposal, which
    /// is not yet the owner's own contract, is visible to the submission.
    pub async fn accept_proposal(&self, proposal_id: &str, owner: &str) -> Result<AcceptReceipt> {
        let proposal_template = templates::mint_proposal(self.registry.write_package());
        let holding_template = templates::holding(self.registry.write_package());
        let request = self.builder.exercise(
            &[owner.to_string()],
            std::slice::from_ref(&self.admin),
            proposal_template,
            proposal_id,
            templates::CHOICE_ACCEPT,
            Map::new(),
        );

        let outcome = self
            .submit(owner, std::slice::from_ref(&self.admin), &request)
            .await?;

        let mut expected = Map::new();
        expected.insert("owner".into(), serde_json::json!(owner));
        let resolved = resolve_created(&outcome, &holding_template, &expected)?;

        info!(holding_id = %resolved.contract_id, owner, "Mint proposal accepted");
        Ok(AcceptReceipt {
            holding_id: resolved.contract_id,
            state: ProposalState::Accepted,
            update_id: update_id(&outcome),
        })
    }

    /// Transfer from a holding. Archives the holding and creates a recipient
    /// holding plus, when amount is less than the holding's, change back to
    /// the sender. The recipient holding is resolved by its owner payload,
    /// never positionally.
    pub async fn transfer(
        &self,
        holding_id: &str,
        owner: &str,
        recipient: &str,
        amount: u64,
    ) -> Result<TransferReceipt> {
        let template = templates::holding(self.registry.write_package());
        let request = self.builder.exercise(
            &[owner.to_string()],
            &[],
            template.clone(),
            holding_id,
            templates::CHOICE_TRANSFER,
            templates::transfer_args(recipient, amount),
        );

        let outcome = self.submit(owner, &[], &request).await?;

        let mut expect_recipient = Map::new();
        expect_recipient.insert("owner".into(), serde_json::json!(recipient));
        let recipient_holding = resolve_created(&outcome, &template, &expect_recipient)?;

        let mut expect_sender = Map::new();
        expect_sender.insert("owner".into(), serde_json::json!(owner));
        let change_holding_id = match resolve_created(&outcome, &template, &expect_sender) {
            Ok(change) if change.contract_id != recipient_holding.contract_id => {
                Some(change.contract_id)
            }
            _ => None,
        };

        info!(
            recipient_holding_id = %recipient_holding.contract_id,
            change = change_holding_id.is_some(),
            "Transfer complete"
        );
        Ok(TransferReceipt {
            recipient_holding_id: recipient_holding.contract_id,
            change_holding_id,
            amount,
            update_id: update_id(&outcome),
        })
    }

    /// First half of a burn: the owner proposes destruction of a holding.
    /// Non-consuming on the holding; the position stays active until the
    /// admin accepts.
    pub async fn propose_burn(
        &self,
        holding_id: &str,
        owner: &str,
    ) -> Result<BurnProposalReceipt> {
        let holding_template = templates::holding(self.registry.write_package());
        let proposal_template = templates::burn_proposal(self.registry.write_package());
        let request = self.builder.exercise(
            &[owner.to_string()],
            &[],
            holding_template,
            holding_id,
            templates::CHOICE_PROPOSE_BURN,
            Map::new(),
        );

        let outcome = self.submit(owner, &[], &request).await?;
        let resolved = resolve_created(&outcome, &proposal_template, &Map::new())?;

        info!(
            proposal_id = %resolved.contract_id,
            holding_id,
            "Burn proposed, awaiting admin acceptance"
        );
        Ok(BurnProposalReceipt {
            proposal_id: resolved.contract_id,
            holding_id: holding_id.to_string(),
            state: ProposalState::Pending,
            update_id: update_id(&outcome),
        })
    }

    /// Second half of a burn: the admin accepts, archiving both the proposal
    /// and the holding it references. Creates nothing, so no contract
    /// resolution happens; the receipt carries the transaction reference.
    pub async fn accept_burn(&self, proposal_id: &str, admin: &str) -> Result<BurnReceipt> {
        // The proposal payload names the owner the token must read as
        let proposal = self
            .query
            .burn_proposal(admin, proposal_id)
            .await?
            .ok_or_else(|| {
                MintgateError::NotFound(format!(
                    "Burn proposal {} is not visible to {}",
                    proposal_id, admin
                ))
            })?;
        let owner = proposal.owner.ok_or_else(|| {
            MintgateError::NotFound(format!(
                "Burn proposal {} payload names no owner",
                proposal_id
            ))
        })?;

        let template = templates::burn_proposal(self.registry.write_package());
        let request = self.builder.exercise(
            &[admin.to_string()],
            std::slice::from_ref(&owner),
            template,
            proposal_id,
            templates::CHOICE_ACCEPT_BURN,
            Map::new(),
        );

        let outcome = self
            .submit(admin, std::slice::from_ref(&owner), &request)
            .await?;

        info!(proposal_id, "Burn accepted, holding archived");
        Ok(BurnReceipt {
            proposal_id: proposal_id.to_string(),
            state: ProposalState::Accepted,
            update_id: update_id(&outcome),
        })
    }

    /// Sign and submit via the participant hosting the acting party
    async fn submit(
        &self,
        acting: &str,
        read_as: &[String],
        request: &crate::command::SubmitRequest,
    ) -> Result<serde_json::Value> {
        let participant = self.directory.participant_for(acting)?;
        let token = self.signer.sign(&[acting.to_string()], read_as)?;
        self.ledger
            .submit_and_wait(participant, &token, request)
            .await
    }
}
