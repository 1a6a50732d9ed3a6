//! Active-state queries
//!
//! Lists holdings and pending proposals for a party by querying the
//! active-contract set at the party's participant, once per historically
//! deployed schema version. Old contracts stay on-ledger under their
//! original version, so no single version is authoritative: a balance is
//! the sum across all of them unless the caller filters.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::auth::TokenSigner;
use crate::client::{ActiveContract, ActiveContractsRequest, LedgerApi, ParticipantDirectory};
use crate::protocol::{templates, ProposalState};
use crate::types::{MintgateError, Result, SchemaRegistry, TemplateId};

/// One holding projected into the caller's result shape
#[derive(Debug, Clone, Serialize)]
pub struct HoldingView {
    pub contract_id: String,
    pub instrument_id: String,
    pub owner: String,
    pub amount: u64,
    /// Schema version the holding was created under
    pub package_id: String,
}

/// All holdings for a party plus their aggregate sum
#[derive(Debug, Clone, Serialize)]
pub struct HoldingsView {
    pub holdings: Vec<HoldingView>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProposalKind {
    Mint,
    Burn,
}

/// A proposal awaiting its counter-party, surfaced to operators as pending
#[derive(Debug, Clone, Serialize)]
pub struct PendingProposal {
    pub contract_id: String,
    pub kind: ProposalKind,
    pub state: ProposalState,
    pub owner: Option<String>,
    pub instrument_id: Option<String>,
    /// For burn proposals, the holding to be archived on acceptance
    pub holding_id: Option<String>,
    pub amount: Option<u64>,
    pub package_id: String,
}

/// Queries the active-contract set across every known schema version
pub struct ActiveStateQuery {
    signer: TokenSigner,
    directory: ParticipantDirectory,
    registry: SchemaRegistry,
    ledger: Arc<dyn LedgerApi>,
}

impl ActiveStateQuery {
    pub fn new(
        signer: TokenSigner,
        directory: ParticipantDirectory,
        registry: SchemaRegistry,
        ledger: Arc<dyn LedgerApi>,
    ) -> Self {
        Self {
            signer,
            directory,
            registry,
            ledger,
        }
    }

    /// Holdings for a party, optionally filtered to one instrument.
    ///
    /// Zero results is a normal outcome (empty ledger state), not an error.
    pub async fn holdings(
        &self,
        owner: &str,
        instrument_filter: Option<&str>,
    ) -> Result<HoldingsView> {
        let contracts = self
            .query_templates(owner, templates::holding)
            .await?;

        let mut holdings = Vec::new();
        for contract in contracts {
            let view = project_holding(&contract)?;
            if let Some(wanted) = instrument_filter {
                if view.instrument_id != wanted {
                    continue;
                }
            }
            holdings.push(view);
        }

        let total = holdings
            .iter()
            .try_fold(0u64, |acc, h| acc.checked_add(h.amount))
            .ok_or_else(|| {
                MintgateError::InvalidResponse(format!(
                    "Holdings total for {} overflows u64",
                    owner
                ))
            })?;
        Ok(HoldingsView { holdings, total })
    }

    /// Mint and burn proposals visible to a party, all versions. Proposals
    /// have no enforced expiry; anything unaccepted stays pending.
    pub async fn pending_proposals(&self, party: &str) -> Result<Vec<PendingProposal>> {
        let mut proposals = Vec::new();
        for kind in [ProposalKind::Mint, ProposalKind::Burn] {
            let template = match kind {
                ProposalKind::Mint => templates::mint_proposal,
                ProposalKind::Burn => templates::burn_proposal,
            };
            for contract in self.query_templates(party, template).await? {
                proposals.push(project_proposal(&contract, kind));
            }
        }
        Ok(proposals)
    }

    /// Find one burn proposal by contract id among those visible to a party
    pub async fn burn_proposal(
        &self,
        party: &str,
        proposal_id: &str,
    ) -> Result<Option<PendingProposal>> {
        let contracts = self
            .query_templates(party, templates::burn_proposal)
            .await?;
        Ok(contracts
            .iter()
            .find(|c| c.contract_id == proposal_id)
            .map(|c| project_proposal(c, ProposalKind::Burn)))
    }

    /// One query per read package, merged
    async fn query_templates(
        &self,
        party: &str,
        template: fn(&str) -> TemplateId,
    ) -> Result<Vec<ActiveContract>> {
        let participant = self.directory.participant_for(party)?;
        let token = self.signer.sign(&[], &[party.to_string()])?;

        let mut merged = Vec::new();
        for package_id in self.registry.read_packages() {
            let request = ActiveContractsRequest::by_party(party, vec![template(package_id)]);
            let contracts = self
                .ledger
                .active_contracts(participant, &token, &request)
                .await?;
            merged.extend(contracts);
        }
        Ok(merged)
    }
}

// A holding that cannot be projected is an error, never a skipped entry in
// the balance.
fn project_holding(contract: &ActiveContract) -> Result<HoldingView> {
    let payload = &contract.payload;
    let missing = |field: &str| {
        MintgateError::InvalidResponse(format!(
            "Holding {} is missing field {}",
            contract.contract_id, field
        ))
    };
    let amount_raw = payload.get("amount").ok_or_else(|| missing("amount"))?;
    Ok(HoldingView {
        contract_id: contract.contract_id.clone(),
        instrument_id: field_str(payload, "instrumentId").ok_or_else(|| missing("instrumentId"))?,
        owner: field_str(payload, "owner").ok_or_else(|| missing("owner"))?,
        amount: parse_amount(amount_raw).ok_or_else(|| {
            MintgateError::InvalidResponse(format!(
                "Holding {} has unparseable amount {}",
                contract.contract_id, amount_raw
            ))
        })?,
        package_id: package_of(&contract.template_id),
    })
}

fn project_proposal(contract: &ActiveContract, kind: ProposalKind) -> PendingProposal {
    let payload = &contract.payload;
    PendingProposal {
        contract_id: contract.contract_id.clone(),
        kind,
        state: ProposalState::Pending,
        owner: field_str(payload, "owner"),
        instrument_id: field_str(payload, "instrumentId"),
        holding_id: field_str(payload, "holdingId"),
        amount: payload.get("amount").and_then(parse_amount),
        package_id: package_of(&contract.template_id),
    }
}

fn field_str(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn package_of(template_id: &str) -> String {
    template_id
        .parse::<TemplateId>()
        .map(|t| t.package_id)
        .unwrap_or_default()
}

/// Amounts arrive as decimal strings per the ledger convention, but older
/// schema versions emitted plain numbers. Accept both. Decimal strings may
/// carry a fractional part as long as it is all zeros; amounts are whole
/// units, so a nonzero fraction is unparseable.
pub fn parse_amount(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => match s.split_once('.') {
            None => s.parse().ok(),
            Some((whole, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => {
                whole.parse().ok()
            }
            Some(_) => None,
        },
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}
