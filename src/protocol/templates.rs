//! Template ids and payload builders for the Token module
//!
//! Entities:
//! - `Instrument`: the asset definition, created directly by the admin
//! - `MintProposal`: admin's half of an issue, accepted by the owner
//! - `Holding`: an owner's position; `Transfer` archives it and creates the
//!   recipient holding plus change, `ProposeBurn` (non-consuming) creates a
//!   `BurnProposal`
//! - `BurnProposal`: owner's half of a burn, accepted by the admin

use serde_json::{json, Map, Value};

use crate::types::TemplateId;

pub const MODULE: &str = "Token";

pub const CHOICE_ACCEPT: &str = "Accept";
pub const CHOICE_TRANSFER: &str = "Transfer";
pub const CHOICE_PROPOSE_BURN: &str = "ProposeBurn";
pub const CHOICE_ACCEPT_BURN: &str = "AcceptBurn";

pub fn instrument(package_id: &str) -> TemplateId {
    TemplateId::new(package_id, MODULE, "Instrument")
}

pub fn mint_proposal(package_id: &str) -> TemplateId {
    TemplateId::new(package_id, MODULE, "MintProposal")
}

pub fn holding(package_id: &str) -> TemplateId {
    TemplateId::new(package_id, MODULE, "Holding")
}

pub fn burn_proposal(package_id: &str) -> TemplateId {
    TemplateId::new(package_id, MODULE, "BurnProposal")
}

/// Amounts travel as decimal strings, the ledger's numeric convention
pub fn amount_value(amount: u64) -> Value {
    json!(amount.to_string())
}

pub fn instrument_args(admin: &str, name: &str, symbol: &str, decimals: u32) -> Map<String, Value> {
    object(&[
        ("admin", json!(admin)),
        ("name", json!(name)),
        ("symbol", json!(symbol)),
        ("decimals", json!(decimals)),
    ])
}

pub fn mint_proposal_args(
    admin: &str,
    owner: &str,
    instrument_id: &str,
    amount: u64,
) -> Map<String, Value> {
    object(&[
        ("admin", json!(admin)),
        ("owner", json!(owner)),
        ("instrumentId", json!(instrument_id)),
        ("amount", amount_value(amount)),
    ])
}

pub fn transfer_args(recipient: &str, amount: u64) -> Map<String, Value> {
    object(&[
        ("recipient", json!(recipient)),
        ("amount", amount_value(amount)),
    ])
}

fn object(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
