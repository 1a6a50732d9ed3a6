//! Contract resolution from command outcomes
//!
//! The outcome document shape varies by API generation and by how many
//! creation events the transaction produced (a transfer with change creates
//! two holdings). Extraction is an ordered strategy list, stop at first
//! success, each success logged with the winning strategy:
//!
//! 1. Structured creation event list, matched by template and, when several
//!    events share the template, by caller-supplied expected payload fields.
//!    Positional choice is never used. A list that yields no unique match
//!    falls through to the next strategy.
//! 2. Flat top-level `contractId` field.
//! 3. Fail closed: an update id is a transaction reference, not a contract
//!    identifier, and must never stand in for one.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{MintgateError, Result, TemplateId};

/// The contract a command outcome produced, as the caller cares about it
#[derive(Debug, Clone)]
pub struct ResolvedContract {
    pub contract_id: String,
    pub template_id: String,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EventsOutcome {
    events: Vec<OutcomeEvent>,
}

#[derive(Debug, Deserialize)]
struct OutcomeEvent {
    #[serde(default)]
    created: Option<CreatedEvent>,
    // Archival events are present in outcomes but carry nothing to resolve
    #[serde(default)]
    #[allow(dead_code)]
    archived: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    #[serde(rename = "contractId")]
    contract_id: String,
    #[serde(rename = "templateId")]
    template_id: String,
    #[serde(default)]
    payload: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FlatOutcome {
    #[serde(rename = "contractId")]
    contract_id: String,
}

/// Extract the ledger-assigned update id (a transaction reference) from an
/// outcome, for receipts. Never a substitute for a contract id.
pub fn update_id(outcome: &Value) -> Option<String> {
    outcome
        .get("updateId")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Resolve the identifier of the contract created by a just-submitted
/// command.
///
/// `expected_fields` disambiguates when the transaction created more than
/// one contract of the expected template: every listed payload field must
/// match exactly one creation event.
pub fn resolve_created(
    outcome: &Value,
    expected: &TemplateId,
    expected_fields: &Map<String, Value>,
) -> Result<ResolvedContract> {
    // Strategy 1: structured creation event list. A no-match or ambiguous
    // list falls through to the flat shape; only the final step fails.
    let mut miss = None;
    if let Ok(events) = serde_json::from_value::<EventsOutcome>(outcome.clone()) {
        match resolve_from_events(events, expected, expected_fields) {
            Ok(resolved) => return Ok(resolved),
            Err(reason) => miss = Some(reason),
        }
    }

    // Strategy 2: flat top-level contract id
    if let Ok(flat) = serde_json::from_value::<FlatOutcome>(outcome.clone()) {
        debug!(
            strategy = "flat-contract-id",
            contract_id = %flat.contract_id,
            "Resolved created contract"
        );
        return Ok(ResolvedContract {
            contract_id: flat.contract_id,
            template_id: expected.to_string(),
            payload: Map::new(),
        });
    }

    // Strategy 3: fail closed
    Err(MintgateError::Unresolved(miss.unwrap_or_else(|| {
        format!(
            "Outcome has no creation events and no contract id for {} (an update id is not a contract id)",
            expected
        )
    })))
}

fn resolve_from_events(
    events: EventsOutcome,
    expected: &TemplateId,
    expected_fields: &Map<String, Value>,
) -> std::result::Result<ResolvedContract, String> {
    let mut matches: Vec<CreatedEvent> = events
        .events
        .into_iter()
        .filter_map(|e| e.created)
        .filter(|c| expected.same_entity(&c.template_id))
        .collect();

    if matches.len() > 1 {
        matches.retain(|c| {
            expected_fields
                .iter()
                .all(|(key, want)| c.payload.get(key) == Some(want))
        });
    }

    match matches.len() {
        1 => {
            let created = matches.remove(0);
            debug!(
                strategy = "created-events",
                contract_id = %created.contract_id,
                template_id = %created.template_id,
                "Resolved created contract"
            );
            Ok(ResolvedContract {
                contract_id: created.contract_id,
                template_id: created.template_id,
                payload: created.payload,
            })
        }
        0 => Err(format!("No creation event matched template {}", expected)),
        n => Err(format!(
            "{} creation events matched template {} and expected fields did not single one out",
            n, expected
        )),
    }
}
