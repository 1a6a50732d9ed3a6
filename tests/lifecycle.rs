//! Token lifecycle integration tests
//!
//! Drives the orchestrator end to end against an in-memory fake ledger that
//! mimics the remote semantics: immutable contracts, archive-on-exercise,
//! stakeholder visibility, participant routing checks, and the multi-event
//! outcomes a transfer with change produces.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use mintgate::auth::TokenSigner;
use mintgate::client::{
    ActiveContract, ActiveContractsRequest, LedgerApi, Participant, ParticipantDirectory,
};
use mintgate::command::{LedgerCommand, SubmitRequest};
use mintgate::protocol::{ProposalState, TokenOrchestrator};
use mintgate::query::{parse_amount, ProposalKind};
use mintgate::types::{MintgateError, Result, SchemaRegistry};

const ADMIN: &str = "Admin::1220aaa";
const OWNER: &str = "Owner::1220bbb";
const RECIPIENT: &str = "Recipient::1220ccc";
const PKG_V1: &str = "pkg-v1";
const PKG_V2: &str = "pkg-v2";

#[derive(Debug, Clone)]
struct FakeContract {
    template_id: String,
    payload: Map<String, Value>,
    stakeholders: Vec<String>,
    active: bool,
}

#[derive(Default)]
struct FakeState {
    contracts: HashMap<String, FakeContract>,
    next_contract: u64,
    next_update: u64,
}

/// In-memory stand-in for the remote ledger. Parties are pinned to their
/// hosting participant; submitting via any other participant is rejected the
/// way the real ledger does it, as an authorization failure.
struct FakeLedger {
    hosting: HashMap<String, String>,
    state: Mutex<FakeState>,
    timeout_next: AtomicBool,
}

impl FakeLedger {
    fn new() -> Self {
        let mut hosting = HashMap::new();
        hosting.insert(ADMIN.to_string(), "alpha".to_string());
        hosting.insert(OWNER.to_string(), "beta".to_string());
        hosting.insert(RECIPIENT.to_string(), "beta".to_string());
        Self {
            hosting,
            state: Mutex::new(FakeState::default()),
            timeout_next: AtomicBool::new(false),
        }
    }

    fn drop_next_response(&self) {
        self.timeout_next.store(true, Ordering::SeqCst);
    }

    /// Seed a contract directly, bypassing the command path. Used to model
    /// contracts created under an older schema version.
    fn seed_contract(
        &self,
        template_id: &str,
        payload: Map<String, Value>,
        stakeholders: &[&str],
    ) -> String {
        let mut state = self.state.lock().unwrap();
        let id = alloc_contract_id(&mut state);
        state.contracts.insert(
            id.clone(),
            FakeContract {
                template_id: template_id.to_string(),
                payload,
                stakeholders: stakeholders.iter().map(|s| s.to_string()).collect(),
                active: true,
            },
        );
        id
    }

    fn contract_active(&self, contract_id: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .contracts
            .get(contract_id)
            .map(|c| c.active)
            .unwrap_or(false)
    }
}

fn alloc_contract_id(state: &mut FakeState) -> String {
    state.next_contract += 1;
    format!("{:06x}:0:0", state.next_contract)
}

fn alloc_update_id(state: &mut FakeState) -> String {
    state.next_update += 1;
    format!("tx-{}", state.next_update)
}

fn entity_of(template_id: &str) -> &str {
    template_id.rsplit(':').next().unwrap_or("")
}

fn created_event(contract_id: &str, contract: &FakeContract) -> Value {
    json!({
        "created": {
            "contractId": contract_id,
            "templateId": contract.template_id,
            "payload": contract.payload,
        }
    })
}

fn archived_event(contract_id: &str, template_id: &str) -> Value {
    json!({
        "archived": { "contractId": contract_id, "templateId": template_id }
    })
}

#[async_trait]
impl LedgerApi for FakeLedger {
    async fn submit_and_wait(
        &self,
        participant: &Participant,
        _token: &str,
        request: &SubmitRequest,
    ) -> Result<Value> {
        if self.timeout_next.swap(false, Ordering::SeqCst) {
            return Err(MintgateError::UnknownOutcome(format!(
                "submit-and-wait to {} timed out (command {})",
                participant.name, request.command_id
            )));
        }

        // Wrong participant for the acting party surfaces exactly like a
        // missing signer: an authorization rejection, not a routing error.
        for party in &request.act_as {
            if self.hosting.get(party) != Some(&participant.name) {
                return Err(MintgateError::Authorization {
                    status: 403,
                    body: format!("PARTY_NOT_HOSTED: {} is not hosted on {}", party, participant.name),
                });
            }
        }

        let command = request.commands.first().ok_or_else(|| {
            MintgateError::Transport {
                status: Some(400),
                body: "empty command list".into(),
            }
        })?;

        let mut state = self.state.lock().unwrap();
        match command {
            LedgerCommand::Create {
                template_id,
                arguments,
            } => {
                let template = template_id.to_string();
                let stakeholders = ["admin", "owner"]
                    .iter()
                    .filter_map(|k| arguments.get(*k).and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                let contract = FakeContract {
                    template_id: template,
                    payload: arguments.clone(),
                    stakeholders,
                    active: true,
                };
                let id = alloc_contract_id(&mut state);
                let event = created_event(&id, &contract);
                state.contracts.insert(id, contract);
                let update = alloc_update_id(&mut state);
                Ok(json!({ "updateId": update, "events": [event] }))
            }
            LedgerCommand::Exercise {
                contract_id,
                choice,
                arguments,
                ..
            } => {
                let target = state
                    .contracts
                    .get(contract_id)
                    .cloned()
                    .filter(|c| c.active)
                    .ok_or_else(|| MintgateError::Transport {
                        status: Some(409),
                        body: format!("CONTRACT_NOT_ACTIVE: {}", contract_id),
                    })?;

                match (entity_of(&target.template_id), choice.as_str()) {
                    ("MintProposal", "Accept") => {
                        state.contracts.get_mut(contract_id).unwrap().active = false;

                        let mut payload = Map::new();
                        for key in ["owner", "admin", "instrumentId", "amount"] {
                            if let Some(v) = target.payload.get(key) {
                                payload.insert(key.to_string(), v.clone());
                            }
                        }
                        let holding = FakeContract {
                            template_id: target.template_id.replace("MintProposal", "Holding"),
                            payload,
                            stakeholders: target.stakeholders.clone(),
                            active: true,
                        };
                        let id = alloc_contract_id(&mut state);
                        let events = vec![
                            archived_event(contract_id, &target.template_id),
                            created_event(&id, &holding),
                        ];
                        state.contracts.insert(id, holding);
                        let update = alloc_update_id(&mut state);
                        Ok(json!({ "updateId": update, "events": events }))
                    }
                    ("Holding", "Transfer") => {
                        let recipient = arguments
                            .get("recipient")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        let amount = arguments.get("amount").and_then(parse_amount).unwrap_or(0);
                        let held = target.payload.get("amount").and_then(parse_amount).unwrap_or(0);
                        if amount > held {
                            return Err(MintgateError::Transport {
                                status: Some(400),
                                body: "INSUFFICIENT_AMOUNT".into(),
                            });
                        }

                        state.contracts.get_mut(contract_id).unwrap().active = false;
                        let mut events =
                            vec![archived_event(contract_id, &target.template_id)];

                        // Change holding first, so a positional resolver
                        // would pick the wrong contract
                        if amount < held {
                            let mut change_payload = target.payload.clone();
                            change_payload.insert(
                                "amount".into(),
                                json!((held - amount).to_string()),
                            );
                            let change = FakeContract {
                                template_id: target.template_id.clone(),
                                payload: change_payload,
                                stakeholders: target.stakeholders.clone(),
                                active: true,
                            };
                            let id = alloc_contract_id(&mut state);
                            events.push(created_event(&id, &change));
                            state.contracts.insert(id, change);
                        }

                        let mut recipient_payload = target.payload.clone();
                        recipient_payload.insert("owner".into(), json!(recipient));
                        recipient_payload.insert("amount".into(), json!(amount.to_string()));
                        let mut stakeholders = vec![recipient.clone()];
                        if let Some(admin) = target.payload.get("admin").and_then(Value::as_str) {
                            stakeholders.push(admin.to_string());
                        }
                        let new_holding = FakeContract {
                            template_id: target.template_id.clone(),
                            payload: recipient_payload,
                            stakeholders,
                            active: true,
                        };
                        let id = alloc_contract_id(&mut state);
                        events.push(created_event(&id, &new_holding));
                        state.contracts.insert(id, new_holding);

                        let update = alloc_update_id(&mut state);
                        Ok(json!({ "updateId": update, "events": events }))
                    }
                    ("Holding", "ProposeBurn") => {
                        // Non-consuming: the holding stays active until the
                        // admin accepts
                        let mut payload = Map::new();
                        for key in ["owner", "admin", "instrumentId", "amount"] {
                            if let Some(v) = target.payload.get(key) {
                                payload.insert(key.to_string(), v.clone());
                            }
                        }
                        payload.insert("holdingId".into(), json!(contract_id));
                        let proposal = FakeContract {
                            template_id: target.template_id.replace("Holding", "BurnProposal"),
                            payload,
                            stakeholders: target.stakeholders.clone(),
                            active: true,
                        };
                        let id = alloc_contract_id(&mut state);
                        let event = created_event(&id, &proposal);
                        state.contracts.insert(id, proposal);
                        let update = alloc_update_id(&mut state);
                        Ok(json!({ "updateId": update, "events": [event] }))
                    }
                    ("BurnProposal", "AcceptBurn") => {
                        state.contracts.get_mut(contract_id).unwrap().active = false;
                        let mut events =
                            vec![archived_event(contract_id, &target.template_id)];

                        if let Some(holding_id) =
                            target.payload.get("holdingId").and_then(Value::as_str)
                        {
                            if let Some(holding) = state.contracts.get_mut(holding_id) {
                                holding.active = false;
                                let template = holding.template_id.clone();
                                events.push(archived_event(holding_id, &template));
                            }
                        }

                        let update = alloc_update_id(&mut state);
                        Ok(json!({ "updateId": update, "events": events }))
                    }
                    (entity, choice) => Err(MintgateError::VersionMismatch(format!(
                        "TEMPLATE_OR_CHOICE_NOT_FOUND: {} on {}",
                        choice, entity
                    ))),
                }
            }
        }
    }

    async fn active_contracts(
        &self,
        _participant: &Participant,
        _token: &str,
        request: &ActiveContractsRequest,
    ) -> Result<Vec<ActiveContract>> {
        let state = self.state.lock().unwrap();
        let mut results = Vec::new();
        for (party, filter) in &request.filter.by_party {
            let wanted: Vec<String> =
                filter.templates.iter().map(|t| t.to_string()).collect();
            for (id, contract) in &state.contracts {
                if contract.active
                    && contract.stakeholders.contains(party)
                    && wanted.contains(&contract.template_id)
                {
                    results.push(ActiveContract {
                        contract_id: id.clone(),
                        template_id: contract.template_id.clone(),
                        payload: contract.payload.clone(),
                    });
                }
            }
        }
        Ok(results)
    }
}

fn directory() -> ParticipantDirectory {
    let mut dir = ParticipantDirectory::new();
    dir.add_participant("alpha", "http://alpha:7575");
    dir.add_participant("beta", "http://beta:7575");
    dir.host_party(ADMIN, "alpha").unwrap();
    dir.host_party(OWNER, "beta").unwrap();
    dir.host_party(RECIPIENT, "beta").unwrap();
    dir
}

fn orchestrator(ledger: Arc<FakeLedger>) -> TokenOrchestrator {
    let signer = TokenSigner::new(
        "test-secret-that-is-at-least-32-characters-long".into(),
        3600,
    )
    .unwrap();
    let registry = SchemaRegistry::new(PKG_V2, vec![PKG_V1.into()]).unwrap();
    TokenOrchestrator::new(ADMIN, "mintgate-tests", signer, directory(), registry, ledger)
}

#[tokio::test]
async fn mint_accept_round_trip() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();

    let mint = orch
        .mint(&instrument.instrument_id, OWNER, 1000)
        .await
        .unwrap();
    assert_eq!(mint.state, ProposalState::Pending);

    // The pending proposal is visible to the owner before acceptance
    let pending = orch.query().pending_proposals(OWNER).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, ProposalKind::Mint);
    assert_eq!(pending[0].contract_id, mint.proposal_id);

    let accepted = orch.accept_proposal(&mint.proposal_id, OWNER).await.unwrap();
    assert_eq!(accepted.state, ProposalState::Accepted);

    // Exactly one terminal contract active, the proposal archived
    assert!(!ledger.contract_active(&mint.proposal_id));
    assert!(ledger.contract_active(&accepted.holding_id));
    assert!(orch.query().pending_proposals(OWNER).await.unwrap().is_empty());

    // Unscaled convention: mint(1000) is a balance of 1000
    let view = orch.query().holdings(OWNER, None).await.unwrap();
    assert_eq!(view.total, 1000);
    assert_eq!(view.holdings.len(), 1);
    assert_eq!(view.holdings[0].contract_id, accepted.holding_id);
}

#[tokio::test]
async fn balance_sums_across_schema_versions() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();

    // A holding created under the previous schema version is still on-ledger
    let mut old_payload = Map::new();
    old_payload.insert("owner".into(), json!(OWNER));
    old_payload.insert("admin".into(), json!(ADMIN));
    old_payload.insert("instrumentId".into(), json!(instrument.instrument_id));
    old_payload.insert("amount".into(), json!("250"));
    ledger.seed_contract(
        &format!("{}:Token:Holding", PKG_V1),
        old_payload,
        &[OWNER, ADMIN],
    );

    let mint = orch
        .mint(&instrument.instrument_id, OWNER, 1000)
        .await
        .unwrap();
    orch.accept_proposal(&mint.proposal_id, OWNER).await.unwrap();

    let view = orch.query().holdings(OWNER, None).await.unwrap();
    assert_eq!(view.holdings.len(), 2);
    assert_eq!(view.total, 1250);

    // Filtering by instrument still spans both versions
    let filtered = orch
        .query()
        .holdings(OWNER, Some(&instrument.instrument_id))
        .await
        .unwrap();
    assert_eq!(filtered.total, 1250);
}

#[tokio::test]
async fn decimal_string_amounts_count_toward_balance() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();

    // Some ledger generations render whole amounts with a zero fraction
    let mut old_payload = Map::new();
    old_payload.insert("owner".into(), json!(OWNER));
    old_payload.insert("admin".into(), json!(ADMIN));
    old_payload.insert("instrumentId".into(), json!(instrument.instrument_id));
    old_payload.insert("amount".into(), json!("250.00"));
    ledger.seed_contract(
        &format!("{}:Token:Holding", PKG_V1),
        old_payload,
        &[OWNER, ADMIN],
    );

    let mint = orch
        .mint(&instrument.instrument_id, OWNER, 1000)
        .await
        .unwrap();
    orch.accept_proposal(&mint.proposal_id, OWNER).await.unwrap();

    let view = orch.query().holdings(OWNER, None).await.unwrap();
    assert_eq!(view.holdings.len(), 2);
    assert_eq!(view.total, 1250);
}

#[tokio::test]
async fn unparseable_amount_is_an_error_not_a_short_balance() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();

    let mut payload = Map::new();
    payload.insert("owner".into(), json!(OWNER));
    payload.insert("admin".into(), json!(ADMIN));
    payload.insert("instrumentId".into(), json!(instrument.instrument_id));
    payload.insert("amount".into(), json!("250.50"));
    ledger.seed_contract(
        &format!("{}:Token:Holding", PKG_V1),
        payload,
        &[OWNER, ADMIN],
    );

    let err = orch.query().holdings(OWNER, None).await.unwrap_err();
    assert!(matches!(err, MintgateError::InvalidResponse(_)));
}

#[tokio::test]
async fn balance_overflow_is_an_error() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();

    for amount in [u64::MAX.to_string(), "1".to_string()] {
        let mut payload = Map::new();
        payload.insert("owner".into(), json!(OWNER));
        payload.insert("admin".into(), json!(ADMIN));
        payload.insert("instrumentId".into(), json!(instrument.instrument_id));
        payload.insert("amount".into(), json!(amount));
        ledger.seed_contract(
            &format!("{}:Token:Holding", PKG_V1),
            payload,
            &[OWNER, ADMIN],
        );
    }

    let err = orch.query().holdings(OWNER, None).await.unwrap_err();
    assert!(matches!(err, MintgateError::InvalidResponse(_)));
}

#[tokio::test]
async fn transfer_resolves_recipient_not_change() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();
    let mint = orch
        .mint(&instrument.instrument_id, OWNER, 1000)
        .await
        .unwrap();
    let accepted = orch.accept_proposal(&mint.proposal_id, OWNER).await.unwrap();

    // The fake emits the change holding before the recipient holding, so a
    // positional pick would return the sender's change
    let transfer = orch
        .transfer(&accepted.holding_id, OWNER, RECIPIENT, 600)
        .await
        .unwrap();

    let recipient_view = orch.query().holdings(RECIPIENT, None).await.unwrap();
    assert_eq!(recipient_view.total, 600);
    assert_eq!(
        recipient_view.holdings[0].contract_id,
        transfer.recipient_holding_id
    );

    let owner_view = orch.query().holdings(OWNER, None).await.unwrap();
    assert_eq!(owner_view.total, 400);
    assert_eq!(
        Some(owner_view.holdings[0].contract_id.clone()),
        transfer.change_holding_id
    );
}

#[tokio::test]
async fn transfer_of_full_amount_has_no_change() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();
    let mint = orch
        .mint(&instrument.instrument_id, OWNER, 500)
        .await
        .unwrap();
    let accepted = orch.accept_proposal(&mint.proposal_id, OWNER).await.unwrap();

    let transfer = orch
        .transfer(&accepted.holding_id, OWNER, RECIPIENT, 500)
        .await
        .unwrap();
    assert!(transfer.change_holding_id.is_none());

    let owner_view = orch.query().holdings(OWNER, None).await.unwrap();
    assert_eq!(owner_view.total, 0);
    assert!(owner_view.holdings.is_empty());
}

#[tokio::test]
async fn burn_round_trip_archives_holding() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();
    let mint = orch
        .mint(&instrument.instrument_id, OWNER, 1000)
        .await
        .unwrap();
    let accepted = orch.accept_proposal(&mint.proposal_id, OWNER).await.unwrap();

    let proposed = orch
        .propose_burn(&accepted.holding_id, OWNER)
        .await
        .unwrap();
    assert_eq!(proposed.state, ProposalState::Pending);

    // ProposeBurn is non-consuming: the position is intact until acceptance
    assert!(ledger.contract_active(&accepted.holding_id));
    let pending = orch.query().pending_proposals(ADMIN).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, ProposalKind::Burn);

    let burned = orch.accept_burn(&proposed.proposal_id, ADMIN).await.unwrap();
    assert_eq!(burned.state, ProposalState::Accepted);
    assert!(burned.update_id.is_some());

    assert!(!ledger.contract_active(&proposed.proposal_id));
    assert!(!ledger.contract_active(&accepted.holding_id));
    assert_eq!(orch.query().holdings(OWNER, None).await.unwrap().total, 0);
}

#[tokio::test]
async fn wrong_participant_is_authorization_not_transport() {
    let ledger = Arc::new(FakeLedger::new());

    // Misroute the owner to the admin's participant
    let mut dir = ParticipantDirectory::new();
    dir.add_participant("alpha", "http://alpha:7575");
    dir.host_party(ADMIN, "alpha").unwrap();
    dir.host_party(OWNER, "alpha").unwrap();

    let signer = TokenSigner::new(
        "test-secret-that-is-at-least-32-characters-long".into(),
        3600,
    )
    .unwrap();
    let registry = SchemaRegistry::new(PKG_V2, vec![PKG_V1.into()]).unwrap();
    let orch = TokenOrchestrator::new(
        ADMIN,
        "mintgate-tests",
        signer,
        dir,
        registry,
        Arc::clone(&ledger) as Arc<dyn LedgerApi>,
    );

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();
    let mint = orch
        .mint(&instrument.instrument_id, OWNER, 100)
        .await
        .unwrap();

    let err = orch
        .accept_proposal(&mint.proposal_id, OWNER)
        .await
        .unwrap_err();
    assert!(
        matches!(err, MintgateError::Authorization { .. }),
        "expected Authorization, got {:?}",
        err
    );
    assert!(!matches!(err, MintgateError::Transport { .. }));
}

#[tokio::test]
async fn timeout_surfaces_as_unknown_outcome() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();

    ledger.drop_next_response();
    let err = orch
        .mint(&instrument.instrument_id, OWNER, 1000)
        .await
        .unwrap_err();
    assert!(err.outcome_is_unknown());

    // Resolution of the ambiguity is a follow-up query, not a resubmit
    let view = orch.query().holdings(OWNER, None).await.unwrap();
    assert_eq!(view.total, 0);
}

#[tokio::test]
async fn exercising_missing_choice_is_version_mismatch() {
    let ledger = Arc::new(FakeLedger::new());
    let orch = orchestrator(Arc::clone(&ledger));

    let instrument = orch
        .create_instrument("Demo Token", "DEMO", 2)
        .await
        .unwrap();

    // An Instrument defines no Transfer choice; the remote rejection is
    // surfaced verbatim as a version mismatch
    let err = orch
        .transfer(&instrument.instrument_id, ADMIN, OWNER, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, MintgateError::VersionMismatch(_)));
}
