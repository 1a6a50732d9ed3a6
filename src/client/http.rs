//! HTTP implementation of the ledger transport
//!
//! One reqwest client with a client-level timeout, shared across calls.
//! Submissions block until the ledger reports an outcome or the timeout
//! fires; on timeout the command may still have succeeded remotely, so the
//! failure is surfaced as an unknown outcome rather than a plain transport
//! error.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ActiveContract, ActiveContractsRequest, LedgerApi, Participant};
use crate::command::SubmitRequest;
use crate::types::{MintgateError, Result};

/// Rejection bodies carrying these codes are authorization failures: a
/// required signer was missing, or the command went to a participant that
/// does not host the acting party.
const AUTHORIZATION_MARKERS: &[&str] = &[
    "MISSING_AUTHORIZATION",
    "PARTY_NOT_HOSTED",
    "PERMISSION_DENIED",
];

/// Rejection bodies carrying these codes mean the contract was created under
/// a schema version that does not define the exercised choice.
const VERSION_MARKERS: &[&str] = &["TEMPLATE_OR_CHOICE_NOT_FOUND", "unknown choice"];

pub struct HttpLedgerClient {
    client: Client,
}

impl HttpLedgerClient {
    /// Build a client with the given per-call timeout
    pub fn new(timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| MintgateError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LedgerApi for HttpLedgerClient {
    async fn submit_and_wait(
        &self,
        participant: &Participant,
        token: &str,
        request: &SubmitRequest,
    ) -> Result<Value> {
        let url = format!("{}/submit-and-wait", participant.base_url);
        debug!(
            participant = %participant.name,
            command_id = %request.command_id,
            "Submitting command"
        );

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    // The command may have succeeded remotely. Callers must
                    // re-query active state, never resubmit with this key.
                    MintgateError::UnknownOutcome(format!(
                        "submit-and-wait to {} timed out (command {})",
                        participant.name, request.command_id
                    ))
                } else {
                    MintgateError::Transport {
                        status: None,
                        body: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                participant = %participant.name,
                status = status.as_u16(),
                "Command rejected"
            );
            return Err(classify_rejection(status, body));
        }

        let outcome: Value = response.json().await.map_err(|e| MintgateError::Transport {
            status: Some(status.as_u16()),
            body: format!("Malformed outcome body: {}", e),
        })?;
        Ok(outcome)
    }

    async fn active_contracts(
        &self,
        participant: &Participant,
        token: &str,
        request: &ActiveContractsRequest,
    ) -> Result<Vec<ActiveContract>> {
        let url = format!("{}/active-contracts", participant.base_url);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(request)
            .send()
            .await
            .map_err(|e| MintgateError::Transport {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_rejection(status, body));
        }

        #[derive(Deserialize)]
        struct ActiveContractsResponse {
            contracts: Vec<ActiveContract>,
        }

        let parsed: ActiveContractsResponse =
            response.json().await.map_err(|e| MintgateError::Transport {
                status: Some(status.as_u16()),
                body: format!("Malformed query body: {}", e),
            })?;
        Ok(parsed.contracts)
    }
}

/// Split a non-2xx response into the orchestrator's failure classes.
///
/// 401/403 and known authorization codes become authorization failures
/// (never retried with the same shape); version-mismatch codes are surfaced
/// verbatim; everything else is a transport failure with status and body.
fn classify_rejection(status: StatusCode, body: String) -> MintgateError {
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || AUTHORIZATION_MARKERS.iter().any(|m| body.contains(m))
    {
        return MintgateError::Authorization {
            status: status.as_u16(),
            body,
        };
    }

    if VERSION_MARKERS.iter().any(|m| body.contains(m)) {
        return MintgateError::VersionMismatch(body);
    }

    MintgateError::Transport {
        status: Some(status.as_u16()),
        body,
    }
}
