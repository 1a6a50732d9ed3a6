//! Mintgate - Ledger command orchestrator for the Elohim asset-token lifecycle
//!
//! "Well done, good and faithful servant" - Matthew 25:21
//!
//! Mintgate drives a multi-party token lifecycle (issue, accept, transfer,
//! burn) on an external permissioned ledger over its HTTP command/query API.
//! Parties are partitioned across participant nodes, so any operation that
//! needs two signatures across a participant boundary runs as a two-phase
//! propose/accept protocol rather than a single atomic transaction.
//!
//! ## Modules
//!
//! - **auth**: signed bearer tokens carrying `actAs`/`readAs` claims
//! - **command**: create/exercise submit bodies with fresh idempotency keys
//! - **client**: HTTP transport with participant routing and typed failures
//! - **resolver**: extracts the created contract id from a command outcome
//! - **protocol**: the propose/accept state machine and public operations
//! - **query**: active-contract queries merged across all schema versions

pub mod auth;
pub mod client;
pub mod command;
pub mod config;
pub mod protocol;
pub mod query;
pub mod resolver;
pub mod types;

pub use config::Args;
pub use protocol::TokenOrchestrator;
pub use types::{MintgateError, Result};
