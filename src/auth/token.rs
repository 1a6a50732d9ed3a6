//! Bearer token signing for ledger commands
//!
//! The ledger authenticates each command with a self-contained HS256 token.
//! Two claims matter: `actAs` names the parties the command may submit
//! transactions for, `readAs` names parties whose observer-visible contracts
//! may be queried but not signed for. Least privilege: callers pass exactly
//! the parties the upcoming command needs, never a superset.
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - Default expiry is 1 hour
//! - The shared secret must come from the environment in production

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{MintgateError, Result};

/// Payload stored in a ledger token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Parties this credential may submit transactions for
    #[serde(rename = "actAs")]
    pub act_as: Vec<String>,
    /// Parties whose observer-visible contracts may be read
    #[serde(rename = "readAs", default, skip_serializing_if = "Vec::is_empty")]
    pub read_as: Vec<String>,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Signs ledger tokens with the deployment's shared secret.
///
/// Pure function of its inputs and the clock; a signed token may be reused
/// until expiry.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
    expiry_seconds: u64,
}

impl TokenSigner {
    /// Create a new signer.
    ///
    /// Returns an error if the secret is empty or too short.
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self> {
        if secret.is_empty() {
            return Err(MintgateError::Config(
                "LEDGER_SECRET is required".into(),
            ));
        }
        if secret.len() < 32 {
            return Err(MintgateError::Config(
                "LEDGER_SECRET must be at least 32 characters".into(),
            ));
        }
        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Sign a token for the given acting and reading parties.
    ///
    /// Submissions need a non-empty `actAs`; read-only queries claim only
    /// `readAs`. A token with neither claims nothing and is refused.
    pub fn sign(&self, act_as: &[String], read_as: &[String]) -> Result<String> {
        if act_as.is_empty() && read_as.is_empty() {
            return Err(MintgateError::Auth(
                "Token must claim at least one party".into(),
            ));
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| MintgateError::Auth(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            act_as: act_as.to_vec(),
            read_as: read_as.to_vec(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify and decode a token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}
