//! Authentication for Mintgate
//!
//! Provides:
//! - Signed bearer tokens carrying `actAs`/`readAs` claims
//! - Token verification (used by tests and diagnostics)

pub mod token;

pub use token::{Claims, TokenSigner};
