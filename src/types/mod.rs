//! Shared types for Mintgate
//!
//! Identifier types used across modules. Parties and contract ids stay plain
//! strings (they are opaque to this layer); template ids and the schema
//! version registry get structure because the orchestrator reasons about
//! them.

pub mod error;

pub use error::{MintgateError, Result};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fully qualified template identifier: a template name bound to a concrete
/// on-ledger schema version (package id).
///
/// Wire form is `package:Module:Entity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateId {
    /// Schema version the template is defined under
    pub package_id: String,
    /// Module name, e.g. "Token"
    pub module_name: String,
    /// Entity name, e.g. "Holding"
    pub entity: String,
}

impl TemplateId {
    pub fn new(
        package_id: impl Into<String>,
        module_name: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            module_name: module_name.into(),
            entity: entity.into(),
        }
    }

    /// Same template under a different schema version
    pub fn with_package(&self, package_id: &str) -> Self {
        Self {
            package_id: package_id.to_string(),
            module_name: self.module_name.clone(),
            entity: self.entity.clone(),
        }
    }

    /// Whether a wire-form template id string refers to this template,
    /// ignoring the package id. Used when matching outcome events that may
    /// echo any deployed version.
    pub fn same_entity(&self, wire: &str) -> bool {
        match wire.parse::<TemplateId>() {
            Ok(other) => other.module_name == self.module_name && other.entity == self.entity,
            Err(_) => false,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.package_id, self.module_name, self.entity)
    }
}

impl FromStr for TemplateId {
    type Err = MintgateError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(pkg), Some(module), Some(entity))
                if !pkg.is_empty() && !module.is_empty() && !entity.is_empty() =>
            {
                Ok(Self::new(pkg, module, entity))
            }
            _ => Err(MintgateError::Config(format!(
                "Invalid template id: {}",
                s
            ))),
        }
    }
}

impl Serialize for TemplateId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Registry of deployed schema versions.
///
/// Writes always target the current version; reads span every version ever
/// deployed, because contracts created under old versions stay on-ledger.
/// Read-only after startup.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    write_package: String,
    read_packages: Vec<String>,
}

impl SchemaRegistry {
    /// Build a registry. The write package is folded into the read set when
    /// the caller did not list it, so reads always cover the write version.
    pub fn new(write_package: impl Into<String>, read_packages: Vec<String>) -> Result<Self> {
        let write_package = write_package.into();
        if write_package.is_empty() {
            return Err(MintgateError::Config(
                "Write package id must not be empty".into(),
            ));
        }
        let mut read_packages = read_packages;
        if !read_packages.contains(&write_package) {
            read_packages.push(write_package.clone());
        }
        Ok(Self {
            write_package,
            read_packages,
        })
    }

    /// The schema version new commands are built against
    pub fn write_package(&self) -> &str {
        &self.write_package
    }

    /// Every schema version queries must cover
    pub fn read_packages(&self) -> &[String] {
        &self.read_packages
    }
}
