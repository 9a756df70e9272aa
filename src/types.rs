//! Shared types for subjects and output rows

use serde::{Deserialize, Serialize};

/// One (name, identifier) record to be searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub identifier: u64,
}

impl Subject {
    pub fn new(name: impl Into<String>, identifier: u64) -> Self {
        Self {
            name: name.into(),
            identifier,
        }
    }

    /// Identifier rendered as an 8-digit zero-padded decimal string.
    /// Identifiers wider than 8 digits keep their natural length.
    pub fn padded_identifier(&self) -> String {
        format!("{:08}", self.identifier)
    }
}

/// A single row of the persisted output table.
///
/// Column order is fixed: name, identifier, email. Rows whose
/// (name, identifier) pair already appeared earlier in the table carry
/// empty strings in those two fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub name: String,
    pub identifier: String,
    pub email: String,
}

impl OutputRow {
    pub fn new(
        name: impl Into<String>,
        identifier: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            email: email.into(),
        }
    }
}
