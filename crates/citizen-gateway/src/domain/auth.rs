//! Caller roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role attached to a token.
///
/// The role check is an exact match: a writer cannot read and a reader
/// cannot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Reads citizen records (the collection agency).
    #[serde(alias = "cjib")]
    Reader,
    /// Creates, updates and deletes citizen records (the municipality).
    #[serde(alias = "mun")]
    Writer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reader => "reader",
            Self::Writer => "writer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}
