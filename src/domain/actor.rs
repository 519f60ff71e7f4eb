//! Acting identities and their roles.
//!
//! Every store operation receives an [`Actor`]. The role it carries is the
//! capability the store checks, so a caller cannot bypass role gating by
//! simply not rendering a button.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of the acting identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A department contributor: submits evidence and new versions
    Department,

    /// The security officer: validates submitted versions
    Rssi,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Rssi => "rssi",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "department" => Ok(Self::Department),
            "rssi" => Ok(Self::Rssi),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// An identity acting on the store, with the role it acts under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Display identity recorded in `submitted_by` / `validated_by`
    pub id: String,

    /// Capability the actor holds for this call
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Shorthand for a department contributor
    pub fn department(id: impl Into<String>) -> Self {
        Self::new(id, Role::Department)
    }

    /// Shorthand for the security officer
    pub fn rssi(id: impl Into<String>) -> Self {
        Self::new(id, Role::Rssi)
    }
}
