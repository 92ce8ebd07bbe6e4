//! Actors - the identity behind every case operation
//!
//! Identities arrive already authenticated from the surrounding API layer;
//! this crate only models them.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Role of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Creates cases, uploads documents, submits
    Maker,
    /// Approves or rejects submitted cases
    Checker,
    /// Automated reviewer (never a human login)
    System,
}

impl UserRole {
    /// Parse a role supplied by a human login. `SYSTEM` is not accepted.
    pub fn parse_human(s: &str) -> Result<Self, CoreError> {
        match UserRole::from_str(s.trim()) {
            Ok(UserRole::System) | Err(_) => Err(CoreError::UnknownRole(s.to_string())),
            Ok(role) => Ok(role),
        }
    }
}

/// An authenticated user (or the system) acting on a case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Stable identity, compared for segregation of duties
    pub id: String,
    /// Display name recorded in the audit trail
    pub name: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: UserRole,
    ) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::EmptyActorId);
        }
        Ok(Self {
            id,
            name: name.into(),
            role,
        })
    }

    pub fn maker(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: UserRole::Maker,
        }
    }

    pub fn checker(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: UserRole::Checker,
        }
    }

    /// The automated reviewer
    pub fn system() -> Self {
        Self {
            id: "SYSTEM".to_string(),
            name: "AI System".to_string(),
            role: UserRole::System,
        }
    }

    pub fn is_same_identity(&self, other: &Actor) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.id, self.role)
    }
}
