//! Analysis targets: one national unit, each prefecture, each proportional block

use serde::{Deserialize, Serialize};
use std::fmt;

/// Id of the single national entity
pub const NATIONAL_ID: &str = "national";

/// Display label for the national entity
pub const NATIONAL_LABEL: &str = "全国情勢";

/// The three kinds of analysis target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    National,
    Regional,
    Block,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::National => "national",
            Self::Regional => "regional",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "national" => Ok(Self::National),
            "regional" | "region" | "prefecture" => Ok(Self::Regional),
            "block" | "proportional" => Ok(Self::Block),
            other => Err(format!("unknown entity kind: {}", other)),
        }
    }
}

/// Identifies one analysis target.
///
/// Regional and block ids overlap ("tokyo" is both), so the kind is part of
/// the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn national() -> Self {
        Self {
            kind: EntityKind::National,
            id: NATIONAL_ID.to_string(),
        }
    }

    pub fn regional(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Regional,
            id: id.into(),
        }
    }

    pub fn block(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Block,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
