//! Principals that can receive assignments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Category of principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    User,
    Team,
    BuiltInRole,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Team => "team",
            PrincipalKind::BuiltInRole => "built_in_role",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrincipalKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(PrincipalKind::User),
            "team" => Ok(PrincipalKind::Team),
            "built_in_role" => Ok(PrincipalKind::BuiltInRole),
            other => Err(Error::InvalidInput(format!(
                "unknown principal category {other:?}"
            ))),
        }
    }
}

/// Organization-wide roles every user holds one of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicRole {
    Viewer,
    Editor,
    Admin,
    #[serde(rename = "Grafana Admin")]
    ServerAdmin,
}

impl BasicRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BasicRole::Viewer => "Viewer",
            BasicRole::Editor => "Editor",
            BasicRole::Admin => "Admin",
            BasicRole::ServerAdmin => "Grafana Admin",
        }
    }
}

impl FromStr for BasicRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Viewer" => Ok(BasicRole::Viewer),
            "Editor" => Ok(BasicRole::Editor),
            "Admin" => Ok(BasicRole::Admin),
            "Grafana Admin" => Ok(BasicRole::ServerAdmin),
            other => Err(Error::InvalidInput(format!("unknown built-in role {other:?}"))),
        }
    }
}

/// A principal that can hold an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Principal {
    User(i64),
    Team(i64),
    BuiltInRole(BasicRole),
}

impl Principal {
    /// Parse a principal from its category and stored identifier.
    pub fn parse(kind: PrincipalKind, id: &str) -> Result<Self> {
        match kind {
            PrincipalKind::User => parse_numeric_id("user", id).map(Principal::User),
            PrincipalKind::Team => parse_numeric_id("team", id).map(Principal::Team),
            PrincipalKind::BuiltInRole => id.parse().map(Principal::BuiltInRole),
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::User(_) => PrincipalKind::User,
            Principal::Team(_) => PrincipalKind::Team,
            Principal::BuiltInRole(_) => PrincipalKind::BuiltInRole,
        }
    }

    /// Identifier as persisted alongside the category.
    pub fn id(&self) -> String {
        match self {
            Principal::User(id) | Principal::Team(id) => id.to_string(),
            Principal::BuiltInRole(role) => role.as_str().to_string(),
        }
    }

    /// Reject identifiers the category cannot hold.
    pub fn validate(&self) -> Result<()> {
        match self {
            Principal::User(id) | Principal::Team(id) if *id <= 0 => Err(Error::InvalidInput(
                format!("{} id must be positive, got {id}", self.kind()),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

fn parse_numeric_id(category: &str, id: &str) -> Result<i64> {
    let parsed: i64 = id
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid {category} id {id:?}")))?;
    if parsed <= 0 {
        return Err(Error::InvalidInput(format!(
            "{category} id must be positive, got {parsed}"
        )));
    }
    Ok(parsed)
}
