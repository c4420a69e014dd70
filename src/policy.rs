//! Which principal categories a resource kind accepts assignments for.

use serde::{Deserialize, Serialize};

use crate::principal::PrincipalKind;

/// Assignment policy flags for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPolicy {
    #[serde(default = "enabled")]
    pub users: bool,
    #[serde(default = "enabled")]
    pub teams: bool,
    #[serde(default = "enabled")]
    pub built_in_roles: bool,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            users: true,
            teams: true,
            built_in_roles: true,
        }
    }
}

fn enabled() -> bool {
    true
}

impl AssignmentPolicy {
    pub fn allows(&self, kind: PrincipalKind) -> bool {
        match kind {
            PrincipalKind::User => self.users,
            PrincipalKind::Team => self.teams,
            PrincipalKind::BuiltInRole => self.built_in_roles,
        }
    }
}
