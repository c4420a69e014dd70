//! Persistence collaborator interfaces.
//!
//! The engine never touches storage directly. Assignments go through a
//! [`PermissionStore`] and the built-in reader/writer roles through a
//! [`RoleStore`]. Implementations own all locking and transaction discipline;
//! in particular `set_assignment` must replace a principal's prior level
//! atomically so that concurrent grants converge to one of the submitted
//! levels.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BoxFuture;
use crate::action::ActionSet;
use crate::error::Result;
use crate::principal::{Principal, PrincipalKind};

/// A durable grant of one permission level to one principal on one resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub kind: String,
    pub org_id: i64,
    pub resource_id: String,
    pub principal_kind: PrincipalKind,
    pub principal_id: String,
    pub level: String,
    pub created: jiff::Timestamp,
    pub updated: jiff::Timestamp,
}

impl Assignment {
    pub fn principal(&self) -> Result<Principal> {
        Principal::parse(self.principal_kind, &self.principal_id)
    }
}

/// Durable record of granted permission levels.
pub trait PermissionStore: Send + Sync {
    /// Replace the principal's level on the resource, or delete the
    /// assignment when `level` is `None`. Returns the assignment as stored.
    fn set_assignment<'a>(
        &'a self,
        kind: &'a str,
        org_id: i64,
        resource_id: &'a str,
        principal: &'a Principal,
        level: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Assignment>>>;

    /// All assignments on one resource instance.
    fn list_assignments<'a>(
        &'a self,
        kind: &'a str,
        org_id: i64,
        resource_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Assignment>>>;

    /// All assignments of one kind held by a principal.
    fn list_by_principal<'a>(
        &'a self,
        kind: &'a str,
        org_id: i64,
        principal: &'a Principal,
    ) -> BoxFuture<'a, Result<Vec<Assignment>>>;
}

/// Desired state of a config-managed role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    pub group: String,
    pub actions: ActionSet,
}

/// A stored role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub uid: Uuid,
    pub name: String,
    pub group: String,
    pub actions: ActionSet,
    pub updated: jiff::Timestamp,
}

/// What `create_or_update_role` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Created,
    Updated,
    Unchanged,
}

/// Role/policy subsystem used to provision built-in roles.
pub trait RoleStore: Send + Sync {
    /// Create the role if absent, rewrite it if its group or actions differ.
    /// Never creates a second role with the same name.
    fn create_or_update_role<'a>(
        &'a self,
        role: &'a RoleDefinition,
    ) -> BoxFuture<'a, Result<RoleChange>>;

    fn get_role<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Option<Role>>>;
}
