//! Resource permission service.
//!
//! One [`Service`] exists per resource kind. Every management call follows
//! the same path: validate the resource instance (which also yields the id
//! the store is keyed by), check the principal against
//! the kind's assignment policy, resolve the level to its action set, then go
//! to the store. Validation and the store write are not one atomic unit; a
//! resource deleted in between is left to the store's own guarantees.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::action::ActionSet;
use crate::error::{Error, Result};
use crate::kind::ResourceKindDefinition;
use crate::permission::Level;
use crate::principal::{BasicRole, Principal};
use crate::store::{Assignment, PermissionStore, RoleChange, RoleStore};

/// An assignment together with the actions its level grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAssignment {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub actions: ActionSet,
}

/// One entry of a batch update. `level: None` revokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCommand {
    pub principal: Principal,
    pub level: Option<String>,
}

impl PermissionCommand {
    pub fn grant(principal: Principal, level: impl Into<String>) -> Self {
        Self {
            principal,
            level: Some(level.into()),
        }
    }

    pub fn revoke(principal: Principal) -> Self {
        Self {
            principal,
            level: None,
        }
    }
}

/// Manages assignments for a single resource kind.
pub struct Service {
    definition: ResourceKindDefinition,
    store: Arc<dyn PermissionStore>,
    roles: Arc<dyn RoleStore>,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl Service {
    pub fn new(
        definition: ResourceKindDefinition,
        store: Arc<dyn PermissionStore>,
        roles: Arc<dyn RoleStore>,
    ) -> Self {
        Self {
            definition,
            store,
            roles,
        }
    }

    /// Resource kind name.
    pub fn kind(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &ResourceKindDefinition {
        &self.definition
    }

    /// Action set for a configured level.
    pub fn resolve(&self, level: &str) -> Result<&ActionSet> {
        self.definition
            .actions()
            .resolve(level)
            .ok_or_else(|| Error::UnknownLevel {
                kind: self.kind().to_string(),
                level: level.to_string(),
            })
    }

    /// Level whose actions are exactly `actions`.
    pub fn map_actions(&self, actions: &ActionSet) -> Option<&str> {
        self.definition.actions().map_actions(actions)
    }

    /// Set `principal`'s level on a resource instance, replacing any prior
    /// level. An absent or empty level revokes the assignment.
    pub async fn set_permission(
        &self,
        org_id: i64,
        resource_id: &str,
        principal: &Principal,
        level: Option<&str>,
    ) -> Result<Option<ResolvedAssignment>> {
        let resource_id = self.validate_resource(org_id, resource_id).await?;
        let level = normalize(level);
        let actions = self.check_command(principal, level)?;
        self.write(org_id, &resource_id, principal, level, actions)
            .await
    }

    pub async fn set_user_permission(
        &self,
        org_id: i64,
        resource_id: &str,
        user_id: i64,
        level: Option<&str>,
    ) -> Result<Option<ResolvedAssignment>> {
        self.set_permission(org_id, resource_id, &Principal::User(user_id), level)
            .await
    }

    pub async fn set_team_permission(
        &self,
        org_id: i64,
        resource_id: &str,
        team_id: i64,
        level: Option<&str>,
    ) -> Result<Option<ResolvedAssignment>> {
        self.set_permission(org_id, resource_id, &Principal::Team(team_id), level)
            .await
    }

    pub async fn set_built_in_role_permission(
        &self,
        org_id: i64,
        resource_id: &str,
        role: BasicRole,
        level: Option<&str>,
    ) -> Result<Option<ResolvedAssignment>> {
        self.set_permission(org_id, resource_id, &Principal::BuiltInRole(role), level)
            .await
    }

    /// Grant the level named by `L`.
    pub async fn grant<L: Level>(
        &self,
        org_id: i64,
        resource_id: &str,
        principal: &Principal,
    ) -> Result<ResolvedAssignment> {
        self.set_permission(org_id, resource_id, principal, Some(L::NAME))
            .await?
            .ok_or_else(|| Error::Store(format!("grant of {} returned no assignment", L::NAME)))
    }

    pub async fn revoke(&self, org_id: i64, resource_id: &str, principal: &Principal) -> Result<()> {
        self.set_permission(org_id, resource_id, principal, None)
            .await
            .map(|_| ())
    }

    /// Apply several commands to one resource instance. Every command is
    /// checked before the first write, so a bad entry leaves the store
    /// untouched. Returns the assignments left by granting commands.
    pub async fn set_permissions(
        &self,
        org_id: i64,
        resource_id: &str,
        commands: &[PermissionCommand],
    ) -> Result<Vec<ResolvedAssignment>> {
        let resource_id = self.validate_resource(org_id, resource_id).await?;

        let mut checked = Vec::with_capacity(commands.len());
        for command in commands {
            let level = normalize(command.level.as_deref());
            let actions = self.check_command(&command.principal, level)?;
            checked.push((&command.principal, level, actions));
        }

        let mut out = Vec::new();
        for (principal, level, actions) in checked {
            if let Some(resolved) = self
                .write(org_id, &resource_id, principal, level, actions)
                .await?
            {
                out.push(resolved);
            }
        }
        Ok(out)
    }

    /// All assignments on a resource instance, with their action sets.
    pub async fn list_permissions(
        &self,
        org_id: i64,
        resource_id: &str,
    ) -> Result<Vec<ResolvedAssignment>> {
        let resource_id = self.validate_resource(org_id, resource_id).await?;
        let assignments = self
            .store
            .list_assignments(self.kind(), org_id, &resource_id)
            .await?;
        debug!(kind = %self.kind(), org_id, %resource_id, count = assignments.len(), "listed permissions");

        assignments
            .into_iter()
            .map(|assignment| {
                let actions = self.resolve(&assignment.level)?.clone();
                Ok(ResolvedAssignment {
                    assignment,
                    actions,
                })
            })
            .collect()
    }

    /// Every assignment of this kind held by `principal`.
    pub async fn list_assignments_for_principal(
        &self,
        org_id: i64,
        principal: &Principal,
    ) -> Result<Vec<Assignment>> {
        principal.validate()?;
        self.store
            .list_by_principal(self.kind(), org_id, principal)
            .await
    }

    /// Create or refresh this kind's reader and writer roles. Safe to call on
    /// every start.
    pub async fn provision(&self) -> Result<()> {
        for role in [self.definition.reader_role(), self.definition.writer_role()] {
            match self.roles.create_or_update_role(&role).await? {
                RoleChange::Created => {
                    info!(kind = %self.kind(), role = %role.name, group = %role.group, "created built-in role")
                }
                RoleChange::Updated => {
                    warn!(kind = %self.kind(), role = %role.name, "built-in role drifted from configuration, rewritten")
                }
                RoleChange::Unchanged => {
                    debug!(kind = %self.kind(), role = %role.name, "built-in role up to date")
                }
            }
        }
        Ok(())
    }

    /// Run the kind's validator. Returns the canonical instance id.
    async fn validate_resource(&self, org_id: i64, resource_id: &str) -> Result<String> {
        self.definition
            .validator()
            .validate(org_id, resource_id)
            .await
    }

    /// Principal, policy and level checks. Returns the level's actions, or
    /// `None` for a revoke.
    fn check_command(&self, principal: &Principal, level: Option<&str>) -> Result<Option<ActionSet>> {
        principal.validate()?;
        let category = principal.kind();
        if !self.definition.policy().allows(category) {
            return Err(Error::Forbidden {
                kind: self.kind().to_string(),
                principal: category.to_string(),
            });
        }
        level.map(|l| self.resolve(l).cloned()).transpose()
    }

    async fn write(
        &self,
        org_id: i64,
        resource_id: &str,
        principal: &Principal,
        level: Option<&str>,
        actions: Option<ActionSet>,
    ) -> Result<Option<ResolvedAssignment>> {
        let stored = self
            .store
            .set_assignment(self.kind(), org_id, resource_id, principal, level)
            .await?;

        match (stored, actions) {
            (Some(assignment), Some(actions)) => {
                info!(kind = %self.kind(), org_id, resource_id, %principal, level = %assignment.level, "permission set");
                Ok(Some(ResolvedAssignment {
                    assignment,
                    actions,
                }))
            }
            (None, None) => {
                info!(kind = %self.kind(), org_id, resource_id, %principal, "permission revoked");
                Ok(None)
            }
            _ => Err(Error::Store(format!(
                "store result does not match request for {principal} on {} {resource_id}",
                self.kind()
            ))),
        }
    }
}

fn normalize(level: Option<&str>) -> Option<&str> {
    level.filter(|l| !l.trim().is_empty())
}
