//! Resource kind definitions.
//!
//! A [`ResourceKindDefinition`] is everything that distinguishes one kind of
//! protected resource from another: its validator, assignment policy, level
//! map and the names of its built-in roles. Definitions are built once at
//! startup and never mutated.

use std::fmt;
use std::sync::Arc;

use crate::action::{ActionSets, Vocabulary};
use crate::error::{Error, Result};
use crate::policy::AssignmentPolicy;
use crate::store::RoleDefinition;
use crate::validator::ResourceValidator;

/// Configuration for one resource kind.
pub struct ResourceKindDefinition {
    name: String,
    validator: Arc<dyn ResourceValidator>,
    policy: AssignmentPolicy,
    actions: ActionSets,
    reader_role: String,
    writer_role: String,
    role_group: String,
}

impl ResourceKindDefinition {
    pub fn builder(name: impl Into<String>) -> Builder {
        Builder {
            name: name.into(),
            validator: None,
            policy: AssignmentPolicy::default(),
            actions: None,
            reader_role: None,
            writer_role: None,
            role_group: None,
            vocabulary: None,
            monotonic: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validator(&self) -> &dyn ResourceValidator {
        self.validator.as_ref()
    }

    pub fn policy(&self) -> &AssignmentPolicy {
        &self.policy
    }

    pub fn actions(&self) -> &ActionSets {
        &self.actions
    }

    pub fn role_group(&self) -> &str {
        &self.role_group
    }

    /// Reader role: the lowest level's actions.
    pub fn reader_role(&self) -> RoleDefinition {
        RoleDefinition {
            name: self.reader_role.clone(),
            group: self.role_group.clone(),
            actions: self.actions.lowest().1.clone(),
        }
    }

    /// Writer role: the highest level's actions.
    pub fn writer_role(&self) -> RoleDefinition {
        RoleDefinition {
            name: self.writer_role.clone(),
            group: self.role_group.clone(),
            actions: self.actions.highest().1.clone(),
        }
    }
}

impl fmt::Debug for ResourceKindDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceKindDefinition")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("actions", &self.actions)
            .field("reader_role", &self.reader_role)
            .field("writer_role", &self.writer_role)
            .field("role_group", &self.role_group)
            .finish_non_exhaustive()
    }
}

/// Builder that validates a definition before handing it out.
pub struct Builder {
    name: String,
    validator: Option<Arc<dyn ResourceValidator>>,
    policy: AssignmentPolicy,
    actions: Option<ActionSets>,
    reader_role: Option<String>,
    writer_role: Option<String>,
    role_group: Option<String>,
    vocabulary: Option<Vocabulary>,
    monotonic: bool,
}

impl Builder {
    pub fn validator(mut self, validator: Arc<dyn ResourceValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn policy(mut self, policy: AssignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn actions(mut self, actions: ActionSets) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn reader_role(mut self, name: impl Into<String>) -> Self {
        self.reader_role = Some(name.into());
        self
    }

    pub fn writer_role(mut self, name: impl Into<String>) -> Self {
        self.writer_role = Some(name.into());
        self
    }

    pub fn role_group(mut self, name: impl Into<String>) -> Self {
        self.role_group = Some(name.into());
        self
    }

    /// Restrict action tokens to a known vocabulary.
    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Require every level to include the level below it. On by default.
    pub fn monotonic(mut self, monotonic: bool) -> Self {
        self.monotonic = monotonic;
        self
    }

    pub fn build(self) -> Result<ResourceKindDefinition> {
        let name = self.name;
        if name.trim().is_empty() {
            return Err(Error::Config("resource kind name must not be empty".into()));
        }
        let missing = |field: &str| Error::Config(format!("{name}: missing {field}"));

        let validator = self.validator.ok_or_else(|| missing("validator"))?;
        let actions = self.actions.ok_or_else(|| missing("permission levels"))?;
        let reader_role = required(self.reader_role).ok_or_else(|| missing("reader role name"))?;
        let writer_role = required(self.writer_role).ok_or_else(|| missing("writer role name"))?;
        let role_group = required(self.role_group).ok_or_else(|| missing("role group"))?;
        if reader_role == writer_role {
            return Err(Error::Config(format!(
                "{name}: reader and writer roles share the name {reader_role:?}"
            )));
        }

        let in_kind = |e: Error| match e {
            Error::Config(msg) => Error::Config(format!("{name}: {msg}")),
            other => other,
        };
        if let Some(vocabulary) = &self.vocabulary {
            actions.check_vocabulary(vocabulary).map_err(in_kind)?;
        }
        if self.monotonic {
            actions.check_monotonic().map_err(in_kind)?;
        }

        Ok(ResourceKindDefinition {
            name,
            validator,
            policy: self.policy,
            actions,
            reader_role,
            writer_role,
            role_group,
        })
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
