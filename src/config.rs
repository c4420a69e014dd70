//! Configuration loading with layered overrides.
//!
//! Config is loaded in order (each layer overrides the previous):
//! 1. Default values
//! 2. Config file (TOML)
//! 3. Environment variables
//! 4. CLI arguments
//!
//! Resource kinds can only come from the file. A file without `[[kinds]]`
//! yields the stock dashboards and folders kinds.
//!
//! ```toml
//! actions = ["reports:read", "reports:write"]
//!
//! [database]
//! url = "permissions.db"
//!
//! [[kinds]]
//! name = "reports"
//! validator = "none"
//! reader_role = "Report permission reader"
//! writer_role = "Report permission writer"
//! role_group = "Reports"
//!
//! [kinds.assignments]
//! teams = false
//!
//! [[kinds.levels]]
//! name = "View"
//! actions = ["reports:read"]
//!
//! [[kinds.levels]]
//! name = "Edit"
//! actions = ["reports:write"]
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Error;
use crate::action::{ActionSet, ActionSets, Vocabulary};
use crate::builtin;
use crate::kind::ResourceKindDefinition;
use crate::policy::AssignmentPolicy;
use crate::registry::Services;
use crate::service::Service;
use crate::store::{PermissionStore, RoleStore};
use crate::validator::{AnyResource, DashboardLookup, DashboardValidator, FolderValidator, ResourceValidator};

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: Database,
    /// Known action tokens. When non-empty, every level may only use these.
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub kinds: Vec<KindConfig>,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "permissions.db".to_string()
}

/// Which validator guards a configured kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    Dashboard,
    Folder,
    #[default]
    None,
}

/// One `[[kinds]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindConfig {
    pub name: String,
    #[serde(default)]
    pub validator: ValidatorKind,
    pub reader_role: String,
    pub writer_role: String,
    pub role_group: String,
    #[serde(default)]
    pub assignments: AssignmentPolicy,
    /// Earlier kinds whose same-named levels are folded into this kind's.
    #[serde(default)]
    pub include: Vec<String>,
    /// Union each level with the levels below it.
    #[serde(default = "default_true")]
    pub cascade: bool,
    #[serde(default = "default_true")]
    pub monotonic: bool,
    pub levels: Vec<LevelConfig>,
}

/// One permission level, in ascending order within its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Known action tokens, when the file lists them. Without the list, kinds
    /// skip the vocabulary check.
    pub fn vocabulary(&self) -> Option<Vocabulary> {
        if self.actions.is_empty() {
            None
        } else {
            Some(self.actions.iter().cloned().collect())
        }
    }

    /// Build a service for every configured kind, or the stock kinds when
    /// none are configured.
    pub fn build_services(
        &self,
        lookup: Arc<dyn DashboardLookup>,
        store: Arc<dyn PermissionStore>,
        roles: Arc<dyn RoleStore>,
    ) -> crate::Result<Services> {
        if self.kinds.is_empty() {
            return builtin::provide_services(lookup, store, roles);
        }

        let vocabulary = self.vocabulary();
        if vocabulary.is_none() {
            let kinds: Vec<&str> = self.kinds.iter().map(|k| k.name.as_str()).collect();
            warn!(
                ?kinds,
                "no top-level `actions` list configured, action tokens are not checked"
            );
        }

        let mut built: HashMap<&str, ActionSets> = HashMap::new();
        let mut services = Services::new();
        for kind in &self.kinds {
            let actions = kind.action_sets(&built)?;

            let validator: Arc<dyn ResourceValidator> = match kind.validator {
                ValidatorKind::Dashboard => Arc::new(DashboardValidator::new(lookup.clone())),
                ValidatorKind::Folder => Arc::new(FolderValidator::new(lookup.clone())),
                ValidatorKind::None => Arc::new(AnyResource),
            };

            let mut builder = ResourceKindDefinition::builder(kind.name.as_str())
                .validator(validator)
                .policy(kind.assignments)
                .actions(actions.clone())
                .reader_role(kind.reader_role.as_str())
                .writer_role(kind.writer_role.as_str())
                .role_group(kind.role_group.as_str())
                .monotonic(kind.monotonic);
            if let Some(vocabulary) = &vocabulary {
                builder = builder.vocabulary(vocabulary.clone());
            }

            services.register(Service::new(builder.build()?, store.clone(), roles.clone()))?;
            built.insert(kind.name.as_str(), actions);
        }
        Ok(services)
    }
}

impl KindConfig {
    fn action_sets(&self, earlier: &HashMap<&str, ActionSets>) -> crate::Result<ActionSets> {
        let mut included = Vec::with_capacity(self.include.len());
        for name in &self.include {
            let sets = earlier.get(name.as_str()).ok_or_else(|| {
                Error::Config(format!(
                    "{}: included kind {name:?} must be defined earlier",
                    self.name
                ))
            })?;
            included.push(sets);
        }

        let in_kind = |e: Error| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", self.name)),
            other => other,
        };

        if self.cascade {
            let mut cascade = ActionSets::cascade();
            for level in &self.levels {
                cascade = cascade.level(level.name.as_str(), level.actions.iter().cloned());
            }
            for sets in included {
                cascade = cascade.include(sets);
            }
            return cascade.build().map_err(in_kind);
        }

        let mut levels = Vec::with_capacity(self.levels.len());
        for level in &self.levels {
            let mut set: ActionSet = level.actions.iter().cloned().collect();
            for sets in &included {
                let other = sets.resolve(&level.name).ok_or_else(|| {
                    Error::Config(format!("included kind has no level {:?}", level.name))
                });
                set.extend_from(other.map_err(in_kind)?);
            }
            levels.push((level.name.clone(), set));
        }
        ActionSets::explicit(levels).map_err(in_kind)
    }
}

/// Builder for loading configuration with customizable options.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix (e.g., "MYAPP" -> MYAPP_DATABASE_URL)
    pub env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            env_prefix: "RESPERM".to_string(),
        }
    }
}

impl ConfigLoader {
    /// Create a new config loader with the given environment prefix.
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
        }
    }

    /// Load configuration from file, environment, and CLI arguments.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `cli_database_url` - CLI override for database URL
    pub fn load(
        &self,
        config_path: Option<&Path>,
        cli_database_url: Option<&str>,
    ) -> crate::Result<Config> {
        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?
        } else {
            Config::default()
        };

        let prefix = &self.env_prefix;
        if let Ok(url) = std::env::var(format!("{prefix}_DATABASE_URL")) {
            config.database.url = url;
        } else if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        if let Some(url) = cli_database_url {
            config.database.url = url.to_string();
        }

        if config.database.url.trim().is_empty() {
            return Err(Error::Config("database url must not be empty".into()));
        }
        for kind in &config.kinds {
            if kind.levels.is_empty() {
                return Err(Error::Config(format!(
                    "{}: at least one level is required",
                    kind.name
                )));
            }
        }

        Ok(config)
    }
}
