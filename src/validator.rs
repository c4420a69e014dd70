//! Resource existence checks.
//!
//! Before a permission can attach to a resource instance the owning kind's
//! [`ResourceValidator`] must confirm the instance exists. The stock
//! validators parse the numeric id and look the dashboard up through a
//! [`DashboardLookup`] collaborator. A validator returns the canonical
//! spelling of the id, and only that spelling reaches the store, so `"042"`
//! and `"42"` name the same instance. The folder validator reports a
//! non-folder dashboard as `NotFound` so callers cannot learn about the
//! existence of resources of another kind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::BoxFuture;
use crate::error::{Error, Result};

/// Confirms that a resource instance exists within an organization.
pub trait ResourceValidator: Send + Sync {
    /// Check the instance and return its canonical id.
    fn validate<'a>(&'a self, org_id: i64, resource_id: &'a str)
    -> BoxFuture<'a, Result<String>>;
}

/// A dashboard or folder row as seen by the validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: i64,
    pub org_id: i64,
    pub uid: String,
    pub title: String,
    pub is_folder: bool,
}

/// Read access to the dashboard store.
pub trait DashboardLookup: Send + Sync {
    /// Find a dashboard by numeric id. `Ok(None)` when absent.
    fn get_dashboard(&self, org_id: i64, id: i64) -> BoxFuture<'_, Result<Option<Dashboard>>>;
}

/// Parse a numeric resource instance id.
pub fn parse_resource_id(resource_id: &str) -> Result<i64> {
    let id: i64 = resource_id
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid resource id {resource_id:?}")))?;
    if id <= 0 {
        return Err(Error::InvalidInput(format!(
            "resource id must be positive, got {id}"
        )));
    }
    Ok(id)
}

/// Validator for the dashboards kind.
pub struct DashboardValidator {
    lookup: Arc<dyn DashboardLookup>,
}

impl DashboardValidator {
    pub fn new(lookup: Arc<dyn DashboardLookup>) -> Self {
        Self { lookup }
    }
}

impl ResourceValidator for DashboardValidator {
    fn validate<'a>(
        &'a self,
        org_id: i64,
        resource_id: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let id = parse_resource_id(resource_id)?;
            match self.lookup.get_dashboard(org_id, id).await? {
                Some(_) => Ok(id.to_string()),
                None => {
                    debug!(org_id, id, "dashboard not found");
                    Err(Error::NotFound(format!("dashboard {id}")))
                }
            }
        })
    }
}

/// Validator for the folders kind: the dashboard row must be a folder.
pub struct FolderValidator {
    lookup: Arc<dyn DashboardLookup>,
}

impl FolderValidator {
    pub fn new(lookup: Arc<dyn DashboardLookup>) -> Self {
        Self { lookup }
    }
}

impl ResourceValidator for FolderValidator {
    fn validate<'a>(
        &'a self,
        org_id: i64,
        resource_id: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let id = parse_resource_id(resource_id)?;
            match self.lookup.get_dashboard(org_id, id).await? {
                Some(dashboard) if dashboard.is_folder => Ok(id.to_string()),
                // Same error for "absent" and "not a folder".
                _ => {
                    debug!(org_id, id, "folder not found");
                    Err(Error::NotFound(format!("folder {id}")))
                }
            }
        })
    }
}

/// Accepts any non-empty identifier, trimmed. For kinds whose instances live
/// outside any store this engine can see.
pub struct AnyResource;

impl ResourceValidator for AnyResource {
    fn validate<'a>(
        &'a self,
        _org_id: i64,
        resource_id: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let id = resource_id.trim();
            if id.is_empty() {
                return Err(Error::InvalidInput("resource id must not be empty".into()));
            }
            Ok(id.to_string())
        })
    }
}
