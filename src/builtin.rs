//! Stock resource kinds: dashboards and folders.
//!
//! Folder levels also grant the matching dashboard level, since a folder's
//! permissions apply to the dashboards inside it.

use std::sync::Arc;

use crate::action::ActionSets;
use crate::error::Result;
use crate::kind::ResourceKindDefinition;
use crate::permission::level::{Admin, Edit, View};
use crate::registry::Services;
use crate::service::Service;
use crate::store::{PermissionStore, RoleStore};
use crate::validator::{DashboardLookup, DashboardValidator, FolderValidator};

pub const DASHBOARDS: &str = "dashboards";
pub const FOLDERS: &str = "folders";

/// Action tokens referenced by the stock kinds.
pub mod actions {
    use crate::action::Vocabulary;

    pub const DASHBOARDS_CREATE: &str = "dashboards:create";
    pub const DASHBOARDS_READ: &str = "dashboards:read";
    pub const DASHBOARDS_WRITE: &str = "dashboards:write";
    pub const DASHBOARDS_DELETE: &str = "dashboards:delete";
    pub const DASHBOARDS_EDIT: &str = "dashboards:edit";
    pub const DASHBOARDS_PERMISSIONS_READ: &str = "dashboards.permissions:read";
    pub const DASHBOARDS_PERMISSIONS_WRITE: &str = "dashboards.permissions:write";

    pub const FOLDERS_READ: &str = "folders:read";
    pub const FOLDERS_WRITE: &str = "folders:write";
    pub const FOLDERS_DELETE: &str = "folders:delete";
    pub const FOLDERS_EDIT: &str = "folders:edit";
    pub const FOLDERS_PERMISSIONS_READ: &str = "folders.permissions:read";
    pub const FOLDERS_PERMISSIONS_WRITE: &str = "folders.permissions:write";

    pub const ALL: [&str; 13] = [
        DASHBOARDS_CREATE,
        DASHBOARDS_READ,
        DASHBOARDS_WRITE,
        DASHBOARDS_DELETE,
        DASHBOARDS_EDIT,
        DASHBOARDS_PERMISSIONS_READ,
        DASHBOARDS_PERMISSIONS_WRITE,
        FOLDERS_READ,
        FOLDERS_WRITE,
        FOLDERS_DELETE,
        FOLDERS_EDIT,
        FOLDERS_PERMISSIONS_READ,
        FOLDERS_PERMISSIONS_WRITE,
    ];

    pub fn vocabulary() -> Vocabulary {
        ALL.into_iter().collect()
    }
}

pub fn dashboard_action_sets() -> Result<ActionSets> {
    use actions::*;
    ActionSets::cascade()
        .typed::<View, _, _>([DASHBOARDS_READ])
        .typed::<Edit, _, _>([DASHBOARDS_WRITE, DASHBOARDS_DELETE, DASHBOARDS_EDIT])
        .typed::<Admin, _, _>([DASHBOARDS_PERMISSIONS_READ, DASHBOARDS_PERMISSIONS_WRITE])
        .build()
}

pub fn folder_action_sets(dashboards: &ActionSets) -> Result<ActionSets> {
    use actions::*;
    ActionSets::cascade()
        .typed::<View, _, _>([FOLDERS_READ])
        .typed::<Edit, _, _>([FOLDERS_WRITE, FOLDERS_DELETE, FOLDERS_EDIT, DASHBOARDS_CREATE])
        .typed::<Admin, _, _>([FOLDERS_PERMISSIONS_READ, FOLDERS_PERMISSIONS_WRITE])
        .include(dashboards)
        .build()
}

pub fn dashboards_definition(lookup: Arc<dyn DashboardLookup>) -> Result<ResourceKindDefinition> {
    ResourceKindDefinition::builder(DASHBOARDS)
        .validator(Arc::new(DashboardValidator::new(lookup)))
        .actions(dashboard_action_sets()?)
        .vocabulary(actions::vocabulary())
        .reader_role("Dashboard permission reader")
        .writer_role("Dashboard permission writer")
        .role_group("Dashboards")
        .build()
}

pub fn folders_definition(lookup: Arc<dyn DashboardLookup>) -> Result<ResourceKindDefinition> {
    ResourceKindDefinition::builder(FOLDERS)
        .validator(Arc::new(FolderValidator::new(lookup)))
        .actions(folder_action_sets(&dashboard_action_sets()?)?)
        .vocabulary(actions::vocabulary())
        .reader_role("Folder permission reader")
        .writer_role("Folder permission writer")
        .role_group("Folders")
        .build()
}

/// Build the registry holding the stock dashboards and folders services.
pub fn provide_services(
    lookup: Arc<dyn DashboardLookup>,
    store: Arc<dyn PermissionStore>,
    roles: Arc<dyn RoleStore>,
) -> Result<Services> {
    let mut services = Services::new();
    services.register(Service::new(
        dashboards_definition(lookup.clone())?,
        store.clone(),
        roles.clone(),
    ))?;
    services.register(Service::new(folders_definition(lookup)?, store, roles))?;
    Ok(services)
}
