//! Lookup of services by resource kind name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::builtin::{DASHBOARDS, FOLDERS};
use crate::error::{Error, Result};
use crate::service::Service;

/// Services keyed by resource kind. Populated once during startup.
#[derive(Default)]
pub struct Services {
    services: HashMap<String, Arc<Service>>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its kind name. Registering a kind twice is a
    /// composition bug and fails.
    pub fn register(&mut self, service: Service) -> Result<Arc<Service>> {
        let kind = service.kind().to_string();
        if self.services.contains_key(&kind) {
            return Err(Error::DuplicateKind(kind));
        }
        debug!(kind = %kind, "registered resource permission service");
        let service = Arc::new(service);
        self.services.insert(kind, service.clone());
        Ok(service)
    }

    pub fn get(&self, kind: &str) -> Option<Arc<Service>> {
        self.services.get(kind).cloned()
    }

    pub fn dashboards(&self) -> Option<Arc<Service>> {
        self.get(DASHBOARDS)
    }

    pub fn folders(&self) -> Option<Arc<Service>> {
        self.get(FOLDERS)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.services.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Provision the built-in roles of every registered kind.
    pub async fn provision_all(&self) -> Result<()> {
        for kind in self.kinds() {
            if let Some(service) = self.services.get(kind) {
                service.provision().await?;
            }
        }
        Ok(())
    }
}
