//! Provider core
//!
//! The resource table and the machinery shared by every resource type:
//! records, diagnostics, composite ids, the lifecycle dispatch and planning.

pub mod data;
pub mod diag;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod plan;
pub mod resource;

pub use data::ResourceData;
pub use diag::Diagnostics;
pub use error::{ErrorKind, ProviderError, RemoteContext};
pub use resource::{OpContext, ResourceDefinition, ResourceHandler, Timeouts};

use crate::schema::Schema;
use std::collections::BTreeMap;

/// All resource types the provider can manage, keyed by type name
#[derive(Debug, Clone, Default)]
pub struct Provider {
    resources: BTreeMap<&'static str, ResourceDefinition>,
}

impl Provider {
    /// The provider with every built-in resource type registered
    pub fn new() -> Self {
        let mut provider = Self::default();
        for def in crate::resources::all() {
            provider.register(def);
        }
        tracing::debug!("Registered {} resource types", provider.resources.len());
        provider
    }

    pub fn register(&mut self, def: ResourceDefinition) {
        self.resources.insert(def.name, def);
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources.get(name)
    }

    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn schemas(&self) -> BTreeMap<&'static str, &Schema> {
        self.resources
            .iter()
            .map(|(name, def)| (*name, def.schema.as_ref()))
            .collect()
    }
}
