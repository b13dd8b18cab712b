//! Resource definitions and the handler contract

use super::data::ResourceData;
use super::error::ProviderError;
use crate::api::AivenClient;
use crate::schema::Schema;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default bound for any lifecycle operation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        };
        f.write_str(name)
    }
}

/// Per-call context handed to every handler
#[derive(Debug, Clone)]
pub struct OpContext {
    pub operation: Operation,
    pub timeout: Duration,
}

/// How long the orchestrator waits for each operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_TIMEOUT,
            read: DEFAULT_TIMEOUT,
            update: DEFAULT_TIMEOUT,
            delete: DEFAULT_TIMEOUT,
        }
    }
}

impl Timeouts {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read | Operation::Import => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// The four remote calls of one resource type.
///
/// Handlers only talk to the API and the record they are given. Chaining
/// into Read and the not-found policy live in [`super::lifecycle`].
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Create the remote object and store its id in `d`
    async fn create(
        &self,
        ctx: &OpContext,
        d: &mut ResourceData,
        client: &AivenClient,
    ) -> Result<(), ProviderError>;

    /// Write every attribute of the remote object into `d`
    async fn read(
        &self,
        ctx: &OpContext,
        d: &mut ResourceData,
        client: &AivenClient,
    ) -> Result<(), ProviderError>;

    async fn update(
        &self,
        ctx: &OpContext,
        d: &mut ResourceData,
        client: &AivenClient,
    ) -> Result<(), ProviderError>;

    async fn delete(
        &self,
        ctx: &OpContext,
        d: &mut ResourceData,
        client: &AivenClient,
    ) -> Result<(), ProviderError>;

    /// Reject ids of the wrong shape before importing
    fn validate_import_id(&self, id: &str) -> Result<(), ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::precondition("import id must not be empty"));
        }
        Ok(())
    }
}

/// Everything the orchestrator knows about one resource type
#[derive(Clone)]
pub struct ResourceDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Arc<Schema>,
    pub timeouts: Timeouts,
    pub handler: Arc<dyn ResourceHandler>,
}

impl ResourceDefinition {
    pub fn new(
        name: &'static str,
        description: &'static str,
        schema: Schema,
        handler: impl ResourceHandler + 'static,
    ) -> Self {
        Self {
            name,
            description,
            schema: Arc::new(schema),
            timeouts: Timeouts::default(),
            handler: Arc::new(handler),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// An empty record of this type
    pub fn new_data(&self) -> ResourceData {
        ResourceData::new(self.name, Arc::clone(&self.schema))
    }

    /// A record rebuilt from persisted state
    pub fn data_from(&self, id: Option<String>, attributes: Map<String, Value>) -> ResourceData {
        ResourceData::from_parts(self.name, Arc::clone(&self.schema), id, attributes)
    }

    pub fn context(&self, operation: Operation) -> OpContext {
        OpContext {
            operation,
            timeout: self.timeouts.for_operation(operation),
        }
    }
}

impl fmt::Debug for ResourceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDefinition")
            .field("name", &self.name)
            .field("attributes", &self.schema.len())
            .field("timeouts", &self.timeouts)
            .finish()
    }
}
