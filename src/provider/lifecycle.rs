//! Lifecycle dispatch
//!
//! The five entry points the orchestrator calls for any resource type. This
//! is the single place where:
//!
//! - Create and Update chain into Read, so both populate state the same way
//! - not-found is turned into drift (Read), success (Delete) or failure (Import)
//! - per-operation timeouts are enforced
//! - handler errors become [`Diagnostics`]

use super::data::ResourceData;
use super::diag::Diagnostics;
use super::error::ProviderError;
use super::resource::{OpContext, Operation, ResourceDefinition};
use crate::api::AivenClient;
use serde_json::Map;
use std::future::Future;

/// Create the remote object, then read it back
pub async fn create(def: &ResourceDefinition, d: &mut ResourceData, client: &AivenClient) -> Diagnostics {
    let ctx = def.context(Operation::Create);
    tracing::info!("create: resource={}", def.name);

    let result = bounded(def, &ctx, async {
        def.handler.create(&ctx, d, client).await?;
        read_tolerating_drift(def, &ctx, d, client).await
    })
    .await;

    into_diagnostics(result)
}

/// Refresh the record from the remote object; a vanished object clears the id
pub async fn read(def: &ResourceDefinition, d: &mut ResourceData, client: &AivenClient) -> Diagnostics {
    let ctx = def.context(Operation::Read);
    tracing::info!("read: resource={}, id={}", def.name, d.id().unwrap_or("-"));

    let result = bounded(def, &ctx, read_tolerating_drift(def, &ctx, d, client)).await;
    into_diagnostics(result)
}

/// Update the remote object, then read it back
pub async fn update(def: &ResourceDefinition, d: &mut ResourceData, client: &AivenClient) -> Diagnostics {
    let ctx = def.context(Operation::Update);
    tracing::info!("update: resource={}, id={}", def.name, d.id().unwrap_or("-"));

    let result = bounded(def, &ctx, async {
        def.handler.update(&ctx, d, client).await?;
        read_tolerating_drift(def, &ctx, d, client).await
    })
    .await;

    into_diagnostics(result)
}

/// Delete the remote object; an object that is already gone counts as deleted
pub async fn delete(def: &ResourceDefinition, d: &mut ResourceData, client: &AivenClient) -> Diagnostics {
    let ctx = def.context(Operation::Delete);
    tracing::info!("delete: resource={}, id={}", def.name, d.id().unwrap_or("-"));

    let result = bounded(def, &ctx, async {
        match def.handler.delete(&ctx, d, client).await {
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} already gone: {}", def.name, e);
                Ok(())
            },
            other => other,
        }
    })
    .await;

    if result.is_ok() {
        d.clear_id();
    }
    into_diagnostics(result)
}

/// Adopt an existing remote object by id.
///
/// Unlike [`read`], a missing object is an error: importing an id that does
/// not exist must not produce an empty record.
pub async fn import(
    def: &ResourceDefinition,
    id: &str,
    client: &AivenClient,
) -> Result<ResourceData, Diagnostics> {
    let ctx = def.context(Operation::Import);
    tracing::info!("import: resource={}, id={}", def.name, id);

    let prefix = format!("cannot import {} `{}`", def.name, id);

    def.handler
        .validate_import_id(id)
        .map_err(|e| Diagnostics::from(e).prefixed(&prefix))?;

    let mut d = def.new_data();
    d.set_id(id);

    bounded(def, &ctx, def.handler.read(&ctx, &mut d, client))
        .await
        .map_err(|diags| diags.prefixed(&prefix))?;

    d.restore_local_values(Map::new());
    Ok(d)
}

async fn read_tolerating_drift(
    def: &ResourceDefinition,
    ctx: &OpContext,
    d: &mut ResourceData,
    client: &AivenClient,
) -> Result<(), ProviderError> {
    let local = d.local_values();

    match def.handler.read(ctx, d, client).await {
        Ok(()) => {
            d.restore_local_values(local);
            Ok(())
        },
        Err(e) if e.is_not_found() => {
            tracing::warn!(
                "{} `{}` not found, removing from state: {}",
                def.name,
                d.id().unwrap_or("-"),
                e
            );
            d.clear_id();
            Ok(())
        },
        other => other,
    }
}

async fn bounded<F>(def: &ResourceDefinition, ctx: &OpContext, fut: F) -> Result<(), Diagnostics>
where
    F: Future<Output = Result<(), ProviderError>>,
{
    match tokio::time::timeout(ctx.timeout, fut).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::error!("{} {} failed: {}", def.name, ctx.operation, e);
            Err(e.into())
        },
        Err(_) => {
            tracing::error!("{} {} timed out", def.name, ctx.operation);
            Err(Diagnostics::error(format!(
                "timeout while waiting for {} {} after {:?}",
                def.name, ctx.operation, ctx.timeout
            )))
        },
    }
}

fn into_diagnostics(result: Result<(), Diagnostics>) -> Diagnostics {
    result.err().unwrap_or_default()
}
