//! Orchestrator
//!
//! Drives the lifecycle entry points over a desired configuration and a
//! state file: refresh, plan, apply, destroy and import. Instances in the
//! same dependency wave run concurrently, bounded by `parallelism`.

pub mod desired;
pub mod state;

pub use desired::{DesiredConfig, DesiredResource};
pub use state::{StateFile, StateRecord};

use crate::api::AivenClient;
use crate::provider::plan::{plan_resource, Action, ResourcePlan};
use crate::provider::{lifecycle, Diagnostics, Provider, ResourceData, ResourceDefinition};
use desired::dependency_waves;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DEFAULT_PARALLELISM: usize = 10;

/// Planned change of one address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedChange {
    pub address: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub plan: ResourcePlan,
    /// Normalized desired attributes, absent for deletions
    #[serde(skip)]
    config: Option<Map<String, Value>>,
}

/// Result of one instance operation
struct Outcome {
    address: String,
    record: Option<StateRecord>,
    diagnostics: Diagnostics,
}

pub struct Engine {
    provider: Provider,
    client: AivenClient,
    parallelism: usize,
}

impl Engine {
    pub fn new(provider: Provider, client: AivenClient) -> Self {
        Self {
            provider,
            client,
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    fn definition(&self, address: &str, type_name: &str) -> Result<&ResourceDefinition, Diagnostics> {
        self.provider.resource(type_name).ok_or_else(|| {
            Diagnostics::error(format!("{}: unsupported resource type `{}`", address, type_name))
        })
    }

    /// Read every recorded instance; instances gone from the remote side are
    /// dropped from the state
    pub async fn refresh(&self, state: &mut StateFile) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let mut jobs = Vec::new();

        for (address, record) in &state.resources {
            match self.definition(address, &record.type_name) {
                Ok(def) => jobs.push((address.clone(), def, record.clone())),
                Err(diags) => diagnostics.extend(diags),
            }
        }

        let outcomes: Vec<Outcome> = stream::iter(jobs)
            .map(|(address, def, record)| async move {
                let mut d = def.data_from(record.id.clone(), record.attributes.clone());
                let diagnostics = if d.id().is_some() {
                    lifecycle::read(def, &mut d, &self.client).await
                } else {
                    Diagnostics::new()
                };

                let record = if diagnostics.has_error() {
                    Some(record)
                } else {
                    to_record(d, record.depends_on)
                };
                Outcome {
                    address,
                    record,
                    diagnostics,
                }
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        for outcome in outcomes {
            self.store(state, outcome, &mut diagnostics, true);
        }
        diagnostics
    }

    /// Compare the desired configuration with the state
    pub fn plan(&self, desired: &DesiredConfig, state: &StateFile) -> Result<Vec<PlannedChange>, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let mut changes = Vec::new();

        for (address, resource) in &desired.resources {
            let def = match self.definition(address, &resource.type_name) {
                Ok(def) => def,
                Err(diags) => {
                    diagnostics.extend(diags);
                    continue;
                },
            };

            let config = match def.schema.validate_config(&resource.attributes) {
                Ok(config) => config,
                Err(errors) => {
                    for error in errors {
                        diagnostics.push_error(format!("{}: {}", address, error), None);
                    }
                    continue;
                },
            };

            let prior = match state.resources.get(address) {
                Some(record) if record.type_name != resource.type_name => {
                    diagnostics.push_error(
                        format!(
                            "{}: type changed from `{}` to `{}`, destroy it first",
                            address, record.type_name, resource.type_name
                        ),
                        None,
                    );
                    continue;
                },
                Some(record) => Some(def.data_from(record.id.clone(), record.attributes.clone())),
                None => None,
            };

            changes.push(PlannedChange {
                address: address.clone(),
                type_name: resource.type_name.clone(),
                plan: plan_resource(&def.schema, prior.as_ref(), Some(&config)),
                config: Some(config),
            });
        }

        for (address, record) in &state.resources {
            if desired.resources.contains_key(address) || record.id.is_none() {
                continue;
            }
            changes.push(PlannedChange {
                address: address.clone(),
                type_name: record.type_name.clone(),
                plan: ResourcePlan {
                    action: Action::Delete,
                    changes: Vec::new(),
                },
                config: None,
            });
        }

        if diagnostics.has_error() {
            Err(diagnostics)
        } else {
            Ok(changes)
        }
    }

    /// Plan and execute. Removed instances are deleted first, in reverse
    /// dependency order; then the desired instances are applied wave by wave.
    pub async fn apply(&self, desired: &DesiredConfig, state: &mut StateFile) -> Diagnostics {
        let changes = match self.plan(desired, state) {
            Ok(changes) => changes,
            Err(diags) => return diags,
        };

        let waves = match desired.waves() {
            Ok(waves) => waves,
            Err(e) => return Diagnostics::error(e.to_string()),
        };

        let (deletions, mut pending): (Vec<PlannedChange>, Vec<PlannedChange>) =
            changes.into_iter().partition(|c| c.config.is_none());

        let mut diagnostics = self.delete_in_order(deletions, state).await;
        if diagnostics.has_error() {
            return diagnostics;
        }

        for wave in waves {
            let (current, rest): (Vec<PlannedChange>, Vec<PlannedChange>) =
                pending.into_iter().partition(|c| wave.contains(&c.address));
            pending = rest;

            let mut jobs = Vec::new();
            for change in current {
                let depends_on = desired
                    .resources
                    .get(&change.address)
                    .map(|r| r.depends_on.clone())
                    .unwrap_or_default();

                if change.plan.action == Action::NoOp {
                    if let Some(record) = state.resources.get_mut(&change.address) {
                        record.depends_on = depends_on;
                    }
                    continue;
                }

                match self.definition(&change.address, &change.type_name) {
                    Ok(def) => {
                        let prior = state.resources.get(&change.address).cloned();
                        jobs.push((change, def, prior, depends_on));
                    },
                    Err(diags) => diagnostics.extend(diags),
                }
            }

            let outcomes: Vec<Outcome> = stream::iter(jobs)
                .map(|(change, def, prior, depends_on)| self.execute(change, def, prior, depends_on))
                .buffer_unordered(self.parallelism)
                .collect()
                .await;

            for outcome in outcomes {
                self.store(state, outcome, &mut diagnostics, false);
            }

            if diagnostics.has_error() {
                break;
            }
        }

        diagnostics
    }

    /// Delete every recorded instance
    pub async fn destroy(&self, state: &mut StateFile) -> Diagnostics {
        let deletions = state
            .resources
            .iter()
            .filter(|(_, record)| record.id.is_some())
            .map(|(address, record)| PlannedChange {
                address: address.clone(),
                type_name: record.type_name.clone(),
                plan: ResourcePlan {
                    action: Action::Delete,
                    changes: Vec::new(),
                },
                config: None,
            })
            .collect();

        let diagnostics = self.delete_in_order(deletions, state).await;
        state.resources.retain(|_, record| record.id.is_some());
        diagnostics
    }

    /// Adopt an existing remote instance under `address`
    pub async fn import(&self, type_name: &str, address: &str, id: &str, state: &mut StateFile) -> Diagnostics {
        if state.resources.contains_key(address) {
            return Diagnostics::error(format!("{}: already managed, remove it from the state first", address));
        }

        let def = match self.definition(address, type_name) {
            Ok(def) => def,
            Err(diags) => return diags,
        };

        match lifecycle::import(def, id, &self.client).await {
            Ok(d) => {
                if let Some(record) = to_record(d, Vec::new()) {
                    state.resources.insert(address.to_string(), record);
                }
                Diagnostics::new()
            },
            Err(diags) => diags,
        }
    }

    /// Delete instances so that dependents go before their dependencies
    async fn delete_in_order(&self, deletions: Vec<PlannedChange>, state: &mut StateFile) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        let graph: BTreeMap<String, Vec<String>> = deletions
            .iter()
            .map(|c| {
                let deps = state
                    .resources
                    .get(&c.address)
                    .map(|r| r.depends_on.clone())
                    .unwrap_or_default();
                (c.address.clone(), deps)
            })
            .collect();

        let mut waves = match dependency_waves(&graph) {
            Ok(waves) => waves,
            Err(e) => return Diagnostics::error(e.to_string()),
        };
        waves.reverse();

        let mut pending = deletions;
        for wave in waves {
            let (current, rest): (Vec<PlannedChange>, Vec<PlannedChange>) =
                pending.into_iter().partition(|c| wave.contains(&c.address));
            pending = rest;

            let mut jobs = Vec::new();
            for change in current {
                match self.definition(&change.address, &change.type_name) {
                    Ok(def) => {
                        let prior = state.resources.get(&change.address).cloned();
                        jobs.push((change, def, prior));
                    },
                    Err(diags) => diagnostics.extend(diags),
                }
            }

            let outcomes: Vec<Outcome> = stream::iter(jobs)
                .map(|(change, def, prior)| self.execute(change, def, prior, Vec::new()))
                .buffer_unordered(self.parallelism)
                .collect()
                .await;

            for outcome in outcomes {
                self.store(state, outcome, &mut diagnostics, false);
            }

            if diagnostics.has_error() {
                break;
            }
        }

        diagnostics
    }

    /// Run the lifecycle operations one planned change needs
    async fn execute(
        &self,
        change: PlannedChange,
        def: &ResourceDefinition,
        prior: Option<StateRecord>,
        depends_on: Vec<String>,
    ) -> Outcome {
        let address = change.address;
        let action = change.plan.action;
        let prior_data = prior
            .as_ref()
            .map(|r| def.data_from(r.id.clone(), r.attributes.clone()));
        let config = change.config.unwrap_or_default();

        tracing::info!("{} {}", action, address);

        let (data, diagnostics) = match (action, prior_data) {
            (Action::Create, _) => {
                let mut d = def.new_data();
                d.apply_config(&config);
                let diags = lifecycle::create(def, &mut d, &self.client).await;
                (Some(d), diags)
            },
            (Action::Update, Some(mut d)) => {
                d.apply_config(&config);
                let diags = lifecycle::update(def, &mut d, &self.client).await;
                (Some(d), diags)
            },
            (Action::Replace, Some(mut old)) => {
                let diags = lifecycle::delete(def, &mut old, &self.client).await;
                if diags.has_error() {
                    (Some(old), diags)
                } else {
                    let mut d = def.new_data();
                    d.apply_config(&config);
                    let diags = lifecycle::create(def, &mut d, &self.client).await;
                    (Some(d), diags)
                }
            },
            (Action::Delete, Some(mut d)) => {
                let diags = lifecycle::delete(def, &mut d, &self.client).await;
                (Some(d), diags)
            },
            (_, unchanged) => (unchanged, Diagnostics::new()),
        };

        let record = match data {
            Some(_) if action == Action::Update && diagnostics.has_error() => prior,
            Some(d) => to_record(d, depends_on),
            None => None,
        };

        Outcome {
            address: address.clone(),
            record,
            diagnostics: diagnostics.prefixed(&address),
        }
    }

    fn store(&self, state: &mut StateFile, outcome: Outcome, diagnostics: &mut Diagnostics, report_drift: bool) {
        match outcome.record {
            Some(record) => {
                state.resources.insert(outcome.address, record);
            },
            None => {
                if state.resources.remove(&outcome.address).is_some() && report_drift {
                    diagnostics.push_warning(format!(
                        "{}: no longer exists remotely, removed from state",
                        outcome.address
                    ));
                }
            },
        }
        diagnostics.extend(outcome.diagnostics);
    }
}

/// State record of an instance, or `None` once it has no id
fn to_record(d: ResourceData, depends_on: Vec<String>) -> Option<StateRecord> {
    let type_name = d.type_name().to_string();
    let (id, attributes) = d.into_parts();
    id.map(|id| StateRecord {
        type_name,
        id: Some(id),
        attributes,
        depends_on,
    })
}
