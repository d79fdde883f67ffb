//! Field discovery for mounted resources.
//!
//! Changing the mounted resources starts a new discovery generation. Fetches run
//! concurrently and may finish in any order; a response is applied only if its
//! [`DiscoveryTicket`] still carries the session's current generation, so the most
//! recent selection always wins. The selection itself is only mounted once its
//! fields are applied, so a failed fetch leaves the session as it was.

use futures_util::future::join_all;
use rescat_api::{ApiError, CatalogBackend};
use rescat_types::{BackingResource, RawField, ResourceType};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    reconcile::{FieldIntake, reconcile},
    session::WizardSession,
};

/// Proof that a discovery was started for a given resource selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryTicket {
    generation: u64,
    resources: Vec<BackingResource>,
}

impl DiscoveryTicket {
    pub fn resources(&self) -> &[BackingResource] {
        &self.resources
    }
}

/// What happened to a discovery response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DiscoveryOutcome {
    Applied { rows: usize, unmapped: usize },
    /// A newer selection superseded the ticket; the session is unchanged.
    Stale { ticket: u64, current: u64 },
}

impl WizardSession {
    /// Starts a new discovery generation for `resources`.
    ///
    /// The mounted resources are left alone until [`WizardSession::apply_discovery`]
    /// accepts the ticket.
    pub fn begin_discovery(&mut self, resources: Vec<BackingResource>) -> DiscoveryTicket {
        self.generation += 1;
        debug!(generation = self.generation, resources = resources.len(), "started field discovery");
        DiscoveryTicket {
            generation: self.generation,
            resources,
        }
    }

    /// Mounts the ticket's resources and reconciles their fields unless the ticket is stale.
    pub fn apply_discovery(&mut self, ticket: &DiscoveryTicket, fields: Vec<RawField>, intake: FieldIntake) -> DiscoveryOutcome {
        if ticket.generation != self.generation {
            warn!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale field discovery"
            );
            return DiscoveryOutcome::Stale {
                ticket: ticket.generation,
                current: self.generation,
            };
        }

        self.set_mount_resources(ticket.resources.clone());
        let merged = reconcile(&fields, self.table.items(), &self.persisted_columns, intake);
        let outcome = DiscoveryOutcome::Applied {
            rows: merged.items.len(),
            unmapped: merged.unmapped.len(),
        };
        self.table.replace_items(merged.items);
        self.table.set_field_options(fields.clone());
        self.raw_fields = fields;
        info!(generation = self.generation, ?outcome, "applied field discovery");
        outcome
    }
}

/// Fetches the fields of every mounted resource concurrently, in mount order.
///
/// Files have no field schema and are skipped. The first failure is returned.
pub async fn discover_fields(backend: &dyn CatalogBackend, resources: &[BackingResource]) -> Result<Vec<RawField>, ApiError> {
    let requests = resources
        .iter()
        .filter(|resource| resource.resource_type != ResourceType::File)
        .map(|resource| backend.fetch_resource_fields(resource));
    let responses = join_all(requests).await;

    let mut fields = Vec::new();
    for response in responses {
        fields.extend(response?);
    }
    debug!(resources = resources.len(), fields = fields.len(), "discovered resource fields");
    Ok(fields)
}

/// Mounts `resources` and reconciles their fields into the session in one go.
pub async fn mount_and_discover(
    session: &mut WizardSession,
    backend: &dyn CatalogBackend,
    resources: Vec<BackingResource>,
) -> Result<DiscoveryOutcome, ApiError> {
    let ticket = session.begin_discovery(resources);
    let fields = discover_fields(backend, ticket.resources()).await?;
    let intake = session.field_intake();
    Ok(session.apply_discovery(&ticket, fields, intake))
}
