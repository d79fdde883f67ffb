//! Explicit state shared by the wizard steps.
//!
//! Each step borrows the [`WizardSession`] and touches only the fields it owns:
//! the mount step writes `mount_resources` and `raw_fields`, the item step writes
//! `table`, and the base-info step writes `base_info` and `schedule_plan`.

use chrono::{DateTime, Utc};
use futures_util::future::join;
use rescat_api::{ApiError, CatalogBackend};
use rescat_types::{
    BackingResource, CatalogBaseInfo, CatalogDetail, InformationItem, PublishStatus, RawField, ResourceType, SchedulePlan,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{reconcile::FieldIntake, table::InfoItemTable, validation::ValidationContext};

/// Rule set selector derived from the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMode {
    /// At least one resource is mounted.
    #[default]
    WithResource,
    /// No resource is mounted; rows are authored by hand.
    Empty,
    /// Government deployment with at least one resource mounted: source-system
    /// attributes are required on every row.
    Government,
}

/// Catalog state as it was when the session was loaded, used to detect changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub base_info: CatalogBaseInfo,
    pub columns: Vec<InformationItem>,
    pub loaded_at: DateTime<Utc>,
}

/// In-progress catalog entry being created or edited.
#[derive(Debug, Clone, Default)]
pub struct WizardSession {
    /// Enables the government rule set.
    pub government: bool,
    /// Requires a primary-key row and a timestamp row.
    pub primary_required: bool,
    /// Server id when editing an existing entry.
    pub catalog_id: Option<String>,
    pub publish_status: PublishStatus,
    mount_resources: Vec<BackingResource>,
    /// Fields discovered from the mounted resources.
    pub raw_fields: Vec<RawField>,
    pub table: InfoItemTable,
    pub base_info: CatalogBaseInfo,
    pub schedule_plan: Option<SchedulePlan>,
    pub snapshot: Option<CatalogSnapshot>,
    /// Columns as persisted, used to carry attributes forward by name.
    pub persisted_columns: Vec<InformationItem>,
    pub(crate) generation: u64,
}

impl WizardSession {
    pub fn new(government: bool, primary_required: bool) -> Self {
        let mut session = Self {
            government,
            primary_required,
            ..Self::default()
        };
        session.table.set_allow_manual_rows(true);
        session
    }

    /// Starts an edit session from a loaded catalog entry.
    pub fn from_detail(detail: CatalogDetail, government: bool, primary_required: bool) -> Self {
        let snapshot = CatalogSnapshot {
            base_info: detail.base_info.clone(),
            columns: detail.columns.clone(),
            loaded_at: Utc::now(),
        };
        let mut session = Self {
            government,
            primary_required,
            catalog_id: Some(detail.id),
            publish_status: detail.publish_status,
            base_info: detail.base_info,
            schedule_plan: detail.schedule_plan,
            snapshot: Some(snapshot),
            persisted_columns: detail.columns.clone(),
            ..Self::default()
        };
        session.table = InfoItemTable::new(detail.columns);
        session.set_mount_resources(detail.mount_resources);
        session
    }

    pub fn mount_resources(&self) -> &[BackingResource] {
        &self.mount_resources
    }

    /// Replaces the mounted resources without touching discovery state.
    pub(crate) fn set_mount_resources(&mut self, resources: Vec<BackingResource>) {
        self.table.set_allow_manual_rows(resources.is_empty());
        self.mount_resources = resources;
    }

    pub fn has_backing_resource(&self) -> bool {
        !self.mount_resources.is_empty()
    }

    /// Whether every mounted resource is a file, in which case the item step is skipped.
    pub fn all_files(&self) -> bool {
        self.has_backing_resource()
            && self
                .mount_resources
                .iter()
                .all(|resource| resource.resource_type == ResourceType::File)
    }

    /// Whether the mount step shows the schedule plan form.
    pub fn schedule_plan_applies(&self) -> bool {
        self.mount_resources
            .iter()
            .any(|resource| resource.resource_type == ResourceType::DataView)
    }

    /// Rule set for the current session. Without mounted resources every catalog is
    /// empty, government deployments included.
    pub fn mode(&self) -> CatalogMode {
        match (self.has_backing_resource(), self.government) {
            (false, _) => CatalogMode::Empty,
            (true, true) => CatalogMode::Government,
            (true, false) => CatalogMode::WithResource,
        }
    }

    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            mode: self.mode(),
            primary_required: self.primary_required,
            has_backing_resource: self.has_backing_resource(),
        }
    }

    /// How newly discovered fields enter the table.
    pub fn field_intake(&self) -> FieldIntake {
        if self.catalog_id.is_some() {
            FieldIntake::Modify
        } else {
            FieldIntake::Import
        }
    }

    /// Serializable copy of the session.
    pub fn to_draft(&self) -> WizardDraft {
        WizardDraft {
            catalog_id: self.catalog_id.clone(),
            publish_status: self.publish_status,
            government: self.government,
            primary_required: self.primary_required,
            mount_resources: self.mount_resources.clone(),
            raw_fields: self.raw_fields.clone(),
            items: self.table.items().to_vec(),
            base_info: self.base_info.clone(),
            schedule_plan: self.schedule_plan.clone(),
            snapshot: self.snapshot.clone(),
        }
    }
}

/// Opens an existing catalog entry for editing.
///
/// The detail and the cataloged columns are fetched together; the column endpoint is
/// authoritative for the rows and for the change-detection snapshot.
pub async fn load_session(
    backend: &dyn CatalogBackend,
    catalog_id: &str,
    government: bool,
    primary_required: bool,
) -> Result<WizardSession, ApiError> {
    let (detail, columns) = join(backend.fetch_catalog(catalog_id), backend.fetch_catalog_columns(catalog_id)).await;
    let mut detail = detail?;
    detail.columns = columns?;
    info!(
        catalog_id,
        columns = detail.columns.len(),
        resources = detail.mount_resources.len(),
        "loaded catalog for editing"
    );
    Ok(WizardSession::from_detail(detail, government, primary_required))
}

/// On-disk form of a [`WizardSession`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardDraft {
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub publish_status: PublishStatus,
    #[serde(default)]
    pub government: bool,
    #[serde(default)]
    pub primary_required: bool,
    #[serde(default)]
    pub mount_resources: Vec<BackingResource>,
    #[serde(default)]
    pub raw_fields: Vec<RawField>,
    #[serde(default)]
    pub items: Vec<InformationItem>,
    #[serde(default)]
    pub base_info: CatalogBaseInfo,
    #[serde(default)]
    pub schedule_plan: Option<SchedulePlan>,
    #[serde(default)]
    pub snapshot: Option<CatalogSnapshot>,
}

impl From<WizardDraft> for WizardSession {
    fn from(draft: WizardDraft) -> Self {
        let persisted_columns = draft
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.columns.clone())
            .unwrap_or_default();
        let mut session = Self {
            government: draft.government,
            primary_required: draft.primary_required,
            catalog_id: draft.catalog_id,
            publish_status: draft.publish_status,
            raw_fields: draft.raw_fields,
            base_info: draft.base_info,
            schedule_plan: draft.schedule_plan,
            snapshot: draft.snapshot,
            persisted_columns,
            ..Self::default()
        };
        session.table = InfoItemTable::new(draft.items);
        session.table.set_field_options(session.raw_fields.clone());
        session.set_mount_resources(draft.mount_resources);
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescat_types::{ItemAttribute, RowId};

    fn detail(resources: Vec<BackingResource>) -> CatalogDetail {
        let mut column = InformationItem::new(RowId::Persisted("c1".into()));
        column.business_name = "姓名".into();
        column.technical_name = "name".into();
        CatalogDetail {
            id: "cat-1".into(),
            base_info: CatalogBaseInfo {
                name: "人口信息".into(),
                ..CatalogBaseInfo::default()
            },
            columns: vec![column],
            mount_resources: resources,
            schedule_plan: None,
            publish_status: PublishStatus::Published,
        }
    }

    #[test]
    fn mode_follows_mounted_resources() {
        let mut session = WizardSession::new(false, false);
        assert_eq!(session.mode(), CatalogMode::Empty);
        assert!(session.table.allows_manual_rows());

        session.set_mount_resources(vec![BackingResource::new("v1", ResourceType::DataView, "人口视图")]);
        assert_eq!(session.mode(), CatalogMode::WithResource);
        assert!(!session.table.allows_manual_rows());
        assert!(session.schedule_plan_applies());

        session.government = true;
        assert_eq!(session.validation_context().mode, CatalogMode::Government);
        assert!(session.validation_context().has_backing_resource);
    }

    #[test]
    fn government_sessions_without_resources_use_the_empty_rules() {
        let mut session = WizardSession::new(true, false);
        assert_eq!(session.mode(), CatalogMode::Empty);

        session.table.add_row().expect("manual row");
        let context = session.validation_context();
        let report = session.table.validate(&context);
        let tips = &report.list[0].error_tips;
        assert!(tips.contains_key(&ItemAttribute::DataType));
        assert!(!tips.contains_key(&ItemAttribute::SourceSystem));

        session.set_mount_resources(vec![BackingResource::new("v1", ResourceType::DataView, "人口视图")]);
        assert_eq!(session.mode(), CatalogMode::Government);
    }

    #[test]
    fn file_only_sessions_are_detected() {
        let mut session = WizardSession::new(false, false);
        assert!(!session.all_files());
        session.set_mount_resources(vec![
            BackingResource::new("f1", ResourceType::File, "a.csv"),
            BackingResource::new("f2", ResourceType::File, "b.csv"),
        ]);
        assert!(session.all_files());
        assert!(!session.schedule_plan_applies());
    }

    #[test]
    fn detail_sessions_keep_a_snapshot() {
        let session = WizardSession::from_detail(
            detail(vec![BackingResource::new("v1", ResourceType::DataView, "人口视图")]),
            false,
            false,
        );
        assert_eq!(session.field_intake(), FieldIntake::Modify);
        let snapshot = session.snapshot.as_ref().expect("snapshot");
        assert_eq!(snapshot.columns.len(), 1);
        assert_eq!(session.persisted_columns.len(), 1);
        assert_eq!(session.table.len(), 1);
    }

    #[test]
    fn drafts_round_trip_through_the_session() {
        let session = WizardSession::from_detail(detail(Vec::new()), true, true);
        let draft = session.to_draft();
        let restored = WizardSession::from(draft.clone());
        assert_eq!(restored.to_draft(), draft);
        assert!(restored.table.allows_manual_rows());
    }
}
