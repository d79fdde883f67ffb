//! Catalog-level models: base information, schedule plans, and the payloads exchanged
//! with the catalog endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BackingResource, ClassifiedFlag, DataType, InformationItem, OpenType, ResourceType, SensitiveFlag, SharedType};

pub mod lookup;

/// How often the catalog's underlying data is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCycle {
    RealTime,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Other,
}

/// Catalog metadata collected in the last wizard step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogBaseInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Department that owns the catalog entry.
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    /// Data-grade label applied to the whole entry.
    #[serde(default)]
    pub data_grade_id: Option<String>,
    #[serde(default)]
    pub update_cycle: Option<UpdateCycle>,
    #[serde(default)]
    pub shared_type: Option<SharedType>,
    #[serde(default)]
    pub shared_condition: Option<String>,
    #[serde(default)]
    pub open_type: Option<OpenType>,
    #[serde(default)]
    pub open_condition: Option<String>,
}

/// Synchronisation plan for data-view backed catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchedulePlan {
    /// Run a single synchronisation at `start`.
    Once { start: DateTime<Utc> },
    /// Run on a cron schedule between `start` and the optional `end`.
    Periodic {
        cron: String,
        start: DateTime<Utc>,
        #[serde(default)]
        end: Option<DateTime<Utc>>,
    },
}

/// Publication state of an existing catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    #[default]
    Unpublished,
    Auditing,
    Published,
    Rejected,
}

impl PublishStatus {
    /// Whether edits to the entry must go through an audit flow.
    pub fn was_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Catalog entry as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDetail {
    pub id: String,
    #[serde(flatten)]
    pub base_info: CatalogBaseInfo,
    #[serde(default)]
    pub columns: Vec<InformationItem>,
    #[serde(default)]
    pub mount_resources: Vec<BackingResource>,
    #[serde(default)]
    pub schedule_plan: Option<SchedulePlan>,
    #[serde(default)]
    pub publish_status: PublishStatus,
}

/// Reference to a mounted resource inside a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountResourceRef {
    pub resource_id: String,
    pub resource_type: ResourceType,
}

impl From<&BackingResource> for MountResourceRef {
    fn from(resource: &BackingResource) -> Self {
        Self {
            resource_id: resource.resource_id.clone(),
            resource_type: resource.resource_type,
        }
    }
}

/// One information item as submitted. Draft rows carry no id; the server issues one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Position in the submitted list, after any drag reordering.
    pub index: usize,
    pub business_name: String,
    pub technical_name: String,
    pub source_id: Option<String>,
    pub data_type: Option<DataType>,
    pub data_length: Option<u32>,
    pub data_precision: Option<u32>,
    pub data_range: Option<String>,
    pub shared_type: Option<SharedType>,
    pub shared_condition: Option<String>,
    pub open_type: Option<OpenType>,
    pub open_condition: Option<String>,
    pub sensitive_flag: Option<SensitiveFlag>,
    pub classified_flag: Option<ClassifiedFlag>,
    pub primary_flag: bool,
    pub timestamp_flag: bool,
    pub standard_code: Option<String>,
    pub code_table_id: Option<String>,
    pub source_system: Option<String>,
    pub source_system_level: Option<String>,
    pub description: Option<String>,
}

impl ColumnPayload {
    pub fn from_item(index: usize, item: &InformationItem) -> Self {
        Self {
            id: item.id.persisted().map(str::to_string),
            index,
            business_name: item.business_name.trim().to_string(),
            technical_name: item.technical_name.trim().to_string(),
            source_id: item.source_id.clone(),
            data_type: item.data_type,
            data_length: item.data_length,
            data_precision: item.data_precision,
            data_range: item.data_range.clone(),
            shared_type: item.shared_type,
            shared_condition: item.shared_condition.clone(),
            open_type: item.open_type,
            open_condition: item.open_condition.clone(),
            sensitive_flag: item.sensitive_flag,
            classified_flag: item.classified_flag,
            primary_flag: item.primary_flag,
            timestamp_flag: item.timestamp_flag,
            standard_code: item.standard_code.clone(),
            code_table_id: item.code_table_id.clone(),
            source_system: item.source_system.clone(),
            source_system_level: item.source_system_level.clone(),
            description: item.description.clone(),
        }
    }
}

/// Body of the create and update catalog calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub base_info: CatalogBaseInfo,
    pub columns: Vec<ColumnPayload>,
    pub mount_resources: Vec<MountResourceRef>,
    #[serde(default)]
    pub schedule_plan: Option<SchedulePlan>,
    /// Staged drafts skip server-side completeness checks.
    #[serde(default)]
    pub draft: bool,
}
