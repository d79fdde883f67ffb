//! Assembling and sending the catalog payload.
//!
//! [`plan_submission`] decides between create, update, and a change audit, and
//! [`submit`] performs the chosen call. Backend failures become a [`Notice`]: a
//! handful of error codes get bespoke follow-ups, the rest go through the generic
//! formatter.

use std::collections::BTreeSet;

use rescat_api::{ApiError, CatalogBackend, codes};
use rescat_types::{CatalogBaseInfo, CatalogPayload, ColumnPayload, InformationItem, ItemAttribute, MountResourceRef};
use rescat_util::{Notice, NoticeAction, format_api_error};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::session::WizardSession;

/// Route the console returns to when catalog changes cannot be audited.
pub const CATALOG_LIST_ROUTE: &str = "/data-catalog/catalogs";

/// Column attributes compared to decide whether a published entry changed.
const COLUMN_DIFF_KEYS: [ItemAttribute; 17] = [
    ItemAttribute::BusinessName,
    ItemAttribute::TechnicalName,
    ItemAttribute::SourceId,
    ItemAttribute::DataType,
    ItemAttribute::DataLength,
    ItemAttribute::DataPrecision,
    ItemAttribute::DataRange,
    ItemAttribute::SharedType,
    ItemAttribute::SharedCondition,
    ItemAttribute::OpenType,
    ItemAttribute::OpenCondition,
    ItemAttribute::SensitiveFlag,
    ItemAttribute::ClassifiedFlag,
    ItemAttribute::PrimaryFlag,
    ItemAttribute::TimestampFlag,
    ItemAttribute::StandardCode,
    ItemAttribute::CodeTableId,
];

/// Backend call chosen for a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitAction {
    Create,
    Update { catalog_id: String },
    /// The entry was published and changed; the edit goes through a new audit flow.
    Audit { catalog_id: String },
}

/// Parts of an entry that differ from the loaded snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub columns: bool,
    pub categories: bool,
    pub base_info: bool,
}

impl ChangeSet {
    pub fn any(&self) -> bool {
        self.columns || self.categories || self.base_info
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPlan {
    pub action: SubmitAction,
    pub changes: ChangeSet,
    pub payload: CatalogPayload,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub catalog_id: String,
    pub action: SubmitAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<String>,
    pub notice: Notice,
}

/// A failed submission together with the notice to show.
#[derive(Debug, Clone, Error)]
#[error("{}", .notice.message)]
pub struct SubmitError {
    pub notice: Notice,
    #[source]
    pub source: ApiError,
}

/// Builds the payload from the session and picks the backend call.
///
/// Staged drafts always create or update in place; only a full submission of a
/// published entry that changed since it was loaded opens an audit.
pub fn plan_submission(session: &WizardSession, draft: bool) -> SubmissionPlan {
    let payload = build_payload(session, draft);
    let changes = changed_since_snapshot(session);
    let action = match session.catalog_id.clone() {
        None => SubmitAction::Create,
        Some(catalog_id) if !draft && session.publish_status.was_published() && changes.any() => {
            SubmitAction::Audit { catalog_id }
        }
        Some(catalog_id) => SubmitAction::Update { catalog_id },
    };
    info!(?action, draft, changed = changes.any(), "planned catalog submission");
    SubmissionPlan { action, changes, payload }
}

fn build_payload(session: &WizardSession, draft: bool) -> CatalogPayload {
    let columns = if session.all_files() {
        Vec::new()
    } else {
        session
            .table
            .selected()
            .enumerate()
            .map(|(index, item)| ColumnPayload::from_item(index, item))
            .collect()
    };
    let mut base_info = session.base_info.clone();
    base_info.name = base_info.name.trim().to_string();

    CatalogPayload {
        id: session.catalog_id.clone(),
        base_info,
        columns,
        mount_resources: session.mount_resources().iter().map(MountResourceRef::from).collect(),
        schedule_plan: session
            .schedule_plan
            .clone()
            .filter(|_| session.schedule_plan_applies()),
        draft,
    }
}

/// Diffs the session against the snapshot taken when the entry was loaded.
///
/// Without a snapshot the entry is new and everything counts as changed.
pub fn changed_since_snapshot(session: &WizardSession) -> ChangeSet {
    let Some(snapshot) = &session.snapshot else {
        return ChangeSet {
            columns: true,
            categories: true,
            base_info: true,
        };
    };
    let current: Vec<&InformationItem> = session.table.selected().collect();
    ChangeSet {
        columns: columns_differ(&current, &snapshot.columns),
        categories: category_set(&session.base_info) != category_set(&snapshot.base_info),
        base_info: base_info_differs(&session.base_info, &snapshot.base_info),
    }
}

fn columns_differ(current: &[&InformationItem], loaded: &[InformationItem]) -> bool {
    if current.len() != loaded.len() {
        return true;
    }
    current.iter().zip(loaded).any(|(now, before)| {
        now.id != before.id
            || COLUMN_DIFF_KEYS
                .iter()
                .any(|attribute| now.attribute_text(*attribute) != before.attribute_text(*attribute))
    })
}

fn category_set(info: &CatalogBaseInfo) -> BTreeSet<&str> {
    info.category_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()).collect()
}

fn base_info_differs(now: &CatalogBaseInfo, before: &CatalogBaseInfo) -> bool {
    fn text(value: &Option<String>) -> &str {
        value.as_deref().map(str::trim).unwrap_or("")
    }
    now.name.trim() != before.name.trim()
        || text(&now.description) != text(&before.description)
        || text(&now.department_id) != text(&before.department_id)
        || text(&now.data_grade_id) != text(&before.data_grade_id)
        || now.update_cycle != before.update_cycle
        || now.shared_type != before.shared_type
        || text(&now.shared_condition) != text(&before.shared_condition)
        || now.open_type != before.open_type
        || text(&now.open_condition) != text(&before.open_condition)
}

/// Sends a planned submission.
pub async fn submit(backend: &dyn CatalogBackend, plan: &SubmissionPlan) -> Result<SubmitReceipt, SubmitError> {
    let fail = |source: ApiError| {
        let notice = classify_failure(&source);
        warn!(error = %source, action = ?plan.action, "catalog submission failed");
        SubmitError { notice, source }
    };

    let receipt = match &plan.action {
        SubmitAction::Create => {
            let catalog_id = backend.create_catalog(&plan.payload).await.map_err(fail)?;
            SubmitReceipt {
                catalog_id,
                action: plan.action.clone(),
                audit_id: None,
                notice: Notice::success(if plan.payload.draft { "Draft saved" } else { "Catalog created" }),
            }
        }
        SubmitAction::Update { catalog_id } => {
            backend.update_catalog(catalog_id, &plan.payload).await.map_err(fail)?;
            SubmitReceipt {
                catalog_id: catalog_id.clone(),
                action: plan.action.clone(),
                audit_id: None,
                notice: Notice::success(if plan.payload.draft { "Draft saved" } else { "Catalog updated" }),
            }
        }
        SubmitAction::Audit { catalog_id } => {
            let audit_id = backend.create_audit_flow(catalog_id, &plan.payload).await.map_err(fail)?;
            SubmitReceipt {
                catalog_id: catalog_id.clone(),
                action: plan.action.clone(),
                audit_id: Some(audit_id),
                notice: Notice::success("Changes submitted for audit"),
            }
        }
    };
    info!(catalog_id = %receipt.catalog_id, action = ?receipt.action, "submitted catalog");
    Ok(receipt)
}

/// Discards unpublished edits after the user confirms the restore prompt.
pub async fn restore_published(backend: &dyn CatalogBackend, catalog_id: &str) -> Result<Notice, SubmitError> {
    backend.cancel_audit_flow(catalog_id).await.map_err(|source| SubmitError {
        notice: classify_failure(&source),
        source,
    })?;
    info!(catalog_id, "restored catalog to published content");
    Ok(Notice::success("Restored to the published content"))
}

/// Maps a backend failure to the notice the console shows.
pub fn classify_failure(error: &ApiError) -> Notice {
    match error.code() {
        Some(codes::AUDIT_PROCESS_NOT_FOUND) => Notice::error("No audit process is configured for catalog changes").with_action(
            NoticeAction::Redirect {
                route: CATALOG_LIST_ROUTE.to_string(),
            },
        ),
        Some(codes::RESTORE_TO_PUBLISHED) => Notice::error(format_api_error(error)).with_action(NoticeAction::ConfirmRestore),
        _ => Notice::error(format_api_error(error)),
    }
}
