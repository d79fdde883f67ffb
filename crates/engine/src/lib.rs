//! # Rescat Engine
//!
//! The Rescat Engine drives the resource cataloging wizard: mount backing resources,
//! edit the information items derived from their fields, fill in the catalog's base
//! information, then submit.
//!
//! ## Key Features
//!
//! - **Field Reconciliation**: Merges discovered raw fields into edited rows without losing edits
//! - **Validation**: A static rule table per catalog mode, with per-cell messages and error navigation
//! - **Editing**: Typed single-row and batch edits with the no-share / not-open cascade
//! - **Orchestration**: Step gating, draft staging, and create / update / audit submission
//!
//! ## Usage
//!
//! ```rust
//! use rescat_engine::{FieldIntake, reconcile, validate, ValidationContext, CatalogMode};
//! use rescat_types::RawField;
//!
//! let fields: Vec<RawField> = serde_json::from_str(r#"[
//!     {"id": "f1", "business_name": "姓名", "technical_name": "name", "data_type": "int"},
//!     {"id": "f2", "business_name": "年龄", "technical_name": "age", "data_type": "int"}
//! ]"#)?;
//!
//! let merged = reconcile(&fields, &[], &[], FieldIntake::Import);
//! assert_eq!(merged.items.len(), 2);
//!
//! let context = ValidationContext {
//!     mode: CatalogMode::WithResource,
//!     primary_required: false,
//!     has_backing_resource: true,
//! };
//! let report = validate(merged.items, &context);
//! // Classification attributes are still unset.
//! assert!(!report.validate_status);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`session`**: The explicit state shared by the wizard steps
//! - **`discovery`**: Concurrent field discovery guarded by generation tickets
//! - **`reconcile`**: Raw field / information item merge
//! - **`validation`**: Rule table, validation report, and error navigator
//! - **`table`**: Row operations and typed edits
//! - **`forms`**: Schedule plan and base-info form checks
//! - **`wizard`**: Step orchestration
//! - **`submission`**: Payload assembly, change detection, and failure notices
//! - **`draft`**: Draft files on disk

pub mod discovery;
pub mod draft;
pub mod forms;
pub mod reconcile;
pub mod session;
pub mod submission;
pub mod table;
pub mod validation;
pub mod wizard;

// Re-export commonly used types for convenience
pub use discovery::{DiscoveryOutcome, DiscoveryTicket, discover_fields, mount_and_discover};
pub use draft::{load_document, load_draft, load_raw_fields, save_document, save_draft};
pub use forms::{FormErrors, FormField, validate_base_info, validate_base_info_refs, validate_catalog_name, validate_schedule_plan};
pub use reconcile::{FieldIntake, Reconciled, reconcile};
pub use session::{CatalogMode, CatalogSnapshot, WizardDraft, WizardSession, load_session};
pub use submission::{
    ChangeSet, SubmissionPlan, SubmitAction, SubmitError, SubmitReceipt, changed_since_snapshot, classify_failure, plan_submission,
    restore_published, submit,
};
pub use table::{ColumnSummary, EditError, InfoItemTable, ItemEdit};
pub use validation::{ErrorLocation, ErrorNavigator, ValidationContext, ValidationReport, validate, validate_row};
pub use wizard::{BaseInfoLookups, StepBlock, StepOutcome, Wizard, WizardError, WizardStep};
