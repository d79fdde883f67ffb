//! Backend error codes that the console reacts to with bespoke behaviour.
//!
//! Every other code is rendered through the generic formatter.

/// No audit process definition is bound to catalog publishing.
pub const AUDIT_PROCESS_NOT_FOUND: &str = "DataCatalog.Public.AuditProcessNotExist";

/// The edited entry diverged from its published content and must be restored first.
pub const RESTORE_TO_PUBLISHED: &str = "DataCatalog.Public.ResourceNeedRestore";

/// Another catalog entry already uses the submitted name.
pub const CATALOG_NAME_REPEAT: &str = "DataCatalog.Public.NameRepeat";

/// A mounted resource was deleted after it was selected.
pub const RESOURCE_NOT_FOUND: &str = "DataCatalog.Public.ResourceNotExist";
