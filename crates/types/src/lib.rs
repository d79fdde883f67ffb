//! Strongly typed data model shared by the catalog API client, the wizard engine, and the CLI.
//!
//! The types here describe three layers of field data:
//!
//! - [`BackingResource`]: a database view, API, or file mounted onto a catalog entry.
//! - [`RawField`]: a column or parameter reported by a backing resource's own schema.
//! - [`InformationItem`]: the catalog-facing, user-editable field definition that may
//!   reference one raw field through `source_id`.

use std::{borrow::Cow, error::Error, fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod catalog;

pub use catalog::{
    CatalogBaseInfo, CatalogDetail, CatalogPayload, ColumnPayload, MountResourceRef, PublishStatus, SchedulePlan, UpdateCycle,
    lookup::{DepartmentNode, LabelNode, TreeNode},
};

/// Kind of resource that can back a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// A database view registered in the data-view module.
    DataView,
    /// A registered REST interface.
    Api,
    /// An uploaded file resource. Files expose no field schema.
    File,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataView => "data_view",
            Self::Api => "api",
            Self::File => "file",
        }
    }
}

impl FromStr for ResourceType {
    type Err = ParseResourceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_view" | "dataview" | "view" => Ok(Self::DataView),
            "api" | "interface" => Ok(Self::Api),
            "file" => Ok(Self::File),
            _ => Err(ParseResourceTypeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResourceTypeError(String);

impl fmt::Display for ParseResourceTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid resource type '{}'; expected 'data_view', 'api' or 'file'", self.0)
    }
}

impl Error for ParseResourceTypeError {}

/// A resource mounted onto the catalog entry in the first wizard step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingResource {
    /// Identifier issued by the module that owns the resource.
    pub resource_id: String,
    pub resource_type: ResourceType,
    /// Display name shown in the resource tree.
    #[serde(default)]
    pub name: String,
    /// Owning department, when the resource declares one.
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub technical_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BackingResource {
    pub fn new(resource_id: impl Into<String>, resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_type,
            name: name.into(),
            department_id: None,
            technical_name: None,
            description: None,
        }
    }
}

/// Data type of a field as understood by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Char,
    Decimal,
    Int,
    Date,
    Datetime,
    Bool,
    Binary,
    Other,
}

impl DataType {
    /// Maps a source-system column type (`varchar`, `bigint`, `timestamp`, ...) onto the catalog types.
    pub fn from_source_type(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        // Strip any length suffix such as `varchar(32)`.
        let base = lowered.split('(').next().unwrap_or_default().trim();
        match base {
            "char" | "varchar" | "nvarchar" | "string" | "text" | "longtext" | "clob" => Self::Char,
            "decimal" | "numeric" | "number" | "float" | "double" | "real" => Self::Decimal,
            "int" | "integer" | "bigint" | "smallint" | "tinyint" | "long" => Self::Int,
            "date" => Self::Date,
            "datetime" | "timestamp" | "time" => Self::Datetime,
            "bool" | "boolean" => Self::Bool,
            "binary" | "varbinary" | "blob" | "bytes" => Self::Binary,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Decimal => "decimal",
            Self::Int => "int",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Bool => "bool",
            Self::Binary => "binary",
            Self::Other => "other",
        }
    }

    /// Whether the type carries a user-supplied length.
    pub fn requires_length(&self) -> bool {
        matches!(self, Self::Char | Self::Decimal)
    }
}

/// Sharing attribute of an information item or catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharedType {
    Unconditional,
    #[serde(rename = "CONDITION")]
    Conditional,
    #[serde(rename = "NOSHARE")]
    NoShare,
}

impl SharedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconditional => "UNCONDITIONAL",
            Self::Conditional => "CONDITION",
            Self::NoShare => "NOSHARE",
        }
    }
}

/// Openness attribute of an information item or catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpenType {
    Unconditional,
    #[serde(rename = "CONDITION")]
    Conditional,
    #[serde(rename = "NOOPEN")]
    NotOpen,
}

impl OpenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconditional => "UNCONDITIONAL",
            Self::Conditional => "CONDITION",
            Self::NotOpen => "NOOPEN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveFlag {
    Sensitive,
    Insensitive,
}

impl SensitiveFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sensitive => "sensitive",
            Self::Insensitive => "insensitive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifiedFlag {
    Classified,
    Unclassified,
}

impl ClassifiedFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classified => "classified",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Identity of an information item row.
///
/// Rows loaded from the server carry the server-issued id; rows added in the
/// editor carry a draft index until the catalog is saved. On the wire drafts are
/// rendered as `a-<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RowId {
    Persisted(String),
    Draft(usize),
}

impl RowId {
    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft(_))
    }

    /// Server id to submit, if the row has already been persisted.
    pub fn persisted(&self) -> Option<&str> {
        match self {
            Self::Persisted(id) => Some(id),
            Self::Draft(_) => None,
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persisted(id) => f.write_str(id),
            Self::Draft(index) => write!(f, "a-{}", index),
        }
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        if let Some(index) = value.strip_prefix("a-").and_then(|digits| digits.parse::<usize>().ok()) {
            return Self::Draft(index);
        }
        Self::Persisted(value)
    }
}

impl From<RowId> for String {
    fn from(value: RowId) -> Self {
        value.to_string()
    }
}

/// Editable attribute of an information item, in table column order.
///
/// Used as the key of [`ErrorTips`] so per-cell errors keep column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemAttribute {
    BusinessName,
    TechnicalName,
    SourceId,
    DataType,
    DataLength,
    DataPrecision,
    DataRange,
    SharedType,
    SharedCondition,
    OpenType,
    OpenCondition,
    SensitiveFlag,
    ClassifiedFlag,
    PrimaryFlag,
    TimestampFlag,
    StandardCode,
    CodeTableId,
    SourceSystem,
    SourceSystemLevel,
    Description,
}

impl ItemAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessName => "business_name",
            Self::TechnicalName => "technical_name",
            Self::SourceId => "source_id",
            Self::DataType => "data_type",
            Self::DataLength => "data_length",
            Self::DataPrecision => "data_precision",
            Self::DataRange => "data_range",
            Self::SharedType => "shared_type",
            Self::SharedCondition => "shared_condition",
            Self::OpenType => "open_type",
            Self::OpenCondition => "open_condition",
            Self::SensitiveFlag => "sensitive_flag",
            Self::ClassifiedFlag => "classified_flag",
            Self::PrimaryFlag => "primary_flag",
            Self::TimestampFlag => "timestamp_flag",
            Self::StandardCode => "standard_code",
            Self::CodeTableId => "code_table_id",
            Self::SourceSystem => "source_system",
            Self::SourceSystemLevel => "source_system_level",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for ItemAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-cell validation messages of one row, keyed by attribute in column order.
pub type ErrorTips = IndexMap<ItemAttribute, String>;

/// A field as reported by a backing resource's schema. Read-only from the console's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    pub id: String,
    /// Resource the field was discovered on.
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub technical_name: String,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub data_length: Option<u32>,
    #[serde(default)]
    pub data_precision: Option<u32>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl RawField {
    /// De-duplication key shared with [`InformationItem::name_key`].
    pub fn name_key(&self) -> (&str, &str) {
        (self.technical_name.as_str(), self.business_name.as_str())
    }
}

/// Catalog-facing field definition edited in the information item table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationItem {
    pub id: RowId,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub technical_name: String,
    /// Raw field this item is mapped onto. Lookup only.
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub data_length: Option<u32>,
    #[serde(default)]
    pub data_precision: Option<u32>,
    #[serde(default)]
    pub data_range: Option<String>,
    #[serde(default)]
    pub shared_type: Option<SharedType>,
    #[serde(default)]
    pub shared_condition: Option<String>,
    #[serde(default)]
    pub open_type: Option<OpenType>,
    #[serde(default)]
    pub open_condition: Option<String>,
    #[serde(default)]
    pub sensitive_flag: Option<SensitiveFlag>,
    #[serde(default)]
    pub classified_flag: Option<ClassifiedFlag>,
    #[serde(default)]
    pub primary_flag: bool,
    #[serde(default)]
    pub timestamp_flag: bool,
    /// Linked data standard.
    #[serde(default)]
    pub standard_code: Option<String>,
    /// Linked code table.
    #[serde(default)]
    pub code_table_id: Option<String>,
    #[serde(default)]
    pub source_system: Option<String>,
    #[serde(default)]
    pub source_system_level: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the row counts toward the catalog submission.
    #[serde(default = "selected_by_default", rename = "isSelectedFlag")]
    pub is_selected: bool,
    #[serde(default, rename = "errorTips", skip_serializing_if = "IndexMap::is_empty")]
    pub error_tips: ErrorTips,
}

fn selected_by_default() -> bool {
    true
}

impl InformationItem {
    /// Creates an empty row with the given identity.
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            business_name: String::new(),
            technical_name: String::new(),
            source_id: None,
            data_type: None,
            data_length: None,
            data_precision: None,
            data_range: None,
            shared_type: None,
            shared_condition: None,
            open_type: None,
            open_condition: None,
            sensitive_flag: None,
            classified_flag: None,
            primary_flag: false,
            timestamp_flag: false,
            standard_code: None,
            code_table_id: None,
            source_system: None,
            source_system_level: None,
            description: None,
            is_selected: true,
            error_tips: ErrorTips::new(),
        }
    }

    /// Creates a draft row mapped onto a discovered raw field.
    pub fn from_raw_field(id: RowId, field: &RawField) -> Self {
        let mut item = Self::new(id);
        item.source_id = Some(field.id.clone());
        item.refresh_from_raw_field(field);
        item.primary_flag = field.primary_key;
        item
    }

    /// Fills naming and type attributes the row does not own yet from a raw field.
    pub fn refresh_from_raw_field(&mut self, field: &RawField) {
        if self.business_name.trim().is_empty() {
            self.business_name = field.business_name.clone();
        }
        if self.technical_name.trim().is_empty() {
            self.technical_name = field.technical_name.clone();
        }
        if self.data_type.is_none() {
            self.data_type = field.data_type;
        }
        if self.data_length.is_none() {
            self.data_length = field.data_length;
        }
        if self.data_precision.is_none() {
            self.data_precision = field.data_precision;
        }
        if self.description.is_none() {
            self.description = field.description.clone();
        }
    }

    /// De-duplication key `(technical_name, business_name)`.
    pub fn name_key(&self) -> (&str, &str) {
        (self.technical_name.as_str(), self.business_name.as_str())
    }

    /// Text form of one attribute, `None` when the attribute is unset or blank.
    ///
    /// Enumerations render as their wire literal and flags render only when set.
    pub fn attribute_text(&self, attribute: ItemAttribute) -> Option<Cow<'_, str>> {
        fn text(value: &Option<String>) -> Option<Cow<'_, str>> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(Cow::Borrowed)
        }
        fn flag(value: bool) -> Option<Cow<'static, str>> {
            value.then_some(Cow::Borrowed("true"))
        }
        match attribute {
            ItemAttribute::BusinessName => Some(self.business_name.trim()).filter(|v| !v.is_empty()).map(Cow::Borrowed),
            ItemAttribute::TechnicalName => Some(self.technical_name.trim()).filter(|v| !v.is_empty()).map(Cow::Borrowed),
            ItemAttribute::SourceId => text(&self.source_id),
            ItemAttribute::DataType => self.data_type.map(|v| Cow::Borrowed(v.as_str())),
            ItemAttribute::DataLength => self.data_length.map(|v| Cow::Owned(v.to_string())),
            ItemAttribute::DataPrecision => self.data_precision.map(|v| Cow::Owned(v.to_string())),
            ItemAttribute::DataRange => text(&self.data_range),
            ItemAttribute::SharedType => self.shared_type.map(|v| Cow::Borrowed(v.as_str())),
            ItemAttribute::SharedCondition => text(&self.shared_condition),
            ItemAttribute::OpenType => self.open_type.map(|v| Cow::Borrowed(v.as_str())),
            ItemAttribute::OpenCondition => text(&self.open_condition),
            ItemAttribute::SensitiveFlag => self.sensitive_flag.map(|v| Cow::Borrowed(v.as_str())),
            ItemAttribute::ClassifiedFlag => self.classified_flag.map(|v| Cow::Borrowed(v.as_str())),
            ItemAttribute::PrimaryFlag => flag(self.primary_flag),
            ItemAttribute::TimestampFlag => flag(self.timestamp_flag),
            ItemAttribute::StandardCode => text(&self.standard_code),
            ItemAttribute::CodeTableId => text(&self.code_table_id),
            ItemAttribute::SourceSystem => text(&self.source_system),
            ItemAttribute::SourceSystemLevel => text(&self.source_system_level),
            ItemAttribute::Description => text(&self.description),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.error_tips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_row_ids_use_the_a_prefix_on_the_wire() {
        let json = serde_json::to_string(&RowId::Draft(3)).expect("serialize draft id");
        assert_eq!(json, "\"a-3\"");

        let back: RowId = serde_json::from_str(&json).expect("deserialize draft id");
        assert_eq!(back, RowId::Draft(3));

        let persisted: RowId = serde_json::from_str("\"a-b12\"").expect("deserialize persisted id");
        assert_eq!(persisted, RowId::Persisted("a-b12".into()));
        assert_eq!(persisted.persisted(), Some("a-b12"));
    }

    #[test]
    fn information_item_defaults_to_selected() {
        let json = r#"{ "id": "c1", "business_name": "姓名", "technical_name": "name" }"#;
        let item: InformationItem = serde_json::from_str(json).expect("deserialize item");
        assert!(item.is_selected);
        assert!(item.error_tips.is_empty());
        assert_eq!(item.name_key(), ("name", "姓名"));
    }

    #[test]
    fn classification_enums_use_server_literals() {
        assert_eq!(serde_json::to_string(&SharedType::NoShare).unwrap(), "\"NOSHARE\"");
        assert_eq!(serde_json::to_string(&SharedType::Conditional).unwrap(), "\"CONDITION\"");
        assert_eq!(serde_json::to_string(&OpenType::NotOpen).unwrap(), "\"NOOPEN\"");
        assert_eq!(serde_json::to_string(&OpenType::Unconditional).unwrap(), "\"UNCONDITIONAL\"");
    }

    #[test]
    fn source_types_map_onto_catalog_types() {
        assert_eq!(DataType::from_source_type("VARCHAR(64)"), DataType::Char);
        assert_eq!(DataType::from_source_type("numeric"), DataType::Decimal);
        assert_eq!(DataType::from_source_type("bigint"), DataType::Int);
        assert_eq!(DataType::from_source_type("timestamp"), DataType::Datetime);
        assert_eq!(DataType::from_source_type("geometry"), DataType::Other);
    }

    #[test]
    fn refresh_keeps_values_the_row_already_owns() {
        let field = RawField {
            id: "f1".into(),
            resource_id: "v1".into(),
            business_name: "年龄".into(),
            technical_name: "age".into(),
            data_type: Some(DataType::Int),
            data_length: None,
            data_precision: None,
            primary_key: false,
            description: None,
        };
        let mut item = InformationItem::new(RowId::Persisted("c9".into()));
        item.business_name = "用户年龄".into();
        item.refresh_from_raw_field(&field);

        assert_eq!(item.business_name, "用户年龄");
        assert_eq!(item.technical_name, "age");
        assert_eq!(item.data_type, Some(DataType::Int));
    }

    #[test]
    fn attribute_text_treats_blank_as_unset() {
        let mut item = InformationItem::new(RowId::Draft(0));
        item.shared_condition = Some("   ".into());
        item.shared_type = Some(SharedType::NoShare);
        item.data_length = Some(32);
        assert_eq!(item.attribute_text(ItemAttribute::SharedCondition), None);
        assert_eq!(item.attribute_text(ItemAttribute::SharedType).as_deref(), Some("NOSHARE"));
        assert_eq!(item.attribute_text(ItemAttribute::DataLength).as_deref(), Some("32"));
        assert_eq!(item.attribute_text(ItemAttribute::PrimaryFlag), None);
    }

    #[test]
    fn error_tips_serialize_in_column_order() {
        let mut item = InformationItem::new(RowId::Draft(0));
        item.error_tips.insert(ItemAttribute::BusinessName, "required".into());
        item.error_tips.insert(ItemAttribute::DataLength, "too long".into());
        let value = serde_json::to_value(&item).expect("serialize item");
        let tips = value.get("errorTips").and_then(|v| v.as_object()).expect("error tips object");
        let keys: Vec<_> = tips.keys().cloned().collect();
        assert_eq!(keys, vec!["business_name".to_string(), "data_length".to_string()]);
    }
}
