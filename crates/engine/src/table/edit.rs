//! Typed cell edits.
//!
//! Every editable attribute has one [`ItemEdit`] variant carrying its new value, and
//! [`ItemEdit::apply`] is the single update function for all of them. Attributes with
//! cross-row invariants (`source_id`, `primary_flag`, `timestamp_flag`, selection) are
//! edited through [`super::InfoItemTable`] instead.

use rescat_types::{ClassifiedFlag, DataType, InformationItem, ItemAttribute, OpenType, SensitiveFlag, SharedType};

use super::EditError;

/// A new value for one attribute of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEdit {
    BusinessName(String),
    TechnicalName(String),
    DataType(Option<DataType>),
    DataLength(Option<u32>),
    DataPrecision(Option<u32>),
    DataRange(Option<String>),
    SharedType(Option<SharedType>),
    SharedCondition(Option<String>),
    OpenType(Option<OpenType>),
    OpenCondition(Option<String>),
    SensitiveFlag(Option<SensitiveFlag>),
    ClassifiedFlag(Option<ClassifiedFlag>),
    StandardCode(Option<String>),
    CodeTableId(Option<String>),
    SourceSystem(Option<String>),
    SourceSystemLevel(Option<String>),
    Description(Option<String>),
}

impl ItemEdit {
    pub fn attribute(&self) -> ItemAttribute {
        match self {
            Self::BusinessName(_) => ItemAttribute::BusinessName,
            Self::TechnicalName(_) => ItemAttribute::TechnicalName,
            Self::DataType(_) => ItemAttribute::DataType,
            Self::DataLength(_) => ItemAttribute::DataLength,
            Self::DataPrecision(_) => ItemAttribute::DataPrecision,
            Self::DataRange(_) => ItemAttribute::DataRange,
            Self::SharedType(_) => ItemAttribute::SharedType,
            Self::SharedCondition(_) => ItemAttribute::SharedCondition,
            Self::OpenType(_) => ItemAttribute::OpenType,
            Self::OpenCondition(_) => ItemAttribute::OpenCondition,
            Self::SensitiveFlag(_) => ItemAttribute::SensitiveFlag,
            Self::ClassifiedFlag(_) => ItemAttribute::ClassifiedFlag,
            Self::StandardCode(_) => ItemAttribute::StandardCode,
            Self::CodeTableId(_) => ItemAttribute::CodeTableId,
            Self::SourceSystem(_) => ItemAttribute::SourceSystem,
            Self::SourceSystemLevel(_) => ItemAttribute::SourceSystemLevel,
            Self::Description(_) => ItemAttribute::Description,
        }
    }

    /// Whether the column offers a "apply to all rows" selector.
    pub fn is_batch_editable(&self) -> bool {
        matches!(
            self,
            Self::SharedType(_)
                | Self::OpenType(_)
                | Self::SensitiveFlag(_)
                | Self::ClassifiedFlag(_)
                | Self::SourceSystem(_)
                | Self::SourceSystemLevel(_)
        )
    }

    /// Attributes whose values (and therefore messages) this edit may change.
    pub fn touched_attributes(&self) -> &'static [ItemAttribute] {
        match self {
            Self::SharedType(_) => &[
                ItemAttribute::SharedType,
                ItemAttribute::SharedCondition,
                ItemAttribute::OpenType,
                ItemAttribute::OpenCondition,
            ],
            Self::OpenType(_) => &[ItemAttribute::OpenType, ItemAttribute::OpenCondition],
            Self::DataType(_) => &[ItemAttribute::DataType, ItemAttribute::DataLength, ItemAttribute::DataPrecision],
            Self::DataLength(_) => &[ItemAttribute::DataLength, ItemAttribute::DataPrecision],
            Self::BusinessName(_) => &[ItemAttribute::BusinessName],
            Self::TechnicalName(_) => &[ItemAttribute::TechnicalName],
            Self::DataPrecision(_) => &[ItemAttribute::DataPrecision],
            Self::DataRange(_) => &[ItemAttribute::DataRange],
            Self::SharedCondition(_) => &[ItemAttribute::SharedCondition],
            Self::OpenCondition(_) => &[ItemAttribute::OpenCondition],
            Self::SensitiveFlag(_) => &[ItemAttribute::SensitiveFlag],
            Self::ClassifiedFlag(_) => &[ItemAttribute::ClassifiedFlag],
            Self::StandardCode(_) => &[ItemAttribute::StandardCode],
            Self::CodeTableId(_) => &[ItemAttribute::CodeTableId],
            Self::SourceSystem(_) => &[ItemAttribute::SourceSystem],
            Self::SourceSystemLevel(_) => &[ItemAttribute::SourceSystemLevel],
            Self::Description(_) => &[ItemAttribute::Description],
        }
    }

    /// Applies the edit to a copy of `row`.
    ///
    /// Setting `shared_type` to no-share forces `open_type` to not-open; `open_type`
    /// cannot be changed afterwards while the row stays no-share.
    pub fn apply(&self, row: &InformationItem) -> Result<InformationItem, EditError> {
        let mut next = row.clone();
        match self {
            Self::BusinessName(value) => next.business_name = value.clone(),
            Self::TechnicalName(value) => next.technical_name = value.clone(),
            Self::DataType(value) => {
                next.data_type = *value;
                if !value.is_some_and(|data_type| data_type.requires_length()) {
                    next.data_length = None;
                }
                if *value != Some(DataType::Decimal) {
                    next.data_precision = None;
                }
            }
            Self::DataLength(value) => next.data_length = *value,
            Self::DataPrecision(value) => next.data_precision = *value,
            Self::DataRange(value) => next.data_range = value.clone(),
            Self::SharedType(value) => {
                next.shared_type = *value;
                match value {
                    Some(SharedType::NoShare) => {
                        next.open_type = Some(OpenType::NotOpen);
                        next.open_condition = None;
                    }
                    Some(SharedType::Unconditional) | None => next.shared_condition = None,
                    Some(SharedType::Conditional) => {}
                }
            }
            Self::SharedCondition(value) => next.shared_condition = value.clone(),
            Self::OpenType(value) => {
                if row.shared_type == Some(SharedType::NoShare) && *value != Some(OpenType::NotOpen) {
                    return Err(EditError::OpenTypeLocked { row: row.id.to_string() });
                }
                next.open_type = *value;
                if *value != Some(OpenType::Conditional) {
                    next.open_condition = None;
                }
            }
            Self::OpenCondition(value) => next.open_condition = value.clone(),
            Self::SensitiveFlag(value) => next.sensitive_flag = *value,
            Self::ClassifiedFlag(value) => next.classified_flag = *value,
            Self::StandardCode(value) => next.standard_code = value.clone(),
            Self::CodeTableId(value) => next.code_table_id = value.clone(),
            Self::SourceSystem(value) => next.source_system = value.clone(),
            Self::SourceSystemLevel(value) => next.source_system_level = value.clone(),
            Self::Description(value) => next.description = value.clone(),
        }
        for attribute in self.touched_attributes() {
            next.error_tips.shift_remove(attribute);
        }
        Ok(next)
    }
}
