//! The information item table edited in the second wizard step.
//!
//! [`InfoItemTable`] owns the ordered rows and the raw fields available for mapping,
//! and enforces the cross-row invariants: at most one row per raw field, at most one
//! primary-key row and one timestamp row, and no deletion of rows bound to a raw field.

use rescat_types::{InformationItem, ItemAttribute, OpenType, RawField, RowId, SharedType};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::validation::{self, ErrorNavigator, ValidationContext, ValidationReport};

mod edit;

pub use edit::ItemEdit;

/// Rejected table operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("row {index} does not exist")]
    RowOutOfRange { index: usize },

    #[error("open attribute of row {row} is locked because the row is not shared")]
    OpenTypeLocked { row: String },

    #[error("batch open attribute is disabled while any row is not shared")]
    BatchOpenTypeDisabled,

    #[error("column {attribute} does not support batch edits")]
    NotBatchEditable { attribute: ItemAttribute },

    #[error("row {row} is bound to source field {source_id} and cannot be deleted")]
    RowBoundToSource { row: String, source_id: String },

    #[error("source field {source_id} is already mapped by row {row}")]
    SourceAlreadyMapped { source_id: String, row: String },

    #[error("source field {source_id} is not available for mapping")]
    UnknownSourceField { source_id: String },

    #[error("rows can only be added to catalogs without mounted resources")]
    ManualRowsDisabled,
}

/// Column-level indicator shown above batch-editable columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ColumnSummary {
    /// Every row agrees; `None` when every row is unset.
    Uniform(Option<String>),
    /// Rows disagree; the selector shows its placeholder.
    Mixed,
}

/// Ordered rows of the information item table.
#[derive(Debug, Clone, Default)]
pub struct InfoItemTable {
    items: Vec<InformationItem>,
    /// Raw fields offered by the field-mapping selector.
    field_options: Vec<RawField>,
    next_draft: usize,
    allow_manual_rows: bool,
}

impl InfoItemTable {
    pub fn new(items: Vec<InformationItem>) -> Self {
        let mut table = Self::default();
        table.replace_items(items);
        table
    }

    pub fn items(&self) -> &[InformationItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<InformationItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows that count toward the submission, in table order.
    pub fn selected(&self) -> impl Iterator<Item = &InformationItem> {
        self.items.iter().filter(|item| item.is_selected)
    }

    pub fn field_options(&self) -> &[RawField] {
        &self.field_options
    }

    pub fn set_field_options(&mut self, fields: Vec<RawField>) {
        self.field_options = fields;
    }

    /// Allows "add row", used by catalogs without mounted resources.
    pub fn set_allow_manual_rows(&mut self, allow: bool) {
        self.allow_manual_rows = allow;
    }

    pub fn allows_manual_rows(&self) -> bool {
        self.allow_manual_rows
    }

    /// Replaces every row, keeping draft ids unique across replacements.
    pub fn replace_items(&mut self, items: Vec<InformationItem>) {
        let highest_draft = items
            .iter()
            .filter_map(|item| match item.id {
                RowId::Draft(index) => Some(index + 1),
                RowId::Persisted(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.next_draft = self.next_draft.max(highest_draft);
        self.items = items;
    }

    /// Allocates the next draft id.
    pub fn allocate_draft_id(&mut self) -> RowId {
        let id = RowId::Draft(self.next_draft);
        self.next_draft += 1;
        id
    }

    /// Appends an empty row.
    pub fn add_row(&mut self) -> Result<RowId, EditError> {
        if !self.allow_manual_rows {
            return Err(EditError::ManualRowsDisabled);
        }
        let id = self.allocate_draft_id();
        self.items.push(InformationItem::new(id.clone()));
        debug!(row = %id, "added information item");
        Ok(id)
    }

    /// Deletes a row that is not bound to a raw field.
    pub fn delete_row(&mut self, index: usize) -> Result<InformationItem, EditError> {
        let item = self.items.get(index).ok_or(EditError::RowOutOfRange { index })?;
        if let Some(source_id) = &item.source_id {
            return Err(EditError::RowBoundToSource {
                row: item.id.to_string(),
                source_id: source_id.clone(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Moves a row by drag handle. Messages travel with their row.
    pub fn move_row(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        let len = self.items.len();
        if from >= len {
            return Err(EditError::RowOutOfRange { index: from });
        }
        if to >= len {
            return Err(EditError::RowOutOfRange { index: to });
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(())
    }

    /// Applies an edit to a single row.
    pub fn edit_row(&mut self, index: usize, edit: &ItemEdit) -> Result<(), EditError> {
        let row = self.items.get(index).ok_or(EditError::RowOutOfRange { index })?;
        let updated = edit.apply(row)?;
        self.items[index] = updated;
        Ok(())
    }

    /// Applies a batch-editable edit to every row.
    ///
    /// Rows whose open attribute is locked keep their not-open value when the batch
    /// sets the sharing attribute; a batch open edit is refused while any row is no-share.
    pub fn edit_all(&mut self, edit: &ItemEdit) -> Result<(), EditError> {
        if !edit.is_batch_editable() {
            return Err(EditError::NotBatchEditable {
                attribute: edit.attribute(),
            });
        }
        if matches!(edit, ItemEdit::OpenType(_)) && !self.batch_open_type_enabled() {
            return Err(EditError::BatchOpenTypeDisabled);
        }

        let updated = self.items.iter().map(|row| edit.apply(row)).collect::<Result<Vec<_>, _>>()?;
        self.items = updated;
        debug!(attribute = %edit.attribute(), rows = self.items.len(), "applied batch edit");
        Ok(())
    }

    /// The batch open-attribute selector is disabled while any row is no-share.
    pub fn batch_open_type_enabled(&self) -> bool {
        !self.items.iter().any(|item| item.shared_type == Some(SharedType::NoShare))
    }

    /// Whether the open-attribute cell of a row is editable.
    pub fn open_type_editable(&self, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|item| item.shared_type != Some(SharedType::NoShare))
    }

    /// Summary value for a column's batch selector.
    pub fn column_summary(&self, attribute: ItemAttribute) -> ColumnSummary {
        let mut values = self.items.iter().map(|item| item.attribute_text(attribute));
        let Some(first) = values.next() else {
            return ColumnSummary::Uniform(None);
        };
        if values.all(|value| value == first) {
            ColumnSummary::Uniform(first.map(|value| value.into_owned()))
        } else {
            ColumnSummary::Mixed
        }
    }

    /// Flags or unflags a row as the primary key; flagging clears every other row.
    pub fn set_primary(&mut self, index: usize, value: bool) -> Result<(), EditError> {
        self.set_exclusive_flag(index, value, ItemAttribute::PrimaryFlag, |item| &mut item.primary_flag)
    }

    /// Flags or unflags a row as the timestamp column; flagging clears every other row.
    pub fn set_timestamp(&mut self, index: usize, value: bool) -> Result<(), EditError> {
        self.set_exclusive_flag(index, value, ItemAttribute::TimestampFlag, |item| &mut item.timestamp_flag)
    }

    /// Flips the primary-key flag of a row, as the table's radio cell does.
    pub fn toggle_primary(&mut self, index: usize) -> Result<(), EditError> {
        let current = self.items.get(index).ok_or(EditError::RowOutOfRange { index })?.primary_flag;
        self.set_primary(index, !current)
    }

    pub fn toggle_timestamp(&mut self, index: usize) -> Result<(), EditError> {
        let current = self.items.get(index).ok_or(EditError::RowOutOfRange { index })?.timestamp_flag;
        self.set_timestamp(index, !current)
    }

    fn set_exclusive_flag(
        &mut self,
        index: usize,
        value: bool,
        attribute: ItemAttribute,
        flag: fn(&mut InformationItem) -> &mut bool,
    ) -> Result<(), EditError> {
        if index >= self.items.len() {
            return Err(EditError::RowOutOfRange { index });
        }
        for (position, item) in self.items.iter_mut().enumerate() {
            if position == index {
                *flag(item) = value;
            } else if value {
                *flag(item) = false;
            }
            item.error_tips.shift_remove(&attribute);
        }
        Ok(())
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) -> Result<(), EditError> {
        let item = self.items.get_mut(index).ok_or(EditError::RowOutOfRange { index })?;
        item.is_selected = selected;
        if !selected {
            item.error_tips.clear();
        }
        Ok(())
    }

    /// Maps a row onto a raw field, or clears its mapping with `None`.
    ///
    /// A raw field can back one row at a time. Mapping fills the row's empty naming
    /// and type attributes from the field.
    pub fn map_source(&mut self, index: usize, source_id: Option<&str>) -> Result<(), EditError> {
        if index >= self.items.len() {
            return Err(EditError::RowOutOfRange { index });
        }
        let Some(source_id) = source_id else {
            self.items[index].source_id = None;
            self.items[index].error_tips.shift_remove(&ItemAttribute::SourceId);
            return Ok(());
        };

        if let Some(holder) = self
            .items
            .iter()
            .enumerate()
            .find(|(position, item)| *position != index && item.source_id.as_deref() == Some(source_id))
        {
            return Err(EditError::SourceAlreadyMapped {
                source_id: source_id.to_string(),
                row: holder.1.id.to_string(),
            });
        }
        let field = self
            .field_options
            .iter()
            .find(|field| field.id == source_id)
            .ok_or_else(|| EditError::UnknownSourceField {
                source_id: source_id.to_string(),
            })?;

        let item = &mut self.items[index];
        item.source_id = Some(field.id.clone());
        item.refresh_from_raw_field(field);
        item.error_tips.shift_remove(&ItemAttribute::SourceId);
        Ok(())
    }

    /// Raw fields not mapped by any row, for the mapping selector.
    pub fn unmapped_fields(&self) -> Vec<&RawField> {
        self.field_options
            .iter()
            .filter(|field| !self.items.iter().any(|item| item.source_id.as_deref() == Some(field.id.as_str())))
            .collect()
    }

    /// Validates every row, storing the refreshed messages in the table.
    pub fn validate(&mut self, context: &ValidationContext) -> ValidationReport {
        let report = validation::validate(std::mem::take(&mut self.items), context);
        self.items = report.list.clone();
        debug!(
            errors = report.error_count,
            primary_missing = report.primary_missing,
            timestamp_missing = report.timestamp_missing,
            "validated information items"
        );
        report
    }

    /// Re-validates a single row after an edit.
    pub fn validate_row(&mut self, index: usize, context: &ValidationContext) -> bool {
        validation::validate_row(&mut self.items, index, context)
    }

    /// Total number of invalid cells currently shown.
    pub fn error_count(&self) -> usize {
        self.items.iter().map(|item| item.error_tips.len()).sum()
    }

    pub fn navigator(&self) -> ErrorNavigator {
        ErrorNavigator::from_items(&self.items)
    }

    /// Whether any row currently uses the not-open value.
    pub fn any_not_open(&self) -> bool {
        self.items.iter().any(|item| item.open_type == Some(OpenType::NotOpen))
    }
}
