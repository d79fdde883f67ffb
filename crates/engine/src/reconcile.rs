//! Merging discovered raw fields into the information item list.
//!
//! Reconciliation runs every time the mounted resources change. It keeps rows the user
//! already edited, refreshes their fallback attributes from the source schema, and
//! decides what to do with raw fields no row points at yet.

use std::collections::{HashMap, HashSet};

use rescat_types::{InformationItem, RawField, RowId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Context in which raw fields enter the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldIntake {
    /// Fresh catalog: every discovered field becomes a row.
    #[default]
    Import,
    /// Editing an existing catalog: new fields are appended as rows.
    Modify,
    /// Fields are offered only through the mapping selector.
    MappingOnly,
}

impl FieldIntake {
    fn creates_rows(self) -> bool {
        matches!(self, Self::Import | Self::Modify)
    }
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciled {
    /// Replacement row list, every row selected and free of messages.
    pub items: Vec<InformationItem>,
    /// Raw fields no row is mapped to.
    pub unmapped: Vec<RawField>,
}

/// Merges `raw_fields` into `current_items`.
///
/// Raw fields are deduplicated by `(technical_name, business_name)` with the first
/// occurrence winning. Rows already mapped to a surviving field keep every edited
/// attribute and only gain the fallbacks they lack. Rows whose field vanished are
/// dropped in [`FieldIntake::Import`] and [`FieldIntake::Modify`], and lose their
/// mapping otherwise. An unmapped field whose name pair matches one of
/// `persisted_columns` brings that column's catalog attributes back.
pub fn reconcile(
    raw_fields: &[RawField],
    current_items: &[InformationItem],
    persisted_columns: &[InformationItem],
    intake: FieldIntake,
) -> Reconciled {
    let fields = dedup_fields(raw_fields);
    let by_id: HashMap<&str, &RawField> = fields.iter().map(|field| (field.id.as_str(), *field)).collect();
    let mut next_draft = current_items
        .iter()
        .chain(persisted_columns)
        .filter_map(|item| match item.id {
            RowId::Draft(index) => Some(index + 1),
            RowId::Persisted(_) => None,
        })
        .max()
        .unwrap_or(0);

    let mut items = Vec::with_capacity(current_items.len().max(fields.len()));
    let mut mapped: HashSet<String> = HashSet::new();
    let mut dropped = 0usize;

    for item in current_items {
        let mut item = item.clone();
        let source = item.source_id.clone();
        match source.as_deref() {
            Some(source_id) if mapped.contains(source_id) => {
                // A second row pointing at the same field keeps its edits but not the link.
                item.source_id = None;
            }
            Some(source_id) => match by_id.get(source_id) {
                Some(field) => {
                    item.refresh_from_raw_field(field);
                    mapped.insert(source_id.to_string());
                }
                None if intake.creates_rows() => {
                    dropped += 1;
                    continue;
                }
                None => item.source_id = None,
            },
            None => {}
        }
        items.push(item);
    }

    let persisted_by_key: HashMap<(String, String), &InformationItem> = persisted_columns
        .iter()
        .filter(|column| !is_blank_key(column.name_key()))
        .map(|column| (owned_key(column.name_key()), column))
        .collect();

    let mut unmapped = Vec::new();
    for field in fields {
        if mapped.contains(&field.id) {
            continue;
        }
        let key = owned_key(field.name_key());
        let blank = is_blank_key(field.name_key());

        // A row with the same names but no link is the field's row.
        if !blank
            && let Some(row) = items
                .iter_mut()
                .find(|item| item.source_id.is_none() && owned_key(item.name_key()) == key)
        {
            row.source_id = Some(field.id.clone());
            row.refresh_from_raw_field(field);
            mapped.insert(field.id.clone());
            continue;
        }

        if !blank
            && let Some(column) = persisted_by_key.get(&key)
            && !items.iter().any(|item| item.id == column.id)
        {
            let mut row = (*column).clone();
            row.source_id = Some(field.id.clone());
            row.refresh_from_raw_field(field);
            items.push(row);
            mapped.insert(field.id.clone());
            continue;
        }

        let duplicate = !blank && items.iter().any(|item| owned_key(item.name_key()) == key);
        if intake.creates_rows() && !duplicate {
            items.push(InformationItem::from_raw_field(RowId::Draft(next_draft), field));
            next_draft += 1;
            mapped.insert(field.id.clone());
        } else {
            unmapped.push(field.clone());
        }
    }

    for item in &mut items {
        item.is_selected = true;
        item.error_tips.clear();
    }

    debug!(
        rows = items.len(),
        unmapped = unmapped.len(),
        dropped,
        ?intake,
        "reconciled information items"
    );
    Reconciled { items, unmapped }
}

fn dedup_fields(raw_fields: &[RawField]) -> Vec<&RawField> {
    let mut seen_keys: HashSet<(String, String)> = HashSet::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();
    raw_fields
        .iter()
        .filter(|field| seen_ids.insert(field.id.as_str()))
        .filter(|field| is_blank_key(field.name_key()) || seen_keys.insert(owned_key(field.name_key())))
        .collect()
}

fn owned_key((technical, business): (&str, &str)) -> (String, String) {
    (technical.trim().to_string(), business.trim().to_string())
}

fn is_blank_key((technical, business): (&str, &str)) -> bool {
    technical.trim().is_empty() && business.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescat_types::{DataType, SharedType};

    fn field(id: &str, business: &str, technical: &str) -> RawField {
        RawField {
            id: id.into(),
            resource_id: "view-1".into(),
            business_name: business.into(),
            technical_name: technical.into(),
            data_type: Some(DataType::Char),
            data_length: Some(64),
            data_precision: None,
            primary_key: false,
            description: None,
        }
    }

    #[test]
    fn import_turns_every_field_into_a_selected_row() {
        let fields = vec![field("f1", "姓名", "name"), field("f2", "年龄", "age")];
        let merged = reconcile(&fields, &[], &[], FieldIntake::Import);
        assert_eq!(merged.items.len(), 2);
        assert!(merged.unmapped.is_empty());
        assert_eq!(merged.items[0].id, RowId::Draft(0));
        assert_eq!(merged.items[1].source_id.as_deref(), Some("f2"));
        assert!(merged.items.iter().all(|item| item.is_selected));
    }

    #[test]
    fn duplicate_name_pairs_keep_the_first_field() {
        let fields = vec![
            field("f1", "姓名", "name"),
            field("f2", "姓名", "name"),
            field("f3", "", ""),
            field("f4", "", ""),
        ];
        let merged = reconcile(&fields, &[], &[], FieldIntake::Import);
        let sources: Vec<_> = merged.items.iter().filter_map(|item| item.source_id.as_deref()).collect();
        assert_eq!(sources, vec!["f1", "f3", "f4"]);
    }

    #[test]
    fn mapped_rows_keep_their_classification() {
        let fields = vec![field("f1", "姓名", "name")];
        let mut edited = InformationItem::from_raw_field(RowId::Persisted("c1".into()), &fields[0]);
        edited.shared_type = Some(SharedType::Conditional);
        edited.shared_condition = Some("仅内部".into());
        edited.business_name = "用户姓名".into();
        edited.data_type = None;

        let merged = reconcile(&fields, &[edited], &[], FieldIntake::Modify);
        assert_eq!(merged.items.len(), 1);
        let row = &merged.items[0];
        assert_eq!(row.business_name, "用户姓名");
        assert_eq!(row.shared_type, Some(SharedType::Conditional));
        assert_eq!(row.data_type, Some(DataType::Char));
    }

    #[test]
    fn repeated_discovery_does_not_duplicate_rows() {
        let fields = vec![field("f1", "姓名", "name"), field("f2", "年龄", "age")];
        let first = reconcile(&fields, &[], &[], FieldIntake::Import);
        let refreshed: Vec<RawField> = fields
            .iter()
            .map(|f| RawField {
                id: format!("{}-v2", f.id),
                ..f.clone()
            })
            .collect();
        let mut current = first.items.clone();
        for item in &mut current {
            item.source_id = None;
        }
        let second = reconcile(&refreshed, &current, &[], FieldIntake::Import);
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[0].source_id.as_deref(), Some("f1-v2"));
    }

    #[test]
    fn vanished_sources_depend_on_intake() {
        let stale = InformationItem::from_raw_field(RowId::Draft(0), &field("gone", "旧字段", "old"));
        let fields = vec![field("f1", "姓名", "name")];

        let imported = reconcile(&fields, std::slice::from_ref(&stale), &[], FieldIntake::Import);
        assert_eq!(imported.items.len(), 1);
        assert_eq!(imported.items[0].id, RowId::Draft(1));

        let mapping = reconcile(&fields, &[stale], &[], FieldIntake::MappingOnly);
        assert_eq!(mapping.items.len(), 1);
        assert_eq!(mapping.items[0].source_id, None);
        assert_eq!(mapping.unmapped.len(), 1);
    }

    #[test]
    fn persisted_columns_carry_forward_by_name_pair() {
        let mut column = InformationItem::new(RowId::Persisted("c9".into()));
        column.business_name = "年龄".into();
        column.technical_name = "age".into();
        column.standard_code = Some("GB-001".into());
        let fields = vec![field("f2", "年龄", "age")];

        let merged = reconcile(&fields, &[], &[column], FieldIntake::Modify);
        assert_eq!(merged.items.len(), 1);
        let row = &merged.items[0];
        assert_eq!(row.id, RowId::Persisted("c9".into()));
        assert_eq!(row.standard_code.as_deref(), Some("GB-001"));
        assert_eq!(row.source_id.as_deref(), Some("f2"));
        assert_eq!(row.data_length, Some(64));
    }

    #[test]
    fn reconciliation_resets_selection_and_messages() {
        let fields = vec![field("f1", "姓名", "name")];
        let mut row = InformationItem::from_raw_field(RowId::Draft(0), &fields[0]);
        row.is_selected = false;
        row.error_tips
            .insert(rescat_types::ItemAttribute::SharedType, "please select shared attribute".into());
        let merged = reconcile(&fields, &[row], &[], FieldIntake::Import);
        assert!(merged.items[0].is_selected);
        assert!(merged.items[0].error_tips.is_empty());
    }
}
