//! Information item validation.
//!
//! Validation never fails: it annotates rows with per-cell messages in
//! [`InformationItem::error_tips`] and reports an aggregate status. Rules are
//! selected by [`ValidationContext`]; see [`rules`] for the table itself.

use std::collections::HashMap;

use rescat_types::{InformationItem, ItemAttribute};
use serde::{Deserialize, Serialize};

use crate::session::CatalogMode;

mod navigator;
pub mod rules;

pub use navigator::{ErrorLocation, ErrorNavigator};
pub use rules::{FieldRule, rule_table};

/// Inputs that select the active rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub mode: CatalogMode,
    /// Requires a primary-key row and a timestamp row among the selected rows.
    pub primary_required: bool,
    pub has_backing_resource: bool,
}

impl ValidationContext {
    /// Whether duplicate names are checked across every row instead of the selected ones.
    pub fn checks_all_rows(&self) -> bool {
        self.mode == CatalogMode::Empty
    }
}

/// Outcome of validating a full row list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    #[serde(rename = "validateStatus")]
    pub validate_status: bool,
    /// Rows with refreshed `error_tips`.
    pub list: Vec<InformationItem>,
    /// No selected row is flagged as primary key while one is required.
    pub primary_missing: bool,
    /// No selected row is flagged as timestamp while one is required.
    pub timestamp_missing: bool,
    pub error_count: usize,
}

impl ValidationReport {
    /// Navigator over the cell errors of [`Self::list`].
    pub fn navigator(&self) -> ErrorNavigator {
        ErrorNavigator::from_items(&self.list)
    }
}

const DUPLICATE_BUSINESS_NAME: &str = "business name already exists";
const DUPLICATE_TECHNICAL_NAME: &str = "technical name already exists";
const DUPLICATE_PRIMARY: &str = "only one primary key is allowed";
const DUPLICATE_TIMESTAMP: &str = "only one timestamp column is allowed";

/// Validates every row against the rule table and the cross-row constraints.
///
/// Unselected rows are skipped and lose any previous messages, except in empty
/// catalog mode where every row is in scope.
pub fn validate(items: Vec<InformationItem>, context: &ValidationContext) -> ValidationReport {
    let rules = rule_table(context);
    let mut list = items;

    for item in list.iter_mut() {
        item.error_tips.clear();
        if in_scope(item, context) {
            apply_rules(item, &rules);
        }
    }

    mark_duplicates(&mut list, context);
    mark_flag_conflicts(&mut list, context);

    let selected: Vec<&InformationItem> = list.iter().filter(|item| in_scope(item, context)).collect();
    let (primary_missing, timestamp_missing) = if context.primary_required && !selected.is_empty() {
        (
            !selected.iter().any(|item| item.primary_flag),
            !selected.iter().any(|item| item.timestamp_flag),
        )
    } else {
        (false, false)
    };

    let error_count = list.iter().map(|item| item.error_tips.len()).sum();
    ValidationReport {
        validate_status: error_count == 0 && !primary_missing && !timestamp_missing,
        list,
        primary_missing,
        timestamp_missing,
        error_count,
    }
}

/// Re-validates the row at `index` against its siblings, leaving other rows untouched.
///
/// Returns whether the row is now free of errors.
pub fn validate_row(items: &mut [InformationItem], index: usize, context: &ValidationContext) -> bool {
    let rules = rule_table(context);
    let Some(item) = items.get_mut(index) else {
        return false;
    };
    item.error_tips.clear();
    if !in_scope(item, context) {
        return true;
    }
    apply_rules(item, &rules);

    let business = normalized_business(&items[index]);
    let technical = normalized_technical(&items[index]);
    let mut duplicate_business = false;
    let mut duplicate_technical = false;
    for (position, other) in items.iter().enumerate() {
        if position == index || !in_scope(other, context) {
            continue;
        }
        duplicate_business |= business.is_some() && normalized_business(other) == business;
        duplicate_technical |= technical.is_some() && normalized_technical(other) == technical;
    }

    let item = &mut items[index];
    if duplicate_business {
        item.error_tips
            .entry(ItemAttribute::BusinessName)
            .or_insert_with(|| DUPLICATE_BUSINESS_NAME.to_string());
    }
    if duplicate_technical {
        item.error_tips
            .entry(ItemAttribute::TechnicalName)
            .or_insert_with(|| DUPLICATE_TECHNICAL_NAME.to_string());
    }
    item.error_tips.sort_keys();
    item.error_tips.is_empty()
}

fn in_scope(item: &InformationItem, context: &ValidationContext) -> bool {
    context.checks_all_rows() || item.is_selected
}

fn apply_rules(item: &mut InformationItem, rules: &[FieldRule]) {
    for rule in rules {
        if let Some(message) = rule.evaluate(item) {
            item.error_tips.insert(rule.attribute, message);
        }
    }
}

fn normalized_business(item: &InformationItem) -> Option<String> {
    Some(item.business_name.trim().to_string()).filter(|name| !name.is_empty())
}

fn normalized_technical(item: &InformationItem) -> Option<String> {
    Some(item.technical_name.trim().to_ascii_lowercase()).filter(|name| !name.is_empty())
}

fn mark_duplicates(list: &mut [InformationItem], context: &ValidationContext) {
    let mut business_counts: HashMap<String, usize> = HashMap::new();
    let mut technical_counts: HashMap<String, usize> = HashMap::new();
    for item in list.iter().filter(|item| in_scope(item, context)) {
        if let Some(name) = normalized_business(item) {
            *business_counts.entry(name).or_default() += 1;
        }
        if let Some(name) = normalized_technical(item) {
            *technical_counts.entry(name).or_default() += 1;
        }
    }

    for item in list.iter_mut().filter(|item| in_scope(item, context)) {
        if normalized_business(item).is_some_and(|name| business_counts.get(&name).copied().unwrap_or(0) > 1) {
            item.error_tips
                .entry(ItemAttribute::BusinessName)
                .or_insert_with(|| DUPLICATE_BUSINESS_NAME.to_string());
        }
        if normalized_technical(item).is_some_and(|name| technical_counts.get(&name).copied().unwrap_or(0) > 1) {
            item.error_tips
                .entry(ItemAttribute::TechnicalName)
                .or_insert_with(|| DUPLICATE_TECHNICAL_NAME.to_string());
        }
        item.error_tips.sort_keys();
    }
}

fn mark_flag_conflicts(list: &mut [InformationItem], context: &ValidationContext) {
    let primary_holders = list.iter().filter(|item| in_scope(item, context) && item.primary_flag).count();
    let timestamp_holders = list.iter().filter(|item| in_scope(item, context) && item.timestamp_flag).count();

    for item in list.iter_mut().filter(|item| in_scope(item, context)) {
        if primary_holders > 1 && item.primary_flag {
            item.error_tips.insert(ItemAttribute::PrimaryFlag, DUPLICATE_PRIMARY.to_string());
        }
        if timestamp_holders > 1 && item.timestamp_flag {
            item.error_tips.insert(ItemAttribute::TimestampFlag, DUPLICATE_TIMESTAMP.to_string());
        }
        item.error_tips.sort_keys();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescat_types::{ClassifiedFlag, DataType, OpenType, RowId, SensitiveFlag, SharedType};

    fn complete_row(index: usize, business: &str, technical: &str) -> InformationItem {
        let mut item = InformationItem::new(RowId::Draft(index));
        item.business_name = business.into();
        item.technical_name = technical.into();
        item.data_type = Some(DataType::Int);
        item.shared_type = Some(SharedType::Unconditional);
        item.open_type = Some(OpenType::Unconditional);
        item.sensitive_flag = Some(SensitiveFlag::Insensitive);
        item.classified_flag = Some(ClassifiedFlag::Unclassified);
        item
    }

    fn context() -> ValidationContext {
        ValidationContext {
            mode: CatalogMode::WithResource,
            primary_required: false,
            has_backing_resource: true,
        }
    }

    #[test]
    fn complete_rows_pass() {
        let report = validate(vec![complete_row(0, "姓名", "name"), complete_row(1, "年龄", "age")], &context());
        assert!(report.validate_status);
        assert_eq!(report.error_count, 0);
    }

    #[test]
    fn duplicate_names_tag_every_selected_holder() {
        let rows = vec![
            complete_row(0, "姓名", "name"),
            complete_row(1, "姓名", "NAME"),
            complete_row(2, "年龄", "age"),
        ];
        let report = validate(rows, &context());
        assert!(!report.validate_status);
        for row in &report.list[..2] {
            assert_eq!(
                row.error_tips.get(&ItemAttribute::BusinessName).map(String::as_str),
                Some(DUPLICATE_BUSINESS_NAME)
            );
            assert_eq!(
                row.error_tips.get(&ItemAttribute::TechnicalName).map(String::as_str),
                Some(DUPLICATE_TECHNICAL_NAME)
            );
        }
        assert!(report.list[2].error_tips.is_empty());
    }

    #[test]
    fn unselected_rows_are_ignored_outside_empty_mode() {
        let mut hidden = complete_row(1, "姓名", "name");
        hidden.is_selected = false;
        hidden.shared_type = None;
        let rows = vec![complete_row(0, "姓名", "name"), hidden];

        let report = validate(rows.clone(), &context());
        assert!(report.validate_status);
        assert!(report.list[1].error_tips.is_empty());

        let empty = ValidationContext {
            mode: CatalogMode::Empty,
            has_backing_resource: false,
            ..context()
        };
        let report = validate(rows, &empty);
        assert!(!report.validate_status);
        assert!(report.list[1].error_tips.contains_key(&ItemAttribute::SharedType));
        assert!(report.list[0].error_tips.contains_key(&ItemAttribute::TechnicalName));
    }

    #[test]
    fn primary_and_timestamp_are_required_when_configured() {
        let ctx = ValidationContext {
            primary_required: true,
            ..context()
        };
        let mut first = complete_row(0, "编号", "id");
        let second = complete_row(1, "更新时间", "updated_at");

        let report = validate(vec![first.clone(), second.clone()], &ctx);
        assert!(report.primary_missing);
        assert!(report.timestamp_missing);
        assert!(!report.validate_status);

        first.primary_flag = true;
        let report = validate(vec![first.clone(), second.clone()], &ctx);
        assert!(!report.primary_missing);
        assert!(report.timestamp_missing);

        let mut second = second;
        second.timestamp_flag = true;
        let report = validate(vec![first, second], &ctx);
        assert!(report.validate_status);
    }

    #[test]
    fn primary_requirement_is_skipped_without_selected_rows() {
        let ctx = ValidationContext {
            primary_required: true,
            ..context()
        };
        let report = validate(Vec::new(), &ctx);
        assert!(!report.primary_missing);
        assert!(report.validate_status);
    }

    #[test]
    fn conflicting_primary_flags_are_tagged() {
        let mut first = complete_row(0, "编号", "id");
        let mut second = complete_row(1, "编码", "code");
        first.primary_flag = true;
        second.primary_flag = true;
        let report = validate(vec![first, second], &context());
        assert!(report.list.iter().all(|row| row.error_tips.contains_key(&ItemAttribute::PrimaryFlag)));
    }

    #[test]
    fn conditional_sharing_requires_a_condition() {
        let mut row = complete_row(0, "年龄", "age");
        row.shared_type = Some(SharedType::Conditional);
        let mut rows = vec![complete_row(1, "姓名", "name"), row];

        let report = validate(rows.clone(), &context());
        assert!(!report.validate_status);
        assert!(report.list[1].error_tips.contains_key(&ItemAttribute::SharedCondition));

        rows[1].shared_condition = Some("仅限公安部门使用".into());
        assert!(validate(rows, &context()).validate_status);
    }

    #[test]
    fn validate_row_checks_siblings_without_touching_them() {
        let mut rows = vec![complete_row(0, "姓名", "name"), complete_row(1, "姓名", "alias")];
        rows[0].error_tips.insert(ItemAttribute::Description, "stale".into());

        assert!(!validate_row(&mut rows, 1, &context()));
        assert!(rows[1].error_tips.contains_key(&ItemAttribute::BusinessName));
        assert!(rows[0].error_tips.contains_key(&ItemAttribute::Description));

        rows[1].business_name = "别名".into();
        assert!(validate_row(&mut rows, 1, &context()));
    }

    #[test]
    fn error_tips_follow_column_order() {
        let mut row = InformationItem::new(RowId::Draft(0));
        row.technical_name = "name".into();
        row.business_name = "姓名".into();
        let rows = vec![row.clone(), row];
        let report = validate(rows, &context());
        let keys: Vec<_> = report.list[0].error_tips.keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.first(), Some(&ItemAttribute::BusinessName));
    }
}
