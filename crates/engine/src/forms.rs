//! Form checks for the mount step (schedule plan) and the base-info step.
//!
//! Like the item table, form validation returns messages instead of failing:
//! an empty [`FormErrors`] means the form is valid.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rescat_types::{CatalogBaseInfo, DepartmentNode, LabelNode, OpenType, SchedulePlan, SharedType, TreeNode, catalog::lookup::find_in};
use serde::Serialize;

/// Maximum length of a catalog name.
pub const CATALOG_NAME_MAX_CHARS: usize = 128;
/// Maximum length of free-text form fields.
pub const FORM_TEXT_MAX_CHARS: usize = 255;

static CATALOG_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{Han}A-Za-z0-9_\-()（）]+$").expect("catalog name pattern"));
static CRON_FIELD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z*/,\-?#]+$").expect("cron field pattern"));

/// A control on the mount or base-info form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Description,
    Department,
    Categories,
    DataGrade,
    UpdateCycle,
    SharedType,
    SharedCondition,
    OpenType,
    OpenCondition,
    SchedulePlan,
    ScheduleCron,
    ScheduleStart,
    ScheduleEnd,
}

/// Messages keyed by form control, in form order.
pub type FormErrors = IndexMap<FormField, String>;

/// Checks the catalog name, the only field a staged draft requires.
pub fn validate_catalog_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return Some("please enter catalog name".to_string());
    }
    if name.chars().count() > CATALOG_NAME_MAX_CHARS {
        return Some(format!("cannot exceed {} characters", CATALOG_NAME_MAX_CHARS));
    }
    if !CATALOG_NAME_PATTERN.is_match(name) {
        return Some("only Chinese characters, letters, digits, underscores, hyphens and brackets are allowed".to_string());
    }
    None
}

/// Checks the base-info form on its own.
pub fn validate_base_info(info: &CatalogBaseInfo) -> FormErrors {
    let mut errors = FormErrors::new();
    if let Some(message) = validate_catalog_name(&info.name) {
        errors.insert(FormField::Name, message);
    }
    if info
        .description
        .as_deref()
        .is_some_and(|text| text.chars().count() > FORM_TEXT_MAX_CHARS)
    {
        errors.insert(FormField::Description, format!("cannot exceed {} characters", FORM_TEXT_MAX_CHARS));
    }
    if is_blank(info.department_id.as_deref()) {
        errors.insert(FormField::Department, "please select the owning department".to_string());
    }
    if info.category_ids.iter().all(|id| id.trim().is_empty()) {
        errors.insert(FormField::Categories, "please select at least one category".to_string());
    }
    if is_blank(info.data_grade_id.as_deref()) {
        errors.insert(FormField::DataGrade, "please select data grade".to_string());
    }
    if info.update_cycle.is_none() {
        errors.insert(FormField::UpdateCycle, "please select update cycle".to_string());
    }

    match info.shared_type {
        None => {
            errors.insert(FormField::SharedType, "please select shared attribute".to_string());
        }
        Some(SharedType::Conditional | SharedType::NoShare) if is_blank(info.shared_condition.as_deref()) => {
            errors.insert(FormField::SharedCondition, "please enter shared condition".to_string());
        }
        Some(_) => {}
    }
    match info.open_type {
        None => {
            errors.insert(FormField::OpenType, "please select open attribute".to_string());
        }
        Some(open) if info.shared_type == Some(SharedType::NoShare) && open != OpenType::NotOpen => {
            errors.insert(FormField::OpenType, "entries that are not shared cannot be opened".to_string());
        }
        Some(OpenType::Conditional) if is_blank(info.open_condition.as_deref()) => {
            errors.insert(FormField::OpenCondition, "please enter open condition".to_string());
        }
        Some(_) => {}
    }
    errors
}

/// Checks that the selected grade label and department exist in the lookup trees.
pub fn validate_base_info_refs(info: &CatalogBaseInfo, grades: &[LabelNode], departments: &[DepartmentNode]) -> FormErrors {
    let mut errors = FormErrors::new();
    if let Some(grade_id) = info.data_grade_id.as_deref().filter(|id| !id.trim().is_empty()) {
        match find_in(grades, grade_id) {
            None => {
                errors.insert(FormField::DataGrade, format!("data grade {} no longer exists", grade_id));
            }
            Some(label) if label.is_group => {
                errors.insert(FormField::DataGrade, format!("{} is a grade group, please select a grade", label.name()));
            }
            Some(_) => {}
        }
    }
    if let Some(department_id) = info.department_id.as_deref().filter(|id| !id.trim().is_empty())
        && find_in(departments, department_id).is_none()
    {
        errors.insert(FormField::Department, format!("department {} no longer exists", department_id));
    }
    errors
}

/// Checks the schedule plan on the mount step.
///
/// `None` is an error only when the plan applies, i.e. a data view is mounted.
pub fn validate_schedule_plan(plan: Option<&SchedulePlan>, applies: bool, now: DateTime<Utc>) -> FormErrors {
    let mut errors = FormErrors::new();
    let Some(plan) = plan else {
        if applies {
            errors.insert(FormField::SchedulePlan, "please configure the synchronisation plan".to_string());
        }
        return errors;
    };

    match plan {
        SchedulePlan::Once { start } => {
            if *start <= now {
                errors.insert(FormField::ScheduleStart, "start time must be in the future".to_string());
            }
        }
        SchedulePlan::Periodic { cron, start, end } => {
            if let Some(message) = validate_cron(cron) {
                errors.insert(FormField::ScheduleCron, message);
            }
            if let Some(end) = end {
                if end <= start {
                    errors.insert(FormField::ScheduleEnd, "end time must be later than start time".to_string());
                } else if *end <= now {
                    errors.insert(FormField::ScheduleEnd, "end time must be in the future".to_string());
                }
            }
        }
    }
    errors
}

fn validate_cron(expression: &str) -> Option<String> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.is_empty() {
        return Some("please enter cron expression".to_string());
    }
    if !(5..=6).contains(&fields.len()) || !fields.iter().all(|field| CRON_FIELD_PATTERN.is_match(field)) {
        return Some(format!("invalid cron expression '{}'", expression.trim()));
    }
    None
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|text| text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rescat_types::UpdateCycle;

    fn complete() -> CatalogBaseInfo {
        CatalogBaseInfo {
            name: "人口基础信息".into(),
            description: None,
            department_id: Some("d1".into()),
            category_ids: vec!["cat-1".into()],
            data_grade_id: Some("g1".into()),
            update_cycle: Some(UpdateCycle::Daily),
            shared_type: Some(SharedType::Unconditional),
            shared_condition: None,
            open_type: Some(OpenType::Unconditional),
            open_condition: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).single().expect("valid time")
    }

    #[test]
    fn complete_base_info_passes() {
        assert!(validate_base_info(&complete()).is_empty());
    }

    #[test]
    fn missing_fields_are_reported_in_form_order() {
        let errors = validate_base_info(&CatalogBaseInfo::default());
        let fields: Vec<_> = errors.keys().copied().collect();
        assert_eq!(fields.first(), Some(&FormField::Name));
        assert!(errors.contains_key(&FormField::Department));
        assert!(errors.contains_key(&FormField::SharedType));
        assert!(errors.contains_key(&FormField::OpenType));
    }

    #[test]
    fn not_shared_entries_cannot_be_opened() {
        let mut info = complete();
        info.shared_type = Some(SharedType::NoShare);
        info.shared_condition = Some("涉密".into());
        let errors = validate_base_info(&info);
        assert_eq!(
            errors.get(&FormField::OpenType).map(String::as_str),
            Some("entries that are not shared cannot be opened")
        );
        info.open_type = Some(OpenType::NotOpen);
        assert!(validate_base_info(&info).is_empty());
    }

    #[test]
    fn catalog_name_rules() {
        assert!(validate_catalog_name("  ").is_some());
        assert!(validate_catalog_name("人口信息(2024)").is_none());
        assert!(validate_catalog_name("bad name!").is_some());
        assert!(validate_catalog_name(&"名".repeat(CATALOG_NAME_MAX_CHARS + 1)).is_some());
    }

    #[test]
    fn references_must_exist_and_grades_must_be_leaves() {
        let grades = vec![LabelNode {
            id: "group".into(),
            name: "敏感级别".into(),
            color: None,
            is_group: true,
            children: vec![LabelNode {
                id: "g1".into(),
                name: "一级".into(),
                color: Some("#f00".into()),
                is_group: false,
                children: Vec::new(),
            }],
        }];
        let departments = vec![DepartmentNode {
            id: "d1".into(),
            name: "公安局".into(),
            children: Vec::new(),
        }];
        assert!(validate_base_info_refs(&complete(), &grades, &departments).is_empty());

        let mut info = complete();
        info.data_grade_id = Some("group".into());
        info.department_id = Some("d9".into());
        let errors = validate_base_info_refs(&info, &grades, &departments);
        assert!(errors[&FormField::DataGrade].contains("grade group"));
        assert!(errors.contains_key(&FormField::Department));
    }

    #[test]
    fn schedule_plan_is_required_only_when_it_applies() {
        assert!(validate_schedule_plan(None, false, now()).is_empty());
        assert!(validate_schedule_plan(None, true, now()).contains_key(&FormField::SchedulePlan));
    }

    #[test]
    fn schedule_plan_times_are_checked() {
        let past = SchedulePlan::Once {
            start: now() - Duration::hours(1),
        };
        assert!(validate_schedule_plan(Some(&past), true, now()).contains_key(&FormField::ScheduleStart));

        let periodic = SchedulePlan::Periodic {
            cron: "0 2 * * *".into(),
            start: now(),
            end: Some(now() - Duration::days(1)),
        };
        let errors = validate_schedule_plan(Some(&periodic), true, now());
        assert!(errors.contains_key(&FormField::ScheduleEnd));
        assert!(!errors.contains_key(&FormField::ScheduleCron));

        let bad_cron = SchedulePlan::Periodic {
            cron: "every day".into(),
            start: now(),
            end: None,
        };
        assert!(validate_schedule_plan(Some(&bad_cron), true, now()).contains_key(&FormField::ScheduleCron));
    }
}
