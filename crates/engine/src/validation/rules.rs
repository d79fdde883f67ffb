//! Static rule table for information item cells.
//!
//! Each [`FieldRule`] describes one attribute: when it is required and with which
//! message, the pattern and length limits applied to its text, and an optional
//! cross-attribute check (numeric bounds that depend on `data_type`, conditions that
//! depend on the sharing attributes). [`rule_table`] selects the rules that apply to
//! the current [`ValidationContext`].

use once_cell::sync::Lazy;
use regex::Regex;
use rescat_types::{DataType, InformationItem, ItemAttribute, OpenType, SharedType};

use super::ValidationContext;
use crate::session::CatalogMode;

/// Maximum length of a `char` column.
pub const CHAR_MAX_LENGTH: u32 = 65535;
/// Maximum length (total digits) of a `decimal` column.
pub const DECIMAL_MAX_LENGTH: u32 = 38;
/// Maximum number of characters of names and condition text.
pub const NAME_MAX_CHARS: usize = 255;

static BUSINESS_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{Han}A-Za-z0-9_\-]+$").expect("business name pattern"));
static TECHNICAL_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("technical name pattern"));

/// When an attribute must carry a value.
#[derive(Clone, Copy)]
pub enum Requirement {
    Optional,
    Always(&'static str),
    /// Required only when the predicate holds for the row.
    When(fn(&InformationItem) -> bool, &'static str),
}

/// Regex constraint on an attribute's text.
#[derive(Clone, Copy)]
pub struct PatternRule {
    pub regex: &'static Lazy<Regex>,
    pub message: &'static str,
}

/// Validation rule for one attribute.
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub attribute: ItemAttribute,
    pub requirement: Requirement,
    pub pattern: Option<PatternRule>,
    pub max_chars: Option<usize>,
    /// Cross-attribute check run once the value is present.
    pub check: Option<fn(&InformationItem) -> Option<String>>,
}

impl FieldRule {
    const fn new(attribute: ItemAttribute) -> Self {
        Self {
            attribute,
            requirement: Requirement::Optional,
            pattern: None,
            max_chars: None,
            check: None,
        }
    }

    const fn required(mut self, message: &'static str) -> Self {
        self.requirement = Requirement::Always(message);
        self
    }

    const fn required_when(mut self, predicate: fn(&InformationItem) -> bool, message: &'static str) -> Self {
        self.requirement = Requirement::When(predicate, message);
        self
    }

    const fn pattern(mut self, regex: &'static Lazy<Regex>, message: &'static str) -> Self {
        self.pattern = Some(PatternRule { regex, message });
        self
    }

    const fn max_chars(mut self, limit: usize) -> Self {
        self.max_chars = Some(limit);
        self
    }

    const fn check(mut self, check: fn(&InformationItem) -> Option<String>) -> Self {
        self.check = Some(check);
        self
    }

    /// Evaluates the rule against a row, returning the first failing message.
    pub fn evaluate(&self, item: &InformationItem) -> Option<String> {
        let text = item.attribute_text(self.attribute);
        let Some(text) = text else {
            return match self.requirement {
                Requirement::Always(message) => Some(message.to_string()),
                Requirement::When(predicate, message) if predicate(item) => Some(message.to_string()),
                _ => None,
            };
        };

        if let Some(limit) = self.max_chars
            && text.chars().count() > limit
        {
            return Some(format!("cannot exceed {} characters", limit));
        }
        if let Some(pattern) = &self.pattern
            && !pattern.regex.is_match(&text)
        {
            return Some(pattern.message.to_string());
        }
        self.check.and_then(|check| check(item))
    }
}

fn needs_length(item: &InformationItem) -> bool {
    item.data_type.is_some_and(|data_type| data_type.requires_length())
}

fn needs_shared_condition(item: &InformationItem) -> bool {
    matches!(item.shared_type, Some(SharedType::Conditional) | Some(SharedType::NoShare))
}

fn needs_open_condition(item: &InformationItem) -> bool {
    item.open_type == Some(OpenType::Conditional)
}

fn check_data_length(item: &InformationItem) -> Option<String> {
    let length = item.data_length?;
    match item.data_type {
        Some(DataType::Char) if !(1..=CHAR_MAX_LENGTH).contains(&length) => {
            Some(format!("data length must be within 1~{}", CHAR_MAX_LENGTH))
        }
        Some(DataType::Decimal) if !(1..=DECIMAL_MAX_LENGTH).contains(&length) => {
            Some(format!("data length must be within 1~{}", DECIMAL_MAX_LENGTH))
        }
        _ => None,
    }
}

fn check_data_precision(item: &InformationItem) -> Option<String> {
    let precision = item.data_precision?;
    if item.data_type != Some(DataType::Decimal) {
        return None;
    }
    match item.data_length {
        Some(length) if precision > length => Some("data precision cannot exceed data length".to_string()),
        _ => None,
    }
}

/// Rules for the attributes every mode validates.
fn base_rules(mode: CatalogMode) -> Vec<FieldRule> {
    let data_type = match mode {
        // Manually authored rows have no source schema to inherit a type from.
        CatalogMode::Empty => FieldRule::new(ItemAttribute::DataType).required("please select data type"),
        _ => FieldRule::new(ItemAttribute::DataType),
    };

    vec![
        FieldRule::new(ItemAttribute::BusinessName)
            .required("please enter business name")
            .max_chars(NAME_MAX_CHARS)
            .pattern(
                &BUSINESS_NAME_PATTERN,
                "only Chinese characters, letters, digits, underscores and hyphens are allowed",
            ),
        FieldRule::new(ItemAttribute::TechnicalName)
            .required("please enter technical name")
            .max_chars(NAME_MAX_CHARS)
            .pattern(
                &TECHNICAL_NAME_PATTERN,
                "must start with a letter and contain only letters, digits and underscores",
            ),
        data_type,
        FieldRule::new(ItemAttribute::DataLength)
            .required_when(needs_length, "please enter data length")
            .check(check_data_length),
        FieldRule::new(ItemAttribute::DataPrecision).check(check_data_precision),
        FieldRule::new(ItemAttribute::DataRange).max_chars(128),
        FieldRule::new(ItemAttribute::SharedType).required("please select shared attribute"),
        FieldRule::new(ItemAttribute::SharedCondition)
            .required_when(needs_shared_condition, "please enter shared condition")
            .max_chars(NAME_MAX_CHARS),
        FieldRule::new(ItemAttribute::OpenType).required("please select open attribute"),
        FieldRule::new(ItemAttribute::OpenCondition)
            .required_when(needs_open_condition, "please enter open condition")
            .max_chars(NAME_MAX_CHARS),
        FieldRule::new(ItemAttribute::SensitiveFlag).required("please select sensitive attribute"),
        FieldRule::new(ItemAttribute::ClassifiedFlag).required("please select classified attribute"),
        FieldRule::new(ItemAttribute::Description).max_chars(NAME_MAX_CHARS),
    ]
}

/// Selects the rules that apply to `context`.
pub fn rule_table(context: &ValidationContext) -> Vec<FieldRule> {
    let mut rules = base_rules(context.mode);
    if context.mode == CatalogMode::Government {
        rules.push(
            FieldRule::new(ItemAttribute::SourceSystem)
                .required("please enter source system")
                .max_chars(NAME_MAX_CHARS),
        );
        rules.push(FieldRule::new(ItemAttribute::SourceSystemLevel).required("please select source system level"));
        if context.has_backing_resource {
            rules.push(FieldRule::new(ItemAttribute::SourceId).required("please select the mapped source field"));
        }
    }
    rules.sort_by_key(|rule| rule.attribute);
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescat_types::RowId;

    fn rule_for(context: &ValidationContext, attribute: ItemAttribute) -> Option<FieldRule> {
        rule_table(context).into_iter().find(|rule| rule.attribute == attribute)
    }

    fn context(mode: CatalogMode, has_backing_resource: bool) -> ValidationContext {
        ValidationContext {
            mode,
            primary_required: false,
            has_backing_resource,
        }
    }

    #[test]
    fn char_length_is_bounded() {
        let rule = rule_for(&context(CatalogMode::WithResource, true), ItemAttribute::DataLength).expect("length rule");
        let mut item = InformationItem::new(RowId::Draft(0));
        item.data_type = Some(DataType::Char);
        item.data_length = Some(65536);
        assert_eq!(rule.evaluate(&item).as_deref(), Some("data length must be within 1~65535"));
        item.data_length = Some(65535);
        assert_eq!(rule.evaluate(&item), None);
    }

    #[test]
    fn decimal_length_and_precision_are_bounded() {
        let ctx = context(CatalogMode::WithResource, true);
        let length = rule_for(&ctx, ItemAttribute::DataLength).expect("length rule");
        let precision = rule_for(&ctx, ItemAttribute::DataPrecision).expect("precision rule");
        let mut item = InformationItem::new(RowId::Draft(0));
        item.data_type = Some(DataType::Decimal);

        assert_eq!(length.evaluate(&item).as_deref(), Some("please enter data length"));
        item.data_length = Some(39);
        assert_eq!(length.evaluate(&item).as_deref(), Some("data length must be within 1~38"));

        item.data_length = Some(10);
        item.data_precision = Some(12);
        assert_eq!(precision.evaluate(&item).as_deref(), Some("data precision cannot exceed data length"));
    }

    #[test]
    fn int_columns_need_no_length() {
        let rule = rule_for(&context(CatalogMode::Empty, false), ItemAttribute::DataLength).expect("length rule");
        let mut item = InformationItem::new(RowId::Draft(0));
        item.data_type = Some(DataType::Int);
        assert_eq!(rule.evaluate(&item), None);
    }

    #[test]
    fn data_type_is_required_only_for_empty_catalogs() {
        let item = InformationItem::new(RowId::Draft(0));
        let empty = rule_for(&context(CatalogMode::Empty, false), ItemAttribute::DataType).expect("rule");
        let mounted = rule_for(&context(CatalogMode::WithResource, true), ItemAttribute::DataType).expect("rule");
        assert!(empty.evaluate(&item).is_some());
        assert!(mounted.evaluate(&item).is_none());
    }

    #[test]
    fn government_mode_adds_source_rules() {
        let with_resource = context(CatalogMode::Government, true);
        let without_resource = context(CatalogMode::Government, false);
        assert!(rule_for(&with_resource, ItemAttribute::SourceSystem).is_some());
        assert!(rule_for(&with_resource, ItemAttribute::SourceSystemLevel).is_some());
        assert!(rule_for(&with_resource, ItemAttribute::SourceId).is_some());
        assert!(rule_for(&without_resource, ItemAttribute::SourceId).is_none());
        assert!(rule_for(&context(CatalogMode::WithResource, true), ItemAttribute::SourceSystem).is_none());
    }

    #[test]
    fn names_follow_their_patterns() {
        let ctx = context(CatalogMode::WithResource, true);
        let business = rule_for(&ctx, ItemAttribute::BusinessName).expect("rule");
        let technical = rule_for(&ctx, ItemAttribute::TechnicalName).expect("rule");
        let mut item = InformationItem::new(RowId::Draft(0));
        item.business_name = "姓名_1".into();
        item.technical_name = "1name".into();
        assert_eq!(business.evaluate(&item), None);
        assert!(technical.evaluate(&item).is_some());

        item.business_name = "姓名 !".into();
        assert!(business.evaluate(&item).is_some());
    }

    #[test]
    fn overlong_names_report_the_limit() {
        let rule = rule_for(&context(CatalogMode::WithResource, true), ItemAttribute::TechnicalName).expect("rule");
        let mut item = InformationItem::new(RowId::Draft(0));
        item.technical_name = "a".repeat(NAME_MAX_CHARS + 1);
        assert_eq!(rule.evaluate(&item).as_deref(), Some("cannot exceed 255 characters"));
    }
}
