//! Step orchestration for the cataloging wizard.
//!
//! The wizard walks mount resource → information items → base info, skipping the
//! item step when every mounted resource is a file. Moving forward runs the gate of
//! the step being left; moving back never validates.

use chrono::{DateTime, Utc};
use rescat_types::{DepartmentNode, LabelNode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    forms::{FormErrors, validate_base_info, validate_base_info_refs, validate_catalog_name, validate_schedule_plan},
    session::WizardSession,
    submission::{SubmissionPlan, plan_submission},
    validation::ErrorLocation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Mount,
    Items,
    BaseInfo,
}

/// Why the wizard refused to move forward.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepBlock {
    /// The schedule plan form on the mount step is invalid.
    Mount { errors: FormErrors },
    /// The information item table has errors.
    Items {
        error_count: usize,
        primary_missing: bool,
        timestamp_missing: bool,
        /// Set when resources are mounted but no row is selected.
        no_rows: bool,
        /// Cell the console scrolls into view.
        first_error: Option<ErrorLocation>,
    },
    BaseInfo { errors: FormErrors },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    Advanced { step: WizardStep },
    Blocked { block: StepBlock },
    /// The last step validated; the entry can be submitted.
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("already at the first step")]
    AtFirstStep,
    #[error("cannot stage draft: {0}")]
    InvalidName(String),
}

/// Lookup trees used to check base-info references.
#[derive(Debug, Clone, Default)]
pub struct BaseInfoLookups {
    pub grades: Vec<LabelNode>,
    pub departments: Vec<DepartmentNode>,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    current: WizardStep,
    lookups: Option<BaseInfoLookups>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            current: WizardStep::Mount,
            lookups: None,
        }
    }

    /// Enables reference checks of the department and data-grade selections.
    pub fn with_lookups(mut self, lookups: BaseInfoLookups) -> Self {
        self.lookups = Some(lookups);
        self
    }

    /// Steps shown for the session's current resource selection.
    pub fn steps(session: &WizardSession) -> Vec<WizardStep> {
        if session.all_files() {
            vec![WizardStep::Mount, WizardStep::BaseInfo]
        } else {
            vec![WizardStep::Mount, WizardStep::Items, WizardStep::BaseInfo]
        }
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    /// Validates the current step and advances when it passes.
    pub fn next(&mut self, session: &mut WizardSession, now: DateTime<Utc>) -> StepOutcome {
        if let Some(block) = self.gate(session, now) {
            debug!(step = ?self.current, "wizard step blocked");
            return StepOutcome::Blocked { block };
        }

        let steps = Self::steps(session);
        let position = steps.iter().position(|step| *step == self.current).unwrap_or(0);
        match steps.get(position + 1) {
            Some(step) => {
                info!(from = ?self.current, to = ?step, "advanced wizard step");
                self.current = *step;
                StepOutcome::Advanced { step: *step }
            }
            None => StepOutcome::Ready,
        }
    }

    pub fn previous(&mut self, session: &WizardSession) -> Result<WizardStep, WizardError> {
        let steps = Self::steps(session);
        let position = steps
            .iter()
            .position(|step| *step == self.current)
            .ok_or(WizardError::AtFirstStep)?;
        if position == 0 {
            return Err(WizardError::AtFirstStep);
        }
        self.current = steps[position - 1];
        debug!(step = ?self.current, "moved wizard back");
        Ok(self.current)
    }

    /// Saves a draft. Only the catalog name is checked; everything else is kept as entered.
    pub fn stage(&self, session: &WizardSession) -> Result<SubmissionPlan, WizardError> {
        if let Some(message) = validate_catalog_name(&session.base_info.name) {
            return Err(WizardError::InvalidName(message));
        }
        Ok(plan_submission(session, true))
    }

    fn gate(&self, session: &mut WizardSession, now: DateTime<Utc>) -> Option<StepBlock> {
        match self.current {
            WizardStep::Mount => {
                if !session.schedule_plan_applies() {
                    return None;
                }
                let errors = validate_schedule_plan(session.schedule_plan.as_ref(), true, now);
                (!errors.is_empty()).then_some(StepBlock::Mount { errors })
            }
            WizardStep::Items => {
                if session.table.is_empty() && !session.has_backing_resource() {
                    return None;
                }
                let context = session.validation_context();
                let report = session.table.validate(&context);
                let no_rows = session.has_backing_resource() && session.table.selected().next().is_none();
                if report.validate_status && !no_rows {
                    return None;
                }
                Some(StepBlock::Items {
                    error_count: report.error_count,
                    primary_missing: report.primary_missing,
                    timestamp_missing: report.timestamp_missing,
                    no_rows,
                    first_error: report.navigator().first().cloned(),
                })
            }
            WizardStep::BaseInfo => {
                let mut errors = validate_base_info(&session.base_info);
                if let Some(lookups) = &self.lookups {
                    for (field, message) in validate_base_info_refs(&session.base_info, &lookups.grades, &lookups.departments) {
                        errors.entry(field).or_insert(message);
                    }
                }
                errors.sort_keys();
                (!errors.is_empty()).then_some(StepBlock::BaseInfo { errors })
            }
        }
    }
}
