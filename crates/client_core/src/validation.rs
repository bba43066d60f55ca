//! Required-field tracking and form validity.
//!
//! Validity is derived purely from field emptiness; `touched` only gates
//! whether an error indicator may be shown for a field, never whether the
//! form counts as valid.

use std::collections::BTreeMap;
use std::fmt;

/// Input fields of the pitch form. Declaration order of the required fields
/// is the order used for first-invalid detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    ClientName,
    CompanyName,
    NamName,
    NamCircle,
    Industry,
    BudgetBand,
    ClientEmail,
    Size,
}

impl FieldId {
    /// Required fields in first-invalid priority order.
    pub const REQUIRED: [FieldId; 6] = [
        FieldId::ClientName,
        FieldId::CompanyName,
        FieldId::NamName,
        FieldId::NamCircle,
        FieldId::Industry,
        FieldId::BudgetBand,
    ];

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::ClientName => "client_name",
            FieldId::CompanyName => "company_name",
            FieldId::NamName => "nam_name",
            FieldId::NamCircle => "nam_circle",
            FieldId::Industry => "industry",
            FieldId::BudgetBand => "budget_band",
            FieldId::ClientEmail => "client_email",
            FieldId::Size => "size",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
struct FieldState {
    value: String,
    touched: bool,
}

/// Result of a validity recomputation. Pure derived output; recomputing twice
/// with no intervening edit yields the same outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// First required field (in declaration order) whose trimmed value is
    /// empty, regardless of touched state.
    pub first_invalid: Option<FieldId>,
    /// True only when `first_invalid` has been touched; gates scroll-to-field
    /// so focus is never stolen before the operator has interacted.
    pub focus_first_invalid: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PitchForm {
    fields: BTreeMap<FieldId, FieldState>,
}

impl PitchForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, field: FieldId, value: impl Into<String>) {
        self.fields.entry(field).or_default().value = value.into();
    }

    /// One-way transition to touched, triggered by the first input or change
    /// event on the field. Idempotent.
    pub fn mark_touched(&mut self, field: FieldId) {
        self.fields.entry(field).or_default().touched = true;
    }

    pub fn value(&self, field: FieldId) -> &str {
        self.fields
            .get(&field)
            .map(|state| state.value.as_str())
            .unwrap_or("")
    }

    pub fn trimmed_value(&self, field: FieldId) -> &str {
        self.value(field).trim()
    }

    pub fn is_touched(&self, field: FieldId) -> bool {
        self.fields
            .get(&field)
            .map(|state| state.touched)
            .unwrap_or(false)
    }

    /// Whether the field should display an error indicator: touched and
    /// required and trimmed-empty. Untouched fields never show one.
    pub fn shows_error(&self, field: FieldId) -> bool {
        field.is_required() && self.is_touched(field) && self.trimmed_value(field).is_empty()
    }

    /// Recomputes overall validity. No side effects on field state.
    pub fn recompute(&self) -> ValidationOutcome {
        let first_invalid = FieldId::REQUIRED
            .into_iter()
            .find(|field| self.trimmed_value(*field).is_empty());
        ValidationOutcome {
            valid: first_invalid.is_none(),
            first_invalid,
            focus_first_invalid: first_invalid
                .map(|field| self.is_touched(field))
                .unwrap_or(false),
        }
    }
}
