// ✅ Data Quality - checks an extracted candidate before it is committed
// Critical issues block the commit; warnings are logged and let through

use crate::entry::{parse_ledger_date, EntryCandidate, EntryPatch};
use serde::{Deserialize, Serialize};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Entry would break a ledger invariant
    Warning,  // Questionable but usable
    Info,     // Valid, could be improved
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub rule_name: String,
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn pass(rule_name: &str, field: &str, message: &str) -> Self {
        ValidationResult {
            passed: true,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            severity: Severity::Info,
        }
    }

    pub fn fail(rule_name: &str, field: &str, message: &str, severity: Severity) -> Self {
        ValidationResult {
            passed: false,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            severity,
        }
    }

    /// Failed with a severity that must keep the value out of the ledger
    pub fn is_blocking(&self) -> bool {
        !self.passed && self.severity == Severity::Critical
    }
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub validations: Vec<ValidationResult>,
}

impl QualityReport {
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.validations.iter().filter(|v| !v.passed)
    }

    pub fn has_critical_issues(&self) -> bool {
        self.validations.iter().any(ValidationResult::is_blocking)
    }

    pub fn warnings(&self) -> Vec<&ValidationResult> {
        self.failures()
            .filter(|v| v.severity == Severity::Warning)
            .collect()
    }

    /// "field: message; field: message" over critical failures
    pub fn critical_summary(&self) -> String {
        self.failures()
            .filter(|v| v.severity == Severity::Critical)
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ============================================================================
// VALIDATION RULES
// ============================================================================

/// Run every rule against a candidate
pub fn validate_candidate(candidate: &EntryCandidate) -> QualityReport {
    QualityReport {
        validations: vec![
            validate_amount(candidate.amount),
            validate_date(&candidate.date),
            validate_category(&candidate.category),
            validate_currency(&candidate.currency),
            validate_description(&candidate.description),
        ],
    }
}

/// Run the rules that apply to the fields a patch carries
pub fn validate_patch(patch: &EntryPatch) -> QualityReport {
    let mut validations = Vec::new();

    if let Some(amount) = patch.amount {
        validations.push(validate_amount(amount));
    }
    if let Some(date) = &patch.date {
        validations.push(validate_date(date));
    }
    if let Some(category) = &patch.category {
        validations.push(validate_category(category));
    }
    if let Some(currency) = &patch.currency {
        validations.push(validate_currency(currency));
    }

    QualityReport { validations }
}

/// Amounts are stored as finite magnitudes
pub fn validate_amount(amount: f64) -> ValidationResult {
    if amount.is_nan() || amount.is_infinite() {
        return ValidationResult::fail(
            "amount_invalid",
            "amount",
            "Amount is not a valid number",
            Severity::Critical,
        );
    }

    if amount < 0.0 {
        return ValidationResult::fail(
            "amount_negative",
            "amount",
            &format!("Amount must be non-negative, got {}", amount),
            Severity::Critical,
        );
    }

    if amount == 0.0 {
        return ValidationResult::fail("amount_zero", "amount", "Amount is zero", Severity::Warning);
    }

    ValidationResult::pass("amount_valid", "amount", "Amount is valid")
}

fn validate_date(date: &str) -> ValidationResult {
    if date.trim().is_empty() {
        return ValidationResult::fail("date_not_empty", "date", "Date is empty", Severity::Critical);
    }

    if parse_ledger_date(date).is_some() {
        return ValidationResult::pass("date_valid", "date", "Date format valid (YYYY-MM-DD)");
    }

    ValidationResult::fail(
        "date_invalid_format",
        "date",
        &format!("Invalid date format: {}", date),
        Severity::Critical,
    )
}

fn validate_category(category: &str) -> ValidationResult {
    if category.trim().is_empty() {
        return ValidationResult::fail(
            "category_not_empty",
            "category",
            "Category is empty",
            Severity::Critical,
        );
    }

    ValidationResult::pass("category_present", "category", "Category present")
}

fn validate_currency(currency: &str) -> ValidationResult {
    let code = currency.trim();
    if code.is_empty() {
        return ValidationResult::fail(
            "currency_not_empty",
            "currency",
            "Currency is empty",
            Severity::Warning,
        );
    }

    // Currency stays free-form; non-ISO codes are only noted
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        ValidationResult::pass("currency_iso", "currency", "ISO 4217 style code")
    } else {
        ValidationResult::fail(
            "currency_non_iso",
            "currency",
            &format!("Currency '{}' is not an ISO 4217 code", code),
            Severity::Info,
        )
    }
}

fn validate_description(description: &str) -> ValidationResult {
    if description.trim().is_empty() {
        return ValidationResult::fail(
            "description_empty",
            "description",
            "Description is empty",
            Severity::Info,
        );
    }

    ValidationResult::pass("description_present", "description", "Description present")
}

// ============================================================================
// TESTS
// ============================================================================
