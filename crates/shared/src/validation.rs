//! Common validation utilities.

use std::collections::BTreeSet;

use validator::ValidationError;

/// Maximum length of a batch, department or tier label.
pub const MAX_LABEL_LENGTH: usize = 64;

/// Normalizes an eligibility label for comparison: trimmed and lowercased.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Normalizes a set of labels, dropping blanks.
pub fn normalize_labels<'a, I>(labels: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    labels
        .into_iter()
        .map(|l| normalize_label(l))
        .filter(|l| !l.is_empty())
        .collect()
}

/// Validates that a string is not blank after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates every label of an eligibility set.
pub fn validate_labels(labels: &BTreeSet<String>) -> Result<(), ValidationError> {
    for label in labels {
        if label.trim().is_empty() {
            let mut err = ValidationError::new("label_blank");
            err.message = Some("Eligibility labels must not be blank".into());
            return Err(err);
        }
        if label.chars().count() > MAX_LABEL_LENGTH {
            let mut err = ValidationError::new("label_length");
            err.message = Some(
                format!("Eligibility labels must be at most {MAX_LABEL_LENGTH} characters").into(),
            );
            return Err(err);
        }
    }
    Ok(())
}
