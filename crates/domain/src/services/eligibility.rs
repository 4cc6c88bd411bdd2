//! Eligibility evaluation.
//!
//! Matches an alumnus's batch, department and membership tier against an
//! event's rules. Labels are compared trimmed and case folded, so
//! "CSE" and " cse " are the same department.

use std::collections::BTreeSet;

use shared::validation::normalize_label;

use crate::models::{Alumnus, EligibilityRules};

/// First rule axis an alumnus failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    BatchNotAllowed,
    DepartmentNotAllowed,
    MembershipRequired,
    TierNotAllowed,
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IneligibleReason::BatchNotAllowed => write!(f, "batch is not eligible"),
            IneligibleReason::DepartmentNotAllowed => write!(f, "department is not eligible"),
            IneligibleReason::MembershipRequired => write!(f, "membership is required"),
            IneligibleReason::TierNotAllowed => write!(f, "membership tier is not eligible"),
        }
    }
}

fn allows(set: &BTreeSet<String>, value: &str) -> bool {
    if set.is_empty() {
        return true;
    }
    let value = normalize_label(value);
    set.iter().any(|allowed| normalize_label(allowed) == value)
}

/// Evaluates every axis; all must pass.
pub fn evaluate(rules: &EligibilityRules, alumnus: &Alumnus) -> Result<(), IneligibleReason> {
    if !allows(&rules.batches, &alumnus.batch) {
        return Err(IneligibleReason::BatchNotAllowed);
    }
    if !allows(&rules.departments, &alumnus.department) {
        return Err(IneligibleReason::DepartmentNotAllowed);
    }
    if rules.requires_membership {
        let tier = alumnus
            .membership_tier
            .as_deref()
            .filter(|tier| !tier.trim().is_empty())
            .ok_or(IneligibleReason::MembershipRequired)?;
        if !allows(&rules.required_tiers, tier) {
            return Err(IneligibleReason::TierNotAllowed);
        }
    }
    Ok(())
}

pub fn is_eligible(rules: &EligibilityRules, alumnus: &Alumnus) -> bool {
    evaluate(rules, alumnus).is_ok()
}
