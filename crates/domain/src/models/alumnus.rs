//! Alumnus attributes supplied by the identity collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The attributes of a caller that eligibility rules look at.
///
/// Trusted as given; this service performs no profile lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Alumnus {
    pub id: Uuid,
    pub batch: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_tier: Option<String>,
}

impl Alumnus {
    pub fn new(
        id: Uuid,
        batch: impl Into<String>,
        department: impl Into<String>,
        membership_tier: Option<String>,
    ) -> Self {
        Self {
            id,
            batch: batch.into(),
            department: department.into(),
            membership_tier,
        }
    }
}
