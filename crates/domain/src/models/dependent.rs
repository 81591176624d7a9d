//! Dependent (family member) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person admitted alongside a registered user, without their own account.
///
/// Dependents belong to a user, not to an event; a check-in references them
/// only through a snapshotted count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub age: Option<i32>,
    pub relationship: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Dependent summary shown to the operator on the approval card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentSummary {
    pub full_name: String,
    pub age: Option<i32>,
    pub relationship: Option<String>,
}

impl From<Dependent> for DependentSummary {
    fn from(dependent: Dependent) -> Self {
        Self {
            full_name: dependent.full_name,
            age: dependent.age,
            relationship: dependent.relationship,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependent_summary_from_dependent() {
        let dependent = Dependent {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: "Mia Kovac".to_string(),
            age: Some(7),
            relationship: Some("child".to_string()),
            notes: Some("nut allergy".to_string()),
            created_at: Utc::now(),
        };

        let summary = DependentSummary::from(dependent);
        assert_eq!(summary.full_name, "Mia Kovac");
        assert_eq!(summary.age, Some(7));
        assert_eq!(summary.relationship, Some("child".to_string()));
    }
}
