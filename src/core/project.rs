use crate::core::repository::{Record, RecordId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    InProgress,
    Completed,
    Cancelled,
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProjectStatus::Active => "active",
                ProjectStatus::InProgress => "in_progress",
                ProjectStatus::Completed => "completed",
                ProjectStatus::Cancelled => "cancelled",
            }
        )
    }
}

/// A solar installation being financed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    pub location: String,
    /// Installed capacity in kW.
    pub system_size: Decimal,
    pub total_investment: Decimal,
    pub client_name: String,
    #[serde(rename = "expectedIRR")]
    pub expected_irr: Option<Decimal>,
    /// Last computed IRR, in percent.
    #[serde(rename = "actualIRR")]
    pub actual_irr: Option<Decimal>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub location: String,
    pub system_size: Decimal,
    pub total_investment: Decimal,
    pub client_name: String,
    #[serde(default, rename = "expectedIRR")]
    pub expected_irr: Option<Decimal>,
    #[serde(default)]
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub system_size: Option<Decimal>,
    pub total_investment: Option<Decimal>,
    pub client_name: Option<String>,
    #[serde(rename = "expectedIRR")]
    pub expected_irr: Option<Decimal>,
    pub status: Option<ProjectStatus>,
    /// Only set internally when a computed IRR is recorded.
    #[serde(skip)]
    pub actual_irr: Option<Decimal>,
}

impl Record for Project {
    type New = NewProject;
    type Patch = ProjectPatch;

    const KIND: &'static str = "projects";
    const LABEL: &'static str = "Project";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_new(id: RecordId, new: NewProject) -> Self {
        Project {
            id,
            name: new.name,
            location: new.location,
            system_size: new.system_size,
            total_investment: new.total_investment,
            client_name: new.client_name,
            expected_irr: new.expected_irr,
            actual_irr: None,
            status: new.status,
            created_at: Utc::now(),
        }
    }

    fn apply(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(system_size) = patch.system_size {
            self.system_size = system_size;
        }
        if let Some(total_investment) = patch.total_investment {
            self.total_investment = total_investment;
        }
        if let Some(client_name) = patch.client_name {
            self.client_name = client_name;
        }
        if patch.expected_irr.is_some() {
            self.expected_irr = patch.expected_irr;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if patch.actual_irr.is_some() {
            self.actual_irr = patch.actual_irr;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Project {
        let new: NewProject = serde_json::from_str(
            r#"{
                "name": "Rooftop Array",
                "location": "Pune",
                "systemSize": "12.50",
                "totalInvestment": "45000",
                "clientName": "Acme Foods",
                "expectedIRR": "14.5"
            }"#,
        )
        .unwrap();
        Project::from_new(1, new)
    }

    #[test]
    fn test_new_project_defaults() {
        let project = sample();
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.expected_irr, Some(Decimal::new(145, 1)));
        assert!(project.actual_irr.is_none());
    }

    #[test]
    fn test_patch_cannot_set_actual_irr_from_json() {
        let mut project = sample();
        let patch: ProjectPatch =
            serde_json::from_str(r#"{"status": "in_progress", "actualIRR": "99"}"#).unwrap();
        project.apply(patch);

        assert_eq!(project.status, ProjectStatus::InProgress);
        assert!(project.actual_irr.is_none());
        assert_eq!(project.name, "Rooftop Array");
    }

    #[test]
    fn test_project_serializes_original_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["expectedIRR"], "14.5");
        assert_eq!(json["clientName"], "Acme Foods");
        assert_eq!(json["status"], "active");
    }
}
