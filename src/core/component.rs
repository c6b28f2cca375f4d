//! Reusable cost components and their use in projects

use crate::core::repository::{Record, RecordId, Relation};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    SolarPanels,
    Inverters,
    Mounting,
    Electrical,
    Labor,
    Permits,
    Other,
}

impl Display for ComponentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ComponentCategory::SolarPanels => "Solar Panels",
                ComponentCategory::Inverters => "Inverters",
                ComponentCategory::Mounting => "Mounting Systems",
                ComponentCategory::Electrical => "Electrical Components",
                ComponentCategory::Labor => "Labor",
                ComponentCategory::Permits => "Permits & Licensing",
                ComponentCategory::Other => "Other",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostComponent {
    pub id: RecordId,
    pub name: String,
    pub category: ComponentCategory,
    /// e.g. "piece", "kW", "hour"
    pub unit_type: String,
    pub base_price: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCostComponent {
    pub name: String,
    pub category: ComponentCategory,
    pub unit_type: String,
    pub base_price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostComponentPatch {
    pub name: Option<String>,
    pub category: Option<ComponentCategory>,
    pub unit_type: Option<String>,
    pub base_price: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Record for CostComponent {
    type New = NewCostComponent;
    type Patch = CostComponentPatch;

    const KIND: &'static str = "cost_components";
    const LABEL: &'static str = "Cost component";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_new(id: RecordId, new: NewCostComponent) -> Self {
        CostComponent {
            id,
            name: new.name,
            category: new.category,
            unit_type: new.unit_type,
            base_price: new.base_price,
            description: new.description,
            is_active: new.is_active,
            created_at: Utc::now(),
        }
    }

    fn apply(&mut self, patch: CostComponentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(unit_type) = patch.unit_type {
            self.unit_type = unit_type;
        }
        if let Some(base_price) = patch.base_price {
            self.base_price = base_price;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }
}

fn default_status() -> String {
    "planned".to_string()
}

fn default_payment_status() -> String {
    "pending".to_string()
}

/// A component actually used in a project, with the supplier it was
/// sourced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectComponent {
    pub id: RecordId,
    pub project_id: RecordId,
    pub component_id: RecordId,
    pub supplier_id: RecordId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_cost: Decimal,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub actual_date: Option<DateTime<Utc>>,
    pub status: String,
    pub payment_status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectComponent {
    pub project_id: RecordId,
    pub component_id: RecordId,
    pub supplier_id: RecordId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Defaults to `quantity * unit_price`.
    #[serde(default)]
    pub total_cost: Option<Decimal>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_date: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_payment_status")]
    pub payment_status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectComponentPatch {
    pub project_id: Option<RecordId>,
    pub component_id: Option<RecordId>,
    pub supplier_id: Option<RecordId>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub actual_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub notes: Option<String>,
}

impl Record for ProjectComponent {
    type New = NewProjectComponent;
    type Patch = ProjectComponentPatch;

    const KIND: &'static str = "project_components";
    const LABEL: &'static str = "Project component";
    const RELATIONS: &'static [Relation] =
        &[Relation::Project, Relation::Supplier, Relation::Component];

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate(new: &NewProjectComponent) -> Result<()> {
        if new.total_cost.is_none() && new.quantity.checked_mul(new.unit_price).is_none() {
            bail!(
                "Invalid project component data: total cost of {} x {} overflows",
                new.quantity,
                new.unit_price
            );
        }
        Ok(())
    }

    fn from_new(id: RecordId, new: NewProjectComponent) -> Self {
        // `validate` rules out the overflow
        let total_cost = new
            .total_cost
            .or_else(|| new.quantity.checked_mul(new.unit_price))
            .unwrap_or_default();
        ProjectComponent {
            id,
            project_id: new.project_id,
            component_id: new.component_id,
            supplier_id: new.supplier_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
            total_cost,
            scheduled_date: new.scheduled_date,
            actual_date: new.actual_date,
            status: new.status,
            payment_status: new.payment_status,
            notes: new.notes,
            created_at: Utc::now(),
        }
    }

    fn apply(&mut self, patch: ProjectComponentPatch) {
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(component_id) = patch.component_id {
            self.component_id = component_id;
        }
        if let Some(supplier_id) = patch.supplier_id {
            self.supplier_id = supplier_id;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(unit_price) = patch.unit_price {
            self.unit_price = unit_price;
        }
        if let Some(total_cost) = patch.total_cost {
            self.total_cost = total_cost;
        }
        if patch.scheduled_date.is_some() {
            self.scheduled_date = patch.scheduled_date;
        }
        if patch.actual_date.is_some() {
            self.actual_date = patch.actual_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(payment_status) = patch.payment_status {
            self.payment_status = payment_status;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
    }

    fn related_id(&self, relation: Relation) -> Option<RecordId> {
        match relation {
            Relation::Project => Some(self.project_id),
            Relation::Supplier => Some(self.supplier_id),
            Relation::Component => Some(self.component_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_component_category() {
        let new: NewCostComponent = serde_json::from_str(
            r#"{"name": "450W Mono Panel", "category": "solar_panels",
                "unitType": "piece", "basePrice": "185.00"}"#,
        )
        .unwrap();
        let component = CostComponent::from_new(1, new);

        assert_eq!(component.category, ComponentCategory::SolarPanels);
        assert_eq!(component.category.to_string(), "Solar Panels");
        assert!(component.is_active);
    }

    #[test]
    fn test_project_component_derives_total_cost() {
        let new: NewProjectComponent = serde_json::from_str(
            r#"{"projectId": 1, "componentId": 2, "supplierId": 3,
                "quantity": "24", "unitPrice": "185.00"}"#,
        )
        .unwrap();
        let usage = ProjectComponent::from_new(1, new);

        assert_eq!(usage.total_cost, Decimal::from(4440));
        assert_eq!(usage.status, "planned");
        assert_eq!(usage.payment_status, "pending");
    }

    #[test]
    fn test_project_component_rejects_overflowing_total() {
        let new: NewProjectComponent = serde_json::from_str(
            r#"{"projectId": 1, "componentId": 2, "supplierId": 3,
                "quantity": "79228162514264337593543950335", "unitPrice": "2"}"#,
        )
        .unwrap();
        let err = ProjectComponent::validate(&new).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Invalid project component data"),
            "{err}"
        );

        // An explicit total needs no multiplication
        let with_total = NewProjectComponent {
            total_cost: Some(Decimal::ONE),
            ..new
        };
        assert!(ProjectComponent::validate(&with_total).is_ok());
    }

    #[test]
    fn test_project_component_keeps_explicit_total() {
        let new: NewProjectComponent = serde_json::from_str(
            r#"{"projectId": 1, "componentId": 2, "supplierId": 3,
                "quantity": "2", "unitPrice": "100", "totalCost": "180"}"#,
        )
        .unwrap();
        assert_eq!(
            ProjectComponent::from_new(1, new).total_cost,
            Decimal::from(180)
        );
    }
}
