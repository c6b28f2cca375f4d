use crate::core::repository::{Record, RecordId, Relation};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Planned versus realised cash flow of a project for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowProjection {
    pub id: RecordId,
    pub project_id: RecordId,
    pub month: u32,
    pub year: i32,
    pub projected_inflow: Decimal,
    pub projected_outflow: Decimal,
    pub actual_inflow: Option<Decimal>,
    pub actual_outflow: Option<Decimal>,
}

impl CashFlowProjection {
    pub fn projected_net(&self) -> Decimal {
        self.projected_inflow - self.projected_outflow
    }

    /// `None` until both actual figures are known.
    pub fn actual_net(&self) -> Option<Decimal> {
        Some(self.actual_inflow? - self.actual_outflow?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCashFlowProjection {
    pub project_id: RecordId,
    pub month: u32,
    pub year: i32,
    pub projected_inflow: Decimal,
    pub projected_outflow: Decimal,
    #[serde(default)]
    pub actual_inflow: Option<Decimal>,
    #[serde(default)]
    pub actual_outflow: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowProjectionPatch {
    pub project_id: Option<RecordId>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub projected_inflow: Option<Decimal>,
    pub projected_outflow: Option<Decimal>,
    pub actual_inflow: Option<Decimal>,
    pub actual_outflow: Option<Decimal>,
}

impl Record for CashFlowProjection {
    type New = NewCashFlowProjection;
    type Patch = CashFlowProjectionPatch;

    const KIND: &'static str = "cash_flow_projections";
    const LABEL: &'static str = "Cash flow projection";
    const RELATIONS: &'static [Relation] = &[Relation::Project];

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_new(id: RecordId, new: NewCashFlowProjection) -> Self {
        CashFlowProjection {
            id,
            project_id: new.project_id,
            month: new.month,
            year: new.year,
            projected_inflow: new.projected_inflow,
            projected_outflow: new.projected_outflow,
            actual_inflow: new.actual_inflow,
            actual_outflow: new.actual_outflow,
        }
    }

    fn apply(&mut self, patch: CashFlowProjectionPatch) {
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(month) = patch.month {
            self.month = month;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(inflow) = patch.projected_inflow {
            self.projected_inflow = inflow;
        }
        if let Some(outflow) = patch.projected_outflow {
            self.projected_outflow = outflow;
        }
        if patch.actual_inflow.is_some() {
            self.actual_inflow = patch.actual_inflow;
        }
        if patch.actual_outflow.is_some() {
            self.actual_outflow = patch.actual_outflow;
        }
    }

    fn related_id(&self, relation: Relation) -> Option<RecordId> {
        match relation {
            Relation::Project => Some(self.project_id),
            _ => None,
        }
    }
}
