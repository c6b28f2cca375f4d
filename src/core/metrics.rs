//! Feeds stored payments into the financial calculations.
//!
//! This is the only place that knows how payment records map onto a cash
//! flow sequence: payments are ordered by payment date and signed by
//! direction before they reach [`financial::compute_irr`].
use crate::core::financial::{self, PnLResult};
use crate::core::payment::{Payment, PaymentType};
use crate::core::project::{Project, ProjectPatch};
use crate::core::repository::{RecordId, Relation, Repository, list_related};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, TimeZone};
use rust_decimal::{Decimal, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrReport {
    /// Percentage
    pub irr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPayments {
    pub client_payments: f64,
    pub supplier_payments: f64,
    pub net_flow: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: usize,
    pub total_investment: f64,
    #[serde(rename = "avgIRR")]
    pub avg_irr: f64,
    pub active_cash_flow: f64,
    pub monthly_payments: MonthlyPayments,
}

pub struct MetricsService<'a> {
    projects: &'a dyn Repository<Project>,
    payments: &'a dyn Repository<Payment>,
}

impl<'a> MetricsService<'a> {
    pub fn new(
        projects: &'a dyn Repository<Project>,
        payments: &'a dyn Repository<Payment>,
    ) -> Self {
        Self { projects, payments }
    }

    async fn project(&self, project_id: RecordId) -> Result<Project> {
        self.projects
            .get(project_id)
            .await?
            .with_context(|| format!("Project {project_id} not found"))
    }

    /// Payments of a project in chronological order. Payments sharing a date
    /// keep their storage order.
    pub async fn project_payments(&self, project_id: RecordId) -> Result<Vec<Payment>> {
        self.project(project_id).await?;
        self.ordered_payments(project_id).await
    }

    async fn ordered_payments(&self, project_id: RecordId) -> Result<Vec<Payment>> {
        let mut payments = list_related(self.payments, Relation::Project, project_id).await?;
        payments.sort_by_key(|p| p.payment_date);
        debug!(
            "Found {} payments for project {}",
            payments.len(),
            project_id
        );
        Ok(payments)
    }

    pub async fn project_cash_flows(&self, project_id: RecordId) -> Result<Vec<f64>> {
        let payments = self.project_payments(project_id).await?;
        Ok(financial::cash_flows(&payments))
    }

    /// The project together with its cash flow sequence, fetching the
    /// project once.
    pub async fn project_with_cash_flows(
        &self,
        project_id: RecordId,
    ) -> Result<(Project, Vec<f64>)> {
        let project = self.project(project_id).await?;
        let payments = self.ordered_payments(project_id).await?;
        Ok((project, financial::cash_flows(&payments)))
    }

    pub async fn project_irr(&self, project_id: RecordId) -> Result<IrrReport> {
        let cash_flows = self.project_cash_flows(project_id).await?;
        let irr = financial::compute_irr(&cash_flows);
        info!("IRR for project {project_id}: {irr:.4}%");
        Ok(IrrReport { irr })
    }

    pub async fn project_pnl(&self, project_id: RecordId) -> Result<PnLResult> {
        let payments = self.project_payments(project_id).await?;
        Ok(financial::compute_pnl(&payments))
    }

    pub async fn portfolio_pnl(&self) -> Result<PnLResult> {
        let payments = self.payments.list().await?;
        Ok(financial::compute_pnl(&payments))
    }

    /// Stores `irr`, rounded to two decimals, as the project's actual IRR.
    pub async fn store_irr(&self, project_id: RecordId, irr: f64) -> Result<Project> {
        let actual = Decimal::from_f64(irr)
            .with_context(|| format!("IRR {irr} cannot be stored"))?
            .round_dp(2);

        let patch = ProjectPatch {
            actual_irr: Some(actual),
            ..Default::default()
        };
        self.projects
            .update(project_id, patch)
            .await?
            .with_context(|| format!("Project {project_id} not found"))
    }

    /// Portfolio wide figures. Monthly payments only count payments dated in
    /// the calendar month of `now`, both seen in the time zone of `now`.
    pub async fn dashboard_stats<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> Result<DashboardStats> {
        let (projects, payments) =
            futures::try_join!(self.projects.list(), self.payments.list())?;

        let total_projects = projects.len();
        let total_investment = projects
            .iter()
            .fold(0.0, |sum, p| sum + p.total_investment.to_f64().unwrap_or_default());
        let avg_irr = if total_projects > 0 {
            projects.iter().fold(0.0, |sum, p| {
                sum + p.actual_irr.and_then(|irr| irr.to_f64()).unwrap_or_default()
            }) / total_projects as f64
        } else {
            0.0
        };

        let mut monthly = MonthlyPayments::default();
        let zone = now.timezone();
        for payment in payments.iter().filter(|p| {
            let date = p.payment_date.with_timezone(&zone);
            date.month() == now.month() && date.year() == now.year()
        }) {
            let amount = payment.amount.to_f64().unwrap_or_default();
            match payment.payment_type {
                PaymentType::ClientPayment => monthly.client_payments += amount,
                PaymentType::SupplierPayment => monthly.supplier_payments += amount,
            }
        }
        monthly.net_flow = monthly.client_payments - monthly.supplier_payments;

        Ok(DashboardStats {
            total_projects,
            total_investment,
            avg_irr,
            active_cash_flow: monthly.net_flow,
            monthly_payments: monthly,
        })
    }
}

/// Computed IRR minus the expected IRR, in percentage points. `None` when
/// there is no expectation or either value is zero.
pub fn irr_variance(expected_irr: Option<Decimal>, irr: f64) -> Option<f64> {
    match expected_irr.and_then(|e| e.to_f64()) {
        Some(expected) if irr != 0.0 && expected != 0.0 => Some(irr - expected),
        _ => None,
    }
}
