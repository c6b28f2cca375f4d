use super::{OutputFormat, print_json, ui};
use crate::core::financial::{self, PnLResult};
use crate::core::metrics::{self as service_metrics, DashboardStats, MetricsService};
use crate::core::project::Project;
use crate::core::repository::RecordId;
use crate::store::{Ledger, require};
use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use comfy_table::Cell;
use rust_decimal::prelude::*;

/// Everything shown by the `irr` command for one project.
#[derive(Debug, Clone)]
pub struct IrrSummary {
    pub project: Project,
    pub irr: f64,
    pub variance: Option<f64>,
    pub npv_at_expected: Option<f64>,
    pub payback_period: Option<usize>,
    pub payments: usize,
}

impl IrrSummary {
    pub async fn load(ledger: &Ledger, project_id: RecordId) -> Result<Self> {
        let service = MetricsService::new(&*ledger.projects, &*ledger.payments);
        let (project, cash_flows) = service.project_with_cash_flows(project_id).await?;
        let irr = financial::compute_irr(&cash_flows);
        let variance = service_metrics::irr_variance(project.expected_irr, irr);

        let expected_rate = project
            .expected_irr
            .and_then(|e| e.to_f64())
            .map(|e| e / 100.0);

        Ok(Self {
            npv_at_expected: expected_rate.map(|rate| financial::npv(&cash_flows, rate)),
            payback_period: financial::payback_period(&cash_flows),
            payments: cash_flows.len(),
            project,
            irr,
            variance,
        })
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

        let irr_cell = if self.payments == 0 {
            ui::na_cell(false)
        } else if self.irr.is_finite() {
            ui::change_cell(self.irr)
        } else {
            ui::na_cell(true)
        };

        table.add_row(vec![Cell::new("Payments"), Cell::new(self.payments)]);
        table.add_row(vec![Cell::new("IRR"), irr_cell]);
        table.add_row(vec![
            Cell::new("Expected IRR"),
            ui::format_optional_cell(self.project.expected_irr, |e| format!("{e:.2}%")),
        ]);
        table.add_row(vec![
            Cell::new("Variance"),
            self.variance.map_or_else(|| ui::na_cell(false), ui::change_cell),
        ]);
        table.add_row(vec![
            Cell::new("NPV at expected IRR"),
            self.npv_at_expected
                .map_or_else(|| ui::na_cell(false), ui::signed_cell),
        ]);
        table.add_row(vec![
            Cell::new("Payback (payments)"),
            ui::format_optional_cell(self.payback_period, |p| p.to_string()),
        ]);

        let mut output = format!(
            "Project: {}\n\n",
            ui::style_text(&self.project.name, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output
    }
}

pub async fn irr(
    ledger: &Ledger,
    project_id: RecordId,
    record: bool,
    format: OutputFormat,
) -> Result<()> {
    let service = MetricsService::new(&*ledger.projects, &*ledger.payments);

    match format {
        OutputFormat::Json => {
            let report = service.project_irr(project_id).await?;
            if record {
                service.store_irr(project_id, report.irr).await?;
            }
            print_json(&report)
        }
        OutputFormat::Table => {
            let summary = IrrSummary::load(ledger, project_id).await?;
            if record {
                service.store_irr(project_id, summary.irr).await?;
            }
            println!("{}", summary.display_as_table());
            if record {
                println!(
                    "\n{}",
                    ui::style_text("Saved as the project's actual IRR", ui::StyleType::Subtle)
                );
            }
            Ok(())
        }
    }
}

impl PnLResult {
    pub fn display_as_table(&self, title: &str, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Metric"),
            ui::header_cell(&format!("Value ({currency})")),
        ]);

        table.add_row(vec![
            Cell::new(format!("Income ({} payments)", self.client_payments)),
            ui::signed_cell(self.total_income),
        ]);
        table.add_row(vec![
            Cell::new(format!("Expenses ({} payments)", self.supplier_payments)),
            ui::signed_cell(-self.total_expenses),
        ]);
        table.add_row(vec![
            Cell::new("Profit Margin"),
            ui::change_cell(self.profit_margin),
        ]);

        let profit_style = if self.net_profit >= 0.0 {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };

        let mut output = format!("{}\n\n", ui::style_text(title, ui::StyleType::Title));
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Net Profit", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.net_profit), profit_style)
        ));
        output
    }
}

pub async fn pnl(
    ledger: &Ledger,
    project_id: Option<RecordId>,
    currency: &str,
    format: OutputFormat,
) -> Result<()> {
    let service = MetricsService::new(&*ledger.projects, &*ledger.payments);
    let (pnl, title) = match project_id {
        Some(id) => {
            let project = require(&*ledger.projects, id).await?;
            (service.project_pnl(id).await?, project.name)
        }
        None => (service.portfolio_pnl().await?, "All projects".to_string()),
    };

    match format {
        OutputFormat::Json => print_json(&pnl),
        OutputFormat::Table => {
            println!("{}", pnl.display_as_table(&title, currency));
            Ok(())
        }
    }
}

impl DashboardStats {
    pub fn display_as_table(&self, today: NaiveDate, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

        table.add_row(vec![Cell::new("Projects"), Cell::new(self.total_projects)]);
        table.add_row(vec![
            Cell::new(format!("Total Investment ({currency})")),
            ui::signed_cell(self.total_investment),
        ]);
        table.add_row(vec![Cell::new("Average IRR"), ui::change_cell(self.avg_irr)]);
        table.add_row(vec![
            Cell::new("Client Payments"),
            ui::signed_cell(self.monthly_payments.client_payments),
        ]);
        table.add_row(vec![
            Cell::new("Supplier Payments"),
            ui::signed_cell(-self.monthly_payments.supplier_payments),
        ]);
        table.add_row(vec![
            Cell::new("Net Cash Flow"),
            ui::signed_cell(self.monthly_payments.net_flow),
        ]);

        let mut output = format!(
            "Dashboard for {}\n\n",
            ui::style_text(&today.format("%B %Y").to_string(), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output
    }
}

pub async fn dashboard(
    ledger: &Ledger,
    now: DateTime<Local>,
    currency: &str,
    format: OutputFormat,
) -> Result<()> {
    let service = MetricsService::new(&*ledger.projects, &*ledger.payments);
    let stats = service.dashboard_stats(&now).await?;

    match format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Table => {
            println!("{}", stats.display_as_table(now.date_naive(), currency));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seed(ledger: &Ledger, expected_irr: Option<&str>) -> RecordId {
        let new = serde_json::from_value(json!({
            "name": "Rooftop",
            "location": "Denver",
            "systemSize": "12.5",
            "totalInvestment": "100",
            "clientName": "Acme",
            "expectedIRR": expected_irr,
        }))
        .unwrap();
        let project = ledger.projects.create(new).await.unwrap();

        for (kind, amount, date) in [
            ("supplier_payment", "100", "2025-01-01"),
            ("client_payment", "60", "2025-07-01"),
            ("client_payment", "60", "2026-01-01"),
        ] {
            let new = serde_json::from_value(json!({
                "projectId": project.id,
                "type": kind,
                "amount": amount,
                "description": "seed",
                "paymentDate": format!("{date}T00:00:00Z"),
            }))
            .unwrap();
            ledger.payments.create(new).await.unwrap();
        }
        project.id
    }

    #[tokio::test]
    async fn test_irr_summary() {
        let ledger = Ledger::in_memory();
        let id = seed(&ledger, Some("10")).await;

        let summary = IrrSummary::load(&ledger, id).await.unwrap();
        assert!((summary.irr - 13.07).abs() < 0.01);
        assert!((summary.variance.unwrap() - 3.07).abs() < 0.01);
        assert!(summary.npv_at_expected.unwrap() > 0.0);
        assert_eq!(summary.payback_period, Some(2));
        assert_eq!(summary.payments, 3);

        let table = summary.display_as_table();
        assert!(table.contains("Rooftop"));
        assert!(table.contains("13.07%"));
        assert!(table.contains("10.00%"));
    }

    #[tokio::test]
    async fn test_irr_summary_without_expectation() {
        let ledger = Ledger::in_memory();
        let id = seed(&ledger, None).await;

        let summary = IrrSummary::load(&ledger, id).await.unwrap();
        assert!(summary.variance.is_none());
        assert!(summary.npv_at_expected.is_none());
        assert!(summary.display_as_table().contains("N/A"));
    }

    #[tokio::test]
    async fn test_irr_with_record_saves_actual_irr() {
        let ledger = Ledger::in_memory();
        let id = seed(&ledger, None).await;

        irr(&ledger, id, true, OutputFormat::Json).await.unwrap();
        let project = require(&*ledger.projects, id).await.unwrap();
        assert_eq!(project.actual_irr, Some(Decimal::new(1307, 2)));
    }

    #[tokio::test]
    async fn test_irr_table_with_record_saves_actual_irr() {
        let ledger = Ledger::in_memory();
        let id = seed(&ledger, Some("10")).await;

        irr(&ledger, id, true, OutputFormat::Table).await.unwrap();
        let project = require(&*ledger.projects, id).await.unwrap();
        assert_eq!(project.actual_irr, Some(Decimal::new(1307, 2)));
        assert_eq!(project.expected_irr, Some(Decimal::from(10)));
    }

    #[tokio::test]
    async fn test_irr_without_record_leaves_project_untouched() {
        let ledger = Ledger::in_memory();
        let id = seed(&ledger, None).await;

        irr(&ledger, id, false, OutputFormat::Table).await.unwrap();
        let project = require(&*ledger.projects, id).await.unwrap();
        assert!(project.actual_irr.is_none());
    }

    #[tokio::test]
    async fn test_pnl_for_missing_project() {
        let ledger = Ledger::in_memory();
        let err = pnl(&ledger, Some(9), "USD", OutputFormat::Table)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Project 9 not found");
    }

    #[test]
    fn test_pnl_table() {
        let pnl = PnLResult {
            total_income: 1000.0,
            total_expenses: 400.0,
            net_profit: 600.0,
            profit_margin: 60.0,
            client_payments: 1,
            supplier_payments: 2,
        };
        let output = pnl.display_as_table("All projects", "EUR");
        assert!(output.contains("Value (EUR)"));
        assert!(output.contains("Income (1 payments)"));
        assert!(output.contains("-400.00"));
        assert!(output.contains("60.00%"));
        assert!(output.contains("600.00"));
    }

    #[test]
    fn test_dashboard_table() {
        let stats = DashboardStats {
            total_projects: 2,
            total_investment: 50000.0,
            avg_irr: 6.0,
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let output = stats.display_as_table(today, "USD");
        assert!(output.contains("March 2025"));
        assert!(output.contains("50000.00"));
        assert!(output.contains("6.00%"));
    }
}
