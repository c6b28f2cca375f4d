//! Create/read/update/delete commands shared by every record kind.
use super::{OutputFormat, print_json, ui};
use crate::core::component::{CostComponent, ProjectComponent};
use crate::core::payment::Payment;
use crate::core::project::Project;
use crate::core::projection::CashFlowProjection;
use crate::core::repository::{Record, RecordId, Relation, Repository, list_where};
use crate::core::supplier::{Supplier, SupplierComponent};
use crate::store::require;
use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use serde::de::DeserializeOwned;
use tracing::info;

#[derive(Debug, Clone, Default, Args)]
pub struct ListFilter {
    /// Only records belonging to this project
    #[arg(long)]
    pub project: Option<RecordId>,
    /// Only records belonging to this supplier
    #[arg(long)]
    pub supplier: Option<RecordId>,
    /// Only records referring to this cost component
    #[arg(long)]
    pub component: Option<RecordId>,
}

impl ListFilter {
    fn relations(&self) -> Vec<(Relation, RecordId)> {
        [
            (Relation::Project, self.project),
            (Relation::Supplier, self.supplier),
            (Relation::Component, self.component),
        ]
        .into_iter()
        .filter_map(|(relation, id)| id.map(|id| (relation, id)))
        .collect()
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum RecordAction {
    /// List records
    List(ListFilter),
    /// Show a single record
    Show { id: RecordId },
    /// Create a record from a JSON body, or @path to a JSON file
    Add { body: String },
    /// Update fields of a record from a JSON body, or @path to a JSON file
    Update { id: RecordId, body: String },
    /// Delete a record
    Delete { id: RecordId },
}

/// Table layout of a record kind.
pub trait Tabular {
    fn header() -> Vec<&'static str>;
    fn row(&self) -> Vec<Cell>;
}

pub async fn run<T>(
    repo: &dyn Repository<T>,
    action: RecordAction,
    format: OutputFormat,
) -> Result<()>
where
    T: Record + Tabular,
    T::New: DeserializeOwned,
    T::Patch: DeserializeOwned,
{
    match action {
        RecordAction::List(filter) => {
            let records = list(repo, &filter).await?;
            display(&records, format)
        }
        RecordAction::Show { id } => {
            let record = require(repo, id).await?;
            display_one(record, format)
        }
        RecordAction::Add { body } => {
            let new: T::New = parse_body::<T, _>(&body)?;
            let record = repo.create(new).await?;
            info!("Created {} {}", T::LABEL, record.id());
            display_one(record, format)
        }
        RecordAction::Update { id, body } => {
            let patch: T::Patch = parse_body::<T, _>(&body)?;
            let record = repo
                .update(id, patch)
                .await?
                .with_context(|| format!("{} {} not found", T::LABEL, id))?;
            info!("Updated {} {}", T::LABEL, id);
            display_one(record, format)
        }
        RecordAction::Delete { id } => {
            if !repo.delete(id).await? {
                bail!("{} {} not found", T::LABEL, id);
            }
            info!("Deleted {} {}", T::LABEL, id);
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({ "deleted": id })),
                OutputFormat::Table => {
                    println!("Deleted {} {}", T::LABEL.to_lowercase(), id);
                    Ok(())
                }
            }
        }
    }
}

/// Lists records matching every relation set in `filter`.
pub async fn list<T: Record>(repo: &dyn Repository<T>, filter: &ListFilter) -> Result<Vec<T>> {
    let relations = filter.relations();
    for (relation, _) in &relations {
        if !T::RELATIONS.contains(relation) {
            bail!("{} records cannot be filtered by {}", T::LABEL, relation);
        }
    }

    list_where(repo, &relations).await
}

/// Parses a JSON body given inline or as `@path`.
fn parse_body<T: Record, B: DeserializeOwned>(body: &str) -> Result<B> {
    let text = match body.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read body file: {path}"))?,
        None => body.to_string(),
    };
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid {} data", T::LABEL.to_lowercase()))
}

fn display_one<T: Record + Tabular>(record: T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Table => display(&[record], format),
    }
}

fn display<T: Record + Tabular>(records: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(records),
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No {} found.", T::KIND.replace('_', " "));
                return Ok(());
            }
            println!("{}", render_table(records));
            Ok(())
        }
    }
}

fn render_table<T: Tabular>(records: &[T]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(T::header().into_iter().map(ui::header_cell));
    for record in records {
        table.add_row(record.row());
    }
    table.to_string()
}

impl Tabular for Project {
    fn header() -> Vec<&'static str> {
        vec![
            "ID",
            "Name",
            "Location",
            "Client",
            "Size (kW)",
            "Investment",
            "Expected IRR",
            "Actual IRR",
            "Status",
        ]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.id),
            Cell::new(&self.name),
            Cell::new(&self.location),
            Cell::new(&self.client_name),
            ui::money_cell(self.system_size),
            ui::money_cell(self.total_investment),
            ui::format_optional_cell(self.expected_irr, |v| format!("{v:.2}%")),
            ui::format_optional_cell(self.actual_irr, |v| format!("{v:.2}%")),
            Cell::new(self.status),
        ]
    }
}

impl Tabular for Payment {
    fn header() -> Vec<&'static str> {
        vec!["ID", "Project", "Type", "Amount", "Date", "Description", "Recurring"]
    }

    fn row(&self) -> Vec<Cell> {
        let recurring = match (self.is_recurring, self.recurring_frequency) {
            (true, Some(frequency)) => format!("{frequency:?}").to_lowercase(),
            (true, None) => "yes".to_string(),
            (false, _) => "no".to_string(),
        };
        vec![
            Cell::new(self.id),
            Cell::new(self.project_id),
            Cell::new(self.payment_type),
            ui::money_cell(self.amount),
            Cell::new(self.payment_date.format("%Y-%m-%d")),
            Cell::new(&self.description),
            Cell::new(recurring),
        ]
    }
}

impl Tabular for CashFlowProjection {
    fn header() -> Vec<&'static str> {
        vec![
            "ID",
            "Project",
            "Period",
            "Projected In",
            "Projected Out",
            "Actual In",
            "Actual Out",
            "Projected Net",
            "Actual Net",
        ]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.id),
            Cell::new(self.project_id),
            Cell::new(format!("{}-{:02}", self.year, self.month)),
            ui::money_cell(self.projected_inflow),
            ui::money_cell(self.projected_outflow),
            ui::format_optional_cell(self.actual_inflow, |v| format!("{v:.2}")),
            ui::format_optional_cell(self.actual_outflow, |v| format!("{v:.2}")),
            ui::money_cell(self.projected_net()),
            ui::format_optional_cell(self.actual_net(), |v| format!("{v:.2}")),
        ]
    }
}

impl Tabular for Supplier {
    fn header() -> Vec<&'static str> {
        vec!["ID", "Name", "Contact", "Email", "Phone", "Terms", "Rating", "Active"]
    }

    fn row(&self) -> Vec<Cell> {
        let optional = |v: &Option<String>| Cell::new(v.as_deref().unwrap_or("-"));
        vec![
            Cell::new(self.id),
            Cell::new(&self.name),
            optional(&self.contact_person),
            optional(&self.email),
            optional(&self.phone),
            optional(&self.payment_terms),
            optional(&self.credit_rating),
            ui::flag_cell(self.is_active),
        ]
    }
}

impl Tabular for CostComponent {
    fn header() -> Vec<&'static str> {
        vec!["ID", "Name", "Category", "Unit", "Base Price", "Active"]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.id),
            Cell::new(&self.name),
            Cell::new(self.category),
            Cell::new(&self.unit_type),
            ui::money_cell(self.base_price),
            ui::flag_cell(self.is_active),
        ]
    }
}

impl Tabular for SupplierComponent {
    fn header() -> Vec<&'static str> {
        vec![
            "ID",
            "Supplier",
            "Component",
            "Price",
            "Lead Time (days)",
            "Min Order",
            "Preferred",
        ]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.id),
            Cell::new(self.supplier_id),
            Cell::new(self.component_id),
            ui::money_cell(self.price),
            ui::format_optional_cell(self.lead_time, |v| v.to_string()),
            ui::format_optional_cell(self.minimum_order, |v| v.to_string()),
            ui::flag_cell(self.is_preferred),
        ]
    }
}

impl Tabular for ProjectComponent {
    fn header() -> Vec<&'static str> {
        vec![
            "ID",
            "Project",
            "Component",
            "Supplier",
            "Quantity",
            "Unit Price",
            "Total",
            "Status",
            "Payment",
        ]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.id),
            Cell::new(self.project_id),
            Cell::new(self.component_id),
            Cell::new(self.supplier_id),
            Cell::new(self.quantity),
            ui::money_cell(self.unit_price),
            ui::money_cell(self.total_cost),
            Cell::new(&self.status),
            Cell::new(&self.payment_status),
        ]
    }
}
