//! Command line presentation: record management, metrics reports and setup.

pub mod metrics;
pub mod records;
pub mod setup;
pub mod ui;

use anyhow::Result;
use serde::Serialize;

pub use records::{ListFilter, RecordAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Table }
    }
}

/// The record kinds managed through the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Project,
    Payment,
    Projection,
    Supplier,
    Component,
    SupplierComponent,
    ProjectComponent,
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
