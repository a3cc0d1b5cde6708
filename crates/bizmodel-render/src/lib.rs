//! # bizmodel-render
//!
//! Layout planning, formula synthesis and xlsx assembly for bizmodel.
//!
//! This crate provides:
//! - A1 cell addressing with validated references
//! - Sheet layout planning (every row fixed before any cell is written)
//! - Formula synthesis for the Staff, Sales and Non-Staff sheets
//! - Inspectable [`WorkbookPlan`] values
//! - The xlsx assembler
//!
//! ## Example
//!
//! ```rust
//! use bizmodel_core::{FixedClock, Generator, MonthAxis};
//! use bizmodel_render::WorkbookGenerator;
//! use chrono::NaiveDate;
//! use serde_json::json;
//!
//! let raw = json!({
//!     "selectedTeams": ["Engineering"],
//!     "employeeCounts": {"Engineering": 2}
//! });
//! let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
//!
//! let generator = WorkbookGenerator::new().currency("£");
//! let plan = generator.plan_json(&raw, &clock).unwrap();
//! assert_eq!(plan.sheet_names(), vec!["Sales", "Staff", "Non-Staff"]);
//!
//! let xlsx = generator.generate_from_json(&raw, &clock).unwrap();
//! assert!(xlsx.starts_with(b"PK"));
//! ```

pub mod address;
pub mod excel;
pub mod formula;
pub mod layout;
pub mod non_staff;
pub mod plan;
pub mod sales;
pub mod staff;

pub use address::{column_letter, column_number, CellRange, CellRef};
pub use excel::ExcelAssembler;
pub use formula::SalesFormulas;
pub use layout::{NonStaffLayout, SalesLayout, SectionLayout, StaffLayout};
pub use plan::{
    BlockKind, CellSpec, CellStyle, CellValue, ListValidation, NumberFormat, RowBlock, Section,
    SheetPlan, WorkbookPlan,
};

use bizmodel_core::{normalize, BusinessConfiguration, Clock, GenerateError, Generator, MonthAxis};
use serde_json::Value;

/// Builds the three-sheet projection workbook
#[derive(Clone, Debug, Default)]
pub struct WorkbookGenerator {
    /// Currency symbol for money formats (empty = plain numbers)
    pub currency: String,
}

impl WorkbookGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency symbol
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Plan every sheet without touching the spreadsheet writer
    ///
    /// Sheets come out in tab order: Sales, Staff, Non-Staff.
    pub fn plan(
        &self,
        config: &BusinessConfiguration,
        axis: &MonthAxis,
    ) -> Result<WorkbookPlan, GenerateError> {
        let sheets = vec![
            sales::plan_sales(config, axis)?,
            staff::plan_staff(config, axis)?,
            non_staff::plan_non_staff(config, axis)?,
        ];
        for sheet in &sheets {
            tracing::debug!(
                sheet = %sheet.name,
                data_rows = sheet.data_row_count(),
                last_row = sheet.last_row(),
                "sheet planned"
            );
        }
        Ok(WorkbookPlan { sheets })
    }

    /// Normalize raw JSON and plan it against the clock's month axis
    pub fn plan_json(&self, raw: &Value, clock: &dyn Clock) -> Result<WorkbookPlan, GenerateError> {
        let config = normalize(raw)?;
        self.plan(&config, &MonthAxis::from_clock(clock))
    }

    /// Full pipeline: normalize, plan and assemble
    pub fn generate_from_json(
        &self,
        raw: &Value,
        clock: &dyn Clock,
    ) -> Result<Vec<u8>, GenerateError> {
        let config = normalize(raw)?;
        self.generate(&config, &MonthAxis::from_clock(clock))
    }

    fn assembler(&self) -> ExcelAssembler {
        ExcelAssembler::new().currency(self.currency.clone())
    }
}

impl Generator for WorkbookGenerator {
    type Output = Vec<u8>;

    fn generate(
        &self,
        config: &BusinessConfiguration,
        axis: &MonthAxis,
    ) -> Result<Vec<u8>, GenerateError> {
        let plan = self.plan(config, axis)?;
        let bytes = self.assembler().assemble(&plan)?;

        tracing::info!(
            employees = config.total_employees(),
            sales_items = config.sales_items.len(),
            sales_model = config.sales_model.map(|m| m.as_str()).unwrap_or("none"),
            start = %axis.start(),
            bytes = bytes.len(),
            "workbook generated"
        );
        Ok(bytes)
    }
}
