//! Sheet plans: the pure-data description of a workbook
//!
//! A [`SheetPlan`] holds every cell value, number format and style plus the
//! sheet-level furniture (column widths, frozen panes, merges, dropdowns).
//! Synthesizers build plans; the assembler is the only consumer that touches
//! the spreadsheet writer. Plans can be inspected directly in tests.

use bizmodel_core::FormulaAddressError;
use serde::Serialize;

use crate::address::{CellRange, CellRef};

/// Content of a single cell
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Formula text including the leading `=`
    Formula(String),
    Blank,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            Self::Formula(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Semantic display format; the assembler maps it to a format code
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum NumberFormat {
    #[default]
    General,
    /// Whole money amounts
    Currency,
    /// Money with cents (unit prices and unit costs)
    UnitCurrency,
    /// Whole quantities
    Count,
    /// Fractions shown as percentages
    Percent,
}

/// Sales sheet section, used for banded fills
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    Revenue,
    Volume,
    Cogs,
    GrossProfit,
}

/// Visual role of a cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CellStyle {
    #[default]
    Plain,
    /// Sheet column header
    Header,
    /// Section title bar (REVENUE, VOLUME, ...)
    SectionTitle(Section),
    /// Column headers inside a section
    SectionHeader(Section),
    /// TOTAL label and total values
    Total,
    /// Gross profit row
    GrossProfit,
    /// Explanatory text in an otherwise empty sheet
    Placeholder,
}

/// One planned cell
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellSpec {
    pub cell: CellRef,
    pub value: CellValue,
    pub format: NumberFormat,
    pub style: CellStyle,
}

impl CellSpec {
    pub fn new(cell: CellRef, value: CellValue) -> Self {
        Self {
            cell,
            value,
            format: NumberFormat::General,
            style: CellStyle::Plain,
        }
    }

    pub fn format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    pub fn style(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }
}

/// Kind of a planned row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BlockKind {
    Header,
    SectionHeader,
    Data,
    Total,
    Spacer,
    Placeholder,
}

/// A planned row and its cells
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowBlock {
    pub kind: BlockKind,
    pub row: u32,
    pub cells: Vec<CellSpec>,
}

impl RowBlock {
    pub fn new(kind: BlockKind, row: u32) -> Self {
        Self {
            kind,
            row,
            cells: Vec::new(),
        }
    }

    /// A row of text cells starting at `first_col`, all in one style
    pub fn labels<'a>(
        kind: BlockKind,
        row: u32,
        first_col: u16,
        labels: impl IntoIterator<Item = &'a str>,
        style: CellStyle,
    ) -> Result<Self, FormulaAddressError> {
        let mut block = Self::new(kind, row);
        for (offset, label) in labels.into_iter().enumerate() {
            let cell = CellRef::new(row, first_col + offset as u16)?;
            block.push(CellSpec::new(cell, CellValue::text(label)).style(style));
        }
        Ok(block)
    }

    pub fn push(&mut self, spec: CellSpec) {
        self.cells.push(spec);
    }

    /// Append a cell at `(self.row, col)`
    pub fn put(
        &mut self,
        col: u16,
        value: CellValue,
        format: NumberFormat,
        style: CellStyle,
    ) -> Result<(), FormulaAddressError> {
        let cell = CellRef::new(self.row, col)?;
        self.cells
            .push(CellSpec::new(cell, value).format(format).style(style));
        Ok(())
    }
}

/// Dropdown list restricting a range to fixed options
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListValidation {
    pub range: CellRange,
    pub options: Vec<String>,
    pub allow_blank: bool,
}

/// Everything needed to write one worksheet
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SheetPlan {
    pub name: String,
    pub blocks: Vec<RowBlock>,
    /// `(column, width)` pairs, 1-based columns
    pub column_widths: Vec<(u16, f64)>,
    /// Top-left unfrozen cell
    pub freeze_at: Option<CellRef>,
    /// Merged ranges; the top-left cell supplies text and style
    pub merges: Vec<CellRange>,
    pub validations: Vec<ListValidation>,
}

impl SheetPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            column_widths: Vec::new(),
            freeze_at: None,
            merges: Vec::new(),
            validations: Vec::new(),
        }
    }

    pub fn push_block(&mut self, block: RowBlock) {
        self.blocks.push(block);
    }

    pub fn set_width(&mut self, col: u16, width: f64) {
        self.column_widths.push((col, width));
    }

    /// All planned cells in row order
    pub fn cells(&self) -> impl Iterator<Item = &CellSpec> {
        self.blocks.iter().flat_map(|b| b.cells.iter())
    }

    /// Planned cell at an address such as `"E7"`
    pub fn cell(&self, address: &str) -> Option<&CellSpec> {
        let target = CellRef::parse(address)?;
        self.cells().find(|spec| spec.cell == target)
    }

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellSpec> {
        self.cells()
            .find(|spec| spec.cell.row == row && spec.cell.col == col)
    }

    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &RowBlock> {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }

    /// Number of data rows
    pub fn data_row_count(&self) -> usize {
        self.blocks_of(BlockKind::Data).count()
    }

    pub fn last_row(&self) -> u32 {
        self.blocks.iter().map(|b| b.row).max().unwrap_or(0)
    }

    pub fn is_merged(&self, cell: CellRef) -> bool {
        self.merges.iter().any(|m| m.start == cell)
    }
}

/// The complete workbook, sheets in tab order
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkbookPlan {
    pub sheets: Vec<SheetPlan>,
}

impl WorkbookPlan {
    pub fn sheet(&self, name: &str) -> Option<&SheetPlan> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
