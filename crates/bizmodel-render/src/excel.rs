//! Workbook assembly
//!
//! Turns a [`WorkbookPlan`] into xlsx bytes. This is the only module that
//! talks to `rust_xlsxwriter`; everything upstream is plain data.
//!
//! ## Styling
//!
//! | Style | Fill | Font |
//! |-------|------|------|
//! | Sheet header | `D9E1F2` | bold |
//! | REVENUE title / headers | `B4C7E7` | bold |
//! | VOLUME title / headers | `C6E0B4` | bold |
//! | COGS title | `F4B084` | bold |
//! | COGS headers | `FCE4D6` | bold |
//! | GROSS PROFIT | `E2EFDA` | bold, `00B050` |
//! | TOTAL rows | none | bold, top border |

use bizmodel_core::AssemblyError;
use rust_xlsxwriter::{
    DataValidation, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError,
};
use std::collections::HashMap;

use crate::plan::{CellSpec, CellStyle, CellValue, NumberFormat, Section, SheetPlan, WorkbookPlan};

/// Excel caps the comma-joined source of a list validation at 255 characters
pub const MAX_LIST_SOURCE_LEN: usize = 255;

const HEADER_FILL: u32 = 0xD9E1F2;
const REVENUE_FILL: u32 = 0xB4C7E7;
const VOLUME_FILL: u32 = 0xC6E0B4;
const COGS_FILL: u32 = 0xF4B084;
const COGS_HEADER_FILL: u32 = 0xFCE4D6;
const GROSS_PROFIT_FILL: u32 = 0xE2EFDA;
const GROSS_PROFIT_FONT: u32 = 0x00B050;
const PLACEHOLDER_FONT: u32 = 0x808080;

fn xlsx_error(e: XlsxError) -> AssemblyError {
    AssemblyError::Xlsx(e.to_string())
}

/// Writes planned sheets into an in-memory xlsx workbook
#[derive(Clone, Debug, Default)]
pub struct ExcelAssembler {
    /// Currency symbol prefixed to money formats; empty for plain numbers
    pub currency: String,
}

impl ExcelAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency symbol
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Number format code for a semantic format
    pub fn num_format(&self, format: NumberFormat) -> String {
        let prefix = if self.currency.is_empty() {
            String::new()
        } else {
            format!("\"{}\"", self.currency.replace('"', ""))
        };
        match format {
            NumberFormat::General => "General".into(),
            NumberFormat::Currency => format!("{prefix}#,##0"),
            NumberFormat::UnitCurrency => format!("{prefix}#,##0.00"),
            NumberFormat::Count => "#,##0".into(),
            NumberFormat::Percent => "0.0%".into(),
        }
    }

    /// Assemble the workbook and serialize it to bytes
    pub fn assemble(&self, plan: &WorkbookPlan) -> Result<Vec<u8>, AssemblyError> {
        let mut workbook = Workbook::new();
        let mut formats = FormatCache::default();

        for sheet_plan in &plan.sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(&sheet_plan.name).map_err(xlsx_error)?;
            self.write_sheet(sheet, sheet_plan, &mut formats)?;
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| AssemblyError::Xlsx(format!("Failed to create Excel: {e}")))?;

        tracing::debug!(bytes = buffer.len(), "workbook serialized");
        Ok(buffer)
    }

    fn write_sheet(
        &self,
        sheet: &mut Worksheet,
        plan: &SheetPlan,
        formats: &mut FormatCache,
    ) -> Result<(), AssemblyError> {
        for spec in plan.cells() {
            if plan.is_merged(spec.cell) {
                continue;
            }
            let format = formats.get(self, spec.style, spec.format);
            write_cell(sheet, spec, &format)?;
        }

        for range in &plan.merges {
            let (text, style) = plan
                .cells()
                .find(|spec| spec.cell == range.start)
                .map(|spec| (spec.value.as_text().unwrap_or_default(), spec.style))
                .unwrap_or(("", CellStyle::Plain));
            let format = formats.get(self, style, NumberFormat::General);
            sheet
                .merge_range(
                    range.start.row - 1,
                    range.start.col - 1,
                    range.end.row - 1,
                    range.end.col - 1,
                    text,
                    &format,
                )
                .map_err(xlsx_error)?;
        }

        for &(col, width) in &plan.column_widths {
            sheet.set_column_width(col - 1, width).ok();
        }

        if let Some(anchor) = plan.freeze_at {
            sheet.set_freeze_panes(anchor.row - 1, anchor.col - 1).ok();
        }

        for validation in &plan.validations {
            let source_len = validation.options.iter().map(String::len).sum::<usize>()
                + validation.options.len().saturating_sub(1);
            if validation.options.is_empty() || source_len > MAX_LIST_SOURCE_LEN {
                tracing::warn!(
                    sheet = %plan.name,
                    range = %validation.range,
                    options = validation.options.len(),
                    "skipping dropdown: option list empty or too long"
                );
                continue;
            }
            let options: Vec<&str> = validation.options.iter().map(String::as_str).collect();
            let rule = DataValidation::new()
                .allow_list_strings(&options)
                .map_err(xlsx_error)?
                .ignore_blank(validation.allow_blank);
            let range = validation.range;
            sheet
                .add_data_validation(
                    range.start.row - 1,
                    range.start.col - 1,
                    range.end.row - 1,
                    range.end.col - 1,
                    &rule,
                )
                .map_err(xlsx_error)?;
        }

        tracing::debug!(
            sheet = %plan.name,
            rows = plan.last_row(),
            merges = plan.merges.len(),
            validations = plan.validations.len(),
            "sheet written"
        );
        Ok(())
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    spec: &CellSpec,
    format: &Format,
) -> Result<(), AssemblyError> {
    let row = spec.cell.row - 1;
    let col = spec.cell.col - 1;
    match &spec.value {
        CellValue::Text(text) => sheet.write_string_with_format(row, col, text, format),
        CellValue::Number(number) => sheet.write_number_with_format(row, col, *number, format),
        CellValue::Formula(formula) => {
            sheet.write_formula_with_format(row, col, formula.as_str(), format)
        }
        CellValue::Blank => sheet.write_blank(row, col, format),
    }
    .map_err(xlsx_error)?;
    Ok(())
}

/// Formats built once per (style, number format) pair
#[derive(Default)]
struct FormatCache {
    formats: HashMap<(CellStyle, NumberFormat), Format>,
}

impl FormatCache {
    fn get(
        &mut self,
        assembler: &ExcelAssembler,
        style: CellStyle,
        number: NumberFormat,
    ) -> Format {
        self.formats
            .entry((style, number))
            .or_insert_with(|| create_format(assembler, style, number))
            .clone()
    }
}

fn create_format(assembler: &ExcelAssembler, style: CellStyle, number: NumberFormat) -> Format {
    let mut format = Format::new();
    if number != NumberFormat::General {
        format = format.set_num_format(assembler.num_format(number));
    }

    match style {
        CellStyle::Plain => format,
        CellStyle::Header => format
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(HEADER_FILL)
            .set_border(FormatBorder::Thin),
        CellStyle::SectionTitle(section) => format
            .set_bold()
            .set_font_size(12)
            .set_background_color(section_fill(section, false)),
        CellStyle::SectionHeader(section) => format
            .set_bold()
            .set_background_color(section_fill(section, true))
            .set_border(FormatBorder::Thin),
        CellStyle::Total => format.set_bold().set_border_top(FormatBorder::Thin),
        CellStyle::GrossProfit => format
            .set_bold()
            .set_font_color(GROSS_PROFIT_FONT)
            .set_background_color(GROSS_PROFIT_FILL),
        CellStyle::Placeholder => format.set_italic().set_font_color(PLACEHOLDER_FONT),
    }
}

fn section_fill(section: Section, column_headers: bool) -> u32 {
    match section {
        Section::Revenue => REVENUE_FILL,
        Section::Volume => VOLUME_FILL,
        Section::Cogs if column_headers => COGS_HEADER_FILL,
        Section::Cogs => COGS_FILL,
        Section::GrossProfit => GROSS_PROFIT_FILL,
    }
}
