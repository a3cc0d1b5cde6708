//! Non-Staff sheet synthesis

use bizmodel_core::{BusinessConfiguration, FormulaAddressError, MonthAxis};

use crate::address::CellRef;
use crate::formula::{column_sum, monthly_from_annual};
use crate::layout::{NonStaffLayout, FIRST_DATA_ROW, HEADER_ROW, MONTH_COLUMN_WIDTH};
use crate::plan::{BlockKind, CellStyle, CellValue, NumberFormat, RowBlock, SheetPlan};

pub const SHEET_NAME: &str = "Non-Staff";

pub const PLACEHOLDER: &str = "[Add your non-staff costs here]";

/// Plan the Non-Staff sheet: one row per selected item instance with an
/// annual cost input spread evenly over the months
pub fn plan_non_staff(
    config: &BusinessConfiguration,
    axis: &MonthAxis,
) -> Result<SheetPlan, FormulaAddressError> {
    let layout = NonStaffLayout::plan(config);
    let mut sheet = SheetPlan::new(SHEET_NAME);

    let headers = ["Item", "Category", "Annual Cost"].into_iter().chain(axis.iter());
    sheet.push_block(RowBlock::labels(
        BlockKind::Header,
        HEADER_ROW,
        1,
        headers,
        CellStyle::Header,
    )?);

    for (col, width) in (1..).zip(NonStaffLayout::LEADING_WIDTHS) {
        sheet.set_width(col, width);
    }
    for month in 0..axis.len() {
        sheet.set_width(NonStaffLayout::month_col(month), MONTH_COLUMN_WIDTH);
    }
    sheet.freeze_at = Some(CellRef::new(NonStaffLayout::FREEZE_ROW, NonStaffLayout::FREEZE_COL)?);

    let Some(last_row) = layout.last_data_row() else {
        let mut placeholder = RowBlock::new(BlockKind::Placeholder, FIRST_DATA_ROW);
        placeholder.put(
            NonStaffLayout::ITEM_COL,
            CellValue::text(PLACEHOLDER),
            NumberFormat::General,
            CellStyle::Placeholder,
        )?;
        sheet.push_block(placeholder);
        return Ok(sheet);
    };

    for (index, line) in layout.lines.iter().enumerate() {
        let row = layout.data_row(index)?;
        let annual = CellRef::new(row, NonStaffLayout::ANNUAL_COL)?;
        let mut block = RowBlock::new(BlockKind::Data, row);
        block.put(
            NonStaffLayout::ITEM_COL,
            CellValue::text(&line.label),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            NonStaffLayout::CATEGORY_COL,
            CellValue::text(&line.category),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(annual.col, CellValue::Number(0.0), NumberFormat::Currency, CellStyle::Plain)?;
        for month in 0..axis.len() {
            block.put(
                NonStaffLayout::month_col(month),
                CellValue::Formula(monthly_from_annual(annual)),
                NumberFormat::Currency,
                CellStyle::Plain,
            )?;
        }
        sheet.push_block(block);
    }

    let mut total = RowBlock::new(BlockKind::Total, last_row + 1);
    total.put(
        NonStaffLayout::ITEM_COL,
        CellValue::text("TOTAL"),
        NumberFormat::General,
        CellStyle::Total,
    )?;
    for month in 0..axis.len() {
        let col = NonStaffLayout::month_col(month);
        total.put(
            col,
            CellValue::Formula(column_sum(col, FIRST_DATA_ROW, last_row)?),
            NumberFormat::Currency,
            CellStyle::Total,
        )?;
    }
    sheet.push_block(total);
    Ok(sheet)
}
