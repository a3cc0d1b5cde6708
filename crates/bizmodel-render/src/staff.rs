//! Staff sheet synthesis
//!
//! One row per employee with an annual salary input and 48 monthly cells of
//! `salary / 12`, closed by a TOTAL row summing each month column. Team,
//! type, allocation and the optional extra category carry dropdowns.

use bizmodel_core::{BusinessConfiguration, FormulaAddressError, MonthAxis};

use crate::address::{CellRange, CellRef};
use crate::formula::{column_sum, monthly_from_annual};
use crate::layout::{StaffLayout, FIRST_DATA_ROW, HEADER_ROW, MONTH_COLUMN_WIDTH};
use crate::plan::{
    BlockKind, CellStyle, CellValue, ListValidation, NumberFormat, RowBlock, SheetPlan,
};

pub const SHEET_NAME: &str = "Staff";

pub const PLACEHOLDER: &str = "[Add your staff here]";

/// Employment types offered in the Type dropdown; the first is the default
pub const EMPLOYMENT_TYPES: [&str; 2] = ["PAYE", "Contract"];

/// Cost allocations offered in the Direct/Overhead dropdown; the first is the default
pub const ALLOCATIONS: [&str; 2] = ["OVERHEAD", "DIRECT"];

/// Plan the Staff sheet
pub fn plan_staff(
    config: &BusinessConfiguration,
    axis: &MonthAxis,
) -> Result<SheetPlan, FormulaAddressError> {
    let layout = StaffLayout::plan(config);
    let mut sheet = SheetPlan::new(SHEET_NAME);

    let mut headers = vec!["Position", "Team", "Type", "Direct/Overhead"];
    if let Some(name) = config.extra_category_name() {
        headers.push(name);
    }
    headers.push("Annual Salary");
    headers.extend(axis.iter());
    sheet.push_block(RowBlock::labels(
        BlockKind::Header,
        HEADER_ROW,
        1,
        headers,
        CellStyle::Header,
    )?);

    for (col, width) in (1..).zip(StaffLayout::LEADING_WIDTHS) {
        sheet.set_width(col, width);
    }
    if let Some(col) = layout.extra_col() {
        sheet.set_width(col, StaffLayout::EXTRA_WIDTH);
    }
    sheet.set_width(layout.salary_col(), StaffLayout::SALARY_WIDTH);
    for month in 0..axis.len() {
        sheet.set_width(layout.month_col(month), MONTH_COLUMN_WIDTH);
    }
    sheet.freeze_at = Some(CellRef::new(StaffLayout::FREEZE_ROW, StaffLayout::FREEZE_COL)?);

    let Some(last_row) = layout.last_data_row() else {
        let mut placeholder = RowBlock::new(BlockKind::Placeholder, FIRST_DATA_ROW);
        placeholder.put(
            StaffLayout::POSITION_COL,
            CellValue::text(PLACEHOLDER),
            NumberFormat::General,
            CellStyle::Placeholder,
        )?;
        sheet.push_block(placeholder);
        return Ok(sheet);
    };

    for (index, seat) in layout.seats.iter().enumerate() {
        let row = layout.data_row(index)?;
        let mut block = RowBlock::new(BlockKind::Data, row);
        let text = |s: &str| CellValue::text(s);

        block.put(
            StaffLayout::POSITION_COL,
            CellValue::Text(seat.position()),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            StaffLayout::TEAM_COL,
            text(seat.team.as_str()),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            StaffLayout::TYPE_COL,
            text(EMPLOYMENT_TYPES[0]),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            StaffLayout::ALLOCATION_COL,
            text(ALLOCATIONS[0]),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        if let Some(col) = layout.extra_col() {
            block.put(col, CellValue::Blank, NumberFormat::General, CellStyle::Plain)?;
        }

        let salary = CellRef::new(row, layout.salary_col())?;
        block.put(salary.col, CellValue::Number(0.0), NumberFormat::Currency, CellStyle::Plain)?;
        for month in 0..axis.len() {
            block.put(
                layout.month_col(month),
                CellValue::Formula(monthly_from_annual(salary)),
                NumberFormat::Currency,
                CellStyle::Plain,
            )?;
        }
        sheet.push_block(block);
    }

    let total_row = last_row + 1;
    let mut total = RowBlock::new(BlockKind::Total, total_row);
    total.put(
        StaffLayout::POSITION_COL,
        CellValue::text("TOTAL"),
        NumberFormat::General,
        CellStyle::Total,
    )?;
    for month in 0..axis.len() {
        let col = layout.month_col(month);
        total.put(
            col,
            CellValue::Formula(column_sum(col, FIRST_DATA_ROW, last_row)?),
            NumberFormat::Currency,
            CellStyle::Total,
        )?;
    }
    sheet.push_block(total);

    sheet.validations = validations(config, &layout, last_row)?;
    Ok(sheet)
}

fn validations(
    config: &BusinessConfiguration,
    layout: &StaffLayout,
    last_row: u32,
) -> Result<Vec<ListValidation>, FormulaAddressError> {
    let list = |col: u16, options: Vec<String>, allow_blank: bool| {
        Ok::<_, FormulaAddressError>(ListValidation {
            range: CellRange::column(col, FIRST_DATA_ROW, last_row)?,
            options,
            allow_blank,
        })
    };
    let owned = |options: &[&str]| options.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let mut validations = vec![
        list(StaffLayout::TEAM_COL, config.selected_teams.clone(), false)?,
        list(StaffLayout::TYPE_COL, owned(&EMPLOYMENT_TYPES), false)?,
        list(StaffLayout::ALLOCATION_COL, owned(&ALLOCATIONS), false)?,
    ];

    if let (Some(col), Some(category)) = (layout.extra_col(), &config.extra_category) {
        if !category.options.is_empty() {
            validations.push(list(col, category.options.clone(), true)?);
        }
    }
    Ok(validations)
}
