//! Sales sheet synthesis
//!
//! Three variants: a free-form template for custom models, a placeholder
//! when there are no items, and the generated REVENUE / VOLUME / COGS /
//! GROSS PROFIT sections. Section rows come from [`SectionLayout`], which is
//! fixed before any cell is written; revenue rows reference volume rows
//! that sit below them.

use bizmodel_core::{BusinessConfiguration, FormulaAddressError, MonthAxis, SalesModel};

use crate::address::{CellRange, CellRef};
use crate::formula::{percent_fraction, SalesFormulas};
use crate::layout::{
    volume_label, SalesLayout, SalesTemplate, SectionLayout, FIRST_DATA_ROW, HEADER_ROW,
    MONTH_COLUMN_WIDTH,
};
use crate::plan::{
    BlockKind, CellStyle, CellValue, NumberFormat, RowBlock, Section, SheetPlan,
};

type Result<T> = std::result::Result<T, FormulaAddressError>;

pub const SHEET_NAME: &str = "Sales";

pub const PLACEHOLDER: &str = "[Add your sales items here]";

pub const REVENUE_TITLE: &str = "REVENUE";
pub const VOLUME_TITLE: &str = "VOLUME";
pub const GMV_VOLUME_TITLE: &str = "VOLUME (GMV)";
pub const COGS_TITLE: &str = "COST OF GOODS SOLD (COGS)";
pub const GROSS_PROFIT_LABEL: &str = "GROSS PROFIT";

/// Plan the Sales sheet
pub fn plan_sales(config: &BusinessConfiguration, axis: &MonthAxis) -> Result<SheetPlan> {
    match (SalesLayout::plan(config), config.sales_model) {
        (SalesLayout::Sections(layout), Some(model)) => {
            plan_sections(config, model, &layout, axis)
        }
        (SalesLayout::Freeform, _) => plan_template(
            &SalesTemplate::FREEFORM_HEADERS,
            &SalesTemplate::FREEFORM_WIDTHS,
            axis,
        ),
        _ => plan_template(
            &SalesTemplate::EMPTY_HEADERS,
            &[SalesTemplate::ITEM_WIDTH],
            axis,
        ),
    }
}

/// Header row, placeholder row and month columns with no formulas
fn plan_template(headers: &[&str], widths: &[f64], axis: &MonthAxis) -> Result<SheetPlan> {
    let mut sheet = SheetPlan::new(SHEET_NAME);
    let mut labels: Vec<&str> = headers.to_vec();
    labels.extend(axis.iter());
    sheet.push_block(RowBlock::labels(
        BlockKind::Header,
        HEADER_ROW,
        1,
        labels,
        CellStyle::Header,
    )?);

    let mut placeholder = RowBlock::new(BlockKind::Placeholder, FIRST_DATA_ROW);
    placeholder.put(
        1,
        CellValue::text(PLACEHOLDER),
        NumberFormat::General,
        CellStyle::Placeholder,
    )?;
    sheet.push_block(placeholder);

    for (col, width) in (1..).zip(widths.iter().copied()) {
        sheet.set_width(col, width);
    }
    let first_month = headers.len() as u16 + 1;
    for month in 0..axis.len() {
        sheet.set_width(first_month + month as u16, MONTH_COLUMN_WIDTH);
    }
    sheet.freeze_at = Some(CellRef::new(SalesTemplate::FREEZE_ROW, SalesTemplate::FREEZE_COL)?);
    Ok(sheet)
}

fn plan_sections(
    config: &BusinessConfiguration,
    model: SalesModel,
    layout: &SectionLayout,
    axis: &MonthAxis,
) -> Result<SheetPlan> {
    let formulas = SalesFormulas::new(model, layout);
    let gmv = model.is_gmv_based();
    let mut sheet = SheetPlan::new(SHEET_NAME);

    // REVENUE
    let rate_header = if gmv { "Commission %" } else { "Unit Price" };
    section_heading(
        &mut sheet,
        layout.revenue_title_row,
        REVENUE_TITLE,
        Section::Revenue,
        ["Item", "Type", rate_header, "Basis"],
        axis,
    )?;
    let (rate_format, revenue_basis) = if gmv {
        (NumberFormat::Percent, "GMV × Commission")
    } else {
        (NumberFormat::UnitCurrency, "Volume × Unit Price")
    };
    for (index, item) in config.sales_items.iter().enumerate() {
        let mut block = RowBlock::new(BlockKind::Data, layout.revenue_row(index)?);
        block.put(
            SectionLayout::ITEM_COL,
            CellValue::text(&item.name),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::TYPE_COL,
            CellValue::Text(model.label()),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::RATE_COL,
            CellValue::Number(formulas.revenue_rate(item)),
            rate_format,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::BASIS_COL,
            CellValue::text(revenue_basis),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        for month in 0..axis.len() {
            block.put(
                SectionLayout::month_col(month),
                formulas.revenue(index, month)?,
                NumberFormat::Currency,
                CellStyle::Plain,
            )?;
        }
        sheet.push_block(block);
    }
    section_total(
        &mut sheet,
        &formulas,
        layout.total_revenue_row,
        layout.revenue_start_row,
        "TOTAL REVENUE",
        NumberFormat::Currency,
        axis,
    )?;
    sheet.push_block(RowBlock::new(BlockKind::Spacer, layout.total_revenue_row + 1));

    // VOLUME
    let (volume_title, volume_format) = if gmv {
        (GMV_VOLUME_TITLE, NumberFormat::Currency)
    } else {
        (VOLUME_TITLE, NumberFormat::Count)
    };
    section_heading(
        &mut sheet,
        layout.volume_title_row,
        volume_title,
        Section::Volume,
        ["Item", volume_label(model), "Growth %", "Churn %"],
        axis,
    )?;
    for (index, item) in config.sales_items.iter().enumerate() {
        let starting = item.base_volume(model);
        let mut block = RowBlock::new(BlockKind::Data, layout.volume_row(index)?);
        block.put(
            SectionLayout::ITEM_COL,
            CellValue::text(&item.name),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::START_COL,
            CellValue::Number(starting),
            volume_format,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::GROWTH_COL,
            CellValue::Number(percent_fraction(item.growth_rate_percent)),
            NumberFormat::Percent,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::CHURN_COL,
            CellValue::Number(percent_fraction(item.churn_rate_percent)),
            NumberFormat::Percent,
            CellStyle::Plain,
        )?;
        for month in 0..axis.len() {
            block.put(
                SectionLayout::month_col(month),
                formulas.volume(index, month, starting)?,
                volume_format,
                CellStyle::Plain,
            )?;
        }
        sheet.push_block(block);
    }
    section_total(
        &mut sheet,
        &formulas,
        layout.total_volume_row,
        layout.volume_start_row,
        "TOTAL VOLUME",
        volume_format,
        axis,
    )?;
    sheet.push_block(RowBlock::new(BlockKind::Spacer, layout.total_volume_row + 1));

    // COGS
    let cost_header = if gmv { "Processing Fee %" } else { "Cost per Unit" };
    section_heading(
        &mut sheet,
        layout.cogs_title_row,
        COGS_TITLE,
        Section::Cogs,
        ["Item", "Type", cost_header, "Basis"],
        axis,
    )?;
    let (cost_format, cogs_basis) = if gmv {
        (NumberFormat::Percent, "GMV × Processing Fee")
    } else {
        (NumberFormat::UnitCurrency, "Volume × Unit Cost")
    };
    for (index, item) in config.sales_items.iter().enumerate() {
        let mut block = RowBlock::new(BlockKind::Data, layout.cogs_row(index)?);
        block.put(
            SectionLayout::ITEM_COL,
            CellValue::Text(format!("{} - COGS", item.name)),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::TYPE_COL,
            CellValue::text("COGS"),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::RATE_COL,
            CellValue::Number(formulas.cogs_rate(item)),
            cost_format,
            CellStyle::Plain,
        )?;
        block.put(
            SectionLayout::BASIS_COL,
            CellValue::text(cogs_basis),
            NumberFormat::General,
            CellStyle::Plain,
        )?;
        for month in 0..axis.len() {
            block.put(
                SectionLayout::month_col(month),
                formulas.cogs(index, month)?,
                NumberFormat::Currency,
                CellStyle::Plain,
            )?;
        }
        sheet.push_block(block);
    }
    section_total(
        &mut sheet,
        &formulas,
        layout.total_cogs_row,
        layout.cogs_start_row,
        "TOTAL COGS",
        NumberFormat::Currency,
        axis,
    )?;
    sheet.push_block(RowBlock::new(BlockKind::Spacer, layout.total_cogs_row + 1));

    // GROSS PROFIT
    let mut profit = RowBlock::new(BlockKind::Total, layout.gross_profit_row);
    profit.put(
        SectionLayout::ITEM_COL,
        CellValue::text(GROSS_PROFIT_LABEL),
        NumberFormat::General,
        CellStyle::GrossProfit,
    )?;
    for month in 0..axis.len() {
        profit.put(
            SectionLayout::month_col(month),
            formulas.gross_profit(month)?,
            NumberFormat::Currency,
            CellStyle::GrossProfit,
        )?;
    }
    sheet.push_block(profit);

    for (col, width) in (1..).zip(SectionLayout::LEADING_WIDTHS) {
        sheet.set_width(col, width);
    }
    for month in 0..axis.len() {
        sheet.set_width(SectionLayout::month_col(month), MONTH_COLUMN_WIDTH);
    }
    sheet.freeze_at = Some(CellRef::new(SectionLayout::FREEZE_ROW, SectionLayout::FREEZE_COL)?);
    Ok(sheet)
}

/// Merged title bar plus the section's column header row
fn section_heading(
    sheet: &mut SheetPlan,
    title_row: u32,
    title: &str,
    section: Section,
    columns: [&str; 4],
    axis: &MonthAxis,
) -> Result<()> {
    let mut bar = RowBlock::new(BlockKind::SectionHeader, title_row);
    bar.put(
        SectionLayout::ITEM_COL,
        CellValue::text(title),
        NumberFormat::General,
        CellStyle::SectionTitle(section),
    )?;
    sheet.push_block(bar);
    sheet.merges.push(CellRange::new(
        CellRef::new(title_row, SectionLayout::ITEM_COL)?,
        CellRef::new(title_row, SectionLayout::TITLE_SPAN)?,
    )?);

    let mut labels: Vec<&str> = columns.to_vec();
    labels.extend(axis.iter());
    sheet.push_block(RowBlock::labels(
        BlockKind::SectionHeader,
        title_row + 1,
        SectionLayout::ITEM_COL,
        labels,
        CellStyle::SectionHeader(section),
    )?);
    Ok(())
}

fn section_total(
    sheet: &mut SheetPlan,
    formulas: &SalesFormulas<'_>,
    row: u32,
    start_row: u32,
    label: &str,
    format: NumberFormat,
    axis: &MonthAxis,
) -> Result<()> {
    let mut total = RowBlock::new(BlockKind::Total, row);
    total.put(
        SectionLayout::ITEM_COL,
        CellValue::text(label),
        NumberFormat::General,
        CellStyle::Total,
    )?;
    for month in 0..axis.len() {
        total.put(
            SectionLayout::month_col(month),
            formulas.section_total(start_row, month)?,
            format,
            CellStyle::Total,
        )?;
    }
    sheet.push_block(total);
    Ok(())
}
