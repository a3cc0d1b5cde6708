//! Formula synthesis
//!
//! Builders for every formula shape the workbook uses, and [`SalesFormulas`],
//! which picks the model-specific shape for each Sales cell from the planned
//! [`SectionLayout`]. Nothing here evaluates formulas; the spreadsheet
//! application does.

use bizmodel_core::{FormulaAddressError, SalesItem, SalesModel};

use crate::address::{CellRange, CellRef};
use crate::layout::SectionLayout;
use crate::plan::CellValue;

type Result<T> = std::result::Result<T, FormulaAddressError>;

/// Monthly share of an annual amount: `=E2/12`
pub fn monthly_from_annual(annual: CellRef) -> String {
    format!("={annual}/12")
}

/// Column total over `first..=last`: `=SUM(F2:F9)`
pub fn column_sum(col: u16, first_row: u32, last_row: u32) -> Result<String> {
    let range = CellRange::column(col, first_row, last_row)?;
    Ok(format!("=SUM({range})"))
}

/// `=B10*C3`
pub fn product(left: CellRef, right: CellRef) -> String {
    format!("={left}*{right}")
}

/// `=E6-E20`
pub fn difference(left: CellRef, right: CellRef) -> String {
    format!("={left}-{right}")
}

/// Churn-adjusted growth from the previous month: `=E10*(1-D10)*(1+C10)`
pub fn churn_adjusted_growth(previous: CellRef, churn: CellRef, growth: CellRef) -> String {
    format!("={previous}*(1-{churn})*(1+{growth})")
}

/// Closed-form compounding from the start value: `=B10*POWER(1+C10,3)`
pub fn compound_growth(start: CellRef, growth: CellRef, months: usize) -> String {
    format!("={start}*POWER(1+{growth},{months})")
}

/// Percent input as the fraction stored in the sheet (5 -> 0.05)
pub fn percent_fraction(percent: f64) -> f64 {
    percent / 100.0
}

/// Model-aware formulas for the Sales sections
///
/// Revenue and COGS rows multiply the item's volume for the month by the
/// rate in their own row: unit price and unit cost for most models,
/// commission and processing fee on GMV for marketplaces. Volume rows either
/// compound from the previous month with churn (SaaS) or compound in closed
/// form from the starting volume (everything else).
#[derive(Clone, Copy, Debug)]
pub struct SalesFormulas<'a> {
    model: SalesModel,
    layout: &'a SectionLayout,
}

impl<'a> SalesFormulas<'a> {
    pub fn new(model: SalesModel, layout: &'a SectionLayout) -> Self {
        Self { model, layout }
    }

    pub fn model(&self) -> SalesModel {
        self.model
    }

    /// Value written to the rate column of a revenue row
    pub fn revenue_rate(&self, item: &SalesItem) -> f64 {
        if self.model.is_gmv_based() {
            percent_fraction(item.commission_rate_percent)
        } else {
            item.unit_price
        }
    }

    /// Value written to the rate column of a COGS row
    pub fn cogs_rate(&self, item: &SalesItem) -> f64 {
        if self.model.is_gmv_based() {
            percent_fraction(item.processing_fee_percent)
        } else {
            item.cost_per_unit
        }
    }

    /// Volume cell of `item` for `month`
    pub fn volume_cell(&self, item: usize, month: usize) -> Result<CellRef> {
        CellRef::new(self.layout.volume_row(item)?, SectionLayout::month_col(month))
    }

    /// Starting volume cell of `item`
    pub fn starting_volume_cell(&self, item: usize) -> Result<CellRef> {
        CellRef::new(self.layout.volume_row(item)?, SectionLayout::START_COL)
    }

    /// Revenue for `item` in `month`
    ///
    /// Month 0 reads the starting volume directly; later months read the
    /// volume section's cell for the same month.
    pub fn revenue(&self, item: usize, month: usize) -> Result<CellValue> {
        let rate = CellRef::new(self.layout.revenue_row(item)?, SectionLayout::RATE_COL)?;
        let volume = if month == 0 {
            self.starting_volume_cell(item)?
        } else {
            self.volume_cell(item, month)?
        };
        Ok(CellValue::Formula(product(volume, rate)))
    }

    /// Volume for `item` in `month`; month 0 is the literal starting volume
    pub fn volume(&self, item: usize, month: usize, starting_volume: f64) -> Result<CellValue> {
        let row = self.layout.volume_row(item)?;
        if month == 0 {
            return Ok(CellValue::Number(starting_volume));
        }
        let growth = CellRef::new(row, SectionLayout::GROWTH_COL)?;
        let formula = if self.model.has_churn_recurrence() {
            let previous = self.volume_cell(item, month - 1)?;
            let churn = CellRef::new(row, SectionLayout::CHURN_COL)?;
            churn_adjusted_growth(previous, churn, growth)
        } else {
            compound_growth(self.starting_volume_cell(item)?, growth, month)
        };
        Ok(CellValue::Formula(formula))
    }

    /// Cost of goods sold for `item` in `month`
    pub fn cogs(&self, item: usize, month: usize) -> Result<CellValue> {
        let rate = CellRef::new(self.layout.cogs_row(item)?, SectionLayout::RATE_COL)?;
        Ok(CellValue::Formula(product(self.volume_cell(item, month)?, rate)))
    }

    /// Section total for `month` over rows `start_row` onwards
    pub fn section_total(&self, start_row: u32, month: usize) -> Result<CellValue> {
        let col = SectionLayout::month_col(month);
        let last = self.layout.last_item_row(start_row);
        Ok(CellValue::Formula(column_sum(col, start_row, last)?))
    }

    /// Gross profit for `month`
    pub fn gross_profit(&self, month: usize) -> Result<CellValue> {
        let col = SectionLayout::month_col(month);
        let revenue = CellRef::new(self.layout.total_revenue_row, col)?;
        let cogs = CellRef::new(self.layout.total_cogs_row, col)?;
        Ok(CellValue::Formula(difference(revenue, cogs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn formula(value: CellValue) -> String {
        value.as_formula().map(str::to_string).unwrap_or_default()
    }

    #[test]
    fn basic_shapes() {
        let e2 = CellRef::new(2, 5).unwrap();
        let c3 = CellRef::new(3, 3).unwrap();
        assert_eq!(monthly_from_annual(e2), "=E2/12");
        assert_eq!(column_sum(31, 2, 9).unwrap(), "=SUM(AE2:AE9)");
        assert_eq!(product(e2, c3), "=E2*C3");
        assert_eq!(difference(e2, c3), "=E2-C3");
        assert_eq!(compound_growth(e2, c3, 4), "=E2*POWER(1+C3,4)");
        assert_eq!(churn_adjusted_growth(e2, c3, c3), "=E2*(1-C3)*(1+C3)");
    }

    #[test]
    fn column_sum_rejects_inverted_range() {
        assert!(column_sum(6, 5, 4).is_err());
    }

    #[test]
    fn product_model_formulas() {
        // one item: revenue row 3, volume row 8, COGS row 13
        let layout = SectionLayout::new(1);
        let formulas = SalesFormulas::new(SalesModel::Product, &layout);

        assert_eq!(formula(formulas.revenue(0, 0).unwrap()), "=B8*C3");
        assert_eq!(formula(formulas.revenue(0, 1).unwrap()), "=F8*C3");
        assert_eq!(formulas.volume(0, 0, 250.0).unwrap(), CellValue::Number(250.0));
        assert_eq!(formula(formulas.volume(0, 2, 250.0).unwrap()), "=B8*POWER(1+C8,2)");
        assert_eq!(formula(formulas.cogs(0, 0).unwrap()), "=E8*C13");
        assert_eq!(formula(formulas.cogs(0, 47).unwrap()), "=AZ8*C13");
    }

    #[test]
    fn saas_volume_recurs_on_previous_month() {
        let layout = SectionLayout::new(2);
        let formulas = SalesFormulas::new(SalesModel::Saas, &layout);
        // volume rows 9 and 10
        assert_eq!(formula(formulas.volume(1, 1, 0.0).unwrap()), "=E10*(1-D10)*(1+C10)");
        assert_eq!(formula(formulas.volume(1, 27, 0.0).unwrap()), "=AE10*(1-D10)*(1+C10)");
    }

    #[test]
    fn totals_and_gross_profit() {
        let layout = SectionLayout::new(2);
        let formulas = SalesFormulas::new(SalesModel::Service, &layout);
        assert_eq!(
            formula(formulas.section_total(layout.revenue_start_row, 0).unwrap()),
            "=SUM(E3:E4)"
        );
        assert_eq!(
            formula(formulas.section_total(layout.cogs_start_row, 1).unwrap()),
            "=SUM(F15:F16)"
        );
        assert_eq!(formula(formulas.gross_profit(0).unwrap()), "=E5-E17");
    }

    #[test]
    fn marketplace_rates_are_fractions() {
        let layout = SectionLayout::new(1);
        let formulas = SalesFormulas::new(SalesModel::Marketplace, &layout);
        let item = SalesItem::new("Orders")
            .unit_price(99.0)
            .commission(12.0)
            .processing_fee(2.5)
            .cost_per_unit(7.0);
        assert_eq!(formulas.revenue_rate(&item), 0.12);
        assert_eq!(formulas.cogs_rate(&item), 0.025);

        let product = SalesFormulas::new(SalesModel::Product, &layout);
        assert_eq!(product.revenue_rate(&item), 99.0);
        assert_eq!(product.cogs_rate(&item), 7.0);
    }

    #[test]
    fn out_of_range_item_is_an_address_error() {
        let layout = SectionLayout::new(2);
        let formulas = SalesFormulas::new(SalesModel::Product, &layout);
        assert!(formulas.revenue(2, 0).is_err());
        assert!(formulas.volume(5, 3, 1.0).is_err());
        assert!(formulas.cogs(2, 1).is_err());
    }
}
