//! Sheet layout planning
//!
//! Phase one of synthesis: every row and column position is fixed here as a
//! pure function of the configuration's counts, before any cell content is
//! produced. The Sales sheet depends on this most. Revenue rows sit above
//! the volume rows they reference, so the volume block's position has to be
//! known in closed form while the revenue block is being written.
//!
//! All positions are 1-based.

use bizmodel_core::{
    team_abbreviation, BusinessConfiguration, FormulaAddressError, SalesModel, PROJECTION_MONTHS,
};

/// Sheet-level header row
pub const HEADER_ROW: u32 = 1;

/// First data row below the sheet header
pub const FIRST_DATA_ROW: u32 = 2;

/// Width of every month column
pub const MONTH_COLUMN_WIDTH: f64 = 12.0;

/// Column of the n-th month given the first month column
pub fn month_column(first_month_col: u16, month: usize) -> u16 {
    first_month_col + month as u16
}

// ============================================================================
// Staff
// ============================================================================

/// One employee row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaffSeat {
    pub team: String,
    /// 1-based employee number within the team
    pub number: u32,
}

impl StaffSeat {
    /// Position label, e.g. "CS Employee 2"
    pub fn position(&self) -> String {
        format!("{} Employee {}", team_abbreviation(&self.team), self.number)
    }
}

/// Staff sheet geometry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaffLayout {
    pub seats: Vec<StaffSeat>,
    pub has_extra_column: bool,
}

impl StaffLayout {
    pub const POSITION_COL: u16 = 1;
    pub const TEAM_COL: u16 = 2;
    pub const TYPE_COL: u16 = 3;
    pub const ALLOCATION_COL: u16 = 4;
    const EXTRA_COL: u16 = 5;

    /// Frozen pane anchor: header row and the first two columns stay visible
    pub const FREEZE_ROW: u32 = 2;
    pub const FREEZE_COL: u16 = 3;

    /// Widths of the four leading columns
    pub const LEADING_WIDTHS: [f64; 4] = [20.0, 30.0, 12.0, 18.0];
    pub const EXTRA_WIDTH: f64 = 18.0;
    pub const SALARY_WIDTH: f64 = 15.0;

    /// Seats follow team selection order, then employee order; teams with no
    /// head count contribute nothing
    pub fn plan(config: &BusinessConfiguration) -> Self {
        let seats = config
            .selected_teams
            .iter()
            .flat_map(|team| {
                (1..=config.employee_count(team)).map(move |number| StaffSeat {
                    team: team.clone(),
                    number,
                })
            })
            .collect();

        Self {
            seats,
            has_extra_column: config.extra_category_name().is_some(),
        }
    }

    pub fn extra_col(&self) -> Option<u16> {
        self.has_extra_column.then_some(Self::EXTRA_COL)
    }

    pub fn salary_col(&self) -> u16 {
        Self::EXTRA_COL + u16::from(self.has_extra_column)
    }

    pub fn first_month_col(&self) -> u16 {
        self.salary_col() + 1
    }

    pub fn month_col(&self, month: usize) -> u16 {
        month_column(self.first_month_col(), month)
    }

    pub fn last_month_col(&self) -> u16 {
        self.month_col(PROJECTION_MONTHS - 1)
    }

    pub fn data_row(&self, index: usize) -> Result<u32, FormulaAddressError> {
        if index >= self.seats.len() {
            return Err(FormulaAddressError(format!(
                "staff row {index} outside {} planned rows",
                self.seats.len()
            )));
        }
        Ok(FIRST_DATA_ROW + index as u32)
    }

    pub fn last_data_row(&self) -> Option<u32> {
        (!self.seats.is_empty()).then(|| FIRST_DATA_ROW + self.seats.len() as u32 - 1)
    }

    /// TOTAL row directly below the data; absent when there is no staff
    pub fn total_row(&self) -> Option<u32> {
        self.last_data_row().map(|row| row + 1)
    }
}

// ============================================================================
// Sales
// ============================================================================

/// Sales sheet variant chosen from the configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SalesLayout {
    /// Custom model: free-form three column template
    Freeform,
    /// No sales items: single placeholder column
    Empty,
    /// Generated REVENUE / VOLUME / COGS / GROSS PROFIT sections
    Sections(SectionLayout),
}

impl SalesLayout {
    pub fn plan(config: &BusinessConfiguration) -> Self {
        match config.sales_model {
            Some(model) if model.is_freeform() => Self::Freeform,
            _ if config.sales_items.is_empty() => Self::Empty,
            _ => Self::Sections(SectionLayout::new(config.sales_items.len() as u32)),
        }
    }
}

/// Row positions of the stacked Sales sections
///
/// Each section is a title row, a column header row, one row per item and a
/// total row; sections are separated by one blank spacer row. Every position
/// is derived from `revenue_start_row` and the item count alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionLayout {
    pub item_count: u32,
    pub revenue_title_row: u32,
    pub revenue_header_row: u32,
    pub revenue_start_row: u32,
    pub total_revenue_row: u32,
    pub volume_title_row: u32,
    pub volume_header_row: u32,
    pub volume_start_row: u32,
    pub total_volume_row: u32,
    pub cogs_title_row: u32,
    pub cogs_header_row: u32,
    pub cogs_start_row: u32,
    pub total_cogs_row: u32,
    pub gross_profit_row: u32,
}

impl SectionLayout {
    /// Rows between the last item of one section and the first item of the
    /// next: total, spacer, title, column headers
    pub const SECTION_OVERHEAD: u32 = 4;

    pub const ITEM_COL: u16 = 1;
    /// Type column in revenue/COGS rows
    pub const TYPE_COL: u16 = 2;
    /// Price, commission, unit cost or fee column in revenue/COGS rows
    pub const RATE_COL: u16 = 3;
    pub const BASIS_COL: u16 = 4;
    /// Starting volume column in volume rows
    pub const START_COL: u16 = 2;
    pub const GROWTH_COL: u16 = 3;
    pub const CHURN_COL: u16 = 4;
    pub const FIRST_MONTH_COL: u16 = 5;

    /// Section titles merge across the leading columns
    pub const TITLE_SPAN: u16 = 4;

    pub const FREEZE_ROW: u32 = 3;
    pub const FREEZE_COL: u16 = 5;

    pub const LEADING_WIDTHS: [f64; 4] = [30.0, 20.0, 18.0, 18.0];

    pub fn new(item_count: u32) -> Self {
        let revenue_title_row = HEADER_ROW;
        let revenue_header_row = revenue_title_row + 1;
        let revenue_start_row = revenue_header_row + 1;
        let total_revenue_row = revenue_start_row + item_count;

        let volume_start_row = revenue_start_row + item_count + Self::SECTION_OVERHEAD;
        let volume_header_row = volume_start_row - 1;
        let volume_title_row = volume_start_row - 2;
        let total_volume_row = volume_start_row + item_count;

        let cogs_start_row = volume_start_row + item_count + Self::SECTION_OVERHEAD;
        let cogs_header_row = cogs_start_row - 1;
        let cogs_title_row = cogs_start_row - 2;
        let total_cogs_row = cogs_start_row + item_count;

        let gross_profit_row = total_cogs_row + 2;

        Self {
            item_count,
            revenue_title_row,
            revenue_header_row,
            revenue_start_row,
            total_revenue_row,
            volume_title_row,
            volume_header_row,
            volume_start_row,
            total_volume_row,
            cogs_title_row,
            cogs_header_row,
            cogs_start_row,
            total_cogs_row,
            gross_profit_row,
        }
    }

    fn item_offset(&self, section: &str, item: usize) -> Result<u32, FormulaAddressError> {
        if item >= self.item_count as usize {
            return Err(FormulaAddressError(format!(
                "{section} row for item {item} outside {} planned items",
                self.item_count
            )));
        }
        Ok(item as u32)
    }

    pub fn revenue_row(&self, item: usize) -> Result<u32, FormulaAddressError> {
        Ok(self.revenue_start_row + self.item_offset("revenue", item)?)
    }

    pub fn volume_row(&self, item: usize) -> Result<u32, FormulaAddressError> {
        Ok(self.volume_start_row + self.item_offset("volume", item)?)
    }

    pub fn cogs_row(&self, item: usize) -> Result<u32, FormulaAddressError> {
        Ok(self.cogs_start_row + self.item_offset("COGS", item)?)
    }

    pub fn month_col(month: usize) -> u16 {
        month_column(Self::FIRST_MONTH_COL, month)
    }

    pub fn last_month_col() -> u16 {
        Self::month_col(PROJECTION_MONTHS - 1)
    }

    /// Last data row of the section starting at `start_row`
    pub fn last_item_row(&self, start_row: u32) -> u32 {
        start_row + self.item_count - 1
    }
}

/// Column geometry of the two placeholder Sales variants
pub struct SalesTemplate;

impl SalesTemplate {
    pub const FREEFORM_HEADERS: [&'static str; 3] = ["Item", "Description 1", "Description 2"];
    pub const FREEFORM_WIDTHS: [f64; 3] = [30.0, 25.0, 25.0];
    pub const EMPTY_HEADERS: [&'static str; 1] = ["Item"];
    pub const ITEM_WIDTH: f64 = 30.0;
    pub const FREEZE_ROW: u32 = 2;
    pub const FREEZE_COL: u16 = 2;
}

/// Label for the model's volume driver
pub fn volume_label(model: SalesModel) -> &'static str {
    if model.is_gmv_based() {
        "Starting GMV"
    } else {
        "Starting Volume"
    }
}

// ============================================================================
// Non-Staff
// ============================================================================

/// One non-staff cost row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonStaffLine {
    pub label: String,
    pub category: String,
}

/// Non-staff sheet geometry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonStaffLayout {
    pub lines: Vec<NonStaffLine>,
}

impl NonStaffLayout {
    pub const ITEM_COL: u16 = 1;
    pub const CATEGORY_COL: u16 = 2;
    pub const ANNUAL_COL: u16 = 3;
    pub const FIRST_MONTH_COL: u16 = 4;

    pub const LEADING_WIDTHS: [f64; 3] = [40.0, 30.0, 15.0];
    pub const FREEZE_ROW: u32 = 2;
    pub const FREEZE_COL: u16 = 2;

    /// One line per selected (category, item, instance) in selection order;
    /// instances are numbered only when there is more than one
    pub fn plan(config: &BusinessConfiguration) -> Self {
        let mut lines = Vec::new();
        for selection in config.non_staff_items.iter().filter(|s| s.selected) {
            let quantity = config.quantity_for(&selection.key);
            for instance in 1..=quantity {
                let label = if quantity > 1 {
                    format!("{} {}", selection.item, instance)
                } else {
                    selection.item.clone()
                };
                lines.push(NonStaffLine {
                    label,
                    category: selection.display_category().to_string(),
                });
            }
        }
        Self { lines }
    }

    pub fn month_col(month: usize) -> u16 {
        month_column(Self::FIRST_MONTH_COL, month)
    }

    pub fn data_row(&self, index: usize) -> Result<u32, FormulaAddressError> {
        if index >= self.lines.len() {
            return Err(FormulaAddressError(format!(
                "non-staff row {index} outside {} planned rows",
                self.lines.len()
            )));
        }
        Ok(FIRST_DATA_ROW + index as u32)
    }

    pub fn last_data_row(&self) -> Option<u32> {
        (!self.lines.is_empty()).then(|| FIRST_DATA_ROW + self.lines.len() as u32 - 1)
    }

    pub fn total_row(&self) -> Option<u32> {
        self.last_data_row().map(|row| row + 1)
    }
}
