//! # bizmodel-core
//!
//! Core domain model for the bizmodel projection workbook generator.
//!
//! This crate provides:
//! - Domain types: `BusinessConfiguration`, `SalesModel`, `SalesItem`, `NonStaffSelection`
//! - The configuration normalizer that turns raw JSON into those types
//! - The 48-month time axis and the `Clock` abstraction it is built from
//! - Core traits (`Generator`) and error types shared by every stage
//!
//! ## Example
//!
//! ```rust
//! use bizmodel_core::{normalize, FixedClock, MonthAxis, SalesModel};
//! use chrono::NaiveDate;
//! use serde_json::json;
//!
//! let config = normalize(&json!({
//!     "selectedTeams": ["Engineering"],
//!     "employeeCounts": {"Engineering": 2},
//!     "salesModel": "saas",
//!     "salesItems": [{"planName": "Pro", "monthlyPrice": 20, "startingSubscribers": 100}]
//! }))
//! .unwrap();
//! assert_eq!(config.sales_model, Some(SalesModel::Saas));
//! assert_eq!(config.sales_items[0].unit_price, 20.0);
//!
//! let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
//! let axis = MonthAxis::from_clock(&clock);
//! assert_eq!(axis.label(0), Some("Jan 2025"));
//! ```

pub mod months;
pub mod normalize;

pub use months::{Clock, FixedClock, MonthAxis, SystemClock, MONTH_STEP_DAYS, PROJECTION_MONTHS};
pub use normalize::{normalize, parse_configuration};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Name of a staff team as selected by the client
pub type TeamName = String;

/// Non-staff selection key in `"category|item"` form
pub type NonStaffKey = String;

/// Quantity assumed for a selected non-staff item without an explicit quantity
pub const DEFAULT_NON_STAFF_QUANTITY: u32 = 1;

/// Rows available on one worksheet
pub const MAX_SHEET_ROWS: u32 = 1_048_576;

/// Data rows a line-item sheet can hold below its header and above its total
pub const MAX_LINE_ITEMS: u64 = MAX_SHEET_ROWS as u64 - 2;

// ============================================================================
// Configuration
// ============================================================================

/// A complete, normalized business configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessConfiguration {
    /// Teams in the order the client selected them
    pub selected_teams: Vec<TeamName>,
    /// Head count per team; teams missing here have no employees
    pub employee_counts: HashMap<TeamName, u32>,
    /// Optional free-form staff classification column
    pub extra_category: Option<ExtraCategory>,
    /// Sales model; only required when there are sales items
    pub sales_model: Option<SalesModel>,
    /// Sales line items with aliases already resolved
    pub sales_items: Vec<SalesItem>,
    /// Non-staff selections in the order the client sent them
    pub non_staff_items: Vec<NonStaffSelection>,
    /// Quantity per non-staff key
    pub non_staff_quantities: HashMap<NonStaffKey, u32>,
}

impl BusinessConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a team with the given head count
    pub fn team(mut self, name: impl Into<String>, count: u32) -> Self {
        let name = name.into();
        self.employee_counts.insert(name.clone(), count);
        self.selected_teams.push(name);
        self
    }

    /// Set the extra staff category column
    pub fn extra_category(mut self, category: ExtraCategory) -> Self {
        self.extra_category = Some(category);
        self
    }

    /// Set the sales model
    pub fn sales_model(mut self, model: SalesModel) -> Self {
        self.sales_model = Some(model);
        self
    }

    /// Append a sales item
    pub fn sales_item(mut self, item: SalesItem) -> Self {
        self.sales_items.push(item);
        self
    }

    /// Append a selected non-staff item with a quantity
    pub fn non_staff(mut self, category: &str, item: &str, quantity: u32) -> Self {
        let selection = NonStaffSelection::new(category, item, true);
        self.non_staff_quantities
            .insert(selection.key.clone(), quantity);
        self.non_staff_items.push(selection);
        self
    }

    /// Number of employees configured for a team (0 when absent)
    pub fn employee_count(&self, team: &str) -> u32 {
        self.employee_counts.get(team).copied().unwrap_or(0)
    }

    /// Quantity for a non-staff key, defaulting to one instance
    pub fn quantity_for(&self, key: &str) -> u32 {
        self.non_staff_quantities
            .get(key)
            .copied()
            .unwrap_or(DEFAULT_NON_STAFF_QUANTITY)
    }

    /// Name of the extra category column, if one should be emitted
    pub fn extra_category_name(&self) -> Option<&str> {
        self.extra_category
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|name| !name.trim().is_empty())
    }

    /// Total number of staff rows across all selected teams
    pub fn total_employees(&self) -> u64 {
        self.selected_teams
            .iter()
            .map(|team| u64::from(self.employee_count(team)))
            .sum()
    }

    /// Total number of Non-Staff rows across all selected items
    pub fn total_non_staff_lines(&self) -> u64 {
        self.non_staff_items
            .iter()
            .filter(|s| s.selected)
            .map(|s| u64::from(self.quantity_for(&s.key)))
            .sum()
    }
}

/// Optional extra staff classification (e.g. "Cost Center")
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraCategory {
    pub name: String,
    /// Dropdown options; blank entries are removed during normalization
    pub options: Vec<String>,
}

impl ExtraCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }
}

/// One entry of the non-staff selection mapping
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonStaffSelection {
    /// Original `"category|item"` key
    pub key: NonStaffKey,
    pub category: String,
    pub item: String,
    pub selected: bool,
}

impl NonStaffSelection {
    pub fn new(category: &str, item: &str, selected: bool) -> Self {
        Self {
            key: format!("{category}|{item}"),
            category: category.to_string(),
            item: item.to_string(),
            selected,
        }
    }

    /// Category without a leading emoji token ("💻 Software" -> "Software")
    pub fn display_category(&self) -> &str {
        match self.category.split_once(' ') {
            Some((first, rest)) if !first.chars().any(char::is_alphanumeric) => rest.trim_start(),
            _ => &self.category,
        }
    }
}

// ============================================================================
// Sales
// ============================================================================

/// Revenue model driving the Sales sheet formulas
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesModel {
    Product,
    Service,
    Saas,
    Marketplace,
    Subscription,
    Usage,
    Manufacturing,
    Custom,
}

impl SalesModel {
    pub const ALL: [SalesModel; 8] = [
        SalesModel::Product,
        SalesModel::Service,
        SalesModel::Saas,
        SalesModel::Marketplace,
        SalesModel::Subscription,
        SalesModel::Usage,
        SalesModel::Manufacturing,
        SalesModel::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesModel::Product => "product",
            SalesModel::Service => "service",
            SalesModel::Saas => "saas",
            SalesModel::Marketplace => "marketplace",
            SalesModel::Subscription => "subscription",
            SalesModel::Usage => "usage",
            SalesModel::Manufacturing => "manufacturing",
            SalesModel::Custom => "custom",
        }
    }

    /// Label written into the Type column of revenue rows
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// SaaS volume compounds month over month with churn
    pub fn has_churn_recurrence(&self) -> bool {
        matches!(self, SalesModel::Saas)
    }

    /// Marketplace revenue and COGS are percentages of GMV
    pub fn is_gmv_based(&self) -> bool {
        matches!(self, SalesModel::Marketplace)
    }

    /// Custom models get a free-form template instead of generated sections
    pub fn is_freeform(&self) -> bool {
        matches!(self, SalesModel::Custom)
    }
}

impl fmt::Display for SalesModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown sales model '{s}' (expected one of {})", known.join(", "))
            })
    }
}

/// A sales line item with every semantic field resolved
///
/// Percent fields hold the value as entered (`5` means 5%).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesItem {
    pub name: String,
    pub unit_price: f64,
    pub starting_volume: f64,
    pub growth_rate_percent: f64,
    pub cost_per_unit: f64,
    pub churn_rate_percent: f64,
    pub commission_rate_percent: f64,
    pub processing_fee_percent: f64,
    pub starting_gmv: f64,
}

impl Default for SalesItem {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_NAME)
    }
}

/// Name used when no alias supplies one
pub const DEFAULT_ITEM_NAME: &str = "Item";

impl SalesItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit_price: 0.0,
            starting_volume: 0.0,
            growth_rate_percent: 0.0,
            cost_per_unit: 0.0,
            churn_rate_percent: 0.0,
            commission_rate_percent: 0.0,
            processing_fee_percent: 0.0,
            starting_gmv: 0.0,
        }
    }

    pub fn unit_price(mut self, price: f64) -> Self {
        self.unit_price = price;
        self
    }

    pub fn starting_volume(mut self, volume: f64) -> Self {
        self.starting_volume = volume;
        self
    }

    pub fn growth(mut self, percent: f64) -> Self {
        self.growth_rate_percent = percent;
        self
    }

    pub fn cost_per_unit(mut self, cost: f64) -> Self {
        self.cost_per_unit = cost;
        self
    }

    pub fn churn(mut self, percent: f64) -> Self {
        self.churn_rate_percent = percent;
        self
    }

    pub fn commission(mut self, percent: f64) -> Self {
        self.commission_rate_percent = percent;
        self
    }

    pub fn processing_fee(mut self, percent: f64) -> Self {
        self.processing_fee_percent = percent;
        self
    }

    pub fn starting_gmv(mut self, gmv: f64) -> Self {
        self.starting_gmv = gmv;
        self
    }

    /// Base quantity the volume section starts from.
    ///
    /// Marketplace items grow GMV; when only `startingGMV` was supplied the
    /// volume alias chain already picked it up, so this falls back to it.
    pub fn base_volume(&self, model: SalesModel) -> f64 {
        if model.is_gmv_based() && self.starting_volume == 0.0 {
            self.starting_gmv
        } else {
            self.starting_volume
        }
    }
}

/// Initials of every word of a team name ("Customer Success" -> "CS")
pub fn team_abbreviation(team: &str) -> String {
    team.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

// ============================================================================
// Traits
// ============================================================================

/// Produces an artifact from a normalized configuration and month axis
pub trait Generator {
    type Output;

    /// Generate the artifact; all-or-nothing
    fn generate(
        &self,
        config: &BusinessConfiguration,
        axis: &MonthAxis,
    ) -> Result<Self::Output, GenerateError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Malformed or missing configuration input
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Configuration must be a JSON object")]
    NotAnObject,

    #[error("Missing required field `{0}`")]
    MissingField(String),

    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ConfigurationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Path of the offending field, when the error is tied to one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField(field) | Self::InvalidField { field, .. } => Some(field),
            Self::MalformedJson(_) | Self::NotAnObject => None,
        }
    }
}

/// A computed cell reference fell outside the planned layout
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Formula address out of range: {0}")]
pub struct FormulaAddressError(pub String);

/// Writing the workbook failed
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet writer error: {0}")]
    Xlsx(String),
}

/// Any failure of the generation pipeline
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    FormulaAddress(#[from] FormulaAddressError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

// ============================================================================
// Tests
// ============================================================================
