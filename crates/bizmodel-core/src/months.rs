//! Projection time axis
//!
//! Month columns are labelled from "today" in fixed 30-day steps rather than
//! calendar months, so a start late in a month can skip or repeat a label
//! (e.g. Jan 31 + 30 days = Mar 2). Downstream labels depend on this exact
//! stepping and it is kept as is.

use chrono::{Days, Local, NaiveDate};

/// Number of month columns in every projection sheet
pub const PROJECTION_MONTHS: usize = 48;

/// Days between consecutive month labels
pub const MONTH_STEP_DAYS: u64 = 30;

/// Source of the current date
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock reading the local system date
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(NaiveDate);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// The 48 month labels heading every projection sheet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthAxis {
    start: NaiveDate,
    labels: Vec<String>,
}

impl MonthAxis {
    /// Build the axis starting at the clock's current date
    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::starting(clock.today())
    }

    /// Build the axis starting at `start`
    pub fn starting(start: NaiveDate) -> Self {
        let labels = (0..PROJECTION_MONTHS as u64)
            .map(|i| {
                start
                    .checked_add_days(Days::new(i * MONTH_STEP_DAYS))
                    .unwrap_or(NaiveDate::MAX)
                    .format("%b %Y")
                    .to_string()
            })
            .collect();
        Self { start, labels }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
