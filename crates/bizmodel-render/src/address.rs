//! A1-style cell addressing
//!
//! Rows and columns are 1-based, exactly as they appear in a formula, so the
//! planner and synthesizer never juggle two numbering schemes. Conversion to
//! the writer's 0-based indices happens only in the assembler.

use bizmodel_core::{FormulaAddressError, MAX_SHEET_ROWS};
use serde::Serialize;
use std::fmt;

/// Last addressable column (XFD)
pub const MAX_COLUMN: u16 = 16_384;

/// Last addressable row
pub const MAX_ROW: u32 = MAX_SHEET_ROWS;

/// Convert a 1-based column number to letters (1 -> A, 26 -> Z, 27 -> AA)
///
/// Column 0 has no letters and yields an empty string.
pub fn column_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col);
    while n > 0 {
        let rem = (n - 1) % 26;
        result.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    result
}

/// Convert column letters back to a 1-based column number
pub fn column_number(letters: &str) -> Option<u16> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        n = n * 26 + (ch as u32 - u32::from(b'A') + 1);
        if n > u32::from(MAX_COLUMN) {
            return None;
        }
    }
    u16::try_from(n).ok()
}

/// A single cell address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    /// Create a validated reference
    pub fn new(row: u32, col: u16) -> Result<Self, FormulaAddressError> {
        if row == 0 || row > MAX_ROW {
            return Err(FormulaAddressError(format!(
                "row {row} outside 1..={MAX_ROW}"
            )));
        }
        if col == 0 || col > MAX_COLUMN {
            return Err(FormulaAddressError(format!(
                "column {col} outside 1..={MAX_COLUMN}"
            )));
        }
        Ok(Self { row, col })
    }

    /// Parse an address such as `AE12`
    pub fn parse(address: &str) -> Option<Self> {
        let split = address.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = address.split_at(split);
        let col = column_number(letters)?;
        let row = digits.parse::<u32>().ok()?;
        Self::new(row, col).ok()
    }

    pub fn column_letter(&self) -> String {
        column_letter(self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row)
    }
}

/// A rectangular range of cells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Create a range; the start must not lie below or right of the end
    pub fn new(start: CellRef, end: CellRef) -> Result<Self, FormulaAddressError> {
        if start.row > end.row || start.col > end.col {
            return Err(FormulaAddressError(format!("inverted range {start}:{end}")));
        }
        Ok(Self { start, end })
    }

    /// Rows `first..=last` of a single column
    pub fn column(col: u16, first_row: u32, last_row: u32) -> Result<Self, FormulaAddressError> {
        Self::new(CellRef::new(first_row, col)?, CellRef::new(last_row, col)?)
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
