//! Cell addressing and cell contents.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `1 → "A"`, `26 → "Z"`, `27 → "AA"`.
pub fn column_letter(column: u32) -> String {
    debug_assert!(column > 0, "columns are 1-based");
    let mut n = column;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Inverse of [`column_letter`].
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.bytes().try_fold(0u32, |acc, b| {
        if !b.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?.checked_add(u32::from(b - b'A') + 1)
    })
}

/// Quote a sheet name for use in a formula.
pub fn quote_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// A cell on a named sheet. Rows and columns are 1-based.
///
/// The textual `'sheet'!A1` form exists only at formula-emission time;
/// nothing parses it back.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CellRef {
    pub sheet: String,
    pub column: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(sheet: impl Into<String>, column: u32, row: u32) -> Self {
        Self {
            sheet: sheet.into(),
            column,
            row,
        }
    }

    pub fn column_letter(&self) -> String {
        column_letter(self.column)
    }

    /// Sheet-local address, e.g. `C4`.
    pub fn a1(&self) -> String {
        format!("{}{}", self.column_letter(), self.row)
    }

    /// Cross-sheet address, e.g. `'A'!C4`.
    pub fn to_formula(&self) -> String {
        format!("{}!{}", quote_sheet(&self.sheet), self.a1())
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_formula())
    }
}

/// A rectangular block of cells on one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CellRange {
    pub start_row: u32,
    pub start_column: u32,
    pub end_row: u32,
    pub end_column: u32,
}

impl CellRange {
    pub fn new(start_row: u32, start_column: u32, end_row: u32, end_column: u32) -> Self {
        Self {
            start_row: start_row.min(end_row),
            start_column: start_column.min(end_column),
            end_row: start_row.max(end_row),
            end_column: start_column.max(end_column),
        }
    }

    pub fn single(row: u32, column: u32) -> Self {
        Self::new(row, column, row, column)
    }

    pub fn contains(&self, row: u32, column: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_column..=self.end_column).contains(&column)
    }

    /// `A1:C3`.
    pub fn a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_letter(self.start_column),
            self.start_row,
            column_letter(self.end_column),
            self.end_row
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Formula text including the leading `=`.
    Formula(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn formula(s: impl Into<String>) -> Self {
        CellValue::Formula(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) | CellValue::Formula(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

/// Named number styles of the host template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NumberStyle {
    Percent,
    Comma,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_style: Option<NumberStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub centered: bool,
}

impl CellStyle {
    pub fn centered() -> Self {
        Self {
            centered: true,
            ..Self::default()
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Cell {
    pub row: u32,
    pub column: u32,
    pub value: CellValue,

    #[serde(default, skip_serializing_if = "CellStyle::is_default")]
    pub style: CellStyle,
}
