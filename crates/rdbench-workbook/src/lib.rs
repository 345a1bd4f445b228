//! In-memory workbook model for rdbench.
//!
//! Report synthesis writes here; turning the model into a host spreadsheet
//! file is left to an external writer that consumes the serialized
//! `rdbench.workbook.v1` document.

pub mod cell;
pub mod chart;
pub mod format;
pub mod sheet;

pub use cell::{
    Cell, CellRange, CellRef, CellStyle, CellValue, NumberStyle, column_index, column_letter,
};
pub use chart::{RowRange, ScatterChart, ScatterSeries, ScatterStyle};
pub use format::{ColorScale, ColorStop, ConditionalFormat, StopKind};
pub use sheet::{ColumnGroup, Worksheet};

use rdbench_types::WORKBOOK_SCHEMA_V1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Host limit on sheet-name length, in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("no sheet named {0:?}")]
    UnknownSheet(String),

    #[error("sheet index {index} out of range (workbook has {len} sheets)")]
    SheetIndex { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Workbook {
    pub schema: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,

    pub sheets: Vec<Worksheet>,

    /// Index of the sheet shown on open.
    #[serde(default)]
    pub active: usize,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            schema: WORKBOOK_SCHEMA_V1.to_string(),
            generated_at: None,
            sheets: Vec::new(),
            active: 0,
        }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Sheet names compare case-insensitively in the host format.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let lower = name.to_lowercase();
        self.sheets
            .iter()
            .position(|s| s.name.to_lowercase() == lower)
    }

    /// A name derived from `wanted` that the host accepts and that no
    /// sheet uses yet: forbidden characters stripped, truncated, and on
    /// collision suffixed with `2`, `3`, ...
    pub fn unique_sheet_name(&self, wanted: &str) -> String {
        let cleaned: String = wanted
            .chars()
            .filter(|c| !FORBIDDEN_SHEET_CHARS.contains(c))
            .collect();
        let cleaned = cleaned.trim().trim_matches('\'');
        let base = if cleaned.is_empty() { "Sheet" } else { cleaned };
        let base = truncate_chars(base, MAX_SHEET_NAME_LEN);

        if !self.contains(&base) {
            return base;
        }

        let mut postfix = 2u32;
        loop {
            let suffix = postfix.to_string();
            let stem = truncate_chars(&base, MAX_SHEET_NAME_LEN - suffix.len());
            let candidate = format!("{stem}{suffix}");
            if !self.contains(&candidate) {
                return candidate;
            }
            postfix += 1;
        }
    }

    /// Append a sheet under a unique name derived from `wanted`.
    pub fn add_sheet(&mut self, wanted: &str) -> &mut Worksheet {
        let name = self.unique_sheet_name(wanted);
        self.sheets.push(Worksheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    /// Insert a sheet at `index` under a unique name derived from `wanted`.
    pub fn insert_sheet(&mut self, index: usize, wanted: &str) -> Result<&mut Worksheet, WorkbookError> {
        if index > self.sheets.len() {
            return Err(WorkbookError::SheetIndex {
                index,
                len: self.sheets.len(),
            });
        }
        let name = self.unique_sheet_name(wanted);
        self.sheets.insert(index, Worksheet::new(name));
        if self.active >= index && self.sheets.len() > 1 {
            self.active += 1;
        }
        Ok(&mut self.sheets[index])
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.position(name).map(|i| &self.sheets[i])
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.position(name).map(move |i| &mut self.sheets[i])
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), WorkbookError> {
        let index = self
            .position(name)
            .ok_or_else(|| WorkbookError::UnknownSheet(name.to_string()))?;
        self.active = index;
        Ok(())
    }

    pub fn active_sheet(&self) -> Option<&Worksheet> {
        self.sheets.get(self.active)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
