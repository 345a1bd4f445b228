//! Scatter charts sourced from sheet ranges.

use crate::cell::{column_letter, quote_sheet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A one-row range on a sheet, used as chart series data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RowRange {
    pub sheet: String,
    pub row: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl RowRange {
    pub fn new(sheet: impl Into<String>, row: u32, start_column: u32, end_column: u32) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            start_column,
            end_column,
        }
    }

    /// Absolute reference, e.g. `'Curve_chart'!$C$3:$F$3`.
    pub fn to_formula(&self) -> String {
        format!(
            "{}!${}${}:${}${}",
            quote_sheet(&self.sheet),
            column_letter(self.start_column),
            self.row,
            column_letter(self.end_column),
            self.row
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScatterSeries {
    /// Single cell holding the series title.
    pub title: RowRange,
    pub x: RowRange,
    pub y: RowRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScatterStyle {
    Line,
    LineMarker,
    Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScatterChart {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub style: ScatterStyle,
    /// Plot data from hidden rows and columns too.
    pub visible_cells_only: bool,
    /// Top-left anchor cell, e.g. `G1`.
    pub anchor: String,
    pub series: Vec<ScatterSeries>,
}

impl ScatterChart {
    pub fn new(title: impl Into<String>, x_axis_title: &str, y_axis_title: &str) -> Self {
        Self {
            title: title.into(),
            x_axis_title: x_axis_title.to_string(),
            y_axis_title: y_axis_title.to_string(),
            style: ScatterStyle::LineMarker,
            visible_cells_only: false,
            anchor: "A1".to_string(),
            series: Vec::new(),
        }
    }
}
