//! One worksheet: cells plus presentation metadata.

use crate::cell::{Cell, CellRange, CellRef, CellStyle, CellValue};
use crate::chart::ScatterChart;
use crate::format::{ColorScale, ConditionalFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnGroup {
    pub start_column: u32,
    pub end_column: u32,
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Worksheet {
    pub name: String,

    /// Cells keyed by `(row, column)`; serialized as a row-major list.
    #[serde(
        serialize_with = "serialize_cells",
        deserialize_with = "deserialize_cells"
    )]
    #[schemars(with = "Vec<Cell>")]
    pub cells: BTreeMap<(u32, u32), Cell>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged: Vec<CellRange>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_widths: BTreeMap<u32, f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_groups: Vec<ColumnGroup>,

    /// Top-left unfrozen cell, e.g. `A4`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze_panes: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_formats: Vec<ConditionalFormat>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ScatterChart>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Write `value` at `(row, column)`, replacing any previous content
    /// and resetting its style.
    pub fn set(&mut self, row: u32, column: u32, value: impl Into<CellValue>) -> &mut Cell {
        self.set_styled(row, column, value, CellStyle::default())
    }

    pub fn set_styled(
        &mut self,
        row: u32,
        column: u32,
        value: impl Into<CellValue>,
        style: CellStyle,
    ) -> &mut Cell {
        debug_assert!(row > 0 && column > 0, "cells are 1-based");
        let cell = Cell {
            row,
            column,
            value: value.into(),
            style,
        };
        match self.cells.entry((row, column)) {
            Entry::Occupied(mut slot) => {
                slot.insert(cell);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(cell),
        }
    }

    pub fn get(&self, row: u32, column: u32) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    pub fn value(&self, row: u32, column: u32) -> Option<&CellValue> {
        self.get(row, column).map(|c| &c.value)
    }

    /// Text or formula at `(row, column)`.
    pub fn text(&self, row: u32, column: u32) -> Option<&str> {
        self.value(row, column).and_then(CellValue::as_str)
    }

    /// Reference to a cell of this sheet.
    pub fn cell_ref(&self, row: u32, column: u32) -> CellRef {
        CellRef::new(self.name.clone(), column, row)
    }

    /// Append a row below the current content; `None` leaves a gap.
    pub fn append_row<I, V>(&mut self, values: I) -> u32
    where
        I: IntoIterator<Item = Option<V>>,
        V: Into<CellValue>,
    {
        let row = self.max_row() + 1;
        for (i, value) in values.into_iter().enumerate() {
            if let Some(v) = value {
                self.set(row, i as u32 + 1, v);
            }
        }
        row
    }

    pub fn merge(&mut self, range: CellRange) {
        self.merged.push(range);
    }

    pub fn set_column_width(&mut self, column: u32, width: f64) {
        self.column_widths.insert(column, width);
    }

    pub fn group_columns(&mut self, start_column: u32, end_column: u32, hidden: bool) {
        self.column_groups.push(ColumnGroup {
            start_column,
            end_column,
            hidden,
        });
    }

    pub fn freeze(&mut self, cell: &str) {
        self.freeze_panes = Some(cell.to_string());
    }

    pub fn add_color_scale(&mut self, range: CellRange, scale: ColorScale) {
        self.conditional_formats
            .push(ConditionalFormat { range, scale });
    }

    pub fn add_chart(&mut self, chart: ScatterChart) {
        self.charts.push(chart);
    }

    /// Last used row (merged ranges included); 0 for an empty sheet.
    pub fn max_row(&self) -> u32 {
        let cells = self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0);
        let merged = self.merged.iter().map(|m| m.end_row).max().unwrap_or(0);
        cells.max(merged)
    }

    /// Last used column (merged ranges included); 0 for an empty sheet.
    pub fn max_column(&self) -> u32 {
        let cells = self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0);
        let merged = self.merged.iter().map(|m| m.end_column).max().unwrap_or(0);
        cells.max(merged)
    }
}

fn serialize_cells<S: Serializer>(
    cells: &BTreeMap<(u32, u32), Cell>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(cells.values())
}

fn deserialize_cells<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<(u32, u32), Cell>, D::Error> {
    let list: Vec<Cell> = Vec::deserialize(deserializer)?;
    Ok(list.into_iter().map(|c| ((c.row, c.column), c)).collect())
}
