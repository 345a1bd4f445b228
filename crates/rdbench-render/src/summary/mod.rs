//! Summary sheets: comparison matrix, anchor list and curve chart.

mod anchor;
mod curve;
mod matrix;

use crate::formula::Category;
use crate::reshape::{BySequence, flatten, flip};
use crate::{RenderError, ReferenceMap};
use rdbench_domain::{FixedLayerSelector, LayerSelector, TotalOnly, resolve_anchor_matching};
use rdbench_types::{SeriesKey, SummaryDefinition};
use rdbench_workbook::{Workbook, Worksheet};
use regex::Regex;
use tracing::info;

/// Write one sheet per definition after the raw sheets, each becoming the
/// active sheet in turn. Returns the names of the sheets written.
pub fn make_summaries(
    workbook: &mut Workbook,
    refs: &ReferenceMap,
    order: &[String],
    definitions: &[SummaryDefinition],
) -> Result<Vec<String>, RenderError> {
    let mut written = Vec::with_capacity(definitions.len());

    for definition in definitions {
        let definition = resolved(definition);
        let by_sequence = flip(&flatten(refs, selector_for(&definition).as_ref()));

        let name = match &definition {
            SummaryDefinition::ComparisonMatrix(def) => {
                let filter = series_filter(def.filter.as_deref())?;
                let wanted = select_series(&by_sequence, &def.tests, filter.as_ref());
                let sheet = workbook.add_sheet(definition.sheet_name());
                matrix::write_matrix(sheet, &wanted, order, def);
                sheet.name.clone()
            }
            SummaryDefinition::AnchorList(def) => {
                let sheet = workbook.add_sheet(definition.sheet_name());
                anchor::write_anchor_list(sheet, &by_sequence, order, def);
                sheet.name.clone()
            }
            SummaryDefinition::CurveChart(def) => {
                let filter = series_filter(def.filter.as_deref())?;
                let wanted = select_series(&by_sequence, &def.tests, filter.as_ref());
                let sheet = workbook.add_sheet(definition.sheet_name());
                curve::write_curve_chart(sheet, &wanted, order, def);
                sheet.name.clone()
            }
        };

        workbook.set_active(&name)?;
        info!(sheet = %name, kind = ?definition.kind(), "summary sheet written");
        written.push(name);
    }

    Ok(written)
}

/// Anchor lists carry their matching rules until render time.
fn resolved(definition: &SummaryDefinition) -> SummaryDefinition {
    let mut definition = definition.clone();
    if let SummaryDefinition::AnchorList(def) = &mut definition {
        resolve_anchor_matching(def);
    }
    definition
}

fn selector_for(definition: &SummaryDefinition) -> Box<dyn LayerSelector> {
    match definition {
        SummaryDefinition::ComparisonMatrix(def) => {
            Box::new(FixedLayerSelector::new(def.layers.clone()))
        }
        _ => match definition.referenced_layers() {
            Some(layers) => Box::new(FixedLayerSelector::from(layers)),
            None => Box::new(TotalOnly),
        },
    }
}

fn series_filter(pattern: Option<&str>) -> Result<Option<Regex>, RenderError> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|source| RenderError::InvalidFilter {
                pattern: p.to_string(),
                source,
            })
        })
        .transpose()
}

/// Keep the series named by `tests` (all when empty) whose flattened name
/// matches `filter`.
fn select_series(by_sequence: &BySequence, tests: &[SeriesKey], filter: Option<&Regex>) -> BySequence {
    by_sequence
        .iter()
        .map(|(seq, series)| {
            let kept = series
                .iter()
                .filter(|(key, _)| tests.is_empty() || tests.contains(key))
                .filter(|(key, _)| filter.is_none_or(|re| re.is_match(&key.series_name())))
                .map(|(key, refs)| (key.clone(), refs.clone()))
                .collect();
            (seq.clone(), kept)
        })
        .collect()
}

/// Placement of one category block on a summary sheet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CategoryBlock {
    pub category: Category,
    /// Label column; data columns follow to its right.
    pub column: u32,
    /// Number of data columns.
    pub width: u32,
    pub header_written: bool,
}

impl CategoryBlock {
    pub fn last_column(&self) -> u32 {
        self.column + self.width
    }
}

/// Blocks left to right from `first_column`, one blank column apart.
pub(crate) fn lay_out_blocks(
    first_column: u32,
    categories: impl IntoIterator<Item = (Category, u32)>,
) -> Vec<CategoryBlock> {
    let mut column = first_column;
    categories
        .into_iter()
        .map(|(category, width)| {
            let block = CategoryBlock {
                category,
                column,
                width,
                header_written: false,
            };
            column = block.last_column() + 2;
            block
        })
        .collect()
}

/// Same width for every used column.
pub(crate) fn set_column_widths(sheet: &mut Worksheet, width: usize) {
    if width == 0 {
        return;
    }
    for column in 1..=sheet.max_column() {
        sheet.set_column_width(column, width as f64);
    }
}

fn longest<'a>(names: impl IntoIterator<Item = &'a str>) -> usize {
    names
        .into_iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
}
