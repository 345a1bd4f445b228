//! Pairwise comparison matrix.
//!
//! Per sequence, one square grid per enabled category. Cell `(R, C)`
//! compares the row series `R` against the column series `C`, which acts
//! as the anchor.

use super::{CategoryBlock, lay_out_blocks, longest, set_column_widths};
use crate::MetricRefs;
use crate::formula::{Category, relative};
use crate::reshape::{BySequence, sequence_order};
use rdbench_types::{MatrixDefinition, SeriesKey};
use rdbench_workbook::{CellRange, CellStyle, CellValue, Worksheet};
use std::collections::BTreeSet;

pub(crate) const MATRIX_TITLE: &str = "Result summary matrix (bdrate, bit, PSNR, Time comparisons)";

/// Blocks start right of the per-sequence title when BD-rate is off.
const FIRST_COLUMN_WITHOUT_BDRATE: u32 = 3;

pub(crate) fn write_matrix(
    sheet: &mut Worksheet,
    by_sequence: &BySequence,
    order: &[String],
    def: &MatrixDefinition,
) {
    sheet.set(1, 1, MATRIX_TITLE);

    let sequences = sequence_order(order, by_sequence);
    let widest = sequences
        .iter()
        .filter_map(|s| by_sequence.get(*s))
        .map(|series| series.len() as u32)
        .max()
        .unwrap_or(0);

    let enabled = [
        (Category::BdRate, def.write_bdbr),
        (Category::Bits, def.write_bits),
        (Category::Psnr, def.write_psnr),
        (Category::Time, def.write_time),
    ]
    .into_iter()
    .filter_map(|(category, on)| on.then_some((category, widest)));
    let first_column = if def.write_bdbr {
        1
    } else {
        FIRST_COLUMN_WITHOUT_BDRATE
    };
    let blocks = lay_out_blocks(first_column, enabled);

    for sequence in &sequences {
        let Some(series) = by_sequence.get(*sequence) else {
            continue;
        };
        let mut series: Vec<(String, &MetricRefs)> = series
            .iter()
            .map(|(key, refs)| (key.series_name(), refs))
            .collect();
        series.sort_by(|a, b| a.0.cmp(&b.0));

        let row = sheet.max_row() + 2;
        sheet.set(row, 1, format!("Sequence {sequence} results"));
        for block in &blocks {
            write_grid(sheet, row, block, &series);
        }
    }

    let names: BTreeSet<String> = by_sequence
        .values()
        .flat_map(|series| series.keys())
        .map(SeriesKey::series_name)
        .collect();
    let width = longest(names.iter().map(String::as_str));
    set_column_widths(sheet, width);
}

fn write_grid(sheet: &mut Worksheet, row: u32, block: &CategoryBlock, series: &[(String, &MetricRefs)]) {
    let category = block.category;
    let col = block.column;
    let n = series.len() as u32;
    let centered = CellStyle::centered();

    if let Some(header) = category.matrix_header() {
        sheet.set_styled(row, col, header, centered.clone());
    }
    if n == 0 {
        return;
    }
    sheet.merge(CellRange::new(row, col, row, col + n));

    for (i, (name, _)) in series.iter().enumerate() {
        let i = i as u32;
        sheet.set_styled(row + 1, col + 1 + i, name.as_str(), centered.clone());
        sheet.set_styled(row + 2 + i, col, name.as_str(), centered.clone());
    }

    for (r, (_, test)) in series.iter().enumerate() {
        for (c, (_, anchor)) in series.iter().enumerate() {
            let value = if r == c {
                category.diagonal()
            } else {
                CellValue::formula(relative(category, anchor, test))
            };
            sheet.set_styled(
                row + 2 + r as u32,
                col + 1 + c as u32,
                value,
                category.relative_style(),
            );
        }
    }

    sheet.add_color_scale(
        CellRange::new(row + 2, col + 1, row + 1 + n, col + n),
        category.color_scale(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::normalized;
    use crate::layout::layout_test_sheet;
    use crate::reshape::{flatten, flip};
    use crate::ReferenceMap;
    use proptest::prelude::*;
    use rdbench_domain::TotalOnly;

    fn by_sequence(tests: &[&str], sequences: &[&str]) -> BySequence {
        let refs: ReferenceMap = tests
            .iter()
            .map(|name| {
                let run = normalized(name, sequences, &[1000.0, 500.0], 40.0);
                let mut sheet = Worksheet::new(*name);
                (name.to_string(), layout_test_sheet(&mut sheet, &run, &[]))
            })
            .collect();
        flip(&flatten(&refs, &TotalOnly))
    }

    fn formula(sheet: &Worksheet, row: u32, col: u32) -> &str {
        match sheet.value(row, col) {
            Some(CellValue::Formula(f)) => f,
            other => panic!("expected formula at ({row},{col}), got {other:?}"),
        }
    }

    #[test]
    fn grid_layout_for_two_tests() {
        let data = by_sequence(&["B", "A"], &["s1"]);
        let order = vec!["s1".to_string()];
        let mut sheet = Worksheet::new("BDBRMatrix");
        write_matrix(&mut sheet, &data, &order, &MatrixDefinition::default());

        assert_eq!(sheet.text(1, 1), Some(MATRIX_TITLE));
        assert_eq!(sheet.text(3, 1), Some("Sequence s1 results"));
        assert_eq!(sheet.text(4, 2), Some("A"));
        assert_eq!(sheet.text(4, 3), Some("B"));
        assert_eq!(sheet.text(5, 1), Some("A"));
        assert_eq!(sheet.text(6, 1), Some("B"));

        assert_eq!(sheet.text(5, 2), Some("-"));
        // Row B against column A.
        assert_eq!(
            formula(&sheet, 6, 2),
            "=bdrate('A'!D5,'A'!K5,'A'!I5,'A'!P5,'B'!D5,'B'!K5,'B'!I5,'B'!P5)"
        );

        // Bits block after one blank column: columns 5..7.
        assert_eq!(sheet.text(3, 5), Some("Bit comparisons"));
        assert_eq!(formula(&sheet, 6, 6), "=AVERAGE('B'!C5,'B'!J5)/AVERAGE('A'!C5,'A'!J5)");
        assert_eq!(sheet.text(3, 9), Some("PSNR comparisons (dB)"));
        assert_eq!(sheet.value(5, 10), Some(&CellValue::Number(0.0)));
        assert_eq!(sheet.text(3, 13), Some("Encoding time comparisons"));

        // s1 first, then the Average block appended after it.
        assert_eq!(sheet.conditional_formats.len(), 8);
        assert_eq!(sheet.conditional_formats[0].range, CellRange::new(5, 2, 6, 3));
    }

    #[test]
    fn sequences_stack_with_blank_row() {
        let data = by_sequence(&["A", "B"], &["s1", "s2"]);
        let order = vec!["Average".to_string(), "s1".to_string(), "s2".to_string()];
        let mut sheet = Worksheet::new("M");
        write_matrix(&mut sheet, &data, &order, &MatrixDefinition::default());

        assert_eq!(sheet.text(3, 1), Some("Sequence Average results"));
        assert_eq!(sheet.text(8, 1), Some("Sequence s1 results"));
        assert_eq!(sheet.text(13, 1), Some("Sequence s2 results"));
    }

    #[test]
    fn disabled_categories_are_skipped() {
        let data = by_sequence(&["A", "B"], &["s1"]);
        let def = MatrixDefinition {
            write_bdbr: false,
            write_psnr: false,
            write_time: false,
            ..MatrixDefinition::default()
        };
        let mut sheet = Worksheet::new("M");
        write_matrix(&mut sheet, &data, &[], &def);

        assert_eq!(sheet.text(3, 3), Some("Bit comparisons"));
        assert_eq!(sheet.conditional_formats.len(), 2);
        assert_eq!(sheet.max_column(), 5);
    }

    #[test]
    fn every_used_column_gets_a_width() {
        let data = by_sequence(&["short", "a_longer_name"], &["s1"]);
        let mut sheet = Worksheet::new("M");
        write_matrix(&mut sheet, &data, &[], &MatrixDefinition::default());
        assert_eq!(sheet.column_widths.len() as u32, sheet.max_column());
        assert_eq!(sheet.column_widths[&1], 13.0);
    }

    proptest! {
        #[test]
        fn diagonal_is_placeholder_and_off_diagonal_is_formula(n in 1usize..5) {
            let names: Vec<String> = (0..n).map(|i| format!("T{i}")).collect();
            let tests: Vec<&str> = names.iter().map(String::as_str).collect();
            let data = by_sequence(&tests, &["s1"]);
            let mut sheet = Worksheet::new("M");
            let def = MatrixDefinition {
                write_bdbr: false,
                write_psnr: false,
                write_time: false,
                ..MatrixDefinition::default()
            };
            write_matrix(&mut sheet, &data, &["s1".to_string()], &def);

            let col = FIRST_COLUMN_WITHOUT_BDRATE;
            for r in 0..n as u32 {
                for c in 0..n as u32 {
                    let value = sheet.value(5 + r, col + 1 + c).cloned();
                    if r == c {
                        prop_assert_eq!(value, Some(CellValue::text("-")));
                    } else {
                        prop_assert!(value.is_some_and(|v| v.is_formula()));
                    }
                }
            }
        }
    }
}
