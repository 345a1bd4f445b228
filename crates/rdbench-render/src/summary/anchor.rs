//! Anchor list: one row per sequence, one column per (test, anchor) pair.

use super::{lay_out_blocks, longest, set_column_widths};
use crate::formula::{Category, absolute, relative};
use crate::reshape::{BySequence, sequence_order};
use rdbench_types::{AnchorListDefinition, AnchorPair, AnchorSub, SeriesKey};
use rdbench_workbook::{CellRange, CellStyle, CellValue, Worksheet};
use std::collections::BTreeSet;
use tracing::debug;

pub(crate) const ANCHOR_TITLE: &str = "Result anchor list summary";

const FIRST_LABEL_COLUMN: u32 = 3;
const HEADER_ROW: u32 = 1;
const TEST_ROW: u32 = 2;
const ANCHOR_ROW: u32 = 3;
const FIRST_DATA_ROW: u32 = 4;

pub(crate) fn write_anchor_list(
    sheet: &mut Worksheet,
    by_sequence: &BySequence,
    order: &[String],
    def: &AnchorListDefinition,
) {
    sheet.set(1, 1, ANCHOR_TITLE);

    let categories: Vec<(Category, Vec<&AnchorPair>)> = [
        (Category::BdRate, &def.bdbr),
        (Category::Bits, &def.bits),
        (Category::Psnr, &def.psnr),
        (Category::Time, &def.time),
    ]
    .into_iter()
    .map(|(category, sub)| (category, usable_pairs(category, sub)))
    .filter(|(_, pairs)| !pairs.is_empty())
    .collect();

    let mut blocks = lay_out_blocks(
        FIRST_LABEL_COLUMN,
        categories
            .iter()
            .map(|(category, pairs)| (*category, pairs.len() as u32)),
    );

    let sequences = sequence_order(order, by_sequence);
    for (i, sequence) in sequences.iter().enumerate() {
        let row = FIRST_DATA_ROW + i as u32;
        let Some(series) = by_sequence.get(*sequence) else {
            continue;
        };

        for (block, (category, pairs)) in blocks.iter_mut().zip(&categories) {
            if !block.header_written {
                write_block_header(sheet, block.column, *category, pairs);
                block.header_written = true;
            }
            sheet.set(row, block.column, *sequence);

            for (j, pair) in pairs.iter().enumerate() {
                let col = block.column + 1 + j as u32;
                let Some(test) = series.get(&pair.test) else {
                    debug!(sequence, series = %pair.test, "test series missing, cell left blank");
                    continue;
                };
                match &pair.anchor {
                    Some(anchor_key) => match series.get(anchor_key) {
                        Some(anchor) => {
                            sheet.set_styled(
                                row,
                                col,
                                CellValue::formula(relative(*category, anchor, test)),
                                category.relative_style(),
                            );
                        }
                        None => {
                            debug!(sequence, series = %anchor_key, "anchor series missing, cell left blank");
                        }
                    },
                    None => {
                        if let Some(formula) = absolute(*category, test) {
                            sheet.set_styled(
                                row,
                                col,
                                CellValue::formula(formula),
                                category.absolute_style(),
                            );
                        }
                    }
                }
            }
        }
    }

    if !sequences.is_empty() {
        let last_row = FIRST_DATA_ROW + sequences.len() as u32 - 1;
        for block in &blocks {
            sheet.add_color_scale(
                CellRange::new(FIRST_DATA_ROW, block.column + 1, last_row, block.last_column()),
                block.category.color_scale(),
            );
        }
    }

    let names: BTreeSet<String> = by_sequence
        .values()
        .flat_map(|series| series.keys())
        .map(SeriesKey::series_name)
        .chain(sequences.iter().map(|s| s.to_string()))
        .collect();
    set_column_widths(sheet, longest(names.iter().map(String::as_str)));
}

/// BD-rate needs an anchor; anchor-less pairs are dropped there.
fn usable_pairs(category: Category, sub: &AnchorSub) -> Vec<&AnchorPair> {
    sub.pairs
        .iter()
        .filter(|pair| {
            let usable = category != Category::BdRate || pair.anchor.is_some();
            if !usable {
                debug!(series = %pair.test, "BD-rate column without anchor dropped");
            }
            usable
        })
        .collect()
}

fn write_block_header(sheet: &mut Worksheet, column: u32, category: Category, pairs: &[&AnchorPair]) {
    let centered = CellStyle::centered();
    sheet.set(HEADER_ROW, column, category.anchor_header());
    sheet.set(TEST_ROW, column, "Test:");
    sheet.set(ANCHOR_ROW, column, "Sequences \\ Anchor:");
    for (j, pair) in pairs.iter().enumerate() {
        let col = column + 1 + j as u32;
        sheet.set_styled(TEST_ROW, col, pair.test.series_name(), centered.clone());
        if let Some(anchor) = &pair.anchor {
            sheet.set_styled(ANCHOR_ROW, col, anchor.series_name(), centered.clone());
        }
    }
}
