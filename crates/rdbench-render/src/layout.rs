//! Raw per-test sheet layout.
//!
//! ```text
//!        A                B      C..I (QP block 0)                  J..P (QP block 1) ...
//!   1    Sequence         Layer  QP <label>
//!   2                            Kb  Kb/s  Time (s)  PSNR
//!   3                                                Y  U  V  AVG
//!   4    Average          total  =AVERAGE(..)  ...
//!   5    <seq> @ scale s  total  bits  bitrate  time  y  u  v  =(6*Y+U+V)/8
//!   6                     0      ...
//! ```

use crate::MetricRefs;
use crate::formula::{local_average, psnr_weighted};
use rdbench_types::{AVERAGE_SEQUENCE, LayerId, MetricRecord, NormalizedRun};
use rdbench_workbook::{CellRange, CellRef, CellStyle, CellValue, Worksheet};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const FIRST_DATA_ROW: u32 = 4;
const FIRST_BLOCK_COLUMN: u32 = 3;
const BLOCK_WIDTH: u32 = 7;
const SEQUENCE_COLUMN_WIDTH: f64 = 50.0;

/// References into one sequence block of a raw sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceRefs {
    pub name: String,
    pub layers: BTreeMap<LayerId, MetricRefs>,
}

/// References into one raw sheet, sequences in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestRefs {
    pub sheet: String,
    pub sequences: Vec<SequenceRefs>,
}

impl TestRefs {
    pub fn sequence(&self, name: &str) -> Option<&SequenceRefs> {
        self.sequences.iter().find(|s| s.name == name)
    }

    pub fn sequence_names(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|s| s.name.as_str())
    }

    /// Layers present for every sequence (TOTAL included).
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.sequences
            .first()
            .map(|s| s.layers.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// Write `run` onto `sheet` and return references to every metric cell.
///
/// Sequences listed in `order` come first, in that order; names without
/// data are ignored and sequences the order misses follow in insertion
/// order. The `Average` block precedes them whenever there is at least
/// one sequence.
pub fn layout_test_sheet(sheet: &mut Worksheet, run: &NormalizedRun, order: &[String]) -> TestRefs {
    let keys = run.results.quality_keys();
    let layers: Vec<LayerId> = run
        .results
        .layer_ids()
        .into_iter()
        .filter(|l| !l.is_total())
        .collect();
    let rows_per_block = 1 + layers.len() as u32;
    let sequences = display_order(run, order);

    write_header(sheet, run, &keys);

    let mut refs = TestRefs {
        sheet: sheet.name.clone(),
        sequences: Vec::with_capacity(sequences.len() + 1),
    };
    if sequences.is_empty() {
        debug!(sheet = %sheet.name, "no sequences to lay out");
        return refs;
    }

    let block = Block {
        keys: &keys,
        layers: &layers,
        rows_per_block,
    };

    refs.sequences
        .push(block.write_average(sheet, FIRST_DATA_ROW, sequences.len() as u32));

    for (i, name) in sequences.iter().enumerate() {
        let row = FIRST_DATA_ROW + rows_per_block * (i as u32 + 1);
        let label = format!("{name} @ scale {}", run.scale);
        refs.sequences
            .push(block.write_sequence(sheet, row, run, name, &label));
    }

    debug!(
        sheet = %sheet.name,
        sequences = sequences.len(),
        quality_points = keys.len(),
        layers = layers.len(),
        "laid out test sheet"
    );
    refs
}

fn display_order<'a>(run: &'a NormalizedRun, order: &'a [String]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    let candidates = order
        .iter()
        .map(String::as_str)
        .chain(run.results.sequence_names());
    for name in candidates {
        if name == AVERAGE_SEQUENCE || out.contains(&name) {
            continue;
        }
        if run.results.sequence(name).is_some() {
            out.push(name);
        }
    }
    if run.results.sequence(AVERAGE_SEQUENCE).is_some() {
        warn!(
            test = %run.name,
            "a sequence named {AVERAGE_SEQUENCE:?} collides with the average block and is left out"
        );
    }
    out
}

fn block_column(position: usize) -> u32 {
    FIRST_BLOCK_COLUMN + BLOCK_WIDTH * position as u32
}

fn write_header(sheet: &mut Worksheet, run: &NormalizedRun, keys: &[usize]) {
    let centered = CellStyle::centered();

    let title = if run.accumulation.runs > 1 {
        format!(
            "Sequence (Kb, Kb/s and Time are sums of {} runs)",
            run.accumulation.runs
        )
    } else {
        "Sequence".to_string()
    };
    sheet.set_styled(1, 1, title, centered.clone());
    sheet.merge(CellRange::new(1, 1, 3, 1));
    sheet.set_styled(1, 2, "Layer", centered.clone());
    sheet.merge(CellRange::new(1, 2, 3, 2));
    sheet.set_column_width(1, SEQUENCE_COLUMN_WIDTH);

    for (position, key) in keys.iter().enumerate() {
        let col = block_column(position);
        let label = run
            .header_label(*key)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string());

        sheet.set_styled(1, col, format!("QP {label}"), centered.clone());
        sheet.merge(CellRange::new(1, col, 1, col + BLOCK_WIDTH - 1));

        for (offset, title) in ["Kb", "Kb/s", "Time (s)"].into_iter().enumerate() {
            let c = col + offset as u32;
            sheet.set_styled(2, c, title, centered.clone());
            sheet.merge(CellRange::new(2, c, 3, c));
        }
        sheet.set_styled(2, col + 3, "PSNR", centered.clone());
        sheet.merge(CellRange::new(2, col + 3, 2, col + 6));
        for (offset, title) in ["Y", "U", "V", "AVG"].into_iter().enumerate() {
            sheet.set_styled(3, col + 3 + offset as u32, title, centered.clone());
        }
    }

    sheet.freeze("A4");
}

struct Block<'a> {
    keys: &'a [usize],
    layers: &'a [LayerId],
    rows_per_block: u32,
}

impl Block<'_> {
    /// TOTAL first, then the real layers in ascending order.
    fn rows(&self) -> impl Iterator<Item = (u32, LayerId)> + '_ {
        std::iter::once(LayerId::Total)
            .chain(self.layers.iter().copied())
            .enumerate()
            .map(|(offset, layer)| (offset as u32, layer))
    }

    fn write_labels(&self, sheet: &mut Worksheet, start: u32, label: &str) {
        sheet.set(start, 1, label);
        for (offset, layer) in self.rows() {
            let value = match layer.index() {
                Some(i) => CellValue::Number(f64::from(i)),
                None => CellValue::text(layer.to_string()),
            };
            sheet.set(start + offset, 2, value);
        }
    }

    fn write_sequence(
        &self,
        sheet: &mut Worksheet,
        start: u32,
        run: &NormalizedRun,
        sequence: &str,
        label: &str,
    ) -> SequenceRefs {
        self.write_labels(sheet, start, label);

        let mut layers = BTreeMap::new();
        for (offset, layer) in self.rows() {
            let row = start + offset;
            let mut refs = MetricRefs::default();
            for (position, key) in self.keys.iter().enumerate() {
                let col = block_column(position);
                match run.results.get(sequence, key, layer) {
                    Some(record) => write_record(sheet, row, col, record),
                    None => debug!(sequence, key, %layer, "missing result cell"),
                }
                push_refs(&mut refs, sheet, row, col);
            }
            layers.insert(layer, refs);
        }

        SequenceRefs {
            name: sequence.to_string(),
            layers,
        }
    }

    /// Average block: every metric cell is the mean of the same cell of
    /// each real sequence block below it.
    fn write_average(&self, sheet: &mut Worksheet, start: u32, sequences: u32) -> SequenceRefs {
        self.write_labels(sheet, start, AVERAGE_SEQUENCE);

        let mut layers = BTreeMap::new();
        for (offset, layer) in self.rows() {
            let row = start + offset;
            let source_rows: Vec<u32> = (1..=sequences)
                .map(|i| start + self.rows_per_block * i + offset)
                .collect();

            let mut refs = MetricRefs::default();
            for position in 0..self.keys.len() {
                let col = block_column(position);
                for c in col..col + 6 {
                    let cells: Vec<CellRef> =
                        source_rows.iter().map(|r| sheet.cell_ref(*r, c)).collect();
                    sheet.set(row, c, CellValue::formula(local_average(&cells)));
                }
                write_weighted_psnr(sheet, row, col);
                push_refs(&mut refs, sheet, row, col);
            }
            layers.insert(layer, refs);
        }

        SequenceRefs {
            name: AVERAGE_SEQUENCE.to_string(),
            layers,
        }
    }
}

fn write_record(sheet: &mut Worksheet, row: u32, col: u32, record: &MetricRecord) {
    sheet.set(row, col, record.bits);
    sheet.set(row, col + 1, record.bitrate);
    sheet.set(row, col + 2, record.time);
    for (offset, value) in record.psnr.components().into_iter().enumerate() {
        sheet.set(row, col + 3 + offset as u32, value);
    }
    write_weighted_psnr(sheet, row, col);
}

fn write_weighted_psnr(sheet: &mut Worksheet, row: u32, col: u32) {
    let formula = psnr_weighted(
        &sheet.cell_ref(row, col + 3),
        &sheet.cell_ref(row, col + 4),
        &sheet.cell_ref(row, col + 5),
    );
    sheet.set(row, col + 6, CellValue::formula(formula));
}

fn push_refs(refs: &mut MetricRefs, sheet: &Worksheet, row: u32, col: u32) {
    refs.bits.push(sheet.cell_ref(row, col));
    refs.bitrate.push(sheet.cell_ref(row, col + 1));
    refs.time.push(sheet.cell_ref(row, col + 2));
    refs.psnr.push(sheet.cell_ref(row, col + 6));
}
