//! Spreadsheet rendering for rdbench.
//!
//! Raw result sheets are laid out first ([`layout`]); the cell references
//! they return are reshaped ([`reshape`]) and fed to the summary
//! synthesizers ([`summary`]), which emit formulas built by [`formula`].

pub mod formula;
pub mod layout;
pub mod reshape;
pub mod summary;

pub use formula::Category;
pub use layout::{SequenceRefs, TestRefs, layout_test_sheet};
pub use reshape::{BySequence, Flattened, flatten, flip, sequence_order};
pub use summary::make_summaries;

use rdbench_types::Metric;
use rdbench_workbook::{CellRef, WorkbookError};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid series filter {pattern:?}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Workbook(#[from] WorkbookError),
}

/// Cell references of one (test, sequence, layer), one entry per quality
/// point in canonical index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricRefs {
    pub bits: Vec<CellRef>,
    pub bitrate: Vec<CellRef>,
    pub time: Vec<CellRef>,
    /// Weighted-average PSNR cells.
    pub psnr: Vec<CellRef>,
}

impl MetricRefs {
    pub fn get(&self, metric: Metric) -> &[CellRef] {
        match metric {
            Metric::Bits => &self.bits,
            Metric::Bitrate => &self.bitrate,
            Metric::Time => &self.time,
            Metric::Psnr => &self.psnr,
        }
    }

    /// Number of quality points.
    pub fn len(&self) -> usize {
        self.bitrate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitrate.is_empty()
    }
}

/// Raw-sheet references of every laid-out test, keyed by test name.
pub type ReferenceMap = BTreeMap<String, TestRefs>;

#[cfg(test)]
pub(crate) mod fixtures {
    use rdbench_types::{
        Accumulation, LayerId, MetricRecord, NormalizedRun, Psnr, QualityLabels, ResultSet,
    };

    fn record(bits: f64, psnr_y: f64) -> MetricRecord {
        MetricRecord {
            bits,
            bitrate: bits / 8.0,
            time: bits / 1000.0,
            psnr: Psnr::new(psnr_y, psnr_y + 2.0, psnr_y + 3.0),
        }
    }

    fn run(name: &str, sequences: &[&str], results: ResultSet<usize>, points: usize) -> NormalizedRun {
        let mut labels = QualityLabels::new();
        for seq in sequences {
            for i in 0..points {
                labels
                    .entry(seq.to_string())
                    .or_default()
                    .insert(i, format!("{}", 22 + 5 * i));
            }
        }
        NormalizedRun {
            name: name.to_string(),
            scale: "1".to_string(),
            input_names: sequences.iter().map(|s| s.to_string()).collect(),
            results,
            labels,
            accumulation: Accumulation::default(),
        }
    }

    /// TOTAL-only run with one quality point per entry of `bits`.
    pub fn normalized(name: &str, sequences: &[&str], bits: &[f64], psnr_y: f64) -> NormalizedRun {
        let mut results = ResultSet::new();
        for seq in sequences {
            for (i, b) in bits.iter().enumerate() {
                results.insert(seq, i, LayerId::Total, record(*b, psnr_y));
            }
        }
        run(name, sequences, results, bits.len())
    }

    /// Two quality points, TOTAL plus `layers` real layers.
    pub fn layered(name: &str, sequences: &[&str], layers: u32) -> NormalizedRun {
        let mut results = ResultSet::new();
        for seq in sequences {
            for i in 0..2usize {
                let bits = 1000.0 / (i as f64 + 1.0);
                results.insert(seq, i, LayerId::Total, record(bits, 40.0));
                for l in 0..layers {
                    results.insert(seq, i, LayerId::Layer(l), record(bits / 2.0, 38.0));
                }
            }
        }
        run(name, sequences, results, 2)
    }
}
