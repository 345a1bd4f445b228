//! Result combination: repeated runs (`combi`) and tests stacked as layers
//! (`layer_combi`).
//!
//! Units contract: bits, bitrate and time of a combined run are sums over
//! its member encodes (`Accumulation::runs` counts them); PSNR is always
//! the mean. Both operations are pure and return a fresh run.

use crate::DomainError;
use rdbench_types::{
    Accumulation, LayerId, LayerResults, MetricRecord, NormalizedRun, Psnr, QualityLabels,
    QualityValue, ResultSet, SequenceResults, make_combi_name, make_layer_combi_name,
    validate_test_name,
};
use std::collections::{BTreeMap, BTreeSet};

/// Average-combine `N` repeated runs of the same test.
///
/// Additive metrics are summed; PSNR is the incremental mean
/// (`mean += value / N`). Quality labels and scale labels are joined with
/// the combination separator.
pub fn average_combine(name: &str, runs: &[&NormalizedRun]) -> Result<NormalizedRun, DomainError> {
    let first = check_compatible(name, runs)?;
    let n = runs.len() as f64;

    let mut sequences = Vec::with_capacity(first.results.sequences.len());
    for seq in &first.results.sequences {
        let mut points = BTreeMap::new();
        for (qp, layers) in &seq.points {
            let mut combined = LayerResults::new();
            for layer in layers.keys() {
                let mut acc = MetricRecord::default();
                for run in runs {
                    let rec = lookup(run, &seq.name, *qp, *layer);
                    accumulate(&mut acc, rec, n);
                }
                combined.insert(*layer, acc);
            }
            points.insert(*qp, combined);
        }
        sequences.push(SequenceResults {
            name: seq.name.clone(),
            points,
        });
    }

    let labels = combine_labels(first, runs, |parts| {
        let keys: Vec<&str> = parts.iter().map(|(_, _, key)| *key).collect();
        Ok(make_combi_name(&keys))
    })?;
    let scales: Vec<&str> = runs.iter().map(|r| r.scale.as_str()).collect();

    Ok(NormalizedRun {
        name: name.to_string(),
        scale: make_combi_name(&scales),
        input_names: first.input_names.clone(),
        results: ResultSet { sequences },
        labels,
        accumulation: Accumulation {
            runs: runs.iter().map(|r| r.accumulation.runs).sum(),
        },
    })
}

/// Stack `N` tests as layers `0..N` of one new scalable test.
///
/// Layer `i` is the TOTAL of input `i`; the new TOTAL sums the additive
/// metrics and averages PSNR over the inputs. Quality labels combine by
/// literal union (`(22,) + (27,) = (22, 27)`). Inputs may carry different
/// accumulations; the result counts every encode summed into its TOTAL.
pub fn layer_combine(name: &str, runs: &[&NormalizedRun]) -> Result<NormalizedRun, DomainError> {
    let first = check_compatible(name, runs)?;
    let n = runs.len() as f64;

    let mut sequences = Vec::with_capacity(first.results.sequences.len());
    for seq in &first.results.sequences {
        let mut points = BTreeMap::new();
        for qp in seq.points.keys() {
            let mut combined = LayerResults::new();
            let mut total = MetricRecord::default();
            for (i, run) in runs.iter().enumerate() {
                let rec = lookup(run, &seq.name, *qp, LayerId::Total);
                combined.insert(LayerId::Layer(i as u32), *rec);
                accumulate(&mut total, rec, n);
            }
            combined.insert(LayerId::Total, total);
            points.insert(*qp, combined);
        }
        sequences.push(SequenceResults {
            name: seq.name.clone(),
            points,
        });
    }

    let labels = combine_labels(first, runs, |parts| Ok(stack_labels(&parts)))?;
    let scales: Vec<&str> = runs.iter().map(|r| r.scale.as_str()).collect();

    Ok(NormalizedRun {
        name: name.to_string(),
        scale: make_layer_combi_name(&scales),
        input_names: first.input_names.clone(),
        results: ResultSet { sequences },
        labels,
        accumulation: Accumulation {
            runs: runs.iter().map(|r| r.accumulation.runs).sum(),
        },
    })
}

/// Literal union of the member labels. Averaged members carry labels such
/// as `22+22` that are not literals; those stack as text, `(22+22, 22)`.
fn stack_labels(parts: &LabelParts<'_>) -> String {
    let values: Result<Vec<QualityValue>, _> = parts
        .iter()
        .map(|(_, _, key)| QualityValue::parse(key))
        .collect();
    match values {
        Ok(values) => values
            .into_iter()
            .fold(QualityValue::empty_tuple(), QualityValue::concat)
            .to_string(),
        Err(_) => {
            let keys: Vec<&str> = parts.iter().map(|(_, _, key)| *key).collect();
            format!("({})", keys.join(", "))
        }
    }
}

/// Combined tests a suite asks for. Averaged sets are built first, so a
/// layer stack may name an averaged result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinationPlan {
    pub combi: Vec<Vec<String>>,
    pub layer_combi: Vec<Vec<String>>,
}

impl CombinationPlan {
    pub fn new(combi: Vec<Vec<String>>, layer_combi: Vec<Vec<String>>) -> Self {
        Self { combi, layer_combi }
    }

    pub fn is_empty(&self) -> bool {
        self.combi.is_empty() && self.layer_combi.is_empty()
    }

    /// Add every combined run to `runs` under its derived name and return
    /// the names added, in plan order.
    pub fn apply(&self, runs: &mut BTreeMap<String, NormalizedRun>) -> Result<Vec<String>, DomainError> {
        let mut added = Vec::with_capacity(self.combi.len() + self.layer_combi.len());

        for set in &self.combi {
            let name = make_combi_name(set);
            validate_test_name(&name)?;
            let combined = average_combine(&name, &members(&name, set, runs)?)?;
            insert_new(runs, combined)?;
            added.push(name);
        }
        for set in &self.layer_combi {
            let name = make_layer_combi_name(set);
            validate_test_name(&name)?;
            let combined = layer_combine(&name, &members(&name, set, runs)?)?;
            insert_new(runs, combined)?;
            added.push(name);
        }

        Ok(added)
    }
}

fn members<'a>(
    combination: &str,
    names: &[String],
    runs: &'a BTreeMap<String, NormalizedRun>,
) -> Result<Vec<&'a NormalizedRun>, DomainError> {
    names
        .iter()
        .map(|test| {
            runs.get(test).ok_or_else(|| DomainError::UnknownTest {
                combination: combination.to_string(),
                test: test.clone(),
            })
        })
        .collect()
}

fn insert_new(runs: &mut BTreeMap<String, NormalizedRun>, run: NormalizedRun) -> Result<(), DomainError> {
    if runs.contains_key(&run.name) {
        return Err(DomainError::DuplicateTest(run.name));
    }
    runs.insert(run.name.clone(), run);
    Ok(())
}

fn accumulate(acc: &mut MetricRecord, rec: &MetricRecord, n: f64) {
    acc.bits += rec.bits;
    acc.bitrate += rec.bitrate;
    acc.time += rec.time;
    acc.psnr = Psnr {
        y: acc.psnr.y + rec.psnr.y / n,
        u: acc.psnr.u + rec.psnr.u / n,
        v: acc.psnr.v + rec.psnr.v / n,
    };
}

// Only called after `check_compatible`, so every lookup hits.
fn lookup<'a>(run: &'a NormalizedRun, seq: &str, qp: usize, layer: LayerId) -> &'a MetricRecord {
    static EMPTY: MetricRecord = MetricRecord {
        bits: 0.0,
        bitrate: 0.0,
        time: 0.0,
        psnr: Psnr {
            y: 0.0,
            u: 0.0,
            v: 0.0,
        },
    };
    run.results.get(seq, &qp, layer).unwrap_or(&EMPTY)
}

/// Label parts for one `(sequence, index)`: `(run name, sequence, label)`.
type LabelParts<'a> = Vec<(&'a str, &'a str, &'a str)>;

fn combine_labels<'a, F>(
    first: &'a NormalizedRun,
    runs: &[&'a NormalizedRun],
    mut join: F,
) -> Result<QualityLabels, DomainError>
where
    F: FnMut(LabelParts<'a>) -> Result<String, DomainError>,
{
    let mut out = QualityLabels::new();
    for seq in &first.results.sequences {
        let mut seq_labels = BTreeMap::new();
        for qp in seq.points.keys() {
            let parts: LabelParts<'a> = runs
                .iter()
                .map(|r| {
                    let label = r
                        .labels
                        .get(&seq.name)
                        .and_then(|m| m.get(qp))
                        .map(String::as_str)
                        .unwrap_or_default();
                    (r.name.as_str(), seq.name.as_str(), label)
                })
                .collect();
            seq_labels.insert(*qp, join(parts)?);
        }
        out.insert(seq.name.clone(), seq_labels);
    }
    Ok(out)
}

type Shape = BTreeMap<String, BTreeMap<usize, BTreeSet<LayerId>>>;

fn shape(run: &NormalizedRun) -> Shape {
    run.results
        .sequences
        .iter()
        .map(|s| {
            let points = s
                .points
                .iter()
                .map(|(qp, layers)| (*qp, layers.keys().copied().collect()))
                .collect();
            (s.name.clone(), points)
        })
        .collect()
}

fn check_compatible<'a>(
    name: &str,
    runs: &[&'a NormalizedRun],
) -> Result<&'a NormalizedRun, DomainError> {
    let Some(first) = runs.first().copied() else {
        return Err(DomainError::EmptyCombination(name.to_string()));
    };

    let expected = shape(first);
    for run in &runs[1..] {
        let got = shape(run);
        if got == expected {
            continue;
        }

        let expected_seqs: BTreeSet<&String> = expected.keys().collect();
        let got_seqs: BTreeSet<&String> = got.keys().collect();
        let detail = if expected_seqs != got_seqs {
            format!(
                "{:?} has sequences {:?}, {:?} has {:?}",
                first.name, expected_seqs, run.name, got_seqs
            )
        } else {
            format!(
                "{:?} and {:?} differ in quality points or layers",
                first.name, run.name
            )
        };
        return Err(DomainError::IncompatibleResultSets {
            name: name.to_string(),
            detail,
        });
    }

    Ok(first)
}
