//! Shared types for rdbench.
//!
//! Design goal: versioned, explicit, boring.
//! These structs carry per-test encoder measurements from the external
//! runner into the aggregation pipeline, and describe the summary sheets
//! that the pipeline should synthesize.

pub mod config;
pub mod literal;
pub mod naming;
pub mod summary;

pub use config::{SuiteConfig, SuiteSection};
pub use literal::{LiteralError, QualityValue};
pub use naming::{
    COMBI_SEPARATOR, LAYER_COMBI_SEPARATOR, LAYER_SEPARATOR, NamingError, make_combi_name,
    make_layer_combi_name, make_sheet_layer, parse_combi_name, parse_layer_combi_name,
    parse_sheet_layer, validate_test_name,
};
pub use summary::{
    AnchorListDefinition, AnchorMatching, AnchorPair, AnchorSub, ChartAxes, CurveAxis,
    CurveChartDefinition, MatrixDefinition, SeriesKey, SummaryDefinition, SummaryKind,
};

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

pub const RESULTS_SCHEMA_V1: &str = "rdbench.results.v1";
pub const WORKBOOK_SCHEMA_V1: &str = "rdbench.workbook.v1";

/// Pseudo-sequence name used for the across-sequence average rows.
pub const AVERAGE_SEQUENCE: &str = "Average";

// ----------------------------
// Layers
// ----------------------------

/// Identifies one coding layer of a (possibly scalable) test.
///
/// `Total` is the combined output measurement and always orders before
/// every real layer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerId {
    #[default]
    Total,
    Layer(u32),
}

impl LayerId {
    pub fn is_total(self) -> bool {
        matches!(self, LayerId::Total)
    }

    pub fn index(self) -> Option<u32> {
        match self {
            LayerId::Total => None,
            LayerId::Layer(i) => Some(i),
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerId::Total => f.write_str("total"),
            LayerId::Layer(i) => write!(f, "{i}"),
        }
    }
}

impl std::str::FromStr for LayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("total") || s == "-1" {
            return Ok(LayerId::Total);
        }
        s.parse::<u32>()
            .map(LayerId::Layer)
            .map_err(|_| format!("invalid layer id: {s} (expected \"total\" or a layer index)"))
    }
}

impl Serialize for LayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LayerId::Total => serializer.serialize_str("total"),
            LayerId::Layer(i) => serializer.serialize_u32(*i),
        }
    }
}

impl<'de> Deserialize<'de> for LayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LayerIdVisitor;

        impl serde::de::Visitor<'_> for LayerIdVisitor {
            type Value = LayerId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"total\" or a non-negative layer index")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<LayerId, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<LayerId, E> {
                u32::try_from(v)
                    .map(LayerId::Layer)
                    .map_err(|_| E::custom(format!("layer index out of range: {v}")))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<LayerId, E> {
                // -1 is the legacy TOTAL marker.
                if v == -1 {
                    return Ok(LayerId::Total);
                }
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("invalid layer index: {v}")))
                    .and_then(|v| self.visit_u64(v))
            }
        }

        deserializer.deserialize_any(LayerIdVisitor)
    }
}

impl JsonSchema for LayerId {
    fn schema_name() -> Cow<'static, str> {
        "LayerId".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "oneOf": [
                { "type": "string", "enum": ["total"] },
                { "type": "integer", "minimum": 0 }
            ]
        })
    }
}

// ----------------------------
// Measurements
// ----------------------------

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct Psnr {
    pub y: f64,
    pub u: f64,
    pub v: f64,
}

impl Psnr {
    pub fn new(y: f64, u: f64, v: f64) -> Self {
        Self { y, u, v }
    }

    /// 6:1:1 luma-weighted average, the same weighting the layout engine
    /// emits as a formula.
    pub fn weighted(&self) -> f64 {
        (6.0 * self.y + self.u + self.v) / 8.0
    }

    pub fn components(&self) -> [f64; 3] {
        [self.y, self.u, self.v]
    }
}

/// The atomic measurement bundle for one (test, sequence, quality point, layer).
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct MetricRecord {
    pub bits: f64,
    pub bitrate: f64,
    pub time: f64,
    pub psnr: Psnr,
}

/// The four per-quality-point reference lists the layout engine returns.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Bits,
    Bitrate,
    Time,
    Psnr,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Bits, Metric::Bitrate, Metric::Time, Metric::Psnr];

    pub fn key(self) -> &'static str {
        match self {
            Metric::Bits => "bits",
            Metric::Bitrate => "bitrate",
            Metric::Time => "time",
            Metric::Psnr => "psnr",
        }
    }
}

// ----------------------------
// Result sets
// ----------------------------

pub type LayerResults = BTreeMap<LayerId, MetricRecord>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceResults<K: Ord> {
    pub name: String,
    pub points: BTreeMap<K, LayerResults>,
}

/// `sequence → quality point → layer → MetricRecord`, with sequences kept
/// in first-seen order.
///
/// `K` is the raw quality-point label (`String`) before normalization and
/// the canonical ascending index (`usize`) afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSet<K: Ord> {
    pub sequences: Vec<SequenceResults<K>>,
}

impl<K: Ord> Default for ResultSet<K> {
    fn default() -> Self {
        Self {
            sequences: Vec::new(),
        }
    }
}

impl<K: Ord + Clone> ResultSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or overwrite) one measurement.
    pub fn insert(&mut self, sequence: &str, key: K, layer: LayerId, record: MetricRecord) {
        let pos = match self.sequences.iter().position(|s| s.name == sequence) {
            Some(pos) => pos,
            None => {
                self.sequences.push(SequenceResults {
                    name: sequence.to_string(),
                    points: BTreeMap::new(),
                });
                self.sequences.len() - 1
            }
        };
        self.sequences[pos]
            .points
            .entry(key)
            .or_default()
            .insert(layer, record);
    }

    pub fn sequence(&self, name: &str) -> Option<&SequenceResults<K>> {
        self.sequences.iter().find(|s| s.name == name)
    }

    pub fn get(&self, sequence: &str, key: &K, layer: LayerId) -> Option<&MetricRecord> {
        self.sequence(sequence)?.points.get(key)?.get(&layer)
    }

    pub fn sequence_names(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Quality keys of the first sequence (all sequences share them once
    /// the shape has been validated).
    pub fn quality_keys(&self) -> Vec<K> {
        self.sequences
            .first()
            .map(|s| s.points.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Layer ids of the first quality point of the first sequence.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.sequences
            .first()
            .and_then(|s| s.points.values().next())
            .map(|layers| layers.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// Per-sequence `canonical index → original quality-point key`.
pub type QualityLabels = BTreeMap<String, BTreeMap<usize, String>>;

/// Units contract for the additive metrics (bits, bitrate, time).
///
/// `runs` is the number of independent encodes summed into each additive
/// value; PSNR is always the mean over those encodes. Ratio formulas are
/// unit-free only when both operands carry the same `runs`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Accumulation {
    pub runs: u32,
}

impl Default for Accumulation {
    fn default() -> Self {
        Self { runs: 1 }
    }
}

/// One executed test as delivered by the external runner.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRun {
    pub name: String,
    pub scale: String,
    pub input_names: Vec<String>,
    pub results: ResultSet<String>,
}

/// A test after quality-point normalization (and possibly combination).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRun {
    pub name: String,
    pub scale: String,
    pub input_names: Vec<String>,
    pub results: ResultSet<usize>,
    pub labels: QualityLabels,
    pub accumulation: Accumulation,
}

impl NormalizedRun {
    /// Quality labels of the first sequence in result order.
    pub fn first_labels(&self) -> Option<&BTreeMap<usize, String>> {
        let first = self.results.sequences.first()?;
        self.labels.get(&first.name)
    }

    /// Label for quality index `index` as shown in sheet headers (taken
    /// from the first sequence, like the header row itself).
    pub fn header_label(&self, index: usize) -> Option<&str> {
        self.first_labels()
            .and_then(|m| m.get(&index))
            .map(String::as_str)
    }
}

// ----------------------------
// On-disk result document
// ----------------------------

/// A quality-point label as written by the runner: either text such as
/// `"(22, 25)"` or a bare number.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum QualityKeyRepr {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl QualityKeyRepr {
    pub fn to_key(&self) -> String {
        match self {
            QualityKeyRepr::Integer(i) => i.to_string(),
            QualityKeyRepr::Float(f) => format!("{f:?}"),
            QualityKeyRepr::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResultRecord {
    pub sequence: String,
    pub qp: QualityKeyRepr,

    #[serde(default)]
    pub layer: LayerId,

    pub bits: f64,
    pub bitrate: f64,
    pub time: f64,

    /// `[Y, U, V]` in dB.
    pub psnr: [f64; 3],
}

/// `rdbench.results.v1`: one executed test, flattened to records.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResultsDocument {
    pub schema: String,
    pub name: String,

    /// Free-form scale label shown next to each sequence name.
    #[serde(default)]
    pub scale: String,

    /// Display order of the input sequences.
    #[serde(default)]
    pub input_names: Vec<String>,

    pub records: Vec<ResultRecord>,
}

impl From<ResultsDocument> for TestRun {
    fn from(doc: ResultsDocument) -> Self {
        let mut results = ResultSet::new();
        for r in doc.records {
            results.insert(
                &r.sequence,
                r.qp.to_key(),
                r.layer,
                MetricRecord {
                    bits: r.bits,
                    bitrate: r.bitrate,
                    time: r.time,
                    psnr: Psnr::new(r.psnr[0], r.psnr[1], r.psnr[2]),
                },
            );
        }
        TestRun {
            name: doc.name,
            scale: doc.scale,
            input_names: doc.input_names,
            results,
        }
    }
}

impl From<&TestRun> for ResultsDocument {
    fn from(run: &TestRun) -> Self {
        let mut records = Vec::new();
        for seq in &run.results.sequences {
            for (qp, layers) in &seq.points {
                for (layer, rec) in layers {
                    records.push(ResultRecord {
                        sequence: seq.name.clone(),
                        qp: QualityKeyRepr::Text(qp.clone()),
                        layer: *layer,
                        bits: rec.bits,
                        bitrate: rec.bitrate,
                        time: rec.time,
                        psnr: rec.psnr.components(),
                    });
                }
            }
        }
        ResultsDocument {
            schema: RESULTS_SCHEMA_V1.to_string(),
            name: run.name.clone(),
            scale: run.scale.clone(),
            input_names: run.input_names.clone(),
            records,
        }
    }
}
