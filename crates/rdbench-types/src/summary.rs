//! Summary sheet definitions.
//!
//! Each definition is a closed, explicitly typed payload. Definitions are
//! built once (usually from `rdbench.toml`) and only read afterwards.

use crate::naming::{make_sheet_layer, parse_sheet_layer};
use crate::LayerId;
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ----------------------------
// Series keys
// ----------------------------

/// One named series: a test, optionally narrowed to one of its layers.
///
/// Accepted in config either as a flattened series name (`"A"`,
/// `"A_layer1"`) or as `{ test = "A", layer = 1 }`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "SeriesKeyRepr", into = "SeriesKeyRepr")]
pub struct SeriesKey {
    pub test: String,
    pub layer: LayerId,
}

impl SeriesKey {
    pub fn new(test: impl Into<String>, layer: LayerId) -> Self {
        Self {
            test: test.into(),
            layer,
        }
    }

    pub fn total(test: impl Into<String>) -> Self {
        Self::new(test, LayerId::Total)
    }

    /// The flattened series name used in summary headers.
    pub fn series_name(&self) -> String {
        make_sheet_layer(&self.test, self.layer)
    }

    pub fn parse(name: &str) -> Self {
        let (test, layer) = parse_sheet_layer(name);
        Self { test, layer }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.series_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
enum SeriesKeyRepr {
    Name(String),
    Parts {
        test: String,
        #[serde(default)]
        layer: LayerId,
    },
}

impl From<SeriesKeyRepr> for SeriesKey {
    fn from(repr: SeriesKeyRepr) -> Self {
        match repr {
            SeriesKeyRepr::Name(name) => SeriesKey::parse(&name),
            SeriesKeyRepr::Parts { test, layer } => SeriesKey { test, layer },
        }
    }
}

impl From<SeriesKey> for SeriesKeyRepr {
    fn from(key: SeriesKey) -> Self {
        SeriesKeyRepr::Name(key.series_name())
    }
}

impl JsonSchema for SeriesKey {
    fn schema_name() -> Cow<'static, str> {
        "SeriesKey".into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        SeriesKeyRepr::json_schema(generator)
    }
}

// ----------------------------
// Definitions
// ----------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    ComparisonMatrix,
    AnchorList,
    CurveChart,
}

impl SummaryKind {
    pub fn default_name(self) -> &'static str {
        match self {
            SummaryKind::ComparisonMatrix => "BDBRMatrix",
            SummaryKind::AnchorList => "Anchor_list",
            SummaryKind::CurveChart => "Curve_chart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryDefinition {
    ComparisonMatrix(MatrixDefinition),
    AnchorList(AnchorListDefinition),
    CurveChart(CurveChartDefinition),
}

impl SummaryDefinition {
    pub fn kind(&self) -> SummaryKind {
        match self {
            SummaryDefinition::ComparisonMatrix(_) => SummaryKind::ComparisonMatrix,
            SummaryDefinition::AnchorList(_) => SummaryKind::AnchorList,
            SummaryDefinition::CurveChart(_) => SummaryKind::CurveChart,
        }
    }

    fn name_field(&self) -> Option<&str> {
        match self {
            SummaryDefinition::ComparisonMatrix(d) => d.name.as_deref(),
            SummaryDefinition::AnchorList(d) => d.name.as_deref(),
            SummaryDefinition::CurveChart(d) => d.name.as_deref(),
        }
    }

    /// User-given name (trimmed), or the per-kind default when blank.
    pub fn sheet_name(&self) -> &str {
        match self.name_field().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.kind().default_name(),
        }
    }

    /// Layers each test must expose as series for this definition.
    ///
    /// `None` means the definition does not name its series up front.
    pub fn referenced_layers(&self) -> Option<BTreeMap<String, BTreeSet<LayerId>>> {
        let keys: Vec<&SeriesKey> = match self {
            SummaryDefinition::ComparisonMatrix(_) => return None,
            SummaryDefinition::AnchorList(d) => d
                .subs()
                .flat_map(|(_, sub)| sub.pairs.iter())
                .flat_map(|p| std::iter::once(&p.test).chain(p.anchor.as_ref()))
                .collect(),
            SummaryDefinition::CurveChart(d) => {
                if d.tests.is_empty() {
                    return None;
                }
                d.tests.iter().collect()
            }
        };

        let mut out: BTreeMap<String, BTreeSet<LayerId>> = BTreeMap::new();
        for key in keys {
            out.entry(key.test.clone()).or_default().insert(key.layer);
        }
        Some(out)
    }
}

fn default_true() -> bool {
    true
}

/// Pairwise test × test grid per sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatrixDefinition {
    #[serde(default)]
    pub name: Option<String>,

    /// Restrict the grid to these series (empty: every series).
    #[serde(default)]
    pub tests: Vec<SeriesKey>,

    /// Regex over flattened series names; non-matching series are dropped.
    #[serde(default)]
    pub filter: Option<String>,

    /// Per-test layers to expose as their own series (default: TOTAL only).
    #[serde(default)]
    pub layers: BTreeMap<String, Vec<LayerId>>,

    #[serde(default = "default_true")]
    pub write_bdbr: bool,
    #[serde(default = "default_true")]
    pub write_bits: bool,
    #[serde(default = "default_true")]
    pub write_psnr: bool,
    #[serde(default = "default_true")]
    pub write_time: bool,
}

impl Default for MatrixDefinition {
    fn default() -> Self {
        Self {
            name: None,
            tests: Vec::new(),
            filter: None,
            layers: BTreeMap::new(),
            write_bdbr: true,
            write_bits: true,
            write_psnr: true,
            write_time: true,
        }
    }
}

/// One column of an anchor list: `test` measured against `anchor`, or an
/// absolute column when `anchor` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnchorPair {
    pub test: SeriesKey,
    #[serde(default)]
    pub anchor: Option<SeriesKey>,
}

impl AnchorPair {
    pub fn relative(test: SeriesKey, anchor: SeriesKey) -> Self {
        Self {
            test,
            anchor: Some(anchor),
        }
    }

    pub fn absolute(test: SeriesKey) -> Self {
        Self { test, anchor: None }
    }
}

/// Anchors chosen by name matching: a candidate is an anchor for `test`
/// when it contains every selected token of the test name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnchorMatching {
    pub tests: Vec<String>,
    pub candidates: Vec<String>,

    #[serde(default = "default_token_separator")]
    pub separator: String,

    /// Indices of the separator-split test name tokens to match on.
    #[serde(default)]
    pub tokens: Vec<usize>,

    /// Emit an absolute column ahead of the matched anchors.
    #[serde(default)]
    pub include_absolute: bool,

    /// Layers of each matched anchor to compare against (default: TOTAL).
    #[serde(default)]
    pub anchor_layers: Vec<LayerId>,
}

fn default_token_separator() -> String {
    "_".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnchorSub {
    #[serde(default)]
    pub pairs: Vec<AnchorPair>,

    #[serde(default)]
    pub matching: Option<AnchorMatching>,
}

impl AnchorSub {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.matching.is_none()
    }
}

/// One row per sequence, one column per (test, anchor) pair per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnchorListDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bdbr: AnchorSub,
    #[serde(default)]
    pub bits: AnchorSub,
    #[serde(default)]
    pub psnr: AnchorSub,
    #[serde(default)]
    pub time: AnchorSub,
}

impl AnchorListDefinition {
    pub fn subs(&self) -> impl Iterator<Item = (&'static str, &AnchorSub)> {
        [
            ("bdbr", &self.bdbr),
            ("bits", &self.bits),
            ("psnr", &self.psnr),
            ("time", &self.time),
        ]
        .into_iter()
    }

    pub fn subs_mut(&mut self) -> impl Iterator<Item = &mut AnchorSub> {
        [
            &mut self.bdbr,
            &mut self.bits,
            &mut self.psnr,
            &mut self.time,
        ]
        .into_iter()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CurveAxis {
    Psnr,
    Rate,
    Time,
}

impl CurveAxis {
    pub fn label(self) -> &'static str {
        match self {
            CurveAxis::Psnr => "psnr",
            CurveAxis::Rate => "rate",
            CurveAxis::Time => "time",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChartAxes {
    pub x: CurveAxis,
    pub y: CurveAxis,
}

fn default_charts() -> Vec<ChartAxes> {
    vec![ChartAxes {
        x: CurveAxis::Rate,
        y: CurveAxis::Psnr,
    }]
}

/// Per-sequence rate/quality/time curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CurveChartDefinition {
    #[serde(default)]
    pub name: Option<String>,

    /// Series to plot (empty: every TOTAL series).
    #[serde(default)]
    pub tests: Vec<SeriesKey>,

    #[serde(default)]
    pub filter: Option<String>,

    #[serde(default = "default_charts")]
    pub charts: Vec<ChartAxes>,
}

impl Default for CurveChartDefinition {
    fn default() -> Self {
        Self {
            name: None,
            tests: Vec::new(),
            filter: None,
            charts: default_charts(),
        }
    }
}
