//! Conditional colour-scale formats.

use crate::cell::CellRange;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StopKind {
    Min,
    Max,
    Number(f64),
    Percentile(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorStop {
    pub kind: StopKind,
    /// `RRGGBB`.
    pub color: String,
}

impl ColorStop {
    pub fn new(kind: StopKind, color: &str) -> Self {
        Self {
            kind,
            color: color.to_string(),
        }
    }
}

/// Two- or three-stop colour scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorScale {
    pub start: ColorStop,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<ColorStop>,
    pub end: ColorStop,
}

impl ColorScale {
    pub fn three(start: ColorStop, mid: ColorStop, end: ColorStop) -> Self {
        Self {
            start,
            mid: Some(mid),
            end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalFormat {
    pub range: CellRange,
    pub scale: ColorScale,
}
