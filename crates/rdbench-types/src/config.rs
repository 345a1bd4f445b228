// ----------------------------
// Suite config file schema
// ----------------------------

use crate::summary::SummaryDefinition;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `rdbench.toml`: everything one report run needs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct SuiteConfig {
    #[serde(default)]
    pub suite: SuiteSection,

    /// Paths or glob patterns of `rdbench.results.v1` documents, relative
    /// to the config file.
    #[serde(default)]
    pub results: Vec<String>,

    /// Sets of tests averaged into one run (`"A+B"`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub combi: Vec<Vec<String>>,

    /// Sets of tests stacked as layers of one run (`"BL_EL"`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layer_combi: Vec<Vec<String>>,

    #[serde(default, rename = "summary")]
    pub summaries: Vec<SummaryDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct SuiteSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Display order of sequences (unlisted sequences follow in input order).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<String>,
}

impl SuiteConfig {
    /// Sheet/file stem for the workbook.
    pub fn suite_name(&self) -> &str {
        self.suite
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("rdbench")
    }
}
