//! Suite report: one raw sheet per test, then the summary sheets.

use crate::Clock;
use anyhow::Context;
use rdbench_domain::{CombinationPlan, DomainError, normalize};
use rdbench_render::{ReferenceMap, layout_test_sheet, make_summaries};
use rdbench_types::{AVERAGE_SEQUENCE, NormalizedRun, SuiteConfig, TestRun, validate_test_name};
use rdbench_workbook::Workbook;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SuiteRequest {
    pub config: SuiteConfig,
    pub runs: Vec<TestRun>,
}

/// What one raw sheet holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub name: String,
    pub sheet: String,
    pub scale: String,
    pub sequences: usize,
    /// Header labels of the quality points, in canonical order.
    pub quality_labels: Vec<String>,
    /// Real layers (TOTAL not counted).
    pub layers: usize,
    pub accumulated_runs: u32,
    pub combined: bool,
}

#[derive(Debug, Clone)]
pub struct SuiteOutcome {
    pub suite: String,
    pub workbook: Workbook,
    /// Sorted by test name.
    pub tests: Vec<TestSummary>,
    /// Display order of the real sequences.
    pub sequences: Vec<String>,
    /// Summary sheet names in creation order.
    pub summaries: Vec<String>,
    /// Normalized and combined runs, sorted by name.
    pub runs: Vec<NormalizedRun>,
}

pub struct ReportSuiteUseCase<C: Clock> {
    clock: C,
}

impl<C: Clock> ReportSuiteUseCase<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn execute(&self, req: SuiteRequest) -> anyhow::Result<SuiteOutcome> {
        let SuiteRequest { config, runs } = req;

        let mut normalized: BTreeMap<String, NormalizedRun> = BTreeMap::new();
        for run in runs {
            let name = run.name.clone();
            validate_test_name(&name).with_context(|| format!("test {name:?}"))?;
            let run = normalize(run).with_context(|| format!("normalize test {name:?}"))?;
            if normalized.insert(name.clone(), run).is_some() {
                return Err(DomainError::DuplicateTest(name).into());
            }
        }

        let plan = CombinationPlan::new(config.combi.clone(), config.layer_combi.clone());
        let combined = plan
            .apply(&mut normalized)
            .context("combine test results")?;
        if !combined.is_empty() {
            info!(tests = ?combined, "combined tests added");
        }

        let sequences = display_order(&config, &normalized);

        let mut workbook = Workbook::new();
        workbook.generated_at = Some(self.clock.now_rfc3339());

        // Raw sheets are complete before any summary reads their references.
        let mut refs = ReferenceMap::new();
        let mut sheet_names: BTreeMap<&str, String> = BTreeMap::new();
        for (name, run) in &normalized {
            let sheet = workbook.insert_sheet(0, name)?;
            let test_refs = layout_test_sheet(sheet, run, &sequences);
            debug!(test = %name, sheet = %sheet.name, "raw sheet written");
            sheet_names.insert(name, sheet.name.clone());
            refs.insert(name.clone(), test_refs);
        }

        let summary_order: Vec<String> = std::iter::once(AVERAGE_SEQUENCE.to_string())
            .chain(sequences.iter().cloned())
            .collect();
        let summaries = make_summaries(&mut workbook, &refs, &summary_order, &config.summaries)
            .context("write summary sheets")?;

        let tests = normalized
            .values()
            .map(|run| TestSummary {
                name: run.name.clone(),
                sheet: sheet_names
                    .get(run.name.as_str())
                    .cloned()
                    .unwrap_or_else(|| run.name.clone()),
                scale: run.scale.clone(),
                sequences: run.results.len(),
                quality_labels: run
                    .first_labels()
                    .map(|labels| labels.values().cloned().collect())
                    .unwrap_or_default(),
                layers: run
                    .results
                    .layer_ids()
                    .iter()
                    .filter(|l| !l.is_total())
                    .count(),
                accumulated_runs: run.accumulation.runs,
                combined: combined.contains(&run.name),
            })
            .collect();

        info!(
            suite = config.suite_name(),
            tests = normalized.len(),
            summaries = summaries.len(),
            "suite report built"
        );

        Ok(SuiteOutcome {
            suite: config.suite_name().to_string(),
            workbook,
            tests,
            sequences,
            summaries,
            runs: normalized.into_values().collect(),
        })
    }
}

/// Configured order first, then each run's input order (runs by name),
/// then anything only present in the results.
fn display_order(config: &SuiteConfig, runs: &BTreeMap<String, NormalizedRun>) -> Vec<String> {
    let from_runs = runs.values().flat_map(|run| {
        run.input_names
            .iter()
            .map(String::as_str)
            .chain(run.results.sequence_names())
    });
    let known = |name: &str| runs.values().any(|run| run.results.sequence(name).is_some());

    let mut out: Vec<String> = Vec::new();
    for name in config.suite.order.iter().map(String::as_str).chain(from_runs) {
        if name == AVERAGE_SEQUENCE || !known(name) || out.iter().any(|n| n == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}
