//! End-to-end checks over the whole pipeline: result documents in, a
//! serialized workbook out.

use rdbench_app::{ExportFormat, ExportUseCase, ReportSuiteUseCase, SuiteOutcome, SuiteRequest, SystemClock};
use rdbench_ingest::parse_results;
use rdbench_types::{SuiteConfig, TestRun};
use rdbench_workbook::{CellValue, Workbook, column_index};
use regex::Regex;

/// A result document with one enhancement layer per quality point when
/// `layered` is set.
fn results_json(name: &str, bits_scale: f64, layered: bool) -> String {
    let mut records = Vec::new();
    for sequence in ["Cactus", "BQTerrace", "Kimono"] {
        for (i, qp) in [22, 27, 32, 37].into_iter().enumerate() {
            let i = i as f64;
            let bits = bits_scale * 10000.0 / (i + 1.0);
            let layers: &[&str] = if layered { &["\"total\"", "0", "1"] } else { &["\"total\""] };
            for layer in layers {
                records.push(format!(
                    r#"{{"sequence": "{sequence}", "qp": {qp}, "layer": {layer}, "bits": {bits}, "bitrate": {rate}, "time": {time}, "psnr": [{y}, {u}, {v}]}}"#,
                    rate = bits / 8.0,
                    time = 4.0 - i,
                    y = 40.0 - i,
                    u = 42.0 - i,
                    v = 43.0 - i,
                ));
            }
        }
    }
    format!(
        r#"{{"schema": "rdbench.results.v1", "name": "{name}", "scale": "1080p", "input_names": ["Kimono", "Cactus", "BQTerrace"], "records": [{}]}}"#,
        records.join(",")
    )
}

fn run(name: &str, bits_scale: f64, layered: bool) -> TestRun {
    TestRun::from(parse_results(&results_json(name, bits_scale, layered), name).expect("parse results"))
}

const CONFIG: &str = r#"
results = []
combi = [["anchor", "fast"]]

[suite]
name = "e2e"

[[summary]]
kind = "comparison_matrix"
layers = { scal = ["total", 0, 1] }

[[summary]]
kind = "anchor_list"
bdbr = { pairs = [{ test = "fast", anchor = "anchor" }, { test = "scal_layer1", anchor = "anchor" }] }
bits = { pairs = [{ test = "fast", anchor = "anchor" }] }
psnr = { pairs = [{ test = "fast" }, { test = "fast", anchor = "anchor" }] }
time = { matching = { tests = ["fast", "scal"], candidates = ["anchor", "anchor+fast"], include_absolute = true } }

[[summary]]
kind = "curve_chart"
charts = [{ x = "rate", y = "psnr" }, { x = "time", y = "psnr" }]
"#;

fn build() -> SuiteOutcome {
    let config: SuiteConfig = toml::from_str(CONFIG).expect("parse config");
    ReportSuiteUseCase::new(SystemClock)
        .execute(SuiteRequest {
            config,
            runs: vec![run("anchor", 1.0, false), run("fast", 1.2, false), run("scal", 0.9, true)],
        })
        .expect("build report")
}

fn formulas(workbook: &Workbook, sheet: &str) -> Vec<String> {
    workbook
        .sheet(sheet)
        .expect("sheet")
        .cells
        .values()
        .filter_map(|cell| match &cell.value {
            CellValue::Formula(f) => Some(f.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn sheet_order_and_active_sheet() {
    let outcome = build();
    assert_eq!(
        outcome.workbook.sheet_names(),
        vec!["scal", "fast", "anchor+fast", "anchor", "BDBRMatrix", "Anchor_list", "Curve_chart"]
    );
    assert_eq!(outcome.workbook.active_sheet().map(|s| s.name.as_str()), Some("Curve_chart"));
    assert_eq!(outcome.sequences, vec!["Kimono", "Cactus", "BQTerrace"]);
}

#[test]
fn every_summary_reference_hits_a_filled_raw_cell() {
    let outcome = build();
    let workbook = &outcome.workbook;
    let reference = Regex::new(r"'((?:[^']|'')+)'!\$?([A-Z]+)\$?([0-9]+)").unwrap();

    let mut checked = 0;
    for summary in &outcome.summaries {
        for formula in formulas(workbook, summary) {
            for caps in reference.captures_iter(&formula) {
                let sheet_name = caps[1].replace("''", "'");
                let column = column_index(&caps[2]).unwrap();
                let row: u32 = caps[3].parse().unwrap();
                let sheet = workbook
                    .sheet(&sheet_name)
                    .unwrap_or_else(|| panic!("{formula} names missing sheet {sheet_name}"));
                assert!(
                    sheet.get(row, column).is_some(),
                    "{formula} points at empty cell {}{row} of {sheet_name}",
                    &caps[2]
                );
                checked += 1;
            }
        }
    }
    assert!(checked > 100, "only {checked} references checked");
}

#[test]
fn anchor_list_columns_follow_definition() {
    let outcome = build();
    let sheet = outcome.workbook.sheet("Anchor_list").unwrap();

    // BD-rate block: two pairs, labels in column 3.
    assert_eq!(sheet.text(1, 3), Some("BDBR results"));
    assert_eq!(sheet.text(2, 4), Some("fast"));
    assert_eq!(sheet.text(2, 5), Some("scal_layer1"));
    assert_eq!(sheet.text(3, 5), Some("anchor"));

    // Only "anchor+fast" contains the token "fast"; "scal" matches nothing
    // and keeps its absolute column.
    let time_column = (1..=sheet.max_column())
        .find(|c| sheet.text(1, *c) == Some("Time results"))
        .expect("time block");
    let tests: Vec<&str> = (1..=4).filter_map(|j| sheet.text(2, time_column + j)).collect();
    assert_eq!(tests, vec!["fast", "fast", "scal"]);
    assert!(sheet.get(3, time_column + 1).is_none());
    assert_eq!(sheet.text(3, time_column + 2), Some("anchor+fast"));
}

#[test]
fn matrix_lists_requested_layers() {
    let outcome = build();
    let sheet = outcome.workbook.sheet("BDBRMatrix").unwrap();
    let headers: Vec<&str> = (2..=7).filter_map(|c| sheet.text(4, c)).collect();
    assert_eq!(
        headers,
        vec!["anchor", "anchor+fast", "fast", "scal", "scal_layer0", "scal_layer1"]
    );
}

#[test]
fn workbook_round_trips_through_json() {
    let outcome = build();
    let json = serde_json::to_string(&outcome.workbook).unwrap();
    let back: Workbook = serde_json::from_str(&json).unwrap();
    assert_eq!(back, outcome.workbook);
}

#[test]
fn export_covers_every_layer_row() {
    let outcome = build();
    let csv = ExportUseCase::export(&outcome.runs, ExportFormat::Csv).unwrap();
    // anchor, fast, anchor+fast: 3 seqs x 4 QPs; scal: 3 layers each.
    assert_eq!(csv.lines().count(), 1 + 3 * 12 + 36);
    assert!(csv.contains("scal,Kimono,22,1,"));
}
