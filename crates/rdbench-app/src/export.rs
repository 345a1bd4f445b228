//! Export use case for flattening normalized results to CSV or JSONL.
//!
//! One row per (test, sequence, quality point, layer), for feeding the raw
//! measurements into other tools without going through the workbook.

use rdbench_types::NormalizedRun;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RFC 4180 compliant CSV with header row.
    Csv,
    /// JSON Lines format (one JSON object per line).
    Jsonl,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "jsonl" => Ok(ExportFormat::Jsonl),
            other => Err(format!("unknown export format {other:?} (expected csv or jsonl)")),
        }
    }
}

/// One measurement row.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExportRow {
    pub test: String,
    pub sequence: String,
    /// Original quality-point key, as found in the results file.
    pub quality: String,
    pub layer: String,
    pub bits: f64,
    pub bitrate: f64,
    pub time: f64,
    pub psnr_y: f64,
    pub psnr_u: f64,
    pub psnr_v: f64,
    /// `(6*Y + U + V) / 8`
    pub psnr_avg: f64,
}

const CSV_HEADER: &str =
    "test,sequence,quality,layer,bits,bitrate,time,psnr_y,psnr_u,psnr_v,psnr_avg\n";

pub struct ExportUseCase;

impl ExportUseCase {
    /// Export every run, in the order given, to the specified format.
    pub fn export(runs: &[NormalizedRun], format: ExportFormat) -> anyhow::Result<String> {
        let rows: Vec<ExportRow> = runs.iter().flat_map(Self::run_to_rows).collect();

        match format {
            ExportFormat::Csv => Ok(Self::rows_to_csv(&rows)),
            ExportFormat::Jsonl => Self::rows_to_jsonl(&rows),
        }
    }

    /// Sequences in result order, then quality index, then layer (TOTAL first).
    fn run_to_rows(run: &NormalizedRun) -> Vec<ExportRow> {
        let mut rows = Vec::new();
        for seq in &run.results.sequences {
            let labels = run.labels.get(&seq.name);
            for (index, layers) in &seq.points {
                let quality = labels
                    .and_then(|l| l.get(index))
                    .cloned()
                    .unwrap_or_else(|| index.to_string());
                for (layer, record) in layers {
                    rows.push(ExportRow {
                        test: run.name.clone(),
                        sequence: seq.name.clone(),
                        quality: quality.clone(),
                        layer: layer.to_string(),
                        bits: record.bits,
                        bitrate: record.bitrate,
                        time: record.time,
                        psnr_y: record.psnr.y,
                        psnr_u: record.psnr.u,
                        psnr_v: record.psnr.v,
                        psnr_avg: record.psnr.weighted(),
                    });
                }
            }
        }
        rows
    }

    fn rows_to_csv(rows: &[ExportRow]) -> String {
        let mut output = String::from(CSV_HEADER);

        for row in rows {
            let fields = [
                csv_escape(&row.test),
                csv_escape(&row.sequence),
                csv_escape(&row.quality),
                csv_escape(&row.layer),
                format!("{:.6}", row.bits),
                format!("{:.6}", row.bitrate),
                format!("{:.6}", row.time),
                format!("{:.6}", row.psnr_y),
                format!("{:.6}", row.psnr_u),
                format!("{:.6}", row.psnr_v),
                format!("{:.6}", row.psnr_avg),
            ];
            output.push_str(&fields.join(","));
            output.push('\n');
        }

        output
    }

    fn rows_to_jsonl(rows: &[ExportRow]) -> anyhow::Result<String> {
        let mut output = String::new();

        for row in rows {
            let json = serde_json::to_string(row)?;
            output.push_str(&json);
            output.push('\n');
        }

        Ok(output)
    }
}

/// Escape a string for CSV per RFC 4180.
/// If the string contains comma, double quote, or newline, wrap in quotes and escape quotes.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
