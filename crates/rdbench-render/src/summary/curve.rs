//! Curve chart: per-sequence data rows (hidden) plus scatter charts.

use crate::MetricRefs;
use crate::reshape::{BySequence, sequence_order};
use rdbench_types::{CurveAxis, CurveChartDefinition, Metric, SeriesKey};
use rdbench_workbook::{
    CellValue, RowRange, ScatterChart, ScatterSeries, Worksheet, column_letter,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Columns hidden at minimum (labels plus four data points).
const MIN_HIDDEN_COLUMNS: u32 = 6;
const CHART_COLUMN_STEP: u32 = 9;
const CHART_ROW_STEP: u32 = 15;

const AXES: [CurveAxis; 3] = [CurveAxis::Rate, CurveAxis::Psnr, CurveAxis::Time];

fn metric(axis: CurveAxis) -> Metric {
    match axis {
        CurveAxis::Rate => Metric::Bitrate,
        CurveAxis::Psnr => Metric::Psnr,
        CurveAxis::Time => Metric::Time,
    }
}

/// Data rows of one series within one sequence.
struct SeriesRows {
    rate: RowRange,
    psnr: RowRange,
    time: RowRange,
}

impl SeriesRows {
    fn get(&self, axis: CurveAxis) -> &RowRange {
        match axis {
            CurveAxis::Rate => &self.rate,
            CurveAxis::Psnr => &self.psnr,
            CurveAxis::Time => &self.time,
        }
    }
}

pub(crate) fn write_curve_chart(
    sheet: &mut Worksheet,
    by_sequence: &BySequence,
    order: &[String],
    def: &CurveChartDefinition,
) {
    let series = plotted_series(by_sequence, def);
    let sequences = sequence_order(order, by_sequence);
    let points = by_sequence
        .values()
        .flat_map(|s| s.values())
        .map(MetricRefs::len)
        .max()
        .unwrap_or(0);

    let mut data: Vec<(&str, Vec<SeriesRows>)> = Vec::with_capacity(sequences.len());
    for sequence in &sequences {
        let rows = write_sequence_rows(sheet, by_sequence, sequence, &series, points);
        data.push((*sequence, rows));
    }

    let hidden = MIN_HIDDEN_COLUMNS.max(2 + points as u32);
    sheet.group_columns(1, hidden, true);

    let first_chart_column = hidden + 1;
    for (s, (sequence, rows)) in data.iter().enumerate() {
        for (k, axes) in def.charts.iter().enumerate() {
            let mut chart = ScatterChart::new(*sequence, axes.x.label(), axes.y.label());
            chart.anchor = format!(
                "{}{}",
                column_letter(first_chart_column + CHART_COLUMN_STEP * k as u32),
                1 + CHART_ROW_STEP * s as u32
            );
            for entry in rows {
                let y = entry.get(axes.y);
                chart.series.push(ScatterSeries {
                    title: RowRange::new(y.sheet.as_str(), y.row, 2, 2),
                    x: entry.get(axes.x).clone(),
                    y: y.clone(),
                });
            }
            sheet.add_chart(chart);
        }
    }
}

/// Series named by the definition, else every TOTAL series by name.
fn plotted_series(by_sequence: &BySequence, def: &CurveChartDefinition) -> Vec<SeriesKey> {
    if !def.tests.is_empty() {
        return def.tests.clone();
    }
    let all: BTreeSet<(String, &SeriesKey)> = by_sequence
        .values()
        .flat_map(|s| s.keys())
        .filter(|key| key.layer.is_total())
        .map(|key| (key.series_name(), key))
        .collect();
    all.into_iter().map(|(_, key)| key.clone()).collect()
}

fn write_sequence_rows(
    sheet: &mut Worksheet,
    by_sequence: &BySequence,
    sequence: &str,
    series: &[SeriesKey],
    points: usize,
) -> Vec<SeriesRows> {
    sheet.append_row([Some(sequence)]);
    let header: Vec<Option<String>> = ["Data Type".to_string(), "Test".to_string()]
        .into_iter()
        .chain((1..=points).map(|i| format!("Data Point {i}")))
        .map(Some)
        .collect();
    sheet.append_row(header);

    let Some(available) = by_sequence.get(sequence) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(series.len());
    for key in series {
        let Some(refs) = available.get(key) else {
            debug!(sequence, series = %key, "series missing, not plotted");
            continue;
        };
        let name = key.series_name();
        let [rate, psnr, time] = AXES.map(|axis| {
            let cells = refs.get(metric(axis));
            let values: Vec<Option<CellValue>> = [
                CellValue::text(axis.label()),
                CellValue::text(name.as_str()),
            ]
            .into_iter()
            .chain(
                cells
                    .iter()
                    .map(|c| CellValue::formula(format!("={}", c.to_formula()))),
            )
            .map(Some)
            .collect();
            let row = sheet.append_row(values);
            RowRange::new(sheet.name.as_str(), row, 3, 2 + cells.len().max(1) as u32)
        });
        out.push(SeriesRows { rate, psnr, time });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReferenceMap;
    use crate::fixtures::normalized;
    use crate::layout::layout_test_sheet;
    use crate::reshape::{flatten, flip};
    use rdbench_domain::TotalOnly;
    use rdbench_types::ChartAxes;

    fn by_sequence(tests: &[&str], sequences: &[&str], points: usize) -> BySequence {
        let bits: Vec<f64> = (0..points).map(|i| 1000.0 / (i as f64 + 1.0)).collect();
        let refs: ReferenceMap = tests
            .iter()
            .map(|name| {
                let run = normalized(name, sequences, &bits, 40.0);
                let mut sheet = Worksheet::new(*name);
                (name.to_string(), layout_test_sheet(&mut sheet, &run, &[]))
            })
            .collect();
        flip(&flatten(&refs, &TotalOnly))
    }

    #[test]
    fn data_rows_reference_raw_cells() {
        let data = by_sequence(&["A", "B"], &["s1"], 4);
        let mut sheet = Worksheet::new("Curve_chart");
        let order = vec!["s1".to_string()];
        write_curve_chart(&mut sheet, &data, &order, &CurveChartDefinition::default());

        assert_eq!(sheet.text(1, 1), Some("s1"));
        assert_eq!(sheet.text(2, 1), Some("Data Type"));
        assert_eq!(sheet.text(2, 6), Some("Data Point 4"));
        assert_eq!(sheet.text(3, 1), Some("rate"));
        assert_eq!(sheet.text(3, 2), Some("A"));
        assert_eq!(sheet.text(3, 3), Some("='A'!D5"));
        assert_eq!(sheet.text(4, 1), Some("psnr"));
        assert_eq!(sheet.text(4, 3), Some("='A'!I5"));
        assert_eq!(sheet.text(5, 1), Some("time"));
        assert_eq!(sheet.text(6, 2), Some("B"));

        assert_eq!(sheet.column_groups.len(), 1);
        assert_eq!(sheet.column_groups[0].end_column, 6);
        assert!(sheet.column_groups[0].hidden);
    }

    #[test]
    fn one_chart_per_sequence_and_axes() {
        let data = by_sequence(&["A", "B"], &["s1"], 4);
        let def = CurveChartDefinition {
            charts: vec![
                ChartAxes {
                    x: CurveAxis::Rate,
                    y: CurveAxis::Psnr,
                },
                ChartAxes {
                    x: CurveAxis::Time,
                    y: CurveAxis::Psnr,
                },
            ],
            ..CurveChartDefinition::default()
        };
        let order = vec!["s1".to_string(), "Average".to_string()];
        let mut sheet = Worksheet::new("Curve_chart");
        write_curve_chart(&mut sheet, &data, &order, &def);

        assert_eq!(sheet.charts.len(), 4);
        let first = &sheet.charts[0];
        assert_eq!(first.title, "s1");
        assert_eq!(first.anchor, "G1");
        assert_eq!(first.x_axis_title, "rate");
        assert_eq!(first.y_axis_title, "psnr");
        assert!(!first.visible_cells_only);
        assert_eq!(first.series.len(), 2);
        assert_eq!(first.series[0].title.to_formula(), "'Curve_chart'!$B$4:$B$4");
        assert_eq!(first.series[0].x.to_formula(), "'Curve_chart'!$C$3:$F$3");
        assert_eq!(first.series[0].y.to_formula(), "'Curve_chart'!$C$4:$F$4");

        assert_eq!(sheet.charts[1].anchor, "P1");
        assert_eq!(sheet.charts[2].anchor, "G16");
        assert_eq!(sheet.charts[2].title, "Average");
    }

    #[test]
    fn explicit_tests_keep_their_order_and_skip_missing() {
        let data = by_sequence(&["A", "B"], &["s1"], 2);
        let def = CurveChartDefinition {
            tests: vec![
                SeriesKey::total("B"),
                SeriesKey::total("ghost"),
                SeriesKey::total("A"),
            ],
            ..CurveChartDefinition::default()
        };
        let mut sheet = Worksheet::new("C");
        write_curve_chart(&mut sheet, &data, &["s1".to_string()], &def);

        assert_eq!(sheet.text(3, 2), Some("B"));
        assert_eq!(sheet.text(6, 2), Some("A"));
        assert_eq!(sheet.charts[0].series.len(), 2);
    }

    #[test]
    fn wide_curves_push_charts_right() {
        let data = by_sequence(&["A"], &["s1"], 6);
        let mut sheet = Worksheet::new("C");
        write_curve_chart(&mut sheet, &data, &["s1".to_string()], &CurveChartDefinition::default());
        assert_eq!(sheet.column_groups[0].end_column, 8);
        assert_eq!(sheet.charts[0].anchor, "I1");
    }
}
