//! Formula compiler.
//!
//! Every summary cell is a live formula over raw-sheet cells; the host
//! spreadsheet evaluates it. `bdrate` is a user-defined function the
//! host template provides.

use crate::MetricRefs;
use rdbench_types::Metric;
use rdbench_workbook::{
    CellRef, CellStyle, CellValue, ColorScale, ColorStop, NumberStyle, StopKind,
};

/// Comparison category of a summary block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    BdRate,
    Bits,
    Psnr,
    Time,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::BdRate,
        Category::Bits,
        Category::Psnr,
        Category::Time,
    ];

    /// Block header in the comparison matrix. BD-rate blocks sit under
    /// the per-sequence header instead.
    pub fn matrix_header(self) -> Option<&'static str> {
        match self {
            Category::BdRate => None,
            Category::Bits => Some("Bit comparisons"),
            Category::Psnr => Some("PSNR comparisons (dB)"),
            Category::Time => Some("Encoding time comparisons"),
        }
    }

    pub fn anchor_header(self) -> &'static str {
        match self {
            Category::BdRate => "BDBR results",
            Category::Bits => "Bit results",
            Category::Psnr => "PSNR results",
            Category::Time => "Time results",
        }
    }

    /// Green for gains, red for losses (blue/teal for rate and time).
    pub fn color_scale(self) -> ColorScale {
        match self {
            Category::BdRate | Category::Psnr => ColorScale::three(
                ColorStop::new(StopKind::Percentile(90.0), "63BE7B"),
                ColorStop::new(StopKind::Number(0.0), "FFFFFF"),
                ColorStop::new(StopKind::Percentile(10.0), "F8696B"),
            ),
            Category::Bits => ColorScale::three(
                ColorStop::new(StopKind::Min, "4F81BD"),
                ColorStop::new(StopKind::Number(1.0), "FFFFFF"),
                ColorStop::new(StopKind::Percentile(80.0), "F8696B"),
            ),
            Category::Time => ColorScale::three(
                ColorStop::new(StopKind::Min, "9BDE55"),
                ColorStop::new(StopKind::Number(1.0), "FFFFFF"),
                ColorStop::new(StopKind::Percentile(80.0), "00BBEF"),
            ),
        }
    }

    /// Style of a test-vs-anchor cell.
    pub fn relative_style(self) -> CellStyle {
        match self {
            Category::BdRate => CellStyle {
                number_style: Some(NumberStyle::Percent),
                number_format: Some("0.00%".to_string()),
                centered: true,
            },
            Category::Bits | Category::Time => CellStyle {
                number_style: Some(NumberStyle::Percent),
                number_format: None,
                centered: true,
            },
            Category::Psnr => CellStyle {
                number_style: Some(NumberStyle::Comma),
                number_format: None,
                centered: true,
            },
        }
    }

    /// Style of an anchor-less cell.
    pub fn absolute_style(self) -> CellStyle {
        CellStyle {
            number_style: Some(NumberStyle::Comma),
            number_format: None,
            centered: true,
        }
    }

    /// Matrix diagonal: a series compared with itself.
    pub fn diagonal(self) -> CellValue {
        match self {
            Category::Psnr => CellValue::Number(0.0),
            _ => CellValue::text("-"),
        }
    }

    /// Reference lists the formula of this category reads.
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            Category::BdRate => &[Metric::Bitrate, Metric::Psnr],
            Category::Bits => &[Metric::Bits],
            Category::Psnr => &[Metric::Psnr],
            Category::Time => &[Metric::Time],
        }
    }
}

fn join(refs: &[CellRef]) -> String {
    refs.iter()
        .map(CellRef::to_formula)
        .collect::<Vec<_>>()
        .join(",")
}

/// `=bdrate(anchor rate…, anchor psnr…, test rate…, test psnr…)`.
pub fn bdrate(anchor: &MetricRefs, test: &MetricRefs) -> String {
    let args = [
        join(&anchor.bitrate),
        join(&anchor.psnr),
        join(&test.bitrate),
        join(&test.psnr),
    ];
    format!("=bdrate({})", args.join(","))
}

/// Test compared against anchor.
pub fn relative(category: Category, anchor: &MetricRefs, test: &MetricRefs) -> String {
    match category {
        Category::BdRate => bdrate(anchor, test),
        Category::Bits => ratio(&test.bits, &anchor.bits),
        Category::Time => ratio(&test.time, &anchor.time),
        Category::Psnr => format!(
            "=AVERAGE({})-AVERAGE({})",
            join(&test.psnr),
            join(&anchor.psnr)
        ),
    }
}

fn ratio(test: &[CellRef], anchor: &[CellRef]) -> String {
    format!("=AVERAGE({})/AVERAGE({})", join(test), join(anchor))
}

/// Plain mean of the test series; BD-rate has no absolute form.
pub fn absolute(category: Category, test: &MetricRefs) -> Option<String> {
    match category {
        Category::BdRate => None,
        Category::Bits => Some(average(&test.bits)),
        Category::Time => Some(average(&test.time)),
        Category::Psnr => Some(average(&test.psnr)),
    }
}

/// `=AVERAGE('S'!A1,'S'!A2,…)`.
pub fn average(refs: &[CellRef]) -> String {
    format!("=AVERAGE({})", join(refs))
}

/// Sheet-local mean, e.g. `=AVERAGE(C5,C7)`.
pub fn local_average(cells: &[CellRef]) -> String {
    let list: Vec<String> = cells.iter().map(CellRef::a1).collect();
    format!("=AVERAGE({})", list.join(","))
}

/// Luma-weighted PSNR over three same-sheet cells.
pub fn psnr_weighted(y: &CellRef, u: &CellRef, v: &CellRef) -> String {
    format!("=(6*{}+{}+{})/8", y.a1(), u.a1(), v.a1())
}
