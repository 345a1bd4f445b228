use crate::SuiteOutcome;

/// Short digest of a suite report: which tests went into which sheets and
/// which summaries were written.
pub fn render_markdown(outcome: &SuiteOutcome) -> String {
    let mut out = String::new();

    out.push_str(&format!("rdbench: `{}`\n\n", outcome.suite));

    if let Some(at) = &outcome.workbook.generated_at {
        out.push_str(&format!("**Generated:** {at}\n\n"));
    }

    out.push_str("| test | sheet | scale | sequences | quality points | layers | runs |\n");
    out.push_str("|---|---|---|---:|---|---:|---:|\n");

    for test in &outcome.tests {
        let name = if test.combined {
            format!("`{}` (combined)", test.name)
        } else {
            format!("`{}`", test.name)
        };
        out.push_str(&format!(
            "| {name} | {sheet} | {scale} | {seqs} | {qp} | {layers} | {runs} |\n",
            sheet = test.sheet,
            scale = test.scale,
            seqs = test.sequences,
            qp = test.quality_labels.join(", "),
            layers = test.layers,
            runs = test.accumulated_runs,
        ));
    }

    if !outcome.sequences.is_empty() {
        out.push_str(&format!("\n**Sequences:** {}\n", outcome.sequences.join(", ")));
    }

    if !outcome.summaries.is_empty() {
        out.push_str("\n**Summaries:**\n");
        for name in &outcome.summaries {
            out.push_str(&format!("- {name}\n"));
        }
    }

    out
}
