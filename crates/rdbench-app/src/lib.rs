//! Application layer for rdbench.
//!
//! The app layer coordinates domain logic and rendering.
//! It does not parse CLI flags and it does not do filesystem I/O.

mod export;
mod markdown;
mod suite;

pub use export::{ExportFormat, ExportRow, ExportUseCase};
pub use markdown::render_markdown;
pub use suite::{ReportSuiteUseCase, SuiteOutcome, SuiteRequest, TestSummary};

pub trait Clock: Send + Sync {
    fn now_rfc3339(&self) -> String;
}

#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        use time::format_description::well_known::Rfc3339;
        time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    }
}
