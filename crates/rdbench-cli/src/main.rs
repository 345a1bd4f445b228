use anyhow::Context;
use clap::{Parser, Subcommand};
use rdbench_app::{
    ExportFormat, ExportUseCase, ReportSuiteUseCase, SuiteOutcome, SuiteRequest, SystemClock,
    render_markdown,
};
use rdbench_ingest::{LoadedConfig, load_config, load_runs};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "rdbench",
    version,
    about = "Rate-distortion comparison workbooks for video codec test runs"
)]
struct Cli {
    /// Log progress to stderr (RUST_LOG overrides the level)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the comparison workbook for a suite and write it as JSON.
    Report {
        /// Suite config (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Output workbook path (default: <out_dir>/<suite>.workbook.json)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Pretty-print JSON
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },

    /// Export the normalized and combined measurements as CSV or JSONL.
    Export {
        #[arg(long)]
        config: PathBuf,

        /// csv or jsonl
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Output path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Render a Markdown digest of the suite report.
    Md {
        #[arg(long)]
        config: PathBuf,

        /// Output markdown path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    if let Err(err) = real_main() {
        eprintln!("{err:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::Report {
            config,
            out,
            pretty,
        } => {
            let loaded = load_config(&config)?;
            let out = out.unwrap_or_else(|| loaded.default_output());
            let outcome = build_report(loaded)?;

            write_json(&out, &outcome.workbook, pretty)?;
            info!(path = %out.display(), sheets = outcome.workbook.sheets.len(), "workbook written");
            Ok(())
        }

        Command::Export {
            config,
            format,
            out,
        } => {
            let outcome = build_report(load_config(&config)?)?;
            let text = ExportUseCase::export(&outcome.runs, format)?;
            write_text(out.as_deref(), &text)
        }

        Command::Md { config, out } => {
            let outcome = build_report(load_config(&config)?)?;
            let md = render_markdown(&outcome);
            write_text(out.as_deref(), &md)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests in one process) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_report(loaded: LoadedConfig) -> anyhow::Result<SuiteOutcome> {
    let runs = load_runs(&loaded.base_dir, &loaded.config.results)?;
    if runs.is_empty() {
        anyhow::bail!("config lists no result files");
    }
    ReportSuiteUseCase::new(SystemClock).execute(SuiteRequest {
        config: loaded.config,
        runs,
    })
}

fn write_text(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
        }
        None => {
            print!("{text}");
        }
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, pretty: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }

    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    atomic_write(path, &bytes)
}

fn atomic_write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    use std::io::Write;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = parent.to_path_buf();
    tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4()));

    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("create temp {}", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write temp {}", tmp.display()))?;
        f.sync_all().ok();
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
