//! vibro-report - render vibration analysis reports

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use vibro_report::{
    Dataset, ReportAssets, ReportBuilder, ReportConfig, ReportContext, ReportResult, Requester,
};

#[derive(Parser)]
#[command(name = "vibro-report")]
#[command(version, about = "Vibration analysis report renderer", long_about = None)]
#[command(after_help = "EXAMPLES:
    vibro-report render --data data.json --user luis --company Acme --date 3 --out report.pdf
    vibro-report validate --data data.json")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the report of one measurement session
    Render {
        /// Dataset JSON file
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Username of the person the report is addressed to
        #[arg(long)]
        user: String,

        /// Company whose machines are reported
        #[arg(long)]
        company: String,

        /// Id of the measurement date
        #[arg(long)]
        date: u32,

        /// Output PDF file
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        /// TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Letter date (YYYY-MM-DD), today when omitted
        #[arg(long, value_name = "DATE")]
        issued: Option<NaiveDate>,
    },
    /// Load and validate a dataset
    Validate {
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("VIBRO_LOG", "error,vibro_report=info"))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Render {
            data,
            user,
            company,
            date,
            out,
            config,
            issued,
        } => render(&data, &user, &company, date, &out, config.as_deref(), issued),
        Command::Validate { data } => validate(&data),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn render(
    data: &Path,
    username: &str,
    company: &str,
    date_id: u32,
    out: &Path,
    config: Option<&Path>,
    issued: Option<NaiveDate>,
) -> ReportResult<()> {
    let config = match config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };

    let mut dataset = Dataset::from_path(data)?;
    let media_root = config
        .media_dir
        .clone()
        .or_else(|| data.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dataset.resolve_media(&media_root);

    let requester = Requester::from(dataset.user_by_username(username)?);
    let rows = dataset.report_rows(company, date_id)?;
    let issued = issued.unwrap_or_else(|| Local::now().date_naive());
    let context = ReportContext::new(rows, requester, issued)?;

    let mut builder = ReportBuilder::new(
        context,
        ReportAssets::from_config(&config)?,
        config.geometry,
        Arc::new(config.font_library()?),
    )?;
    let story = builder.measurement_story();
    builder.extend(story);
    let summary = builder.build_to_path(out)?;
    println!("{}: {} pages", out.display(), summary.page_count());
    Ok(())
}

fn validate(data: &Path) -> ReportResult<()> {
    let dataset = Dataset::from_path(data)?;
    info!("Validated {}", data.display());
    println!(
        "{}: {} companies, {} machines, {} measurements, {} points",
        data.display(),
        dataset.companies.len(),
        dataset.machines.len(),
        dataset.measurements.len(),
        dataset.points.len()
    );
    Ok(())
}
