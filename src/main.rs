use clap::{Parser, Subcommand};
use sqldiag::analysis::size::DEFAULT_TOP_N;
use sqldiag::config::ReportJob;
use sqldiag::reporter::{ReportFormat, Reporter};
use sqldiag::runner::ReportRunner;
use sqldiag::source::FileSource;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SQL Server diagnostics - ranks property result sizes and index fragmentation from exported facts
#[derive(Parser, Debug)]
#[command(name = "sqldiag")]
#[command(version = "0.1.0")]
#[command(about = "Property size and index fragmentation reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "markdown")]
    format: ReportFormat,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank the largest analysis properties by stored result size
    Size {
        /// JSON or YAML file of size records
        #[arg(short = 'i', long = "input", env = "SQLDIAG_SIZE_INPUT")]
        input: PathBuf,

        /// Number of properties to report
        #[arg(short = 'n', long = "top-n", env = "SQLDIAG_TOP_N", default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
    },
    /// Report fragmentation and space usage for every index
    Fragmentation {
        /// JSON or YAML file of index statistics
        #[arg(short = 'i', long = "input", env = "SQLDIAG_INDEX_INPUT")]
        input: PathBuf,
    },
    /// Run several reports from a YAML job file
    Config {
        /// Path to YAML job file
        #[arg(short = 'c', long = "config")]
        config_path: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let reporter = Reporter::new(cli.format);
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    match cli.command {
        Commands::Size { input, top_n } => {
            info!("Building size report from: {}", input.display());
            run_job(
                &ReportJob::Size {
                    name: "size".into(),
                    input,
                    top_n,
                },
                &reporter,
                &mut handle,
            )?;
        }
        Commands::Fragmentation { input } => {
            info!("Building fragmentation report from: {}", input.display());
            run_job(
                &ReportJob::Fragmentation {
                    name: "fragmentation".into(),
                    input,
                },
                &reporter,
                &mut handle,
            )?;
        }
        Commands::Config { config_path } => {
            info!("Loading report jobs from: {}", config_path);
            let jobs = ReportJob::from_config_file(&config_path)?;

            for job in &jobs {
                info!("Running report job: {}", job.name());
                run_job(job, &reporter, &mut handle)?;
            }
        }
    }

    handle.flush()?;
    Ok(())
}

fn run_job<W: Write>(job: &ReportJob, reporter: &Reporter, out: &mut W) -> anyhow::Result<()> {
    match job {
        ReportJob::Size { input, top_n, .. } => {
            let runner = ReportRunner::new(FileSource::new().with_size_records(input));
            let report = runner.size_report(*top_n)?;
            reporter.report_size(&report, out)?;
        }
        ReportJob::Fragmentation { input, .. } => {
            let runner = ReportRunner::new(FileSource::new().with_index_stats(input));
            let report = runner.fragmentation_report()?;
            reporter.report_fragmentation(&report, out)?;
        }
    }
    Ok(())
}
