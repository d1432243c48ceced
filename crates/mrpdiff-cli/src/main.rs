use anyhow::{anyhow, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use mrpdiff_analysis::{compare, explain};
use mrpdiff_log::{load_document, DocumentBuilder, LogDocument};
use mrpdiff_report::{ReportFormat, ReportOptions, ReportRenderer};
use std::fs;
use std::path::{Path, PathBuf};

const DEMO_RUN_A: &str = include_str!("../demo/run_a.log");
const DEMO_RUN_B: &str = include_str!("../demo/run_b.log");

#[derive(Parser)]
#[command(name = "mrpdiff")]
#[command(about = "Compare two MRP scheduler runs and explain what changed", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two MRP logs and print a report
    Compare {
        /// Baseline (earlier) run
        #[arg(value_name = "FILE_A")]
        run_a: PathBuf,
        /// Run to compare against the baseline
        #[arg(value_name = "FILE_B")]
        run_b: PathBuf,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Parse an MRP log and emit its document as JSON
    Parse {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Compare two bundled sample runs
    Demo {
        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Output markup
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// Show at most N differences in the report
    #[arg(long, value_name = "N")]
    max_differences: Option<usize>,
    /// Leave inferred causes out of the report
    #[arg(long)]
    no_inferences: bool,
    /// Leave the log evidence section out of the report
    #[arg(long)]
    no_evidence: bool,
    /// Show at most N evidence lines
    #[arg(long, value_name = "N")]
    max_evidence_lines: Option<usize>,
    /// JSON file with report options; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Write the report to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Markdown,
    Plain,
}

impl ReportArgs {
    fn options(&self) -> anyhow::Result<ReportOptions> {
        let mut options = match &self.config {
            Some(path) => ReportOptions::load(path)?,
            None => ReportOptions::default(),
        };
        if let Some(format) = self.format {
            options.format = match format {
                FormatArg::Markdown => ReportFormat::Markdown,
                FormatArg::Plain => ReportFormat::PlainText,
            };
        }
        if let Some(n) = self.max_differences {
            options.max_differences_to_show = n;
        }
        if let Some(n) = self.max_evidence_lines {
            options.max_evidence_lines = n;
        }
        if self.no_inferences {
            options.include_inferences = false;
        }
        if self.no_evidence {
            options.include_evidence = false;
        }
        Ok(options)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Compare {
            run_a,
            run_b,
            report,
        } => {
            let options = report.options()?;
            let (a, b) = load_pair(run_a, run_b)?;
            emit(&render(a, b, options), report.output.as_deref())?;
        }
        Commands::Parse { path } => {
            let document = load_document(path)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Commands::Demo { report } => {
            let options = report.options()?;
            let a = DocumentBuilder::new("demo/run_a.log").parse(DEMO_RUN_A);
            let b = DocumentBuilder::new("demo/run_b.log").parse(DEMO_RUN_B);
            emit(&render(a, b, options), report.output.as_deref())?;
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Parses both runs on separate threads; the builders share nothing.
fn load_pair(run_a: &Path, run_b: &Path) -> anyhow::Result<(LogDocument, LogDocument)> {
    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| load_document(run_a));
        let b = load_document(run_b);
        (a.join(), b)
    });
    let a = a.map_err(|_| anyhow!("parser thread for {} panicked", run_a.display()))??;
    Ok((a, b?))
}

fn render(a: LogDocument, b: LogDocument, options: ReportOptions) -> String {
    let comparison = compare(a, b);
    let explanations = explain(&comparison);
    log::info!(
        "{} differences, {} explanations",
        comparison.summary.total_differences,
        explanations.len()
    );
    ReportRenderer::new(options).render(&comparison, &explanations)
}

fn emit(report: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => fs::write(path, report)
            .with_context(|| format!("failed to write report to {}", path.display())),
        None => {
            print!("{}", report);
            Ok(())
        }
    }
}
