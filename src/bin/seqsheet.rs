use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use seqsheet::app::{App, PrepareOutcome, PrepareRequest};
use seqsheet::config::{ConfigLoader, Settings, SettingsOverrides};
use seqsheet::domain::SheetDelimiter;
use seqsheet::error::SheetError;
use seqsheet::eutils::EutilsHttpClient;
use seqsheet::output::{JsonOutput, OutputMode};
use seqsheet::viz::{self, VizOutcome};

#[derive(Parser)]
#[command(name = "seqsheet")]
#[command(about = "Prepare pipeline samplesheets from SRA accessions and local FASTQ files")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Reconcile SRA accessions and local FASTQ files into a samplesheet")]
    Prepare(PrepareArgs),
    #[command(about = "Render presence/absence visualizations from a results table")]
    Visualize(VisualizeArgs),
}

#[derive(Args)]
struct PrepareArgs {
    #[arg(short, long, default_value = "samplesheet_prepared.csv")]
    output: PathBuf,

    /// SRA accessions to include (run, study, or experiment level).
    #[arg(short = 's', long = "sra", num_args = 0.., value_name = "ACCESSION")]
    sra: Vec<String>,

    /// Local FASTQ files as R1 R2 pairs.
    #[arg(short = 'f', long = "fastq", num_args = 0.., value_name = "PATH")]
    fastq: Vec<Utf8PathBuf>,

    /// Directory to scan for paired FASTQ files (_R1/_R2 or _1/_2 suffixes).
    #[arg(short = 'd', long = "input-dir")]
    input_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SheetDelimiter::Comma)]
    delimiter: SheetDelimiter,

    /// Exclude runs whose read count is positive but below the low-depth threshold.
    #[arg(long)]
    curated: bool,

    /// Low-depth threshold used by --curated.
    #[arg(long)]
    min_read_count: Option<u64>,

    /// NCBI API key (overrides the config file).
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum UIDs returned per search.
    #[arg(long)]
    retmax: Option<u32>,

    /// Pause between successive E-utilities calls.
    #[arg(long)]
    fetch_delay_ms: Option<u64>,

    /// Settings file (default: seqsheet.json when present).
    #[arg(long)]
    config: Option<String>,
}

#[derive(Args)]
struct VisualizeArgs {
    /// Analysis-results table (.csv, or .tsv for tab-delimited).
    results: PathBuf,

    /// Directory the images are written into.
    out_dir: PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(sheet) = report.downcast_ref::<SheetError>() {
            return ExitCode::from(map_exit_code(sheet));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SheetError) -> u8 {
    match error {
        SheetError::UnpairedFastqArgs(_)
        | SheetError::MissingColumn(_)
        | SheetError::ConfigRead(_)
        | SheetError::ConfigParse(_) => 2,
        SheetError::EutilsHttp(_) | SheetError::EutilsStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Prepare(args) => run_prepare(args, output_mode),
        Commands::Visualize(args) => run_visualize(args, output_mode),
    }
}

fn run_prepare(args: PrepareArgs, output_mode: OutputMode) -> miette::Result<()> {
    let file = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    let overrides = SettingsOverrides {
        api_key: args.api_key,
        retmax: args.retmax,
        fetch_delay_ms: args.fetch_delay_ms,
        min_read_count: args.min_read_count,
    };
    let settings = Settings::from_sources(file, overrides);

    let eutils = EutilsHttpClient::new(settings.api_key.clone()).into_diagnostic()?;
    let app = App::new(eutils, settings);

    let request = PrepareRequest {
        output: args.output,
        accessions: args.sra,
        fastq_args: args.fastq,
        input_dir: args.input_dir,
        delimiter: args.delimiter,
        curated: args.curated,
    };
    let outcome = app.prepare(request).into_diagnostic()?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_prepare(&outcome).into_diagnostic(),
        OutputMode::Interactive => {
            print_prepare_summary(&outcome);
            Ok(())
        }
    }
}

fn run_visualize(args: VisualizeArgs, output_mode: OutputMode) -> miette::Result<()> {
    let outcome = viz::visualize(&args.results, &args.out_dir).into_diagnostic()?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_visualize(&outcome).into_diagnostic(),
        OutputMode::Interactive => {
            print_visualize_summary(&outcome);
            Ok(())
        }
    }
}

fn print_prepare_summary(outcome: &PrepareOutcome) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}📋 seqsheet summary{reset}");
    match &outcome.written {
        Some(path) => println!(
            "{green}✅ samplesheet: {path} ({} records){reset}",
            outcome.records
        ),
        None => println!("{yellow}⚠️ no samples processed; samplesheet not created{reset}"),
    }
    for warning in &outcome.warnings {
        println!("{yellow}⚠️ {warning}{reset}");
    }
}

fn print_visualize_summary(outcome: &VizOutcome) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}📋 seqsheet summary{reset}");
    if outcome.images.is_empty() {
        println!("{yellow}⚠️ no renderable columns found in the results table{reset}");
    }
    for image in &outcome.images {
        println!("{green}🖼️  {image}{reset}");
    }
}
