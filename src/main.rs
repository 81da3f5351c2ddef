use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use rusty_forecast::collab::JsonFileClient;
use rusty_forecast::data::loader::encode_table;
use rusty_forecast::pipeline;
use rusty_forecast::wire::{self, Payload};
use rusty_forecast::{DirectoryStore, PipelineConfig, PngRenderer, SeriesReport};

#[derive(Parser, Debug)]
#[command(
    name = "rusty-forecast",
    version,
    about = "Prepare forecast requests from CSV data and report on forecast results"
)]
struct Cli {
    /// JSON pipeline configuration; absent keys take defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the inference request for a table.
    Prepare(InputArgs),
    /// Render charts and reports for a prediction bundle.
    Report(ReportArgs),
    /// Prepare, read the result from a file, and report.
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Delimited table with a header row.
    #[arg(long)]
    csv: PathBuf,

    /// The file is already base64-wrapped.
    #[arg(long, default_value_t = false)]
    base64: bool,
}

#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Directory that receives the chart images.
    #[arg(long, default_value = "forecast-charts")]
    out_dir: PathBuf,

    /// Base URL under which `out_dir` is published.
    #[arg(long)]
    public_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct ReportArgs {
    /// JSON `{"inputs": ..., "results": ...}`.
    #[arg(long)]
    bundle: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    /// JSON result document in the inference service's wire shape.
    #[arg(long)]
    result: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("{err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Prepare(args) => {
            let encoded = read_encoded(&args)?;
            let batch = pipeline::prepare(&encoded, &config)?;
            println!("{}", wire::request_to_json(&batch.request)?);
        }
        Commands::Report(args) => {
            let text = std::fs::read_to_string(&args.bundle)
                .with_context(|| format!("reading {}", args.bundle.display()))?;
            let store = make_store(&args.output);
            let reports =
                pipeline::report_bundle(Payload::Raw(text), &PngRenderer, &store, &config.render)?;
            print_reports(&reports);
        }
        Commands::Run(args) => {
            let encoded = read_encoded(&args.input)?;
            let client = JsonFileClient::new(&args.result);
            let store = make_store(&args.output);
            let reports = pipeline::run(&encoded, &config, &client, &PngRenderer, &store)?;
            print_reports(&reports);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    PipelineConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_encoded(args: &InputArgs) -> Result<String> {
    let text = std::fs::read_to_string(&args.csv)
        .with_context(|| format!("reading {}", args.csv.display()))?;
    Ok(if args.base64 { text } else { encode_table(&text) })
}

fn make_store(output: &OutputArgs) -> DirectoryStore {
    let store = DirectoryStore::new(&output.out_dir);
    match &output.public_url {
        Some(url) => store.with_public_base(url),
        None => store,
    }
}

fn print_reports(reports: &[SeriesReport]) {
    log::info!("{} reports", reports.len());
    for report in reports {
        println!("{}", report.text);
    }
}
