//! Coda CLI - cause-of-death coding analysis for narrative medical records.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use coda_lib::config::{
    self, AnalysisConfig, ApiKey, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS, DUMP_DIR_ENV, MODEL_ENV,
};
use coda_lib::pipeline::analysis::{AnalysisClient, AnalysisMode, AnalysisPipeline, PreparedAnalysis};
use coda_lib::pipeline::extraction::{extract, ExtractedFacts};
use coda_lib::pipeline::import::MedicalRecord;
use coda_lib::pipeline::presenter::Presentation;

#[derive(Parser)]
#[command(name = "coda", version, about = "Cause-of-death coding analysis for medical records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract symptoms, medical history and course of events as JSON
    Extract {
        /// Medical record text file
        file: PathBuf,

        /// Write the facts here instead of stdout (edit, then pass via --facts)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the request that would be sent, without calling the service
    Prompt(InputArgs),

    /// Send the record for analysis, show the result and export the report
    Analyze(AnalyzeArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Narrative,
    Structured,
    RootCause,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Narrative => AnalysisMode::Narrative,
            ModeArg::Structured => AnalysisMode::Structured,
            ModeArg::RootCause => AnalysisMode::RootCause,
        }
    }
}

#[derive(Args)]
struct InputArgs {
    /// Medical record text file
    #[arg(required_unless_present = "facts")]
    file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ModeArg::Narrative)]
    mode: ModeArg,

    /// Reviewed facts JSON (from `coda extract`); implies structured mode
    #[arg(long)]
    facts: Option<PathBuf>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = MODEL_ENV, default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Report file or directory (default: downloads folder)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Do not write a report file
    #[arg(long)]
    no_export: bool,

    /// Reveal the result this many characters at a time (0 prints at once)
    #[arg(long, default_value_t = 0)]
    reveal_chunk: usize,

    #[arg(long, default_value_t = 10)]
    reveal_delay_ms: u64,

    /// Write per-run diagnostic artifacts under this directory
    #[arg(long, env = DUMP_DIR_ENV)]
    dump_dir: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    coda_lib::init_tracing();

    let cli = Cli::parse();
    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    match cli.command {
        Commands::Extract { file, output } => extract_command(&file, output.as_deref()),
        Commands::Prompt(input) => prompt_command(&input),
        Commands::Analyze(args) => analyze_command(&args),
    }
}

fn extract_command(file: &Path, output: Option<&Path>) -> Result<ExitCode> {
    let record = load_record(file)?;
    let facts = extract(record.text());
    let json = serde_json::to_string_pretty(&facts)?;

    match output {
        Some(path) => {
            std::fs::write(path, json.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Facts written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn prompt_command(input: &InputArgs) -> Result<ExitCode> {
    let prepared = prepare(input)?;
    println!("{}", serde_json::to_string_pretty(&prepared.request)?);
    Ok(ExitCode::SUCCESS)
}

fn analyze_command(args: &AnalyzeArgs) -> Result<ExitCode> {
    // Configuration is checked before anything touches the network.
    let api_key = ApiKey::from_optional(args.api_key.clone())?;
    let settings = AnalysisConfig::default()
        .with_base_url(&args.base_url)?
        .with_model(&args.model)?
        .with_timeout_secs(args.timeout_secs)?;

    let prepared = prepare(&args.input)?;
    let client = AnalysisClient::mistral(api_key, &settings)?;
    eprintln!("Performing clinical analysis with {}...", client.model());
    let pipeline = AnalysisPipeline::new(client).with_dump_dir(args.dump_dir.clone());

    let result = pipeline.submit(prepared);
    let presentation = Presentation::from_result(&result);

    println!("{}\n", presentation.heading());
    print_revealed(&presentation, args.reveal_chunk, args.reveal_delay_ms)?;

    if !presentation.is_exportable() {
        if result.as_ref().is_err_and(|e| e.is_auth_failure()) {
            eprintln!("The service rejected the API key. Check --api-key or {API_KEY_ENV}.");
        }
        return Ok(ExitCode::FAILURE);
    }

    if !args.no_export {
        let target = args.output.clone().unwrap_or_else(config::default_export_dir);
        let path = presentation
            .export(&target)
            .with_context(|| format!("failed to export report to {}", target.display()))?;
        eprintln!("Report saved to {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn prepare(input: &InputArgs) -> Result<PreparedAnalysis> {
    if let Some(path) = &input.facts {
        if input.mode != ModeArg::Structured {
            tracing::info!("--facts given, using structured mode");
        }
        return Ok(PreparedAnalysis::from_facts(load_facts(path)?));
    }

    let file = input
        .file
        .as_deref()
        .context("a record file is required unless --facts is given")?;
    let record = load_record(file)?;
    Ok(PreparedAnalysis::from_record(&record, input.mode.into()))
}

fn load_record(path: &Path) -> Result<MedicalRecord> {
    MedicalRecord::load(path).with_context(|| format!("failed to load record {}", path.display()))
}

fn load_facts(path: &Path) -> Result<ExtractedFacts> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read facts {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid facts JSON in {}", path.display()))
}

/// Stream the text to stdout chunk by chunk. Pacing lives here, not in the library.
fn print_revealed(presentation: &Presentation<'_>, chunk_chars: usize, delay_ms: u64) -> Result<()> {
    let mut stdout = std::io::stdout().lock();

    if chunk_chars == 0 {
        writeln!(stdout, "{}", presentation.text())?;
        return Ok(());
    }

    let delay = Duration::from_millis(delay_ms);
    for chunk in presentation.reveal(chunk_chars) {
        stdout.write_all(chunk.as_bytes())?;
        stdout.flush()?;
        std::thread::sleep(delay);
    }
    writeln!(stdout)?;
    Ok(())
}
