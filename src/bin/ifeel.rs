//! IFEEL CLI - Command-line interface for IFEEL
//!
//! Commands:
//! - extract: Extract global and peak-period features from a load table
//! - transform: Emit the SAX word of every daily profile
//! - names: Print the feature column names

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{warn, Level};

use ifeel::batch::{BatchConfig, BatchProcessor, ErrorMode};
use ifeel::encoder::{FeatureTableEncoder, SymbolFormat};
use ifeel::{
    ConstantProfilePolicy, ExtractionConfig, FeaturePipeline, IfeelError, LoadTable,
    GLOBAL_FEATURE_NAMES, IFEEL_VERSION, PEAK_FEATURE_NAMES, PRODUCER_NAME,
};

/// IFEEL - Interpretable feature extraction of electricity loads
#[derive(Parser)]
#[command(name = "ifeel")]
#[command(version = IFEEL_VERSION)]
#[command(about = "Extract interpretable features from daily load profiles", long_about = None)]
struct Cli {
    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract global and peak-period features
    Extract {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Feature table to write
        #[arg(long, default_value = "all")]
        table: TableKind,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,

        #[command(flatten)]
        params: ExtractionArgs,

        /// Worker threads (default: all cores)
        #[arg(long)]
        threads: Option<usize>,

        /// Abort on the first profile that cannot be processed
        #[arg(long)]
        fail_fast: bool,
    },

    /// Emit the SAX word of every daily profile as CSV
    Transform {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Write letters or numeric codes
        #[arg(long, default_value = "letters")]
        symbols: SymbolArg,

        #[command(flatten)]
        params: ExtractionArgs,
    },

    /// Print feature column names
    Names {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Extraction parameters, from flags or a JSON config file
#[derive(Args)]
struct ExtractionArgs {
    /// JSON file with alphabet_size, business_hour_start, business_hour_end
    #[arg(long, conflicts_with_all = ["alphabet_size", "business_start", "business_end"])]
    config: Option<PathBuf>,

    /// SAX alphabet size (2-52)
    #[arg(long, required_unless_present = "config")]
    alphabet_size: Option<usize>,

    /// First business hour, inclusive (0-23)
    #[arg(long, required_unless_present = "config")]
    business_start: Option<u32>,

    /// Last business hour, inclusive (0-23)
    #[arg(long, required_unless_present = "config")]
    business_end: Option<u32>,

    /// Treatment of constant-valued days
    #[arg(long)]
    constant_profile: Option<ConstantArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TableKind {
    /// 13 global features
    Global,
    /// 8 peak-period features
    Peak,
    /// Both families (JSON formats only)
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Comma-separated values (one feature family)
    Csv,
    /// JSON document
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Newline-delimited JSON (one profile per line)
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum SymbolArg {
    Letters,
    Codes,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConstantArg {
    /// Normalize constant days to all zeros
    ZeroFill,
    /// Report constant days as failed
    Reject,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), IfeelCliError> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            table,
            output_format,
            params,
            threads,
            fail_fast,
        } => {
            let mut batch_config = BatchConfig::new().with_error_mode(if fail_fast {
                ErrorMode::FailFast
            } else {
                ErrorMode::CollectErrors
            });
            if let Some(threads) = threads {
                batch_config = batch_config.with_threads(threads);
            }
            cmd_extract(&input, &output, table, output_format, &params, batch_config)
        }

        Commands::Transform {
            input,
            output,
            symbols,
            params,
        } => cmd_transform(&input, &output, symbols, &params),

        Commands::Names { json } => cmd_names(json),
    }
}

fn cmd_extract(
    input: &Path,
    output: &Path,
    table_kind: TableKind,
    output_format: OutputFormat,
    params: &ExtractionArgs,
    batch_config: BatchConfig,
) -> Result<(), IfeelCliError> {
    if matches!(output_format, OutputFormat::Csv) && matches!(table_kind, TableKind::All) {
        return Err(IfeelCliError::Usage(
            "CSV output holds one feature family; pass --table global or --table peak".to_string(),
        ));
    }

    let config = params.resolve()?;
    let table = read_table(input)?;
    if table.is_empty() {
        return Err(IfeelCliError::NoProfiles);
    }

    let pipeline = FeaturePipeline::new(config, &table.slot_labels)?;
    let features = BatchProcessor::new(pipeline, batch_config).process_table(&table)?;
    if features.successful_count() == 0 {
        warn!(failed = features.failed_count(), "no profile could be processed");
    }

    let output_data = match output_format {
        OutputFormat::Csv => match table_kind {
            TableKind::Peak => FeatureTableEncoder::peak_csv(&features)?,
            _ => FeatureTableEncoder::global_csv(&features)?,
        },
        OutputFormat::Json => FeatureTableEncoder::to_json(&features, false)?,
        OutputFormat::JsonPretty => FeatureTableEncoder::to_json(&features, true)?,
        OutputFormat::Ndjson => FeatureTableEncoder::to_ndjson(&features)?,
    };
    write_output(output, &output_data)
}

fn cmd_transform(
    input: &Path,
    output: &Path,
    symbols: SymbolArg,
    params: &ExtractionArgs,
) -> Result<(), IfeelCliError> {
    let config = params.resolve()?;
    let table = read_table(input)?;
    let pipeline = FeaturePipeline::new(config, &table.slot_labels)?;

    let mut words = Vec::with_capacity(table.len());
    for row in &table.rows {
        match pipeline.transform_row(row) {
            Ok(profile) => words.push((row.id.clone(), profile)),
            Err(e) => warn!(id = %row.id, error = %e, "profile skipped"),
        }
    }

    let format = match symbols {
        SymbolArg::Letters => SymbolFormat::Letters,
        SymbolArg::Codes => SymbolFormat::Codes,
    };
    let output_data =
        FeatureTableEncoder::symbolic_csv(&table.index_name, &table.slot_labels, &words, format)?;
    write_output(output, &output_data)
}

fn cmd_names(json: bool) -> Result<(), IfeelCliError> {
    if json {
        let names = serde_json::json!({
            "producer": PRODUCER_NAME,
            "version": IFEEL_VERSION,
            "global": GLOBAL_FEATURE_NAMES,
            "peak": PEAK_FEATURE_NAMES,
        });
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        println!("Global features");
        println!("===============");
        for (i, name) in GLOBAL_FEATURE_NAMES.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, name);
        }
        println!();
        println!("Peak-period features");
        println!("====================");
        for (i, name) in PEAK_FEATURE_NAMES.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, name);
        }
        println!();
        println!("Longest periods, peak times and durations are in hours.");
        println!("Peak slopes are in symbols per sampling interval.");
    }
    Ok(())
}

// Helper functions

impl ExtractionArgs {
    fn resolve(&self) -> Result<ExtractionConfig, IfeelCliError> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::from_json(&fs::read_to_string(path)?)?,
            None => match (self.alphabet_size, self.business_start, self.business_end) {
                (Some(alphabet), Some(start), Some(end)) => {
                    ExtractionConfig::new(alphabet, start, end)
                }
                _ => {
                    return Err(IfeelCliError::Usage(
                        "--alphabet-size, --business-start and --business-end are required"
                            .to_string(),
                    ))
                }
            },
        };
        if let Some(policy) = self.constant_profile {
            config = config.with_constant_profile(match policy {
                ConstantArg::ZeroFill => ConstantProfilePolicy::ZeroFill,
                ConstantArg::Reject => ConstantProfilePolicy::Reject,
            });
        }
        config.validate()?;
        Ok(config)
    }
}

fn read_table(input: &Path) -> Result<LoadTable, IfeelCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            warn!("reading load table from an interactive terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };
    Ok(LoadTable::from_csv_str(&input_data)?)
}

fn write_output(output: &Path, data: &str) -> Result<(), IfeelCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum IfeelCliError {
    Io(io::Error),
    Compute(IfeelError),
    Json(serde_json::Error),
    Usage(String),
    NoProfiles,
}

impl From<io::Error> for IfeelCliError {
    fn from(e: io::Error) -> Self {
        IfeelCliError::Io(e)
    }
}

impl From<IfeelError> for IfeelCliError {
    fn from(e: IfeelError) -> Self {
        IfeelCliError::Compute(e)
    }
}

impl From<serde_json::Error> for IfeelCliError {
    fn from(e: serde_json::Error) -> Self {
        IfeelCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<IfeelCliError> for CliError {
    fn from(e: IfeelCliError) -> Self {
        match e {
            IfeelCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            IfeelCliError::Compute(e) => {
                let hint = match &e {
                    IfeelError::ParseError(_) => {
                        Some("Column headers after the index column must be HH:MM:SS".to_string())
                    }
                    IfeelError::InvalidConfig(_) => {
                        Some("Alphabet size is 2-52; business hours are 0-23 with start <= end".to_string())
                    }
                    IfeelError::RowFailed { .. } => {
                        Some("Drop --fail-fast to report failed profiles individually".to_string())
                    }
                    _ => None,
                };
                CliError {
                    code: "COMPUTE_ERROR".to_string(),
                    message: e.to_string(),
                    hint,
                }
            }
            IfeelCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            IfeelCliError::Usage(message) => CliError {
                code: "USAGE_ERROR".to_string(),
                message,
                hint: Some("Run with --help for usage".to_string()),
            },
            IfeelCliError::NoProfiles => CliError {
                code: "NO_PROFILES".to_string(),
                message: "Input table contains no daily profiles".to_string(),
                hint: Some("Ensure the CSV has a header row and at least one data row".to_string()),
            },
        }
    }
}
