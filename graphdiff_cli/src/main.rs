use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use graphdiff_common::{load_config, ComparisonOptions, DiffDefaults, DiffOptions, Value};
use graphdiff_core::{
    load_document, Difference, DiffProvider, DocumentFormat, LineDiffOptions, MemberFilter,
    SegmentKind, TextDiffEngine, TextDifferences,
};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Process exit code when the inputs differ
const EXIT_DIFFERENT: i32 = 2;
const EXIT_ERROR: i32 = 1;

#[derive(Parser)]
#[command(name = "graphdiff")]
#[command(author = "graphdiff contributors")]
#[command(version)]
#[command(about = "Structural diff of JSON, YAML and TOML documents, and Myers text diff", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two documents member by member
    Compare(CompareArgs),
    /// Compare two text files line by line or word by word
    Text(TextArgs),
}

#[derive(Args)]
struct CompareArgs {
    /// Left document
    left: PathBuf,

    /// Right document
    right: PathBuf,

    /// Document format; `auto` picks it from the file extension
    #[arg(short, long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    /// Stop descending below this depth (0 is unlimited)
    #[arg(short = 'd', long)]
    max_depth: Option<usize>,

    /// Member name or dotted path to skip (can be specified multiple times)
    #[arg(short, long, conflicts_with = "include")]
    exclude: Vec<String>,

    /// Member name or dotted path to compare exclusively (can be specified multiple times)
    #[arg(short, long)]
    include: Vec<String>,

    /// Do not extend included paths to their descendants
    #[arg(long)]
    no_inherit: bool,

    /// Match collection elements regardless of order
    #[arg(short, long)]
    unordered: bool,

    /// Treat an empty collection and a missing one as equal
    #[arg(long)]
    empty_equals_null: bool,

    /// Skip collections entirely
    #[arg(long)]
    no_collections: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file (defaults to the per-user graphdiff.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct TextArgs {
    /// Left text file
    left: PathBuf,

    /// Right text file
    right: PathBuf,

    /// Compare words instead of lines
    #[arg(short, long)]
    words: bool,

    /// Ignore leading and trailing whitespace
    #[arg(short, long)]
    trim: bool,

    /// Treat runs of whitespace as a single space
    #[arg(long)]
    ignore_space: bool,

    /// Compare case-insensitively
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Auto,
    Json,
    Yaml,
    Toml,
}

impl FormatArg {
    fn document_format(self) -> Option<DocumentFormat> {
        match self {
            FormatArg::Auto => None,
            FormatArg::Json => Some(DocumentFormat::Json),
            FormatArg::Yaml => Some(DocumentFormat::Yaml),
            FormatArg::Toml => Some(DocumentFormat::Toml),
        }
    }
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    // Usage errors exit with 1; 2 is reserved for "inputs differ"
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_ERROR } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let outcome = match cli.command {
        Commands::Compare(args) => run_compare(args).context("Compare failed"),
        Commands::Text(args) => run_text(args).context("Text diff failed"),
    };

    match outcome {
        Ok(true) => std::process::exit(EXIT_DIFFERENT),
        Ok(false) => {}
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(EXIT_ERROR);
        }
    }
}

/// Returns whether the documents differ
fn run_compare(args: CompareArgs) -> Result<bool> {
    let loaded = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if loaded.exists {
        debug!("Loaded configuration from {}", loaded.path.display());
    }
    let config = loaded.config;

    DiffDefaults::from_config(&config)
        .install()
        .context("Failed to install diff defaults")?;

    // Documents carry no declared types, so mixed shapes are reported rather than rejected
    let mut options = config.comparison_options()?;
    options.insert(ComparisonOptions::ALLOW_COMPARE_DIFFERENT_OBJECTS);
    if args.unordered {
        options.insert(ComparisonOptions::ALLOW_COLLECTIONS_OUT_OF_ORDER);
    }
    if args.empty_equals_null {
        options.insert(ComparisonOptions::TREAT_EMPTY_AND_NULL_COLLECTIONS_EQUAL);
    }
    if args.no_collections {
        options.remove(ComparisonOptions::COMPARE_COLLECTIONS);
    }

    let mut include = config.include.clone();
    include.extend(args.include.iter().cloned());
    let mut exclude = config.exclude.clone();
    exclude.extend(args.exclude.iter().cloned());

    let filter_list = if include.is_empty() {
        exclude
    } else {
        if !exclude.is_empty() {
            warn!("Both include and exclude lists given; the exclude list is ignored");
        }
        options.insert(ComparisonOptions::INCLUDE_LIST);
        if args.no_inherit {
            options.insert(ComparisonOptions::INCLUDE_LIST_NO_INHERITANCE);
        }
        include
    };
    let filter = MemberFilter::new(options, &filter_list);
    let max_depth = args.max_depth.or(config.max_depth);

    info!("Comparing:");
    info!("  Left:  {}", args.left.display());
    info!("  Right: {}", args.right.display());

    let format = args.format.document_format();
    let left = load_document(&args.left, format)
        .with_context(|| format!("Failed to load {}", args.left.display()))?;
    let right = load_document(&args.right, format)
        .with_context(|| format!("Failed to load {}", args.right.display()))?;

    let differences = DiffProvider::new().diff_values(
        &left,
        &right,
        max_depth,
        options,
        &DiffOptions::default(),
        &filter,
    )?;
    info!("Found {} differences", differences.len());

    if args.json {
        let report = CompareReport {
            left: args.left.display().to_string(),
            right: args.right.display().to_string(),
            identical: differences.is_empty(),
            total: differences.len(),
            differences: differences.iter().map(JsonDifference::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_differences(&differences);
    }

    Ok(!differences.is_empty())
}

fn print_differences(differences: &[Difference]) {
    let use_color = std::io::stdout().is_terminal();

    if differences.is_empty() {
        println!("No differences");
        return;
    }

    for difference in differences {
        let (color, reset) = if !use_color {
            ("", "")
        } else if difference.is_addition() {
            ("\x1b[32m", "\x1b[0m") // Green
        } else if difference.is_removal() {
            ("\x1b[31m", "\x1b[0m") // Red
        } else {
            ("\x1b[33m", "\x1b[0m") // Yellow
        };
        println!("{}{:#}{}", color, difference, reset);
    }
    println!("\n{} differences", differences.len());
}

/// Returns whether the texts differ
fn run_text(args: TextArgs) -> Result<bool> {
    let left = read_text(&args.left)?;
    let right = read_text(&args.right)?;

    let engine = TextDiffEngine::with_options(LineDiffOptions {
        trim_space: args.trim,
        ignore_space: args.ignore_space,
        ignore_case: args.ignore_case,
    });
    let result = if args.words {
        engine.diff_words_full(&left, &right)
    } else {
        engine.diff_lines(&left, &right)
    };
    debug!(
        "{} additions, {} deletions",
        result.additions.len(),
        result.deletions.len()
    );

    if args.json {
        let report = TextReport::new(&args, &result);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_segments(&result, args.words);
    }

    Ok(result.has_changes())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_segments(result: &TextDifferences, words: bool) {
    let use_color = std::io::stdout().is_terminal();

    for segment in &result.segments {
        if words && segment.kind == SegmentKind::Unchanged {
            continue;
        }
        let (marker, color) = match segment.kind {
            SegmentKind::Unchanged => (' ', ""),
            SegmentKind::Deleted => ('-', "\x1b[31m"),
            SegmentKind::Inserted => ('+', "\x1b[32m"),
        };
        if use_color && !color.is_empty() {
            println!("{}{}{}\x1b[0m", color, marker, segment.text);
        } else {
            println!("{}{}", marker, segment.text);
        }
    }
}

#[derive(Serialize)]
struct CompareReport {
    left: String,
    right: String,
    identical: bool,
    total: usize,
    differences: Vec<JsonDifference>,
}

#[derive(Serialize)]
struct JsonDifference {
    path: String,
    property: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    array_index: Option<usize>,
    property_type: String,
    left: Option<String>,
    right: Option<String>,
    delta: Option<String>,
}

impl From<&Difference> for JsonDifference {
    fn from(difference: &Difference) -> Self {
        Self {
            path: difference.path.clone(),
            property: difference.property.clone(),
            array_index: difference.array_index,
            property_type: difference.property_type.to_string(),
            left: difference.left_value.as_ref().map(value_text),
            right: difference.right_value.as_ref().map(value_text),
            delta: difference.delta.as_ref().map(|d| d.to_string()),
        }
    }
}

// Strings unquoted; everything else in display form
fn value_text(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

#[derive(Serialize)]
struct TextReport {
    left: String,
    right: String,
    mode: &'static str,
    identical: bool,
    additions: Vec<String>,
    deletions: Vec<String>,
}

impl TextReport {
    fn new(args: &TextArgs, result: &TextDifferences) -> Self {
        Self {
            left: args.left.display().to_string(),
            right: args.right.display().to_string(),
            mode: if args.words { "words" } else { "lines" },
            identical: !result.has_changes(),
            additions: result.additions.clone(),
            deletions: result.deletions.clone(),
        }
    }
}
