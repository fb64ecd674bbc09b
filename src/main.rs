use anyhow::Context;
use clap::{Args, ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use piisense::detectors::EntityFileRecognizer;
use piisense::{DetectionEngine, DetectionReport, FailurePolicy, PiiConfig};
use std::io::{IsTerminal, stdout};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV_VAR: &str = "PIISENSE_LOG";

/// Characters of each input echoed in human output
const PREVIEW_CHARS: usize = 50;

/// PII found with `--fail-on-detect`, or a detection layer failed
const EXIT_DETECTED: i32 = 1;
/// Bad usage, configuration or input
const EXIT_USAGE: i32 = 2;
/// Output could not be serialized
const EXIT_INTERNAL: i32 = 3;

#[derive(Parser)]
#[command(
    name = "piisense",
    about = "Detect personally identifiable information in free text",
    arg_required_else_help = true
)]
struct Cli {
    /// Disable color
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Config file to use instead of PIISENSE_CONFIG or the user config
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect PII in one or more texts
    Detect(DetectArgs),
    /// Show or initialize the configuration
    Config(ConfigArgs),
    /// Print the JSON schema of the detection report
    Schema,
}

#[derive(Args, Clone)]
struct DetectArgs {
    /// Texts to analyze; reads stdin when none are given
    #[arg(value_name = "TEXT", conflicts_with = "file")]
    texts: Vec<String>,

    /// Read the text to analyze from a file
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// JSON file of entities produced by an external recognizer
    #[arg(long, value_name = "PATH")]
    entities: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Minimum fused confidence to report
    #[arg(long, value_name = "X")]
    min_confidence: Option<f64>,

    /// Entropy above which a span counts as random
    #[arg(long, value_name = "X")]
    entropy_threshold: Option<f64>,

    /// Characters inspected on each side of a span
    #[arg(long, value_name = "N")]
    context_window: Option<usize>,

    /// Continue with the remaining layer when one layer fails
    #[arg(long)]
    degrade: bool,

    /// Exit with status 1 when any PII is found
    #[arg(long)]
    fail_on_detect: bool,
}

#[derive(Args, Clone)]
struct ConfigArgs {
    /// Write the default configuration file
    #[arg(long, conflicts_with = "path")]
    init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    force: bool,

    /// Print the configuration file path
    #[arg(long)]
    path: bool,
}

fn load_config(explicit: Option<&Path>) -> Result<PiiConfig, i32> {
    let loaded = match explicit {
        Some(path) => PiiConfig::from_file(path),
        None => PiiConfig::load(),
    };
    loaded.map_err(|e| {
        eprintln!("Error: {}", e);
        EXIT_USAGE
    })
}

fn read_inputs(args: &DetectArgs) -> anyhow::Result<Vec<String>> {
    if let Some(path) = &args.file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        return Ok(vec![content]);
    }
    if !args.texts.is_empty() {
        return Ok(args.texts.clone());
    }
    let content = std::io::read_to_string(std::io::stdin()).context("cannot read stdin")?;
    Ok(vec![content])
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn render_human(text: &str, report: &DetectionReport, color: bool, out: &mut String) {
    let heading = format!("Analyzing: {}", preview(text));
    if color {
        out.push_str(&heading.bold().cyan().to_string());
    } else {
        out.push_str(&heading);
    }

    for layer in &report.degraded_layers {
        let warning = format!("Warning: {} layer failed and was skipped", layer);
        out.push('\n');
        if color {
            out.push_str(&warning.yellow().to_string());
        } else {
            out.push_str(&warning);
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "Found {} PII elements:",
        report.summary.total_pii_found
    ));
    for pii in &report.pii_detected {
        let pii_type = if color {
            pii.pii_type.yellow().to_string()
        } else {
            pii.pii_type.clone()
        };
        out.push('\n');
        out.push_str(&format!(
            "  - {}: '{}' (confidence: {}, layer: {}, position: {}..{})",
            pii_type, pii.text, pii.confidence, pii.layer, pii.position[0], pii.position[1]
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "Average confidence: {}",
        report.summary.average_confidence
    ));
}

fn run_detect(args: DetectArgs, config_path: Option<&Path>, color: ColorChoice) -> Result<(), i32> {
    let mut config = load_config(config_path)?;
    if let Some(min) = args.min_confidence {
        config.validation.min_confidence = min;
    }
    if let Some(threshold) = args.entropy_threshold {
        config.validation.entropy_threshold = threshold;
    }
    if let Some(window) = args.context_window {
        config.context.window = window;
    }
    if args.degrade {
        config.engine.on_detector_failure = FailurePolicy::Degrade;
    }

    let mut engine = match DetectionEngine::new(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(EXIT_USAGE);
        }
    };

    let inputs = match read_inputs(&args) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Err(EXIT_USAGE);
        }
    };

    if let Some(path) = &args.entities {
        if inputs.len() != 1 {
            eprintln!("Error: --entities can only be used with a single input text");
            return Err(EXIT_USAGE);
        }
        engine = engine.with_recognizer(EntityFileRecognizer::new(path));
    }

    let texts: Vec<&str> = inputs.iter().map(String::as_str).collect();
    let mut reports = Vec::with_capacity(texts.len());
    for result in engine.detect_batch(&texts) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("Error: {}", e);
                return Err(EXIT_DETECTED);
            }
        }
    }

    if args.json {
        let rendered = if reports.len() == 1 {
            serde_json::to_string_pretty(&reports[0])
        } else {
            serde_json::to_string_pretty(&reports)
        };
        match rendered {
            Ok(s) => println!("{}", s),
            Err(_) => return Err(EXIT_INTERNAL),
        }
    } else {
        let want_color = stdout().is_terminal() && !matches!(color, ColorChoice::Never);
        let mut out = String::new();
        for (i, (text, report)) in texts.iter().zip(&reports).enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            render_human(text, report, want_color, &mut out);
        }
        println!("{}", out);
    }

    if args.fail_on_detect && reports.iter().any(|r| !r.is_empty()) {
        return Err(EXIT_DETECTED);
    }
    Ok(())
}

fn run_config(args: ConfigArgs, config_path: Option<&Path>) -> Result<(), i32> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(PiiConfig::config_file_path);

    if args.path {
        match path {
            Some(p) => println!("{}", p.display()),
            None => {
                eprintln!("Error: no configuration directory available");
                return Err(EXIT_USAGE);
            }
        }
        return Ok(());
    }

    if args.init {
        let Some(path) = path else {
            eprintln!("Error: no configuration directory available");
            return Err(EXIT_USAGE);
        };
        if path.exists() && !args.force {
            eprintln!(
                "Error: {} already exists (use --force to overwrite)",
                path.display()
            );
            return Err(EXIT_USAGE);
        }
        if let Err(e) = PiiConfig::default().save(&path) {
            eprintln!("Error: {}", e);
            return Err(EXIT_USAGE);
        }
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = load_config(config_path)?;
    match config.to_toml() {
        Ok(s) => print!("{}", s),
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(EXIT_INTERNAL);
        }
    }
    Ok(())
}

fn run_schema() -> Result<(), i32> {
    let schema = schemars::schema_for!(DetectionReport);
    match serde_json::to_string_pretty(&schema) {
        Ok(s) => println!("{}", s),
        Err(_) => return Err(EXIT_INTERNAL),
    }
    Ok(())
}

fn detect_color_choice() -> ColorChoice {
    // Looked up before clap runs so its help and error output stay plain too.
    // Anything after `--` is a text to analyze, not a flag.
    let no_color_flag = std::env::args_os()
        .skip(1)
        .take_while(|arg| arg != "--")
        .any(|arg| arg == "--no-color");
    let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    if no_color_flag || no_color_env {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn init_logging(verbose: bool, color: ColorChoice) {
    let fallback = if verbose { "piisense=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!matches!(color, ColorChoice::Never) && std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() {
    let color = detect_color_choice();
    let matches = Cli::command().color(color).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    init_logging(cli.verbose, color);

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Some(Commands::Detect(args)) => run_detect(args, config_path, color),
        Some(Commands::Config(args)) => run_config(args, config_path),
        Some(Commands::Schema) => run_schema(),
        None => Ok(()),
    };
    if let Err(code) = result {
        std::process::exit(code);
    }
}
