// Triage CLI - AI-assisted incident log analysis

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use triage_core::{
    load_config, Format, LogSource, OutputParser, ParsedAnalysis, ParserRegistry, TriageConfig,
};
use triage_llm::{AnalysisEngine, ConnectionStatus, ProgressSink};

const SAMPLE_INCIDENT: &str = include_str!("../../../sample-data/sample_incident.log");

#[derive(Parser)]
#[command(name = "triage")]
#[command(author = "Triage Team")]
#[command(version = "0.1.0")]
#[command(about = "Incident log root-cause analysis with a local LLM", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long, env = "TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    /// OpenAI-compatible base URL (overrides config)
    #[arg(long, env = "OLLAMA_BASE_URL")]
    base_url: Option<String>,

    /// Model identifier (overrides config)
    #[arg(short, long, env = "OLLAMA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the canonical text a log file is turned into
    Parse {
        /// Path to log file (.json, .csv, .log, .txt)
        file: PathBuf,

        /// Force a format instead of detecting it (json, csv, text)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Analyze a log file for root causes
    Analyze {
        /// Path to log file
        file: PathBuf,

        /// Force a format instead of detecting it (json, csv, text)
        #[arg(short, long)]
        format: Option<String>,

        /// Print the parsed sections as JSON
        #[arg(long)]
        json: bool,

        /// Also print the canonical log text sent for analysis
        #[arg(long)]
        show_parsed: bool,
    },

    /// Analyze the bundled sample incident
    Demo {
        /// Print the parsed sections as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the LLM endpoint is reachable and answering
    Check,
}

/// Drives an indicatif bar from engine milestones
struct BarSink(ProgressBar);

impl ProgressSink for BarSink {
    fn report(&self, percent: u8, message: &str) {
        self.0.set_position(u64::from(percent));
        self.0.set_message(message.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    match cli.command {
        Commands::Parse { file, format } => {
            let source = read_source(&file, format.as_deref())?;
            show_parsed(&config, &source);
        }
        Commands::Analyze {
            file,
            format,
            json,
            show_parsed: show,
        } => {
            let source = read_source(&file, format.as_deref())?;
            if show {
                show_parsed(&config, &source);
            }
            analyze(&config, &source, json).await?;
        }
        Commands::Demo { json } => {
            let source = LogSource::with_format("sample_incident.log", SAMPLE_INCIDENT, Format::Text);
            analyze(&config, &source, json).await?;
        }
        Commands::Check => {
            check_connection(&config).await?;
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<TriageConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TriageConfig::from_env(),
    };
    if let Some(url) = &cli.base_url {
        config.llm.base_url = url.clone();
    }
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    debug!(base_url = %config.llm.base_url, model = %config.llm.model, "Configuration loaded");
    Ok(config)
}

fn read_source(file: &Path, format: Option<&str>) -> Result<LogSource, Box<dyn std::error::Error>> {
    let mut source = LogSource::from_path(file)?;
    if let Some(hint) = format {
        source.format = Format::from_hint(hint)
            .ok_or_else(|| format!("Unknown format '{}' (expected json, csv or text)", hint))?;
    }
    Ok(source)
}

fn show_parsed(config: &TriageConfig, source: &LogSource) {
    println!("\n{} {}", "📄 Source:".cyan().bold(), source.name);
    println!("{} {}", "Format:".dimmed(), source.format);
    println!("{}", "─".repeat(60).dimmed());

    let outcome = ParserRegistry::from_config(config).parse_source(source);
    if let Some(diagnostic) = outcome.diagnostic() {
        println!("{} {}", "Parsing degraded:".yellow().bold(), diagnostic);
    }
    println!("{}", outcome.text());
}

async fn analyze(
    config: &TriageConfig,
    source: &LogSource,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = AnalysisEngine::from_config(config)?;
    let canonical = ParserRegistry::from_config(config)
        .parse_source(source)
        .into_text();

    println!(
        "\n{} {} {}",
        "🔎 Analyzing".cyan().bold(),
        source.name,
        format!("({}, model {})", source.format, engine.model()).dimmed()
    );

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
            .progress_chars("#>-"),
    );
    let sink = BarSink(pb.clone());

    let result = engine.run(&canonical, Some(&sink)).await;
    pb.finish_and_clear();

    let text = match result {
        Ok(report) => report.text,
        Err(e) => {
            eprintln!("\n{} {}", "Analysis failed:".red().bold(), engine.describe_error(&e));
            std::process::exit(1);
        }
    };

    let parsed = OutputParser::new().parse(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print_sections(&parsed);
    }
    Ok(())
}

fn print_sections(parsed: &ParsedAnalysis) {
    if !parsed.thinking.is_empty() {
        println!("\n{}", "🧠 Reasoning".magenta().bold());
        println!("{}", parsed.thinking.dimmed());
    }

    if !parsed.step_analysis.is_empty() {
        println!("\n{}", "🔍 Analysis".cyan().bold());
        println!("{}", "─".repeat(60).dimmed());
        println!("{}", parsed.step_analysis);
    }

    if !parsed.tldr.is_empty() {
        println!("\n{}", "📋 TLDR".green().bold());
        println!("{}", parsed.tldr.green());
    }

    if !parsed.metadata.is_empty() {
        println!("\n{}", "─".repeat(60).dimmed());
        println!("{}", parsed.metadata.dimmed());
    }
}

async fn check_connection(config: &TriageConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", "🔧 LLM Connection".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let engine = AnalysisEngine::from_config(config)?;
    let report = engine.validate_connection().await;

    let status = match report.status {
        ConnectionStatus::Connected => "✓ Connected".green().to_string(),
        ConnectionStatus::Error => "✗ Error".red().to_string(),
    };
    let validation = if report.validation_passed {
        "✓ Passed".green().to_string()
    } else {
        "✗ Failed".red().to_string()
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Endpoint".to_string(), config.llm.base_url.clone()]);
    table.add_row(vec!["Model".to_string(), report.model.clone()]);
    table.add_row(vec!["Status".to_string(), status]);
    table.add_row(vec!["Response time".to_string(), format!("{} ms", report.response_time_ms)]);
    table.add_row(vec!["Validation".to_string(), validation]);
    if let Some(response) = &report.response {
        table.add_row(vec!["Response".to_string(), response.clone()]);
    }
    if let Some(error) = &report.error {
        table.add_row(vec!["Error".to_string(), error.clone()]);
    }
    table.add_row(vec!["Checked at".to_string(), report.timestamp.clone()]);

    println!("{table}");
    Ok(())
}
