//! Command-line access to the chart renderer and the AI helpers.
//!
//! Usage:
//!   cargo run --bin ikigai-chart -- render --input responses.json --output chart.png
//!   cargo run --bin ikigai-chart -- placeholder --output preview.png
//!   cargo run --bin ikigai-chart -- suggest --pillar love --text "painting"
//!   cargo run --bin ikigai-chart -- tips --input responses.json

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ikigai_pathway::chart::{ChartFormat, ChartOptions, ChartRenderer, ColorScheme, DEFAULT_SIZE_PX};
use ikigai_pathway::clients::create_generator;
use ikigai_pathway::config::{Config, RuntimeConfig};
use ikigai_pathway::enrich::{Enricher, Enrichment};
use ikigai_pathway::pillar::PillarResponses;

#[derive(Parser)]
#[command(name = "ikigai-chart")]
#[command(about = "Render ikigai charts and query the suggestion helpers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a chart from a JSON object of pillar -> [responses]
    Render {
        /// Responses file, or "-" for stdin
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Optional color scheme JSON file
        #[arg(long)]
        colors: Option<PathBuf>,
        /// png or svg; defaults to the output file extension
        #[arg(long)]
        format: Option<ChartFormat>,
        #[arg(long, default_value_t = DEFAULT_SIZE_PX)]
        size: u32,
    },
    /// Render the empty preview chart
    Placeholder {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SIZE_PX)]
        size: u32,
    },
    /// Ask for clarifying suggestions for one pillar
    Suggest {
        #[arg(long)]
        pillar: String,
        #[arg(long)]
        text: String,
    },
    /// Generate workplace tips from a responses file
    Tips {
        /// Responses file, or "-" for stdin
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    ikigai_pathway::load_env();
    ikigai_pathway::init_tracing("ikigai_pathway=warn");

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            colors,
            format,
            size,
        } => render(&input, &output, colors.as_deref(), format, size),
        Commands::Placeholder { output, size } => placeholder(&output, size),
        Commands::Suggest { pillar, text } => suggest(&pillar, &text).await,
        Commands::Tips { input } => tips(&input).await,
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_responses(path: &Path) -> Result<PillarResponses> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid responses JSON in {}", path.display()))
}

fn format_for(output: &Path, explicit: Option<ChartFormat>) -> ChartFormat {
    explicit.unwrap_or_else(|| {
        output
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or_default()
    })
}

fn render(
    input: &Path,
    output: &Path,
    colors: Option<&Path>,
    format: Option<ChartFormat>,
    size: u32,
) -> Result<()> {
    let responses = read_responses(input)?;
    let scheme: Option<ColorScheme> = match colors {
        Some(path) => Some(
            serde_json::from_str(&read_input(path)?)
                .with_context(|| format!("Invalid color scheme JSON in {}", path.display()))?,
        ),
        None => None,
    };

    let renderer = ChartRenderer::new(ChartOptions {
        size_px: size,
        format: format_for(output, format),
    })?;
    let image = renderer.render(&responses, scheme.as_ref())?;
    std::fs::write(output, &image.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "✅ Wrote {} ({} bytes, {} response(s))",
        output.display(),
        image.bytes.len(),
        responses.total()
    );
    Ok(())
}

fn placeholder(output: &Path, size: u32) -> Result<()> {
    let renderer = ChartRenderer::new(ChartOptions {
        size_px: size,
        format: format_for(output, None),
    })?;
    let image = renderer.render_placeholder()?;
    std::fs::write(output, &image.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("✅ Wrote {} ({} bytes)", output.display(), image.bytes.len());
    Ok(())
}

/// The CLI never touches storage, so a config it cannot load only costs the AI settings
fn enricher() -> Enricher {
    let (ai, runtime) = match Config::load() {
        Ok(config) => (config.ai, config.runtime),
        Err(e) => {
            eprintln!("⚠️  Config not loaded ({}), using defaults", e);
            (Default::default(), RuntimeConfig::load_from_env())
        }
    };
    Enricher::new(create_generator(&ai, &runtime))
}

fn print_list(title: &str, result: &Enrichment<Vec<String>>) {
    println!("{} (source: {})", title, result.source());
    if let Enrichment::Fallback { reason, .. } = result {
        println!("  note: {}", reason);
    }
    for (i, item) in result.value().iter().enumerate() {
        println!("  {}. {}", i + 1, item);
    }
}

async fn suggest(pillar: &str, text: &str) -> Result<()> {
    let result = enricher().suggest_for_key(text, pillar).await;
    print_list("Suggestions", &result);
    Ok(())
}

async fn tips(input: &Path) -> Result<()> {
    let responses = read_responses(input)?;
    let result = enricher().tips(&responses).await;
    print_list("Workplace tips", &result);
    Ok(())
}
