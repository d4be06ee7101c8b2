//! IntelliPen command line
//!
//! Runs field discovery and correction against page snapshots (or live pages
//! with the `live` feature) and prints the results as JSON.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use intellipen::adapters::universal::get_field_label;
use intellipen::capability::apply_corrections;
use intellipen::dom::{self, Document};
use intellipen::{AdapterLoader, Correction, NodeId, PenConfig, TextFieldAdapter, TextFieldContext};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intellipen")]
#[command(version)]
#[command(about = "Text-field discovery and correction for web pages", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover and classify the text fields of a page
    Scan {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Apply a correction list to one discovered field
    Correct {
        #[command(flatten)]
        page: PageArgs,

        /// Index of the field in scan order
        #[arg(long, default_value = "0")]
        field: usize,

        /// JSON file holding the corrections
        #[arg(long, value_name = "FILE")]
        corrections: PathBuf,
    },
    /// Print the adapter chosen for a hostname
    Resolve { hostname: String },
}

#[derive(Args)]
struct PageArgs {
    /// Page snapshot JSON file
    #[arg(long, value_name = "FILE", conflicts_with = "url", required_unless_present = "url")]
    snapshot: Option<PathBuf>,

    /// Page to capture with headless Chrome
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Hostname to pick adapters for, instead of the page's own
    #[arg(long, value_name = "NAME")]
    host: Option<String>,

    /// Show the browser window while capturing
    #[arg(long)]
    headed: bool,
}

#[derive(Serialize)]
struct FieldReport {
    index: usize,
    node: NodeId,
    tag: String,
    label: Option<String>,
    context: TextFieldContext,
    text: String,
}

#[derive(Serialize)]
struct ScanReport {
    url: String,
    adapter: String,
    fields: Vec<FieldReport>,
}

#[derive(Serialize)]
struct CorrectReport {
    field: usize,
    proposed: usize,
    applied: usize,
    text: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PenConfig::from_json_file(path)?,
        None => PenConfig::default(),
    };
    let loader = AdapterLoader::new(config);

    match cli.command {
        Command::Resolve { hostname } => {
            println!("{}", loader.resolve_adapter(&hostname));
        }
        Command::Scan { page } => {
            let doc = load_page(&page)?;
            let host = page.host.clone().unwrap_or_else(|| doc.hostname());
            let report = loader.load_adapters_for_current_site(&host).await;
            let adapter = loader.create_adapter(report.effective_adapter())?;

            let fields = adapter
                .discover_fields(&doc, doc.root())?
                .into_iter()
                .enumerate()
                .map(|(index, node)| FieldReport {
                    index,
                    node,
                    tag: doc.tag_name(node).unwrap_or_default().to_string(),
                    label: get_field_label(&doc, node),
                    context: adapter.classify_field(&doc, node),
                    text: adapter.read_text(&doc, node),
                })
                .collect();

            let scan = ScanReport {
                url: doc.url().to_string(),
                adapter: report.effective_adapter().to_string(),
                fields,
            };
            println!("{}", serde_json::to_string_pretty(&scan)?);
        }
        Command::Correct { page, field, corrections } => {
            let mut doc = load_page(&page)?;
            let host = page.host.clone().unwrap_or_else(|| doc.hostname());
            let report = loader.load_adapters_for_current_site(&host).await;
            let adapter = loader.create_adapter(report.effective_adapter())?;

            let fields = adapter.discover_fields(&doc, doc.root())?;
            let Some(&element) = fields.get(field) else {
                bail!("Field {} not found, page has {} field(s)", field, fields.len());
            };

            let json = std::fs::read_to_string(&corrections)
                .with_context(|| format!("Failed to read {}", corrections.display()))?;
            let corrections: Vec<Correction> = serde_json::from_str(&json).context("Invalid corrections JSON")?;

            let applied = apply_corrections(&mut doc, adapter.as_ref(), element, &corrections)?;
            let result = CorrectReport {
                field,
                proposed: corrections.len(),
                applied,
                text: adapter.read_text(&doc, element),
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn load_page(page: &PageArgs) -> Result<Document> {
    if let Some(path) = &page.snapshot {
        let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(dom::load_document(&json)?);
    }

    let Some(url) = &page.url else {
        bail!("Either --snapshot or --url is required");
    };
    capture(url, page.headed)
}

#[cfg(feature = "live")]
fn capture(url: &str, headed: bool) -> Result<Document> {
    let options = dom::live::CaptureOptions::new().headless(!headed);
    let snapshot = dom::live::capture_page(url, &options)?;
    Ok(Document::from_snapshot(&snapshot))
}

#[cfg(not(feature = "live"))]
fn capture(url: &str, _headed: bool) -> Result<Document> {
    bail!("Capturing {} requires the `live` feature", url)
}
