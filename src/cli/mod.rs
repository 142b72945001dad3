//! Command line interface for receiptfold.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::llm::{decode_stores, price_points, repair::repair, LlmClient};
use crate::models::{AnalysisRequest, ReceiptRecord};
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::repository::{
    MemoryReceiptRepository, MemoryShoppingListRepository, ReceiptRepository,
    ShoppingListRepository,
};
use crate::services::AnalysisService;

#[derive(Parser)]
#[command(name = "rfold")]
#[command(about = "Receipt analysis and family shopping list consolidation")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze receipt text files and fold them into a shopping list
    Analyze {
        /// Family id that owns the shopping list
        #[arg(long, default_value = "local")]
        family: String,

        /// Email used for the notification
        #[arg(long, default_value = "local@localhost")]
        email: String,

        /// Analysis request JSON file; overrides --family and --email
        #[arg(long)]
        request: Option<PathBuf>,

        /// Receipt text files (OCR output), one per receipt
        #[arg(required = true)]
        receipts: Vec<PathBuf>,

        /// Print the merged list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a saved model response without running the pipeline
    Decode {
        /// File containing the raw model response
        input: PathBuf,

        /// Print the repaired JSON text instead of decoded bundles
        #[arg(long)]
        repaired: bool,

        /// Project item/price pairs onto flat price records
        #[arg(long)]
        prices: bool,
    },

    /// Check extraction model availability
    Check,
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            family,
            email,
            request,
            receipts,
            json,
        } => cmd_analyze(&settings, family, email, request, receipts, json).await,
        Commands::Decode {
            input,
            repaired,
            prices,
        } => cmd_decode(&input, repaired, prices),
        Commands::Check => cmd_check(&settings).await,
    }
}

/// Run the full pipeline over receipt text files.
async fn cmd_analyze(
    settings: &Settings,
    family: String,
    email: String,
    request_path: Option<PathBuf>,
    receipt_paths: Vec<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let request: AnalysisRequest = match request_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => AnalysisRequest::new(family, email),
    };

    let receipt_repo = Arc::new(MemoryReceiptRepository::new());
    for path in &receipt_paths {
        let text = std::fs::read_to_string(path)?;
        let receipt = ReceiptRecord::new(&request.family_id, &request.user_email, text)
            .with_source_blob(path.display().to_string());
        receipt_repo.save(&receipt).await?;
    }

    let list_repo = Arc::new(MemoryShoppingListRepository::new());
    let extractor = Arc::new(LlmClient::new(settings.llm.clone())?);
    let notifier: Arc<dyn Notifier> = match &settings.notify.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url)?),
        None => Arc::new(LogNotifier),
    };

    let service = AnalysisService::new(
        receipt_repo.clone(),
        list_repo.clone(),
        extractor,
        notifier,
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("extracting receipt data...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcome = service.run(&request).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    if outcome.list_id.is_none() {
        println!(
            "{}",
            style("No unprocessed receipts; nothing to do.").yellow()
        );
        return Ok(());
    }

    let list = list_repo
        .get(&request.family_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("merged list was not persisted"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        println!("\n{}", style(format!("Shopping list {}", list.id)).bold());
        for (store, items) in &list.store_items {
            println!("\n  {}", style(store).cyan());
            for item in items {
                println!("    - {item}");
            }
        }
        println!(
            "\n{} receipt(s) processed, {} new item(s), {} store(s)",
            outcome.receipts_processed, outcome.new_items, outcome.stores_touched
        );
    }

    Ok(())
}

/// Inspect a saved model response.
fn cmd_decode(input: &std::path::Path, repaired: bool, prices: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(input)?;

    if repaired {
        println!("{}", repair(&raw));
        return Ok(());
    }

    if prices {
        let points = price_points(&raw);
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    let stores = decode_stores(&raw);
    println!("{}", serde_json::to_string_pretty(&stores)?);
    Ok(())
}

/// Report extraction model availability.
async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Model Status").bold());
    println!("{}", "-".repeat(50));

    let client = LlmClient::new(settings.llm.clone())?;
    let status = if client.is_available().await {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<10} {}", "endpoint", settings.llm.endpoint);
    println!("  {:<10} {}", "model", settings.llm.model);
    println!("  {:<10} {}", "status", status);

    match client.list_models().await {
        Ok(models) if !models.is_empty() => {
            println!("\n{}", style("Installed models:").cyan());
            for model in models {
                println!("  {model}");
            }
        }
        Ok(_) => println!("\n{}", style("No models installed.").yellow()),
        Err(e) => println!("\n{}", style(format!("Could not list models: {e}")).dim()),
    }

    Ok(())
}
