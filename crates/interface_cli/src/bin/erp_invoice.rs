//! ERP Invoice - Command-line Client
//!
//! Submits incoming invoices to the ERP and inspects its supplier directory.
//!
//! # Usage
//!
//! ```bash
//! # Render the XML that would be sent
//! erp-invoice preview draft.json
//!
//! # Submit an invoice
//! ERP_BASE_URL=https://erp.example.com:443 ERP_LOGIN=api ERP_PASSWORD=... \
//!     erp-invoice submit draft.json
//!
//! # List suppliers
//! erp-invoice suppliers
//!
//! # Hash a password for ERP_PASSWORD_SHA1
//! erp-invoice hash-password 's3cret'
//! ```
//!
//! # Environment Variables
//!
//! * `ERP_BASE_URL` - ERP server URL
//! * `ERP_LOGIN` - Login name
//! * `ERP_PASSWORD` / `ERP_PASSWORD_SHA1` - Password, plain or pre-hashed
//! * `ERP_VERIFY_SSL` - Verify TLS certificates (default: true)
//! * `ERP_TIMEOUT_SECS` - Request timeout (default: 30)
//! * `ERP_MAX_RETRIES` - Retries for 502/503/504 and timeouts (default: 3)
//! * `ERP_BACKOFF_FACTOR` - Backoff base in seconds (default: 2.0)
//! * `ERP_LOG_LEVEL` - trace, debug, info, warn, error (default: info)

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_erp::{codec, config::sha1_hex, ErpClient, SubmissionStats};
use interface_cli::{CliConfig, InvoiceDraft};

/// ERP incoming-invoice client
#[derive(Parser, Debug)]
#[command(name = "erp-invoice", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit an invoice draft to the ERP
    Submit(DraftArgs),
    /// Print the XML document for a draft without sending it
    Preview(DraftArgs),
    /// List suppliers known to the ERP
    Suppliers,
    /// Print the SHA-1 digest of a password
    HashPassword(HashArgs),
}

#[derive(Args, Debug)]
struct DraftArgs {
    /// Path to the JSON invoice draft
    path: String,
}

#[derive(Args, Debug)]
struct HashArgs {
    /// Plain-text password
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = CliConfig::from_env().context("failed to load ERP_* configuration")?;
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Submit(args) => submit(&config, &args).await,
        Commands::Preview(args) => preview(&args),
        Commands::Suppliers => suppliers(&config).await,
        Commands::HashPassword(args) => {
            println!("{}", sha1_hex(&args.password));
            Ok(())
        }
    }
}

async fn submit(config: &CliConfig, args: &DraftArgs) -> anyhow::Result<()> {
    let invoice = InvoiceDraft::load(&args.path)?.into_invoice()?;
    let stats = Arc::new(SubmissionStats::new());
    let client = ErpClient::from_config(&config.client_config())?.with_observer(stats.clone());

    let result = client.submit_invoice(&invoice).await;
    client.close().await;

    let receipt = result.context("invoice submission failed")?;
    println!(
        "Submitted {} (ERP number: {}) in {} ms",
        receipt.invoice_number,
        receipt.document_number.as_deref().unwrap_or("-"),
        receipt.elapsed.as_millis()
    );
    tracing::debug!(successes = stats.successes(), failures = stats.failures(), "Session stats");
    Ok(())
}

fn preview(args: &DraftArgs) -> anyhow::Result<()> {
    let invoice = InvoiceDraft::load(&args.path)?.into_invoice()?;
    println!("{}", codec::encode(&invoice)?);
    Ok(())
}

async fn suppliers(config: &CliConfig) -> anyhow::Result<()> {
    let suppliers = ErpClient::scoped(&config.client_config(), |client| async move {
        client.get_suppliers().await
    })
    .await
    .context("failed to list suppliers")?;

    for supplier in suppliers {
        println!("{}\t{}", supplier.id, supplier.name);
    }
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
