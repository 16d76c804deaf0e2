mod catalog;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pillalo")]
#[command(about = "Píllalo catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the current USD → VES rate and where it came from
    Rate,
    /// Search the catalog sheet and print priced results
    Search {
        /// Product name or part of it
        query: String,
        /// Maximum number of results to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Normalize a raw price cell and convert it
    Normalize {
        raw: String,
        /// Use this rate instead of fetching one
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Validate a seller submission line
    /// (`Producto, Tienda, Zona, Precio, WhatsApp, Categoria`)
    CheckRow {
        line: String,
        #[arg(long)]
        rate: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(std::env::var("PILLALO_LOG_LEVEL").unwrap_or_else(|_| "warn".into()))
    })?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Rate) => catalog::run_rate().await?,
        Some(Commands::Search { query, limit }) => catalog::run_search(&query, limit).await?,
        Some(Commands::Normalize { raw, rate }) => catalog::run_normalize(&raw, rate).await?,
        Some(Commands::CheckRow { line, rate }) => catalog::run_check_row(&line, rate).await?,
        None => println!("pillalo: run with --help to see available commands"),
    }

    Ok(())
}
