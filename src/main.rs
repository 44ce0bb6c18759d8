mod application;
mod domain;
mod infrastructure;
mod ingest;
mod presentation;

use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::AppContainer;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let container = match AppContainer::new() {
        Ok(container) => container,
        Err(e) => {
            eprintln!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("load") => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: invoiceql load <invoices.csv>");
                std::process::exit(2);
            };

            match ingest::load_csv(
                Path::new(path),
                &container.db_pool,
                container.embedding_provider.clone(),
            )
            .await
            {
                Ok(count) => info!(rows = count, "invoice CSV loaded"),
                Err(e) => {
                    eprintln!("Load failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some("serve") | None => presentation::http::server::run(container).await,
        Some(other) => {
            eprintln!("Unknown subcommand '{}'; expected 'serve' or 'load'", other);
            std::process::exit(2);
        }
    }
}
