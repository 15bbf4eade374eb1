//! # Almacen
//!
//! Opens the inventory and prints the stock of every product.
//!
//! ## Usage
//! ```bash
//! almacen                         # platform config dir, then ALMACEN_* env
//! almacen --config ./almacen.toml
//! RUST_LOG=debug almacen
//! ```

use std::path::PathBuf;

use almacen::{init_tracing, Almacen, AppConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config_path = match parse_args() {
        Some(path) => path,
        None => return,
    };

    let (config, load_error) = AppConfig::load_or_default(config_path);
    init_tracing(config.log_filter());

    if let Some(e) = load_error {
        warn!("Failed to load config: {}. Using defaults.", e);
    }

    if let Err(e) = run(&config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Returns `None` when the process should exit (e.g. after `--help`).
fn parse_args() -> Option<Option<PathBuf>> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Almacen stock report");
                println!();
                println!("Usage: almacen [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Print help");
                println!();
                println!("Environment:");
                println!("  ALMACEN_DB_PATH, ALMACEN_DB_MAX_CONNECTIONS,");
                println!("  ALMACEN_MEDIA_ROOT, ALMACEN_MAX_IMAGE_DIMENSION, ALMACEN_LOG");
                return None;
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    Some(config_path)
}

async fn run(config: &AppConfig) -> almacen::ServiceResult<()> {
    let almacen = Almacen::open(config).await?;
    let report = almacen.stock_report().await?;

    info!(products = report.len(), "Stock report ready");

    println!("{:<40} {:>8} {:>8} {:>8}", "Producto", "Entradas", "Salidas", "Stock");
    println!("{}", "─".repeat(67));
    for row in &report {
        println!(
            "{:<40} {:>8} {:>8} {:>8}",
            row.product_name,
            row.level.entradas,
            row.level.salidas,
            row.stock()
        );
    }

    almacen.close().await;
    Ok(())
}
