//! # Price Quote Tool
//!
//! Prices a single product configuration from the command line.
//!
//! ## Usage
//! ```bash
//! # 18k solitaire with a diamond, in USD
//! cargo run -p karat-store --bin quote -- --product solitaire-ring --karat 18 --stone diamond
//!
//! # Two rope chains for a shopper in Australia, with fresh rates
//! cargo run -p karat-store --bin quote -- --product rope-chain --karat 14 --qty 2 \
//!     --country AU --rates ./rates.json
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls the level), the quote to stdout.

use std::env;
use std::path::PathBuf;

use karat_core::currency::format_price;
use karat_core::BASE_CURRENCY;
use karat_store::{Catalog, FileRateProvider, QuoteRequest, RateRefresher, StoreConfig, Storefront};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

struct Args {
    product: Option<String>,
    karat: Option<u32>,
    stone: Option<String>,
    quantity: u32,
    currency: Option<String>,
    country: Option<String>,
    catalog: Option<PathBuf>,
    rates: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn print_usage() {
    println!("Karat Price Quote");
    println!();
    println!("Usage: quote --product <ID> --karat <K> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -p, --product <ID>     Product ID from the catalog");
    println!("  -k, --karat <K>        Purity (karat or fineness, e.g. 18 or 950)");
    println!("  -s, --stone <ID>       Stone ID (optional)");
    println!("  -q, --qty <N>          Quantity (default: 1)");
    println!("      --currency <CODE>  Display currency (e.g. GBP)");
    println!("      --country <CC>     Pick the display currency for a country (e.g. AU)");
    println!("      --catalog <PATH>   Catalog TOML (default: configured or bundled sample)");
    println!("      --rates <PATH>     JSON exchange-rate file to refresh from");
    println!("      --config <PATH>    Store config file (default: platform config dir)");
    println!("  -h, --help             Show this help message");
}

fn parse_args() -> Result<Option<Args>, Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        product: None,
        karat: None,
        stone: None,
        quantity: 1,
        currency: None,
        country: None,
        catalog: None,
        rates: None,
        config: None,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "-h" | "--help") {
            return Ok(None);
        }

        let value = args
            .get(i + 1)
            .cloned()
            .ok_or_else(|| format!("missing value for {flag}"))?;

        match flag {
            "-p" | "--product" => parsed.product = Some(value),
            "-k" | "--karat" => parsed.karat = Some(value.parse()?),
            "-s" | "--stone" => parsed.stone = Some(value),
            "-q" | "--qty" => parsed.quantity = value.parse()?,
            "--currency" => parsed.currency = Some(value),
            "--country" => parsed.country = Some(value),
            "--catalog" => parsed.catalog = Some(PathBuf::from(value)),
            "--rates" => parsed.rates = Some(PathBuf::from(value)),
            "--config" => parsed.config = Some(PathBuf::from(value)),
            other => return Err(format!("unknown option {other}").into()),
        }
        i += 2;
    }

    Ok(Some(parsed))
}

/// `RUST_LOG=debug` shows catalog and rate details. Default: INFO.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let Some(args) = parse_args()? else {
        print_usage();
        return Ok(());
    };

    let (Some(product_id), Some(karat)) = (args.product, args.karat) else {
        print_usage();
        return Err("--product and --karat are required".into());
    };

    let config = StoreConfig::load(args.config)?;

    let catalog_path = args
        .catalog
        .or_else(|| config.catalog.path.clone())
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.toml")));
    debug!(path = ?catalog_path, "Using catalog");
    let catalog = Catalog::load(&catalog_path)?;

    let store = Storefront::new(config.clone(), catalog)?;

    if let Some(source) = args.rates.or_else(|| config.rates.source.clone()) {
        let outcome = RateRefresher::new(config.rates.clone())
            .refresh(&FileRateProvider::new(source), store.currency())
            .await;
        if !outcome.is_updated() {
            warn!(?outcome, "Quoting with fallback exchange rates");
        }
    }

    if let Some(country) = &args.country {
        store.detect_currency(country);
    }
    if let Some(code) = &args.currency {
        store.select_currency(code)?;
    }

    let request = QuoteRequest {
        product_id,
        karat,
        stone_id: args.stone,
        quantity: args.quantity,
    };

    let catalog = store.catalog();
    let product = catalog.product(&request.product_id)?;
    let metal = catalog.metal(&product.metal_id)?;
    let stone = catalog.stone_for(product, request.stone_id.as_deref())?;
    let quote = store.quote(&request)?;

    let usd = |amount: f64| format_price(Some(amount), BASE_CURRENCY, "$");

    println!("{}", product.name);
    println!("  Metal:       {} {}", metal.name, karat);
    if let Some(stone) = stone {
        println!("  Stone:       {}", stone.name);
    }
    println!("  Quantity:    {}", quote.quantity);
    println!();
    println!("  Base price:  {}", usd(quote.base_price));
    println!("  Multiplier:  x{:.4}", quote.multiplier);
    println!("  Stone:       {}", usd(quote.stone_price));
    println!("  Unit price:  {}", usd(quote.unit_price));
    println!("  Total:       {}", usd(quote.total));

    let currency = store.currency().current();
    if currency != BASE_CURRENCY {
        println!(
            "  Total ({}): {}",
            currency,
            store.currency().display(Some(quote.total))
        );
    }

    Ok(())
}
