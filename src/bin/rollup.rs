//! Rollup Binary - Daily, Monthly and Quarterly Summaries
//!
//! Runs every rollup stage once against the SQLite document store and exits.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin bluerate-rollup
//! cargo run --release --bin bluerate-rollup -- --reprocess BOB
//! ```
//!
//! `--reprocess <FIAT>` re-derives the stored intervals of USDT/<FIAT>
//! against the current advertiser block-list before the rollup (repeatable).
//!
//! ## Environment Variables
//!
//! - BLUERATE_DB_PATH - SQLite database path (default: data/bluerate.db)
//! - ROLLUP_TIMEZONE - Local timezone for day boundaries (default: America/La_Paz)
//! - ROLLUP_EPOCH - First day rolled up (default: 2022-01-01)
//! - MIN_DAILY_SAMPLES - Minimum interval rows per crypto-pair day (default: 6)
//! - MARKET_FEED_CUTOVER - First day of the market-data feed (default: 2023-05-01)
//! - CURVE_CUTOVER - Smoother uses days strictly after this (default: 2023-02-08)
//! - OFFICIAL_SELL_RATE / OFFICIAL_BUY_RATE - Official peg (default: 6.96 / 6.86)
//! - RUST_LOG - Logging level (optional, default: info)

use bluerate::aggregator_core::CurrencyPair;
use bluerate::pipeline::RollupEngine;
use bluerate::store::SqliteStore;
use bluerate::RollupConfig;
use std::env;
use std::process;

fn parse_reprocess_from_args() -> Vec<CurrencyPair> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .enumerate()
        .filter(|(_, arg)| arg.as_str() == "--reprocess")
        .filter_map(|(idx, _)| args.get(idx + 1))
        .map(|fiat| CurrencyPair::new(fiat.as_str(), "USDT"))
        .collect()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = match RollupConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            process::exit(1);
        }
    };
    let reprocess = parse_reprocess_from_args();

    log::info!("🚀 Starting Rollup");
    log::info!("   Database: {}", config.db_path);
    log::info!("   Timezone: {}", config.timezone);
    log::info!("   Epoch: {}", config.epoch);
    log::info!("   Min daily samples: {}", config.min_daily_samples);
    for pair in &reprocess {
        log::info!("   Reprocessing: {}", pair);
    }

    let mut store = match SqliteStore::open(&config.db_path) {
        Ok(store) => store,
        Err(e) => {
            log::error!("❌ Failed to open {}: {}", config.db_path, e);
            process::exit(1);
        }
    };

    let mut engine = RollupEngine::new(&mut store, config);
    match engine.run_all(&reprocess) {
        Ok(reports) => {
            let writes: usize = reports.iter().map(|(_, r)| r.writes()).sum();
            log::info!("✅ Rollup complete: {} stages, {} writes", reports.len(), writes);
        }
        Err(e) => {
            log::error!("❌ Rollup failed at {}: {}", e.context(), e);
            process::exit(1);
        }
    }
}
