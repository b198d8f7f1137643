//! Rollup configuration from environment variables

use crate::error::ConfigError;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

/// Configuration for the rollup runtime
///
/// Loaded from environment variables with defaults matching the production
/// deployment (La Paz local days, history starting 2022-01-01).
#[derive(Debug, Clone)]
pub struct RollupConfig {
    /// Path to SQLite document store
    pub db_path: String,

    /// Timezone whose midnights delimit a calendar day
    pub timezone: Tz,

    /// First day of the daily rollup
    pub epoch: NaiveDate,

    /// Minimum interval rows for a crypto-pair day to count
    pub min_daily_samples: usize,

    /// First day the external market-data feed is considered
    pub market_feed_cutover: NaiveDate,

    /// The smoother only uses days strictly after this date
    pub curve_cutover: NaiveDate,

    /// Pegged official sell rate embedded in every summary
    pub official_sell_rate: f64,

    /// Pegged official buy rate embedded in every summary
    pub official_buy_rate: f64,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            db_path: "data/bluerate.db".to_string(),
            timezone: chrono_tz::America::La_Paz,
            epoch: ymd(2022, 1, 1),
            min_daily_samples: 6,
            market_feed_cutover: ymd(2023, 5, 1),
            curve_cutover: ymd(2023, 2, 8),
            official_sell_rate: 6.96,
            official_buy_rate: 6.86,
        }
    }
}

impl RollupConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BLUERATE_DB_PATH` (default: data/bluerate.db)
    /// - `ROLLUP_TIMEZONE` (default: America/La_Paz)
    /// - `ROLLUP_EPOCH` (default: 2022-01-01)
    /// - `MIN_DAILY_SAMPLES` (default: 6)
    /// - `MARKET_FEED_CUTOVER` (default: 2023-05-01)
    /// - `CURVE_CUTOVER` (default: 2023-02-08)
    /// - `OFFICIAL_SELL_RATE` (default: 6.96)
    /// - `OFFICIAL_BUY_RATE` (default: 6.86)
    ///
    /// Unset variables fall back to defaults; set but unparseable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            db_path: env::var("BLUERATE_DB_PATH").unwrap_or(defaults.db_path),
            timezone: parse_var("ROLLUP_TIMEZONE", defaults.timezone)?,
            epoch: parse_var("ROLLUP_EPOCH", defaults.epoch)?,
            min_daily_samples: parse_var("MIN_DAILY_SAMPLES", defaults.min_daily_samples)?,
            market_feed_cutover: parse_var("MARKET_FEED_CUTOVER", defaults.market_feed_cutover)?,
            curve_cutover: parse_var("CURVE_CUTOVER", defaults.curve_cutover)?,
            official_sell_rate: parse_var("OFFICIAL_SELL_RATE", defaults.official_sell_rate)?,
            official_buy_rate: parse_var("OFFICIAL_BUY_RATE", defaults.official_buy_rate)?,
        };

        if config.min_daily_samples == 0 {
            return Err(ConfigError::InvalidValue(
                "MIN_DAILY_SAMPLES must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{}={}", name, raw))),
        Err(_) => Ok(default),
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global; keep every env mutation inside one test.
    #[test]
    fn test_env_config() {
        // Test: Default configuration when no env vars set
        env::remove_var("BLUERATE_DB_PATH");
        env::remove_var("ROLLUP_TIMEZONE");
        env::remove_var("MIN_DAILY_SAMPLES");
        env::remove_var("CURVE_CUTOVER");

        let config = RollupConfig::from_env().unwrap();
        assert_eq!(config.db_path, "data/bluerate.db");
        assert_eq!(config.timezone, chrono_tz::America::La_Paz);
        assert_eq!(config.epoch, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(config.min_daily_samples, 6);
        assert_eq!(config.official_sell_rate, 6.96);

        // Test: Custom configuration from env vars
        env::set_var("BLUERATE_DB_PATH", "/tmp/test.db");
        env::set_var("ROLLUP_TIMEZONE", "America/Argentina/Buenos_Aires");
        env::set_var("CURVE_CUTOVER", "2024-01-31");

        let config = RollupConfig::from_env().unwrap();
        assert_eq!(config.db_path, "/tmp/test.db");
        assert_eq!(config.timezone, chrono_tz::America::Argentina::Buenos_Aires);
        assert_eq!(config.curve_cutover, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        // Test: Garbage is rejected instead of silently defaulted
        env::set_var("MIN_DAILY_SAMPLES", "six");
        let err = RollupConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("MIN_DAILY_SAMPLES"));

        env::set_var("MIN_DAILY_SAMPLES", "0");
        assert!(RollupConfig::from_env().is_err());

        // Cleanup
        env::remove_var("BLUERATE_DB_PATH");
        env::remove_var("ROLLUP_TIMEZONE");
        env::remove_var("MIN_DAILY_SAMPLES");
        env::remove_var("CURVE_CUTOVER");
    }
}
