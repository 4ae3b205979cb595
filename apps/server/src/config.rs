//! Server configuration module.
//!
//! Configuration is loaded from `MINIPOS_*` environment variables with
//! fallback to defaults.
//!
//! ```text
//! ┌────────────────────────────────┬──────────────────────┐
//! │ Variable                       │ Default              │
//! ├────────────────────────────────┼──────────────────────┤
//! │ MINIPOS_HOST                   │ 0.0.0.0              │
//! │ MINIPOS_PORT                   │ 3000                 │
//! │ MINIPOS_DB_PATH                │ ./minipos.db         │
//! │ MINIPOS_DB_MAX_CONNECTIONS     │ 5                    │
//! │ MINIPOS_BUSY_TIMEOUT_MS        │ 5000                 │
//! │ MINIPOS_COMMIT_TIMEOUT_MS      │ 10000                │
//! │ MINIPOS_PAYMENT_METHODS        │ cash,card,digital    │
//! │ MINIPOS_TAX_RATE_BPS           │ (caller-supplied)    │
//! │ MINIPOS_ALLOW_PRICE_OVERRIDE   │ false                │
//! │ MINIPOS_LOYALTY_RATE_BPS       │ 10000                │
//! │ MINIPOS_DEFAULT_CASHIER        │ 1                    │
//! └────────────────────────────────┴──────────────────────┘
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use minipos_core::pricing::{PricingPolicy, TaxPolicy};
use minipos_core::{LoyaltyRate, PaymentMethod, TaxRate};
use minipos_db::DbConfig;
use minipos_sales::SalesConfig;

/// Server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub db_path: PathBuf,

    pub db_max_connections: u32,

    /// How long a writer waits on SQLite's write lock
    pub busy_timeout: Duration,

    /// Upper bound on one commit/void/delete transaction
    pub commit_timeout: Duration,

    pub payment_methods: Vec<PaymentMethod>,

    /// Server-side tax rate; `None` keeps the caller's tax amount
    pub tax_rate_bps: Option<u32>,

    pub allow_price_override: bool,

    pub loyalty_rate_bps: u32,

    pub default_cashier: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ServerConfig {
            host: lookup("MINIPOS_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: parse_or(&lookup, "MINIPOS_PORT", 3000)?,

            db_path: lookup("MINIPOS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./minipos.db")),

            db_max_connections: parse_or(&lookup, "MINIPOS_DB_MAX_CONNECTIONS", 5)?,

            busy_timeout: Duration::from_millis(parse_or(&lookup, "MINIPOS_BUSY_TIMEOUT_MS", 5000)?),

            commit_timeout: Duration::from_millis(parse_or(
                &lookup,
                "MINIPOS_COMMIT_TIMEOUT_MS",
                10_000,
            )?),

            payment_methods: match lookup("MINIPOS_PAYMENT_METHODS") {
                Some(raw) => parse_payment_methods(&raw)?,
                None => PaymentMethod::ALL.to_vec(),
            },

            tax_rate_bps: lookup("MINIPOS_TAX_RATE_BPS")
                .map(|raw| parse_value("MINIPOS_TAX_RATE_BPS", &raw))
                .transpose()?,

            allow_price_override: match lookup("MINIPOS_ALLOW_PRICE_OVERRIDE") {
                Some(raw) => parse_bool("MINIPOS_ALLOW_PRICE_OVERRIDE", &raw)?,
                None => false,
            },

            loyalty_rate_bps: parse_or(
                &lookup,
                "MINIPOS_LOYALTY_RATE_BPS",
                LoyaltyRate::default().bps(),
            )?,

            default_cashier: lookup("MINIPOS_DEFAULT_CASHIER").unwrap_or_else(|| "1".to_string()),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MINIPOS_DB_MAX_CONNECTIONS".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(config)
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path)
            .max_connections(self.db_max_connections)
            .busy_timeout(self.busy_timeout)
    }

    pub fn sales_config(&self) -> SalesConfig {
        let pricing = if self.allow_price_override {
            PricingPolicy::AllowOverride
        } else {
            PricingPolicy::CatalogOnly
        };
        let tax = match self.tax_rate_bps {
            Some(bps) => TaxPolicy::Rate(TaxRate::from_bps(bps)),
            None => TaxPolicy::CallerSupplied,
        };

        SalesConfig::default()
            .payment_methods(self.payment_methods.clone())
            .pricing(pricing)
            .tax(tax)
            .loyalty_rate(LoyaltyRate::from_bps(self.loyalty_rate_bps))
            .commit_timeout(self.commit_timeout)
            .default_cashier(self.default_cashier.clone())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn parse_payment_methods(raw: &str) -> Result<Vec<PaymentMethod>, ConfigError> {
    let mut methods = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let method: PaymentMethod = parse_value("MINIPOS_PAYMENT_METHODS", part)?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }

    if methods.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "MINIPOS_PAYMENT_METHODS".to_string(),
            value: raw.to_string(),
        });
    }
    Ok(methods)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}
