/// Worker configuration from environment variables
///
/// # Environment Variables
///
/// - `DATABASE_URL` - PostgreSQL connection URL (required)
/// - `DATABASE_MAX_CONNECTIONS` - Pool size (default 5)
/// - `WORKER_INTERVAL_SECS` - Seconds between job runs (default 3600)
/// - `WORKER_ISSUE_EXPENSAS` - Issue monthly expensas (default true)
/// - `WORKER_RECONCILE_UNITS` - Reconcile unit occupancy (default true)
///
/// Push notification credentials are read through [`VendorConfig`].

use condo_shared::db::pool::DatabaseConfig;
use condo_shared::vendors::VendorConfig;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database: DatabaseConfig,
    pub interval: Duration,
    pub issue_expensas: bool,
    pub reconcile_units: bool,
    pub vendors: VendorConfig,
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn flag(name: &str) -> bool {
    env::var(name).map(|v| parse_bool(&v)).unwrap_or(true)
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let interval_secs = env::var("WORKER_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()?;
        if interval_secs == 0 {
            anyhow::bail!("WORKER_INTERVAL_SECS must be greater than zero");
        }

        let vendors = VendorConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

        Ok(WorkerConfig {
            database: DatabaseConfig {
                url,
                max_connections,
                ..Default::default()
            },
            interval: Duration::from_secs(interval_secs),
            issue_expensas: flag("WORKER_ISSUE_EXPENSAS"),
            reconcile_units: flag("WORKER_RECONCILE_UNITS"),
            vendors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" 1 "));
        assert!(parse_bool("ON"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
