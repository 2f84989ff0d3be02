use clap::Args;
use std::time::Duration;

/// Timeouts applied around the two suspension points of a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    pub provider_timeout: Duration,
    pub storage_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(30),
            storage_timeout: Duration::from_secs(5),
        }
    }
}

/// Command-line and environment overrides for [`BridgeConfig`].
#[derive(Debug, Clone, Args)]
pub struct BridgeArgs {
    /// Timeout for a single provider call, in milliseconds.
    #[arg(long, env = "PAYBRIDGE_PROVIDER_TIMEOUT_MS", default_value_t = 30_000)]
    pub provider_timeout_ms: u64,

    /// Timeout for a transaction log read or append, in milliseconds.
    #[arg(long, env = "PAYBRIDGE_STORAGE_TIMEOUT_MS", default_value_t = 5_000)]
    pub storage_timeout_ms: u64,
}

impl From<BridgeArgs> for BridgeConfig {
    fn from(args: BridgeArgs) -> Self {
        Self {
            provider_timeout: Duration::from_millis(args.provider_timeout_ms),
            storage_timeout: Duration::from_millis(args.storage_timeout_ms),
        }
    }
}
