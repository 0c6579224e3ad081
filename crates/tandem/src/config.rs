//! Command-line and environment configuration.

use std::time::Duration;

use clap::Parser;
use tandem_room::RelayConfig;

/// Tandem: two-player WebSocket room relay
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "tandem")]
#[command(about = "A two-seat WebSocket room relay for browser games")]
#[command(version)]
pub struct Cli {
    /// Interface to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. Serves WebSocket upgrades and `/health`.
    #[arg(long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Seconds after creation before an empty room may be evicted.
    #[arg(long, env = "ROOM_TTL_SECS", default_value_t = 1800)]
    pub room_ttl_secs: u64,

    /// Seconds between janitor sweeps.
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,
}

impl Cli {
    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Relay settings with the CLI overrides applied.
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            room_ttl: Duration::from_secs(self.room_ttl_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            ..RelayConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "tandem",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--room-ttl-secs",
            "120",
            "--sweep-interval-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.bind_addr(), "127.0.0.1:9000");

        let relay = cli.relay_config();
        assert_eq!(relay.room_ttl, Duration::from_secs(120));
        assert_eq!(relay.sweep_interval, Duration::from_secs(5));
        assert_eq!(relay.start_delay, RelayConfig::default().start_delay);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["tandem", "--port", "http"]).is_err());
    }
}
