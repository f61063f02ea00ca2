//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use modemwatch_core::{FileConfig, Overrides, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "modemwatchd",
    about = "Reboots an LTE gateway when its uplink stops answering pings",
    version
)]
pub struct Cli {
    /// URL of the modem's web interface.
    #[arg(env = "MODEM_URL")]
    pub url: Option<String>,

    /// Username for the modem's web interface [default: admin].
    #[arg(long, env = "MODEM_USERNAME")]
    pub username: Option<String>,

    /// Password for the modem's web interface.
    #[arg(long, env = "MODEM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Single target host to ping.
    #[arg(long, alias = "target_ip", env = "TARGET_IP")]
    pub target_ip: Option<String>,

    /// Comma-separated target hosts to ping.
    #[arg(long, alias = "target_ips", env = "TARGET_IPS")]
    pub target_ips: Option<String>,

    /// Initial interval between probe cycles in seconds [default: 10].
    #[arg(long, env = "PING_INTERVAL")]
    pub interval: Option<u64>,

    /// Maximum reboots within the reboot interval [default: 3].
    #[arg(long, alias = "max_reboots", env = "MAX_REBOOTS")]
    pub max_reboots: Option<u32>,

    /// Window in seconds for limiting reboots [default: 3600].
    #[arg(long, alias = "reboot_interval", env = "REBOOT_INTERVAL")]
    pub reboot_interval: Option<u64>,

    /// Consecutive failed cycles before a reboot [default: 3].
    #[arg(long, alias = "ping_attempts", env = "PING_ATTEMPTS")]
    pub ping_attempts: Option<u32>,

    /// Base wait after a reboot in seconds [default: 120].
    #[arg(long, alias = "reboot_wait", env = "REBOOT_WAIT")]
    pub reboot_wait: Option<u64>,

    /// Webhook notified after each reboot.
    #[arg(long, alias = "webhook_url", env = "DISCORD_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Adapt the probe interval between 1s and 60s [default: true].
    #[arg(long, env = "ADAPTIVE_INTERVAL")]
    pub adaptive_interval: Option<bool>,

    /// Check the gateway answers before rebooting it [default: true].
    #[arg(long, env = "VERIFY_GATEWAY")]
    pub verify_gateway: Option<bool>,

    /// Ping timeout in seconds [default: 1].
    #[arg(long, env = "PROBE_TIMEOUT")]
    pub probe_timeout: Option<u64>,

    /// TOML config file; flags and environment take precedence.
    #[arg(long, env = "MODEMWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            target_ip: self.target_ip.clone(),
            target_ips: self.target_ips.clone(),
            interval: self.interval,
            max_reboots: self.max_reboots,
            reboot_interval: self.reboot_interval,
            ping_attempts: self.ping_attempts,
            reboot_wait: self.reboot_wait,
            webhook_url: self.webhook_url.clone(),
            adaptive_interval: self.adaptive_interval,
            verify_gateway: self.verify_gateway,
            probe_timeout: self.probe_timeout,
        }
    }

    /// Load the optional config file and resolve the final settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let file = self
            .config
            .as_deref()
            .map(FileConfig::from_file)
            .transpose()?;
        Ok(Settings::resolve(file, self.overrides())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["modemwatchd"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn positional_url_and_kebab_flags() {
        let cli = parse(&[
            "http://192.168.8.1/",
            "--target-ips",
            "8.8.8.8,1.1.1.1",
            "--max-reboots",
            "2",
            "--reboot-wait",
            "60",
        ]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.url, "http://192.168.8.1/");
        assert_eq!(settings.targets, vec!["8.8.8.8", "1.1.1.1"]);
        assert_eq!(settings.max_reboots, 2);
        assert_eq!(settings.reboot_wait, Duration::from_secs(60));
    }

    #[test]
    fn underscore_aliases_are_accepted() {
        let cli = parse(&[
            "http://192.168.8.1/",
            "--target_ip",
            "8.8.8.8",
            "--max_reboots",
            "4",
            "--reboot_interval",
            "600",
            "--ping_attempts",
            "5",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.target_ip.as_deref(), Some("8.8.8.8"));
        assert_eq!(overrides.max_reboots, Some(4));
        assert_eq!(overrides.reboot_interval, Some(600));
        assert_eq!(overrides.ping_attempts, Some(5));
    }

    #[test]
    fn boolean_switches_take_values() {
        let cli = parse(&[
            "http://192.168.8.1/",
            "--target-ip",
            "8.8.8.8",
            "--adaptive-interval",
            "false",
            "--verify-gateway",
            "false",
        ]);
        let settings = cli.settings().unwrap();
        assert!(!settings.adaptive_interval);
        assert!(!settings.verify_gateway);
    }

    #[test]
    fn log_format_defaults_to_text() {
        let cli = parse(&["http://192.168.8.1/"]);
        assert_eq!(cli.log_format, LogFormat::Text);

        let cli = parse(&["--log-format", "json"]);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn non_numeric_interval_is_a_parse_error() {
        let result = Cli::try_parse_from(["modemwatchd", "http://x/", "--interval", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = parse(&[
            "http://192.168.8.1/",
            "--target-ip",
            "8.8.8.8",
            "--config",
            "/nonexistent/modemwatch.toml",
        ]);
        let err = cli.settings().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/modemwatch.toml"));
    }
}
