//! modemwatch.toml configuration parser and settings resolution.
//!
//! Settings are layered: explicit overrides (CLI flags, then environment,
//! already merged by the caller) win over the config file, which wins over
//! the built-in defaults.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_MAX_REBOOTS: u32 = 3;
pub const DEFAULT_REBOOT_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_PING_ATTEMPTS: u32 = 3;
pub const DEFAULT_REBOOT_WAIT_SECS: u64 = 120;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub gateway: Option<GatewayConfig>,
    pub probe: Option<ProbeConfig>,
    pub reboot: Option<RebootConfig>,
    pub notify: Option<NotifyConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub targets: Option<Vec<String>>,
    pub interval: Option<u64>,
    pub attempts: Option<u32>,
    pub timeout: Option<u64>,
    pub adaptive_interval: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebootConfig {
    pub max_reboots: Option<u32>,
    pub window: Option<u64>,
    pub wait: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Values supplied on the command line or through the environment.
///
/// `None` means "not given", so the file or default value applies.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub target_ip: Option<String>,
    pub target_ips: Option<String>,
    pub interval: Option<u64>,
    pub max_reboots: Option<u32>,
    pub reboot_interval: Option<u64>,
    pub ping_attempts: Option<u32>,
    pub reboot_wait: Option<u64>,
    pub webhook_url: Option<String>,
    pub adaptive_interval: Option<bool>,
    pub verify_gateway: Option<bool>,
    pub probe_timeout: Option<u64>,
}

/// Fully resolved watchdog settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub targets: Vec<String>,
    pub interval: Duration,
    pub max_reboots: u32,
    pub reboot_interval: Duration,
    pub ping_attempts: u32,
    pub reboot_wait: Duration,
    pub webhook_url: Option<String>,
    pub adaptive_interval: bool,
    pub verify_gateway: bool,
    pub probe_timeout: Duration,
}

impl Settings {
    /// Merge overrides over the optional file config and validate the result.
    pub fn resolve(file: Option<FileConfig>, overrides: Overrides) -> ConfigResult<Self> {
        let file = file.unwrap_or_default();
        let gateway = file.gateway.unwrap_or_default();
        let probe = file.probe.unwrap_or_default();
        let reboot = file.reboot.unwrap_or_default();
        let notify = file.notify.unwrap_or_default();

        let url = overrides
            .url
            .or(gateway.url)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?;

        let mut targets = Vec::new();
        if let Some(single) = &overrides.target_ip {
            push_targets(&mut targets, single);
        }
        if let Some(list) = &overrides.target_ips {
            push_targets(&mut targets, list);
        }
        if targets.is_empty()
            && let Some(list) = &probe.targets
        {
            for target in list {
                push_targets(&mut targets, target);
            }
        }
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let interval = overrides
            .interval
            .or(probe.interval)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        require_positive("interval", interval)?;

        let ping_attempts = overrides
            .ping_attempts
            .or(probe.attempts)
            .unwrap_or(DEFAULT_PING_ATTEMPTS);
        require_positive("ping_attempts", u64::from(ping_attempts))?;

        let reboot_interval = overrides
            .reboot_interval
            .or(reboot.window)
            .unwrap_or(DEFAULT_REBOOT_INTERVAL_SECS);
        require_positive("reboot_interval", reboot_interval)?;

        let probe_timeout = overrides
            .probe_timeout
            .or(probe.timeout)
            .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS);
        require_positive("probe_timeout", probe_timeout)?;

        let webhook_url = overrides
            .webhook_url
            .or(notify.webhook_url)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        Ok(Self {
            url,
            username: overrides
                .username
                .or(gateway.username)
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: overrides.password.or(gateway.password).unwrap_or_default(),
            targets,
            interval: Duration::from_secs(interval),
            max_reboots: overrides
                .max_reboots
                .or(reboot.max_reboots)
                .unwrap_or(DEFAULT_MAX_REBOOTS),
            reboot_interval: Duration::from_secs(reboot_interval),
            ping_attempts,
            reboot_wait: Duration::from_secs(
                overrides
                    .reboot_wait
                    .or(reboot.wait)
                    .unwrap_or(DEFAULT_REBOOT_WAIT_SECS),
            ),
            webhook_url,
            adaptive_interval: overrides
                .adaptive_interval
                .or(probe.adaptive_interval)
                .unwrap_or(true),
            verify_gateway: overrides.verify_gateway.or(gateway.verify).unwrap_or(true),
            probe_timeout: Duration::from_secs(probe_timeout),
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("targets", &self.targets)
            .field("interval", &self.interval)
            .field("max_reboots", &self.max_reboots)
            .field("reboot_interval", &self.reboot_interval)
            .field("ping_attempts", &self.ping_attempts)
            .field("reboot_wait", &self.reboot_wait)
            .field("webhook_url", &self.webhook_url.as_deref().map(redact_url))
            .field("adaptive_interval", &self.adaptive_interval)
            .field("verify_gateway", &self.verify_gateway)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

/// Keep only scheme and host; webhook paths carry their secret token.
fn redact_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            let host = host.rsplit('@').next().unwrap_or_default();
            format!("{scheme}://{host}/<redacted>")
        }
        None => "<redacted>".to_string(),
    }
}

/// Split a comma-separated host list and append new, non-empty entries.
fn push_targets(targets: &mut Vec<String>, list: &str) {
    for host in list.split(',').map(str::trim).filter(|h| !h.is_empty()) {
        if !targets.iter().any(|t| t == host) {
            targets.push(host.to_string());
        }
    }
}

fn require_positive(field: &'static str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Overrides {
        Overrides {
            url: Some("http://192.168.8.1/".to_string()),
            target_ip: Some("8.8.8.8".to_string()),
            ..Overrides::default()
        }
    }

    #[test]
    fn defaults_apply_when_nothing_else_is_set() {
        let settings = Settings::resolve(None, minimal()).unwrap();
        assert_eq!(settings.username, "admin");
        assert_eq!(settings.password, "");
        assert_eq!(settings.targets, vec!["8.8.8.8"]);
        assert_eq!(settings.interval, Duration::from_secs(10));
        assert_eq!(settings.max_reboots, 3);
        assert_eq!(settings.reboot_interval, Duration::from_secs(3600));
        assert_eq!(settings.ping_attempts, 3);
        assert_eq!(settings.reboot_wait, Duration::from_secs(120));
        assert!(settings.webhook_url.is_none());
        assert!(settings.adaptive_interval);
        assert!(settings.verify_gateway);
    }

    #[test]
    fn missing_url_is_rejected() {
        let overrides = Overrides {
            target_ip: Some("8.8.8.8".to_string()),
            ..Overrides::default()
        };
        let err = Settings::resolve(None, overrides).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl));
    }

    #[test]
    fn blank_url_is_rejected() {
        let mut overrides = minimal();
        overrides.url = Some("   ".to_string());
        assert!(matches!(
            Settings::resolve(None, overrides),
            Err(ConfigError::MissingUrl)
        ));
    }

    #[test]
    fn missing_targets_are_rejected() {
        let overrides = Overrides {
            url: Some("http://192.168.8.1/".to_string()),
            target_ips: Some(" , ".to_string()),
            ..Overrides::default()
        };
        assert!(matches!(
            Settings::resolve(None, overrides),
            Err(ConfigError::NoTargets)
        ));
    }

    #[test]
    fn target_lists_are_merged_and_deduplicated() {
        let mut overrides = minimal();
        overrides.target_ips = Some("1.1.1.1, 8.8.8.8 ,9.9.9.9".to_string());
        let settings = Settings::resolve(None, overrides).unwrap();
        assert_eq!(settings.targets, vec!["8.8.8.8", "1.1.1.1", "9.9.9.9"]);
    }

    #[test]
    fn zero_interval_is_invalid() {
        let mut overrides = minimal();
        overrides.interval = Some(0);
        let err = Settings::resolve(None, overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "interval", .. }));
    }

    #[test]
    fn zero_max_reboots_is_allowed() {
        let mut overrides = minimal();
        overrides.max_reboots = Some(0);
        let settings = Settings::resolve(None, overrides).unwrap();
        assert_eq!(settings.max_reboots, 0);
    }

    #[test]
    fn overrides_win_over_file() {
        let file = FileConfig::from_toml_str(
            r#"
[gateway]
url = "http://10.0.0.1/"
username = "root"
verify = false

[probe]
targets = ["1.1.1.1"]
interval = 30

[reboot]
max_reboots = 5
wait = 60

[notify]
webhook_url = "https://hooks.example/x"
"#,
        )
        .unwrap();

        let overrides = Overrides {
            interval: Some(5),
            ..Overrides::default()
        };
        let settings = Settings::resolve(Some(file), overrides).unwrap();
        assert_eq!(settings.url, "http://10.0.0.1/");
        assert_eq!(settings.username, "root");
        assert!(!settings.verify_gateway);
        assert_eq!(settings.targets, vec!["1.1.1.1"]);
        assert_eq!(settings.interval, Duration::from_secs(5));
        assert_eq!(settings.max_reboots, 5);
        assert_eq!(settings.reboot_wait, Duration::from_secs(60));
        assert_eq!(
            settings.webhook_url.as_deref(),
            Some("https://hooks.example/x")
        );
    }

    #[test]
    fn override_targets_replace_file_targets() {
        let file = FileConfig::from_toml_str(
            r#"
[probe]
targets = ["1.1.1.1"]
"#,
        )
        .unwrap();
        let settings = Settings::resolve(Some(file), minimal()).unwrap();
        assert_eq!(settings.targets, vec!["8.8.8.8"]);
    }

    #[test]
    fn debug_output_redacts_password() {
        let mut overrides = minimal();
        overrides.password = Some("hunter2".to_string());
        let settings = Settings::resolve(None, overrides).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn debug_output_hides_webhook_token() {
        let mut overrides = minimal();
        overrides.webhook_url =
            Some("https://discord.com/api/webhooks/123456/s3cr3t-token".to_string());
        let settings = Settings::resolve(None, overrides).unwrap();

        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("s3cr3t-token"));
        assert!(!rendered.contains("123456"));
        assert!(rendered.contains("https://discord.com/<redacted>"));
        assert_eq!(
            settings.webhook_url.as_deref(),
            Some("https://discord.com/api/webhooks/123456/s3cr3t-token")
        );
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modemwatch.toml");
        std::fs::write(&path, "[gateway]\nurl = \"http://192.168.8.1/\"\n").unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(
            config.gateway.and_then(|g| g.url).as_deref(),
            Some("http://192.168.8.1/")
        );
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = FileConfig::from_file(Path::new("/nonexistent/modemwatch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = FileConfig::from_toml_str("[probe\ninterval = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
