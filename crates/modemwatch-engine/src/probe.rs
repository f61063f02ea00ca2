//! Reachability probes.
//!
//! A probe is a single ICMP echo sent through the system `ping` binary.
//! Anything other than a zero exit status within the timeout (bad host,
//! missing binary, no reply) counts as unreachable.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of probing one target in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub target: String,
    pub reachable: bool,
    pub timestamp: Instant,
}

/// Answers "is this host reachable right now?".
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &str) -> bool;
}

/// Probes hosts with `ping -c 1`.
#[derive(Debug, Clone)]
pub struct PingProber {
    timeout: Duration,
}

impl PingProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(&self, target: &str) -> Command {
        let mut cmd = Command::new("ping");
        cmd.args(ping_args(target, self.timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, target: &str) -> bool {
        let target = target.trim();
        // A leading dash would be parsed as a ping option.
        if target.is_empty() || target.starts_with('-') {
            debug!(%target, "refusing to probe malformed target");
            return false;
        }

        let mut cmd = self.command(target);
        match tokio::time::timeout(self.timeout, cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!(%target, error = %e, "failed to run ping");
                false
            }
            Err(_) => {
                debug!(%target, timeout_ms = self.timeout.as_millis() as u64, "ping timed out");
                false
            }
        }
    }
}

/// Arguments for a single echo request with a whole-second reply deadline.
fn ping_args(target: &str, timeout: Duration) -> Vec<String> {
    let wait_secs = timeout.as_secs_f64().ceil().max(1.0) as u64;
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        wait_secs.to_string(),
        target.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_args_send_one_packet() {
        let args = ping_args("8.8.8.8", Duration::from_secs(1));
        assert_eq!(args, vec!["-c", "1", "-W", "1", "8.8.8.8"]);
    }

    #[test]
    fn ping_args_round_subsecond_timeout_up() {
        let args = ping_args("example.com", Duration::from_millis(300));
        assert_eq!(args[3], "1");

        let args = ping_args("example.com", Duration::from_millis(2500));
        assert_eq!(args[3], "3");
    }

    #[tokio::test]
    async fn empty_target_is_unreachable() {
        let prober = PingProber::new(Duration::from_millis(200));
        assert!(!prober.probe("").await);
        assert!(!prober.probe("   ").await);
    }

    #[tokio::test]
    async fn option_like_target_is_unreachable() {
        let prober = PingProber::new(Duration::from_millis(200));
        assert!(!prober.probe("-f").await);
    }
}
