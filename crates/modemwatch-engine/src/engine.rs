//! Decision engine: one probe cycle at a time.
//!
//! `PROBING → REBOOT_ATTEMPT → SETTLING → PROBING`. The engine owns all
//! mutable loop state (limiter history, backoff multiplier, poll cadence,
//! failure streak); collaborators only perform I/O.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use modemwatch_core::Settings;

use crate::backoff::BackoffController;
use crate::error::EngineError;
use crate::limiter::RebootLimiter;
use crate::poll::PollState;
use crate::probe::{ProbeResult, Prober};

/// Delay between an acknowledged reboot and its notification.
pub const NOTIFY_DELAY: Duration = Duration::from_secs(300);

/// How the gateway answered a reboot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebootOutcome {
    /// The gateway explicitly acknowledged the reboot.
    Acknowledged,
    /// The request was rejected or errored; nothing was rebooted.
    Failed(String),
}

/// Authenticated access to the gateway.
///
/// Implementations handle retries and session expiry themselves and only
/// return `Err` when the session cannot be recovered.
#[async_trait]
pub trait Gateway: Send {
    async fn is_responding(&mut self) -> Result<bool, EngineError>;
    async fn reboot(&mut self) -> Result<RebootOutcome, EngineError>;
}

/// Deferred, fire-and-forget message delivery.
pub trait Notifier: Send + Sync {
    /// Deliver `message` after `delay` without blocking the caller.
    fn notify_after(&self, message: String, delay: Duration);
}

/// Where the engine currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Probing,
    RebootAttempt,
    Settling,
}

/// What a single cycle decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every target answered.
    Reachable,
    /// Some targets failed; the cycle still counts as a success.
    PartiallyReachable { failed: usize },
    /// All targets failed but the streak is below `ping_attempts`.
    Unreachable { consecutive: u32 },
    /// The limiter refused another reboot inside the window.
    RebootDenied,
    /// The gateway did not answer the liveness check.
    GatewayUnresponsive,
    /// The gateway did not acknowledge the reboot.
    RebootFailed,
    /// Reboot acknowledged; `settled` is the wait that followed it.
    Rebooted { settled: Duration, multiplier: u32 },
}

/// Static engine parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub targets: Vec<String>,
    pub interval: Duration,
    pub max_reboots: u32,
    pub reboot_interval: Duration,
    pub ping_attempts: u32,
    pub reboot_wait: Duration,
    pub adaptive_interval: bool,
    pub verify_gateway: bool,
    /// Gateway address used in notification text.
    pub gateway_label: String,
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            targets: settings.targets.clone(),
            interval: settings.interval,
            max_reboots: settings.max_reboots,
            reboot_interval: settings.reboot_interval,
            ping_attempts: settings.ping_attempts,
            reboot_wait: settings.reboot_wait,
            adaptive_interval: settings.adaptive_interval,
            verify_gateway: settings.verify_gateway,
            gateway_label: settings.url.clone(),
        }
    }
}

pub struct DecisionEngine<P, G, N> {
    config: EngineConfig,
    prober: P,
    gateway: G,
    notifier: N,
    limiter: RebootLimiter,
    backoff: BackoffController,
    poll: PollState,
    consecutive_failures: u32,
    phase: Phase,
}

impl<P, G, N> DecisionEngine<P, G, N>
where
    P: Prober,
    G: Gateway,
    N: Notifier,
{
    pub fn new(config: EngineConfig, prober: P, gateway: G, notifier: N) -> Self {
        let limiter = RebootLimiter::new(config.max_reboots, config.reboot_interval);
        let poll = PollState::new(config.interval, config.ping_attempts);
        Self {
            config,
            prober,
            gateway,
            notifier,
            limiter,
            backoff: BackoffController::new(),
            poll,
            consecutive_failures: 0,
            phase: Phase::Probing,
        }
    }

    /// Run cycles until the gateway session is irrecoverably lost.
    ///
    /// Cancel by dropping the future; no state outlives the process.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        info!(
            targets = %self.config.targets.join(","),
            interval_secs = self.config.interval.as_secs(),
            max_reboots = self.config.max_reboots,
            reboot_interval_secs = self.config.reboot_interval.as_secs(),
            ping_attempts = self.config.ping_attempts,
            "watchdog started"
        );

        loop {
            let outcome = self.run_cycle().await?;
            let interval = self.next_interval();
            debug!(?outcome, next_secs = interval.as_secs(), "cycle complete");
            tokio::time::sleep(interval).await;
        }
    }

    /// Probe every target once and act on the result.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, EngineError> {
        self.phase = Phase::Probing;
        let results = self.probe_all().await;
        let failed = results.iter().filter(|r| !r.reachable).count();

        if failed < results.len() {
            self.consecutive_failures = 0;
            self.backoff.on_success();
            if self.config.adaptive_interval {
                self.poll.on_success();
            }
            return Ok(if failed == 0 {
                CycleOutcome::Reachable
            } else {
                CycleOutcome::PartiallyReachable { failed }
            });
        }

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.poll.on_failure();

        if self.consecutive_failures < self.config.ping_attempts {
            debug!(
                consecutive = self.consecutive_failures,
                threshold = self.config.ping_attempts,
                "all targets unreachable, below reboot threshold"
            );
            return Ok(CycleOutcome::Unreachable {
                consecutive: self.consecutive_failures,
            });
        }

        self.attempt_reboot().await
    }

    async fn probe_all(&self) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(self.config.targets.len());
        for target in &self.config.targets {
            let reachable = self.prober.probe(target).await;
            if reachable {
                info!(%target, "ping successful");
            } else {
                warn!(%target, "ping failed");
            }
            results.push(ProbeResult {
                target: target.clone(),
                reachable,
                timestamp: Instant::now(),
            });
        }
        results
    }

    async fn attempt_reboot(&mut self) -> Result<CycleOutcome, EngineError> {
        let now = Instant::now();
        if !self.limiter.permit(now) {
            warn!(
                max_reboots = self.config.max_reboots,
                window_secs = self.config.reboot_interval.as_secs(),
                "maximum number of reboots reached, skipping reboot"
            );
            return Ok(CycleOutcome::RebootDenied);
        }

        self.phase = Phase::RebootAttempt;

        if self.config.verify_gateway && !self.gateway.is_responding().await? {
            error!(gateway = %self.config.gateway_label, "gateway is not responding, skipping reboot");
            self.phase = Phase::Probing;
            return Ok(CycleOutcome::GatewayUnresponsive);
        }

        if let RebootOutcome::Failed(reason) = self.gateway.reboot().await? {
            error!(gateway = %self.config.gateway_label, %reason, "reboot request failed");
            self.phase = Phase::Probing;
            return Ok(CycleOutcome::RebootFailed);
        }

        self.limiter.record(now);
        info!(
            gateway = %self.config.gateway_label,
            recent = self.limiter.recent(now),
            "reboot requested successfully"
        );

        self.notifier
            .notify_after(self.reboot_message(), NOTIFY_DELAY);

        self.phase = Phase::Settling;
        let settled = self.backoff.current_wait(self.config.reboot_wait);
        info!(
            settle_secs = settled.as_secs(),
            multiplier = self.backoff.multiplier(),
            "waiting for gateway to restart"
        );
        tokio::time::sleep(settled).await;

        let multiplier = self.backoff.on_reboot();
        self.phase = Phase::Probing;
        Ok(CycleOutcome::Rebooted {
            settled,
            multiplier,
        })
    }

    fn reboot_message(&self) -> String {
        format!(
            "Modem at {} rebooted due to ping failure to {}",
            self.config.gateway_label,
            self.config.targets.join(",")
        )
    }

    /// Sleep before the next cycle.
    pub fn next_interval(&self) -> Duration {
        if self.config.adaptive_interval {
            self.poll.current_interval()
        } else {
            self.config.interval
        }
    }

    pub fn multiplier(&self) -> u32 {
        self.backoff.multiplier()
    }

    pub fn reboot_history_len(&self) -> usize {
        self.limiter.len()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}
