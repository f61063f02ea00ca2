//! Wires the gateway session, prober and notifier into the decision engine.

use anyhow::Context;
use tracing::{error, info};

use modemwatch_core::Settings;
use modemwatch_engine::{DecisionEngine, EngineConfig, PingProber};
use modemwatch_gateway::{Credentials, GatewaySession, HuaweiClient, RetryPolicy};
use modemwatch_notify::WebhookNotifier;

/// Run the watchdog until a termination signal or a fatal error.
///
/// A signal is a clean exit; losing the gateway session is not.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tokio::select! {
        result = supervise(settings) => {
            if let Err(e) = &result {
                error!(error = %format!("{e:#}"), "watchdog stopped");
            }
            result
        }
        signal = shutdown_signal() => {
            let name = signal?;
            info!(signal = name, "received termination signal, exiting gracefully");
            Ok(())
        }
    }
}

async fn supervise(settings: Settings) -> anyhow::Result<()> {
    let client = HuaweiClient::new(&settings.url).context("invalid modem URL")?;
    let credentials = Credentials::new(settings.username.clone(), settings.password.clone());

    info!(url = %settings.url, username = %settings.username, "connecting to gateway");
    let session = GatewaySession::connect(client, credentials, RetryPolicy::default())
        .await
        .with_context(|| format!("failed to establish a session with {}", settings.url))?;
    info!(url = %settings.url, "gateway session established");

    let notifier = WebhookNotifier::new(settings.webhook_url.clone())
        .context("failed to build webhook client")?;
    if !notifier.is_enabled() {
        info!("no webhook configured, reboot notifications disabled");
    }

    let prober = PingProber::new(settings.probe_timeout);
    let mut engine = DecisionEngine::new(
        EngineConfig::from_settings(&settings),
        prober,
        session,
        notifier,
    );

    engine.run().await.context("gateway session lost")?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> anyhow::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for SIGINT")?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> anyhow::Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    Ok("ctrl-c")
}
