//! Retry and re-authentication around a `GatewayApi`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use modemwatch_engine::{EngineError, Gateway, RebootOutcome};

use crate::client::GatewayApi;
use crate::error::{GatewayError, GatewayResult};

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated gateway handle that recovers from session expiry.
#[derive(Debug)]
pub struct GatewaySession<A> {
    api: A,
    credentials: Credentials,
    retry: RetryPolicy,
}

impl<A: GatewayApi> GatewaySession<A> {
    /// Open a session (retried per `retry`) and log in once.
    ///
    /// Both exhausting the connection retries and a rejected login are
    /// returned as errors; the caller treats them as fatal.
    pub async fn connect(
        mut api: A,
        credentials: Credentials,
        retry: RetryPolicy,
    ) -> GatewayResult<Self> {
        let attempts = retry.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match api.open().await {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    warn!(attempt, max = attempts, error = %e, "gateway connection failed, retrying");
                    tokio::time::sleep(retry.delay).await;
                }
                Err(e) => {
                    error!(attempts, error = %e, "giving up connecting to gateway");
                    return Err(e);
                }
            }
        }

        let mut session = Self {
            api,
            credentials,
            retry,
        };
        session.authenticate().await?;
        Ok(session)
    }

    /// Log in with the configured credentials.
    pub async fn authenticate(&mut self) -> GatewayResult<()> {
        match self
            .api
            .login(&self.credentials.username, &self.credentials.password)
            .await
        {
            Ok(()) => {
                info!(username = %self.credentials.username, "logged in to gateway");
                Ok(())
            }
            Err(e) => {
                error!(username = %self.credentials.username, error = %e, "login error");
                Err(e)
            }
        }
    }

    /// Refresh the session and log in again. Failure is unrecoverable.
    async fn reauthenticate(&mut self) -> Result<(), EngineError> {
        warn!("re-authenticating with the gateway");
        if let Err(e) = self.api.open().await {
            error!(error = %e, "failed to refresh gateway session");
            return Err(EngineError::SessionLost(e.to_string()));
        }
        self.authenticate()
            .await
            .map_err(|e| EngineError::SessionLost(e.to_string()))
    }

    /// Liveness check with bounded retries.
    ///
    /// An expired session is re-authenticated once, followed by exactly
    /// one more check whose result is final.
    pub async fn check_responding(&mut self) -> Result<bool, EngineError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.api.device_information().await {
                Ok(info) => {
                    debug!(
                        device = info.device_name.as_deref().unwrap_or("unknown"),
                        serial = info.serial_number.as_deref().unwrap_or("unknown"),
                        hardware = info.hardware_version.as_deref().unwrap_or("unknown"),
                        software = info.software_version.as_deref().unwrap_or("unknown"),
                        "gateway is responding"
                    );
                    return Ok(true);
                }
                Err(GatewayError::LoginRequired) => {
                    self.reauthenticate().await?;
                    return match self.api.device_information().await {
                        Ok(_) => Ok(true),
                        Err(e) => {
                            warn!(error = %e, "gateway liveness check failed after re-authentication");
                            Ok(false)
                        }
                    };
                }
                Err(e) if attempt < attempts => {
                    warn!(attempt, max = attempts, error = %e, "gateway liveness check failed, retrying");
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => {
                    error!(attempts, error = %e, "gateway is not responding");
                    return Ok(false);
                }
            }
        }
    }

    /// Request a reboot; an expired session gets one re-login and one retry.
    pub async fn request_reboot(&mut self) -> Result<RebootOutcome, EngineError> {
        match self.api.reboot().await {
            Ok(()) => Ok(RebootOutcome::Acknowledged),
            Err(GatewayError::LoginRequired) => {
                self.reauthenticate().await?;
                Ok(match self.api.reboot().await {
                    Ok(()) => RebootOutcome::Acknowledged,
                    Err(e) => RebootOutcome::Failed(e.to_string()),
                })
            }
            Err(e) => Ok(RebootOutcome::Failed(e.to_string())),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

#[async_trait]
impl<A: GatewayApi> Gateway for GatewaySession<A> {
    async fn is_responding(&mut self) -> Result<bool, EngineError> {
        self.check_responding().await
    }

    async fn reboot(&mut self) -> Result<RebootOutcome, EngineError> {
        self.request_reboot().await
    }
}
