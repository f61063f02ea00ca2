//! Error types for the decision engine.

use thiserror::Error;

/// Errors that stop the decision engine.
///
/// Everything else (failed probes, rejected reboots, unresponsive gateway)
/// is handled inside the cycle and never leaves the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("gateway session lost, re-authentication failed: {0}")]
    SessionLost(String),
}
