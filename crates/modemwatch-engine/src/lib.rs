//! modemwatch-engine — the reboot decision engine.
//!
//! Turns a stream of noisy reachability probes into a bounded,
//! rate-limited sequence of gateway reboots.
//!
//! # Architecture
//!
//! ```text
//! DecisionEngine
//!   ├── Prober (one ping per target per cycle)
//!   ├── RebootLimiter (sliding window over executed reboots)
//!   ├── Gateway (liveness check, reboot, transparent re-auth)
//!   ├── BackoffController (settling wait multiplier, 1 → 15)
//!   ├── Notifier (deferred, fire-and-forget webhook)
//!   └── PollState (adaptive probe interval, 1s → 60s)
//! ```
//!
//! # Cycle
//!
//! A cycle fails when every target is unreachable. After `ping_attempts`
//! consecutive failed cycles the engine asks the limiter for a permit,
//! optionally verifies the gateway still answers, and requests a reboot.
//! Only an acknowledged reboot is recorded, notified, and followed by the
//! settling wait (`reboot_wait * multiplier`). Any cycle with at least one
//! reachable target resets the multiplier to 1.

pub mod backoff;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod poll;
pub mod probe;

pub use backoff::BackoffController;
pub use engine::{
    CycleOutcome, DecisionEngine, EngineConfig, Gateway, Notifier, Phase, RebootOutcome,
};
pub use error::EngineError;
pub use limiter::{RebootEvent, RebootLimiter};
pub use poll::PollState;
pub use probe::{PingProber, ProbeResult, Prober};
