//! modemwatch-notify — fire-and-forget webhook notifications.
//!
//! Each notification runs on its own detached task: it sleeps for the
//! requested delay, posts `{"content": "..."}` once, and logs the result.
//! Nothing is retried and nothing flows back to the caller.

pub mod webhook;

pub use webhook::{NotifyError, WebhookNotifier, WebhookPayload};
