//! modemwatch-gateway — authenticated access to the gateway.
//!
//! `HuaweiClient` speaks the Huawei LTE web management API (XML over
//! HTTP with rotating verification tokens). `GatewaySession` wraps any
//! [`GatewayApi`] with the recovery policy the decision engine relies on:
//!
//! - connect: up to 3 attempts, 5s apart, then fatal
//! - liveness: up to 3 attempts, 5s apart; an expired session triggers one
//!   re-login and exactly one more check
//! - reboot: an expired session triggers one re-login and one retry
//!
//! A failed re-login is the only error that reaches the engine.

pub mod auth;
pub mod client;
pub mod error;
pub mod session;
mod xml;

pub use client::{DeviceInformation, GatewayApi, HuaweiClient};
pub use error::{GatewayError, GatewayResult};
pub use session::{Credentials, GatewaySession, RetryPolicy};
