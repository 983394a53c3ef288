//! Qendercore cloud integration
//!
//! `client` talks HTTP, `telemetry` sequences the two dependent queries, and
//! `types` holds the typed wire records. The traits below are the seams the
//! session manager and telemetry client are written against.

pub mod client;
pub mod telemetry;
pub mod types;

pub use client::QenderClient;
pub use telemetry::TelemetryClient;
pub use types::{Column, DeviceNode, DeviceTree, DsQuery, DsResponse, TokenGrant};

use crate::error::Result;
use crate::session::BearerToken;

/// Client sequence header expected by the Qendercore apps
pub const CLIENT_SEQ: &str = "A.2.3";

/// User agent of the official iOS app
pub const USER_AGENT: &str = "Qendercore/98 CFNetwork/3860.300.31 Darwin/25.2.0";

/// Name of the cookie carrying the rotating refresh token
pub const REFRESH_COOKIE: &str = "rtok";

/// Token endpoints
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange a refresh token for a new bearer token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;

    /// Full username/password login
    async fn login(&self, username: &str, password: &str) -> Result<TokenGrant>;
}

/// Data endpoints
#[async_trait::async_trait]
pub trait QueryApi: Send + Sync {
    /// Run a `/v1/h/ds` dataset query
    async fn ds(&self, token: &BearerToken, query: &DsQuery) -> Result<DsResponse>;

    /// Fetch the inverter device tree
    async fn device_tree(&self, token: &BearerToken) -> Result<DeviceTree>;
}
