//! # Soltaro bridge - Qendercore battery telemetry for Hubitat
//!
//! Periodically fetches live power and state-of-charge metrics of a Soltaro
//! battery inverter from the Qendercore cloud and forwards them as commands
//! to a virtual device on a Hubitat hub through the Maker API.
//!
//! ## Architecture
//!
//! Data flows strictly downward through these modules every cycle:
//!
//! - `persistence`: the rotating refresh token on disk
//! - `session`: bearer token acquisition (refresh first, login fallback)
//! - `qendercore`: HTTP client and the two dependent telemetry queries
//! - `snapshot`: columnar response to keyed metrics, battery state
//! - `bridge`: ordered hub commands, dispatched through `hubitat`
//! - `pipeline` and `daemon`: one cycle, and the fixed-interval loop around it
//!
//! `config`, `logging` and `error` are shared by all of them.

pub mod bridge;
pub mod config;
pub mod daemon;
pub mod error;
pub mod hubitat;
pub mod logging;
pub mod persistence;
pub mod pipeline;
pub mod qendercore;
pub mod session;
pub mod snapshot;

// Re-export commonly used types
pub use config::Config;
pub use daemon::{Daemon, PollCycle};
pub use error::{BridgeError, Result};
pub use pipeline::Pipeline;
pub use snapshot::{BatteryState, Snapshot};
