//! One poll cycle: session, telemetry, normalization, push

use std::sync::Arc;

use crate::bridge::Bridge;
use crate::config::Config;
use crate::daemon::PollCycle;
use crate::error::{BridgeError, Result};
use crate::hubitat::MakerApiTransport;
use crate::logging::get_logger;
use crate::persistence::SessionStore;
use crate::qendercore::{AuthApi, DeviceNode, QenderClient, QueryApi, TelemetryClient};
use crate::session::{Credentials, SessionManager};
use crate::snapshot::Snapshot;

/// Sequenced components of a poll cycle
pub struct Pipeline {
    sessions: SessionManager,
    telemetry: TelemetryClient,
    bridge: Option<Bridge>,
    logger: crate::logging::StructuredLogger,
}

impl Pipeline {
    pub fn new(
        sessions: SessionManager,
        telemetry: TelemetryClient,
        bridge: Option<Bridge>,
    ) -> Self {
        Self {
            sessions,
            telemetry,
            bridge,
            logger: get_logger("pipeline"),
        }
    }

    /// Wire the real HTTP clients from configuration
    ///
    /// The hub bridge is only built when the Maker API settings are complete.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(QenderClient::new(&config.qendercore)?);
        let auth: Arc<dyn AuthApi> = client.clone();
        let query: Arc<dyn QueryApi> = client;

        let sessions = SessionManager::new(
            auth,
            SessionStore::open(&config.state_file),
            Credentials {
                username: config.qendercore.username.clone(),
                password: config.qendercore.password.clone(),
            },
        );
        let telemetry = TelemetryClient::new(query, config.qendercore.hwid.clone());
        let bridge = if config.hubitat.is_configured() {
            Some(Bridge::new(Arc::new(MakerApiTransport::new(
                &config.hubitat,
            )?)))
        } else {
            None
        };

        Ok(Self::new(sessions, telemetry, bridge))
    }

    /// Fetch a snapshot and, when asked, push it to the hub
    pub async fn poll_once(&mut self, push: bool) -> Result<Snapshot> {
        let token = self.sessions.acquire().await?;
        let source = self.telemetry.fetch_snapshot_source(&token).await?;
        let snapshot = Snapshot::from_response(&source);

        if push {
            let bridge = self.bridge.as_ref().ok_or_else(|| {
                BridgeError::config(
                    "Hubitat settings missing (HUBITAT_MAKER_BASE_URL, HUBITAT_MAKER_TOKEN, HUBITAT_DEVICE_ID)",
                )
            })?;
            bridge.push(&snapshot).await?;
        }

        self.logger.info(&format!(
            "SOC={} battery={}W ({})",
            display_or_dash(snapshot.state_of_charge()),
            display_or_dash(snapshot.battery_power()),
            snapshot.battery_state()
        ));
        Ok(snapshot)
    }

    /// Inverters visible to the account
    pub async fn list_inverters(&mut self) -> Result<Vec<DeviceNode>> {
        let token = self.sessions.acquire().await?;
        self.telemetry.list_inverters(&token).await
    }

    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

#[async_trait::async_trait]
impl PollCycle for Pipeline {
    async fn run_cycle(&mut self) -> Result<()> {
        self.poll_once(true).await.map(|_| ())
    }
}

fn display_or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
