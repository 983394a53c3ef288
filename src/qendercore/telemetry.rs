use std::sync::Arc;

use serde_json::Value;

use super::QueryApi;
use super::types::{DeviceNode, DsQuery, DsResponse};
use crate::error::{BridgeError, Result};
use crate::logging::get_logger;
use crate::session::BearerToken;
use crate::snapshot::metric;

/// Derived field naming the per-inverter handle
pub const DEVICE_HANDLE_FIELD: &str = "enchwt";

/// Trailing window of the realtime query (ISO-8601 duration)
pub const REALTIME_WINDOW: &str = "PT15M";

/// Properties requested from the realtime dataset
pub const REALTIME_PROPS: [&str; 5] = [
    metric::SOLAR_POWER,
    metric::CONSUMPTION_POWER,
    metric::GRID_POWER,
    metric::BATTERY_POWER,
    metric::BATTERY_SOC,
];

/// Runs the two dependent telemetry queries for one inverter
pub struct TelemetryClient {
    api: Arc<dyn QueryApi>,
    hwid: String,
    logger: crate::logging::StructuredLogger,
}

impl TelemetryClient {
    pub fn new(api: Arc<dyn QueryApi>, hwid: impl Into<String>) -> Self {
        Self {
            api,
            hwid: hwid.into(),
            logger: get_logger("telemetry"),
        }
    }

    /// Resolve the opaque device handle from the hardware-version dataset
    pub async fn resolve_device_handle(&self, token: &BearerToken) -> Result<String> {
        let query = DsQuery::HardwareVersion {
            hwid: self.hwid.clone(),
            fields: vec![DEVICE_HANDLE_FIELD.to_string()],
        };
        let response = self.api.ds(token, &query).await?;
        let handle = device_handle(&response)?;
        self.logger.debug("Resolved device handle");
        Ok(handle)
    }

    /// Resolve the handle, then fetch the last realtime sample per property
    pub async fn fetch_snapshot_source(&self, token: &BearerToken) -> Result<DsResponse> {
        let enchwt = self.resolve_device_handle(token).await?;
        let query = DsQuery::Metrics {
            hwid: self.hwid.clone(),
            enchwt,
            props: REALTIME_PROPS.iter().map(ToString::to_string).collect(),
            duration: REALTIME_WINDOW.to_string(),
            resolution: "last".to_string(),
            tz: "local".to_string(),
        };
        let response = self.api.ds(token, &query).await?;
        self.logger.debug(&format!(
            "Fetched realtime metrics: {} columns, {} rows",
            response.cols.len(),
            response.rows.len()
        ));
        Ok(response)
    }

    /// Inverters visible to the account
    pub async fn list_inverters(&self, token: &BearerToken) -> Result<Vec<DeviceNode>> {
        Ok(self.api.device_tree(token).await?.tree)
    }
}

/// Pick the handle out of a hardware-version response
///
/// The value sits under the `enchwt` column, or in the first cell when the
/// response carries no column descriptors.
fn device_handle(response: &DsResponse) -> Result<String> {
    let index = response.column_index(DEVICE_HANDLE_FIELD).unwrap_or(0);
    let cell = response
        .first_row()
        .ok_or_else(|| {
            BridgeError::missing_field(DEVICE_HANDLE_FIELD, "hwv query returned no rows")
        })?
        .get(index);

    match cell {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(BridgeError::missing_field(
            DEVICE_HANDLE_FIELD,
            "No enchwt returned from hwv query",
        )),
    }
}
