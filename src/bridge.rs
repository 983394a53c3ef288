//! Mapping of snapshots onto Hubitat device commands
//!
//! The command list is fixed and ordered. Values the snapshot does not carry
//! are skipped entirely, never sent as placeholders. Commands go out one by one
//! with no atomicity: a failure stops the rest of the push and the next cycle
//! brings the device up to date again.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::error::Result;
use crate::logging::get_logger;
use crate::snapshot::{BatteryState, Snapshot, metric};

/// Hubitat virtual device command names
pub mod command {
    pub const SET_BATTERY_SOC: &str = "setBatterySoc";
    pub const SET_BATTERY_POWER: &str = "setBatteryPower";
    pub const SET_BATTERY_STATE: &str = "setBatteryState";
    pub const SET_SOLAR_POWER: &str = "setSolarPower";
    pub const SET_CONSUMPTION_POWER: &str = "setConsumptionPower";
    pub const SET_GRID_POWER: &str = "setGridPower";
    pub const SET_LAST_TIMESTAMP: &str = "setLastTimestamp";
}

/// A single named, single-argument device command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubCommand {
    pub name: &'static str,
    pub argument: String,
}

impl HubCommand {
    pub fn new(name: &'static str, argument: impl Into<String>) -> Self {
        Self {
            name,
            argument: argument.into(),
        }
    }
}

/// Delivers one command to the hub
#[async_trait::async_trait]
pub trait HubTransport: Send + Sync {
    async fn send(&self, command: &HubCommand) -> Result<()>;
}

/// Where each value command takes its argument from
enum Source {
    Metric(&'static str),
    BatteryState,
}

const VALUE_COMMANDS: [(&str, Source); 6] = [
    (command::SET_BATTERY_SOC, Source::Metric(metric::BATTERY_SOC)),
    (command::SET_BATTERY_POWER, Source::Metric(metric::BATTERY_POWER)),
    (command::SET_BATTERY_STATE, Source::BatteryState),
    (command::SET_SOLAR_POWER, Source::Metric(metric::SOLAR_POWER)),
    (
        command::SET_CONSUMPTION_POWER,
        Source::Metric(metric::CONSUMPTION_POWER),
    ),
    (command::SET_GRID_POWER, Source::Metric(metric::GRID_POWER)),
];

/// Render a metric the way the device driver parses it
fn format_argument(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ordered commands for a snapshot, absent values dropped
///
/// The battery state is derived from battery power, so it is skipped
/// together with it. The trailing timestamp is always present: the
/// snapshot's own, or `now` to the second.
pub fn commands_for(snapshot: &Snapshot, now: DateTime<Local>) -> Vec<HubCommand> {
    let mut commands: Vec<HubCommand> = VALUE_COMMANDS
        .iter()
        .filter_map(|(name, source)| {
            let argument = match source {
                Source::Metric(key) => format_argument(snapshot.get(key)?),
                Source::BatteryState => match snapshot.battery_state() {
                    BatteryState::Unknown => return None,
                    state => state.as_str().to_string(),
                },
            };
            Some(HubCommand::new(*name, argument))
        })
        .collect();

    let timestamp = snapshot.timestamp().map_or_else(
        || now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        str::to_string,
    );
    commands.push(HubCommand::new(command::SET_LAST_TIMESTAMP, timestamp));
    commands
}

/// Pushes snapshots to the hub through a [`HubTransport`]
pub struct Bridge {
    transport: Arc<dyn HubTransport>,
    logger: crate::logging::StructuredLogger,
}

impl Bridge {
    pub fn new(transport: Arc<dyn HubTransport>) -> Self {
        Self {
            transport,
            logger: get_logger("bridge"),
        }
    }

    /// Dispatch every command in order; returns how many were sent
    pub async fn push(&self, snapshot: &Snapshot) -> Result<usize> {
        let commands = commands_for(snapshot, Local::now());
        for (sent, cmd) in commands.iter().enumerate() {
            if let Err(e) = self.transport.send(cmd).await {
                self.logger.warn(&format!(
                    "Push aborted at {} after {sent} of {} commands",
                    cmd.name,
                    commands.len()
                ));
                return Err(e);
            }
            self.logger
                .trace(&format!("Sent {} {}", cmd.name, cmd.argument));
        }
        self.logger
            .debug(&format!("Pushed {} commands to the hub", commands.len()));
        Ok(commands.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Map, json};

    fn snapshot(pairs: &[(&str, Value)]) -> Snapshot {
        let metrics: Map<String, Value> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        Snapshot::from_metrics(metrics)
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_full_snapshot_order() {
        let s = snapshot(&[
            (metric::SOLAR_POWER, json!(1200)),
            (metric::CONSUMPTION_POWER, json!(450.5)),
            (metric::GRID_POWER, json!(-20)),
            (metric::BATTERY_POWER, json!(730)),
            (metric::BATTERY_SOC, json!(64)),
        ]);
        let commands = commands_for(&s, fixed_now());
        let names: Vec<_> = commands.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            [
                command::SET_BATTERY_SOC,
                command::SET_BATTERY_POWER,
                command::SET_BATTERY_STATE,
                command::SET_SOLAR_POWER,
                command::SET_CONSUMPTION_POWER,
                command::SET_GRID_POWER,
                command::SET_LAST_TIMESTAMP,
            ]
        );
        assert_eq!(commands[0].argument, "64");
        assert_eq!(commands[2].argument, "charging");
        assert_eq!(commands[4].argument, "450.5");
        assert_eq!(commands[5].argument, "-20");
        assert_eq!(commands[6].argument, "2026-10-16T09:30:05");
    }

    #[test]
    fn test_snapshot_timestamp_wins() {
        let s = snapshot(&[(metric::TIMESTAMP, json!("2026-10-16 08:00"))]);
        let commands = commands_for(&s, fixed_now());
        assert_eq!(
            commands,
            [HubCommand::new(command::SET_LAST_TIMESTAMP, "2026-10-16 08:00")]
        );
    }

    #[test]
    fn test_null_values_are_skipped() {
        let s = snapshot(&[
            (metric::BATTERY_SOC, Value::Null),
            (metric::BATTERY_POWER, json!(0)),
        ]);
        let commands = commands_for(&s, fixed_now());
        let names: Vec<_> = commands.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            [
                command::SET_BATTERY_POWER,
                command::SET_BATTERY_STATE,
                command::SET_LAST_TIMESTAMP,
            ]
        );
        assert_eq!(commands[1].argument, "idle");
    }
}
