use std::sync::{Arc, Mutex};

use serde_json::{Map, Value, json};
use soltaro_bridge::bridge::{Bridge, HubCommand, HubTransport, command};
use soltaro_bridge::error::{BridgeError, Result};
use soltaro_bridge::snapshot::{Snapshot, metric};

#[derive(Default)]
struct RecordingHub {
    sent: Mutex<Vec<HubCommand>>,
    fail_on: Option<&'static str>,
}

impl RecordingHub {
    fn names(&self) -> Vec<&'static str> {
        self.sent.lock().unwrap().iter().map(|c| c.name).collect()
    }
}

#[async_trait::async_trait]
impl HubTransport for RecordingHub {
    async fn send(&self, cmd: &HubCommand) -> Result<()> {
        if self.fail_on == Some(cmd.name) {
            return Err(BridgeError::hub(format!("{} failed: connection refused", cmd.name)));
        }
        self.sent.lock().unwrap().push(cmd.clone());
        Ok(())
    }
}

fn snapshot(pairs: &[(&str, Value)]) -> Snapshot {
    let metrics: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect();
    Snapshot::from_metrics(metrics)
}

fn full_snapshot() -> Snapshot {
    snapshot(&[
        (metric::SOLAR_POWER, json!(2100)),
        (metric::CONSUMPTION_POWER, json!(600)),
        (metric::GRID_POWER, json!(-900)),
        (metric::BATTERY_POWER, json!(-600)),
        (metric::BATTERY_SOC, json!(55)),
        (metric::TIMESTAMP, json!("2026-10-16T10:00:00")),
    ])
}

#[tokio::test]
async fn pushes_all_commands_in_declared_order() {
    let hub = Arc::new(RecordingHub::default());
    let bridge = Bridge::new(hub.clone());

    let sent = bridge.push(&full_snapshot()).await.unwrap();

    assert_eq!(sent, 7);
    assert_eq!(
        hub.names(),
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
    let sent = hub.sent.lock().unwrap();
    assert_eq!(sent[2].argument, "discharging");
    assert_eq!(sent[6].argument, "2026-10-16T10:00:00");
}

#[tokio::test]
async fn absent_battery_power_skips_the_power_pair() {
    let hub = Arc::new(RecordingHub::default());
    let bridge = Bridge::new(hub.clone());
    let s = snapshot(&[
        (metric::SOLAR_POWER, json!(2100)),
        (metric::CONSUMPTION_POWER, json!(600)),
        (metric::GRID_POWER, json!(-900)),
        (metric::BATTERY_SOC, json!(55)),
    ]);

    let sent = bridge.push(&s).await.unwrap();

    assert_eq!(sent, 5);
    assert_eq!(
        hub.names(),
        [
            command::SET_BATTERY_SOC,
            command::SET_SOLAR_POWER,
            command::SET_CONSUMPTION_POWER,
            command::SET_GRID_POWER,
            command::SET_LAST_TIMESTAMP,
        ]
    );
}

#[tokio::test]
async fn failure_stops_remaining_commands() {
    let hub = Arc::new(RecordingHub {
        fail_on: Some(command::SET_SOLAR_POWER),
        ..RecordingHub::default()
    });
    let bridge = Bridge::new(hub.clone());

    let err = bridge.push(&full_snapshot()).await.unwrap_err();

    assert!(matches!(err, BridgeError::Hub { .. }));
    assert_eq!(
        hub.names(),
        [
            command::SET_BATTERY_SOC,
            command::SET_BATTERY_POWER,
            command::SET_BATTERY_STATE,
        ]
    );
}

#[tokio::test]
async fn empty_snapshot_still_stamps_the_device() {
    let hub = Arc::new(RecordingHub::default());
    let bridge = Bridge::new(hub.clone());

    let sent = bridge.push(&Snapshot::default()).await.unwrap();

    assert_eq!(sent, 1);
    assert_eq!(hub.names(), [command::SET_LAST_TIMESTAMP]);
    let stamp = hub.sent.lock().unwrap()[0].argument.clone();
    assert!(chrono::NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%dT%H:%M:%S").is_ok());
}
