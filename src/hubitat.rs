//! Hubitat Maker API transport
//!
//! One command is one `GET <base>/devices/<id>/<command>/<argument>?access_token=…`.
//! The response body is ignored; only a successful status matters.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::bridge::{HubCommand, HubTransport};
use crate::config::HubitatConfig;
use crate::error::{BridgeError, Result};
use crate::logging::get_logger;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Sends device commands through the Maker API app
pub struct MakerApiTransport {
    http: Client,
    base_url: Url,
    access_token: String,
    device_id: String,
    logger: crate::logging::StructuredLogger,
}

impl MakerApiTransport {
    pub fn new(config: &HubitatConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            BridgeError::validation("hubitat.base_url", format!("invalid URL: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BridgeError::validation(
                "hubitat.base_url",
                "URL cannot carry a path",
            ));
        }

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url,
            access_token: config.access_token.clone(),
            device_id: config.device_id.trim().to_string(),
            logger: get_logger("hubitat"),
        })
    }

    /// Full command URL; every path segment is percent-encoded, `/` included
    pub fn command_url(&self, command: &HubCommand) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BridgeError::config("invalid Hubitat base URL"))?
            .pop_if_empty()
            .extend([
                "devices",
                self.device_id.as_str(),
                command.name,
                command.argument.as_str(),
            ]);
        url.query_pairs_mut()
            .clear()
            .append_pair("access_token", &self.access_token);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl HubTransport for MakerApiTransport {
    async fn send(&self, command: &HubCommand) -> Result<()> {
        let url = self.command_url(command)?;
        self.logger
            .trace(&format!("{} -> device {}", command.name, self.device_id));
        // without_url() keeps the access token out of error messages
        self.http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| BridgeError::hub(format!("{} failed: {}", command.name, e.without_url())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> MakerApiTransport {
        MakerApiTransport::new(&HubitatConfig {
            base_url: base_url.into(),
            access_token: "a b&c".into(),
            device_id: "17".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_command_url_encodes_argument_and_token() {
        let t = transport("http://hub.local/apps/api/7/");
        let url = t
            .command_url(&HubCommand::new("setLastTimestamp", "2026-10-16T09:30:05"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://hub.local/apps/api/7/devices/17/setLastTimestamp/2026-10-16T09:30:05?access_token=a+b%26c"
        );

        let url = t
            .command_url(&HubCommand::new("setBatteryState", "a/b c"))
            .unwrap();
        assert!(url.path().ends_with("/setBatteryState/a%2Fb%20c"));
    }

    #[test]
    fn test_missing_settings_rejected() {
        let err = MakerApiTransport::new(&HubitatConfig::default()).err();
        assert!(matches!(err, Some(BridgeError::Config { .. })));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = MakerApiTransport::new(&HubitatConfig {
            base_url: "not a url".into(),
            access_token: "t".into(),
            device_id: "1".into(),
        })
        .err();
        assert!(matches!(err, Some(BridgeError::Validation { .. })));
    }
}
