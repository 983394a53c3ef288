use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Token endpoint payload shared by login and refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Result of a successful login or refresh
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Short-lived bearer token
    pub access_token: String,

    /// Rotating refresh token carried in `Set-Cookie`, when the server issued one
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Body of a `/v1/h/ds` query, tagged by `_ft`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "_ft")]
pub enum DsQuery {
    /// Hardware-version dataset, used to resolve the `enchwt` handle
    #[serde(rename = "hwv")]
    HardwareVersion {
        hwid: String,
        #[serde(rename = "f")]
        fields: Vec<String>,
    },

    /// Realtime metrics dataset
    #[serde(rename = "hwm")]
    Metrics {
        hwid: String,
        enchwt: String,
        props: Vec<String>,
        duration: String,
        resolution: String,
        tz: String,
    },
}

/// Column descriptor of a tabular response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub id: Option<String>,
}

/// Columnar `/v1/h/ds` response; `null` lists read as empty
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cols: Vec<Column>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl DsResponse {
    /// Position of a column by id
    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.cols.iter().position(|c| c.id.as_deref() == Some(id))
    }

    /// First row, the only meaningful one for single-sample queries
    pub fn first_row(&self) -> Option<&[serde_json::Value]> {
        self.rows.first().map(Vec::as_slice)
    }
}

/// `/v1/h/devicetree` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceTree {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tree: Vec<DeviceNode>,
}

/// One inverter entry of the device tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceNode {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub key: Option<String>,
}

impl fmt::Display for DeviceNode {
    /// `title<TAB>key`, with `None` standing in for a missing field
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}",
            self.title.as_deref().unwrap_or("None"),
            self.key.as_deref().unwrap_or("None")
        )
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hardware_version_query_shape() {
        let query = DsQuery::HardwareVersion {
            hwid: "hw-1".into(),
            fields: vec!["enchwt".into()],
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"_ft": "hwv", "hwid": "hw-1", "f": ["enchwt"]})
        );
    }

    #[test]
    fn test_metrics_query_shape() {
        let query = DsQuery::Metrics {
            hwid: "hw-1".into(),
            enchwt: "h".into(),
            props: vec!["inv.core.batt_soc_perc".into()],
            duration: "PT15M".into(),
            resolution: "last".into(),
            tz: "local".into(),
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["_ft"], "hwm");
        assert_eq!(value["enchwt"], "h");
        assert_eq!(value["duration"], "PT15M");
        assert_eq!(value["props"][0], "inv.core.batt_soc_perc");
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let resp: DsResponse = serde_json::from_str(r#"{"cols": null, "rows": null}"#).unwrap();
        assert!(resp.cols.is_empty());
        assert!(resp.rows.is_empty());

        let resp: DsResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp, DsResponse::default());
    }

    #[test]
    fn test_device_tree_parses() {
        let tree: DeviceTree = serde_json::from_value(json!({
            "tree": [{"title": "Garage", "key": "abc"}, {"key": "def"}]
        }))
        .unwrap();
        assert_eq!(tree.tree.len(), 2);
        assert_eq!(tree.tree[0].title.as_deref(), Some("Garage"));
        assert_eq!(tree.tree[1].title, None);
    }

    #[test]
    fn test_device_node_listing_line() {
        let node = DeviceNode {
            title: Some("Garage".into()),
            key: Some("abc".into()),
        };
        assert_eq!(node.to_string(), "Garage\tabc");

        let untitled = DeviceNode {
            title: None,
            key: Some("def".into()),
        };
        assert_eq!(untitled.to_string(), "None\tdef");
        assert_eq!(DeviceNode::default().to_string(), "None\tNone");
    }

    #[test]
    fn test_grant_debug_hides_tokens() {
        let grant = TokenGrant {
            access_token: "secret-a".into(),
            refresh_token: Some("secret-r".into()),
        };
        let printed = format!("{grant:?}");
        assert!(!printed.contains("secret"));
    }
}
