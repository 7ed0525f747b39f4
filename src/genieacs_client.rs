use crate::{config::AppConfig, http_client::acs_http_client, services::projection::paths};
use log::{error, info};
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use trait_variant::make;

/// One CPE as the ACS stores it: two stable top-level fields plus the
/// vendor object-model tree, which varies by vendor and firmware. Any leaf
/// below the tree may be absent.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawDevice {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_deviceId", default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<DeviceIdentity>,

    #[serde(flatten)]
    pub tree: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeviceIdentity {
    #[serde(rename = "_Manufacturer", default)]
    pub manufacturer: Option<String>,

    #[serde(rename = "_ProductClass", default)]
    pub product_class: Option<String>,

    #[serde(rename = "_OUI", default, skip_serializing_if = "Option::is_none")]
    pub oui: Option<String>,

    #[serde(rename = "_SerialNumber", default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// A work item queued on the ACS for one device. The ACS processes tasks
/// asynchronously; no completion callback is observed here.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "name")]
pub enum Task {
    #[serde(rename = "refreshObject", rename_all = "camelCase")]
    RefreshObject { object_name: String },

    #[serde(rename = "setParameterValues", rename_all = "camelCase")]
    SetParameterValues { parameter_values: Vec<ParameterValue> },
}

/// One `(parameter path, value, type tag)` tuple of a `setParameterValues`
/// task, serialized as a three-element array on the wire.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterValue(pub String, pub String, pub String);

impl ParameterValue {
    pub fn string(path: &str, value: &str) -> Self {
        ParameterValue(path.to_string(), value.to_string(), "xsd:string".to_string())
    }
}

/// Verbatim ACS response to a task submission. The caller decides what a
/// given status means; queued-vs-executed semantics belong to the ACS.
#[derive(Clone, Debug, Serialize)]
pub struct TaskOutcome {
    pub status: u16,
    pub body: String,
}

impl TaskOutcome {
    pub fn accepted(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum AcsError {
    #[error("failed to fetch device inventory: {status}")]
    InventoryFetch { status: String },

    #[error("failed to decode device inventory: {0}")]
    MalformedInventory(#[from] serde_json::Error),

    #[error("ACS request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[make(Send)]
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait AcsClient {
    async fn list_devices(&self) -> Result<Vec<RawDevice>, AcsError>;
    async fn find_device_id_by_mac(&self, mac: &str) -> Option<String>;
    async fn submit_task(&self, device_id: &str, task: &Task) -> Result<TaskOutcome, AcsError>;
}

#[derive(Clone)]
pub struct GenieAcsClient {
    client: Client,
    base_url: String,
}

impl GenieAcsClient {
    const DEVICES_ENDPOINT: &str = "/devices";

    pub fn new() -> Result<Self, AcsError> {
        Self::with_base_url(&AppConfig::get().acs.base_url)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, AcsError> {
        let client = acs_http_client()?;

        Ok(GenieAcsClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn devices_url(&self) -> String {
        format!("{}{}", self.base_url, Self::DEVICES_ENDPOINT)
    }

    /// Inventory query filtered by LAN-side MAC address.
    fn lookup_url(&self, mac: &str) -> String {
        let query = json!({ (paths::LAN_MAC_ADDRESS): mac }).to_string();
        format!(
            "{}{}/?query={}",
            self.base_url,
            Self::DEVICES_ENDPOINT,
            urlencoding::encode(&query)
        )
    }

    /// Task queue for one device; `connection_request` asks the ACS to ping
    /// the CPE right away instead of waiting for its next inform.
    fn tasks_url(&self, device_id: &str) -> String {
        format!(
            "{}{}/{}/tasks?connection_request",
            self.base_url,
            Self::DEVICES_ENDPOINT,
            urlencoding::encode(device_id)
        )
    }
}

impl AcsClient for GenieAcsClient {
    async fn list_devices(&self) -> Result<Vec<RawDevice>, AcsError> {
        let url = self.devices_url();
        info!("GET {url}");

        let res = self.client.get(&url).send().await?;
        let status = res.status();

        if !status.is_success() {
            return Err(AcsError::InventoryFetch {
                status: status.to_string(),
            });
        }

        let body = res.text().await?;
        let devices = serde_json::from_str(&body)?;
        Ok(devices)
    }

    async fn find_device_id_by_mac(&self, mac: &str) -> Option<String> {
        let url = self.lookup_url(mac);
        info!("GET {url}");

        let res = match self.client.get(&url).send().await {
            Ok(res) => res,
            Err(e) => {
                error!("device lookup by MAC failed: {e}");
                return None;
            }
        };

        if !res.status().is_success() {
            error!("device lookup by MAC failed: {}", res.status());
            return None;
        }

        let matches: Vec<RawDevice> = match res.json().await {
            Ok(matches) => matches,
            Err(e) => {
                error!("failed to decode device lookup result: {e}");
                return None;
            }
        };

        match matches.into_iter().next() {
            Some(device) => {
                info!("device found for MAC {mac}: {}", device.id);
                Some(device.id)
            }
            None => {
                error!("no device found for MAC {mac}");
                None
            }
        }
    }

    async fn submit_task(&self, device_id: &str, task: &Task) -> Result<TaskOutcome, AcsError> {
        let url = self.tasks_url(device_id);
        info!("POST {url}");

        let res = self.client.post(&url).json(task).send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;

        Ok(TaskOutcome { status, body })
    }
}
