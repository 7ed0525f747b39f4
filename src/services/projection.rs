//! Device classification pipeline.
//!
//! Turns the raw ACS inventory into the fleet views the dashboard renders.
//! A device is classified by its WAN PPPoE username alone: the fixed reset
//! sentinel marks an unprovisioned device, any other username marks a
//! configured ("online") one, and an absent username leaves the device
//! unclassified. Views are recomputed from scratch on every call; nothing
//! is cached between invocations.

use crate::genieacs_client::RawDevice;
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// PPPoE username a CPE reports after a factory reset, before an operator
/// provisions it. Compared trimmed and lowercased.
pub const RESET_SENTINEL: &str = "resetado@fixanet.com";

/// TR-098 object-model paths for this deployment's device fleet.
///
/// The numeric instance keys (`1`, `2`, `6`) are conventions of the CPE
/// models in the field, not discovered from the ACS. A device whose vendor
/// tree uses other instance numbers reports no username through these paths
/// and stays unclassified.
pub mod paths {
    pub const WAN_PPPOE_USERNAME: &str =
        "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.2.Username";
    pub const LAN_MAC_ADDRESS: &str =
        "InternetGatewayDevice.LANDevice.1.LANEthernetInterfaceConfig.1.MACAddress";
    pub const WLAN_SSID_24G: &str =
        "InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.SSID";
    pub const WLAN_SSID_5G: &str =
        "InternetGatewayDevice.LANDevice.1.WLANConfiguration.6.SSID";
    pub const WLAN_KEY_24G: &str =
        "InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.KeyPassphrase";
    pub const WLAN_KEY_5G: &str =
        "InternetGatewayDevice.LANDevice.1.WLANConfiguration.6.KeyPassphrase";
}

/// A factory-reset CPE awaiting provisioning. Leaf fields stay `None` when
/// the vendor tree does not carry them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResetCpe {
    pub mac: Option<String>,
    pub manufacturer: Option<String>,
    pub product_class: Option<String>,
    pub device_id: String,
}

/// A provisioned CPE, brief form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OnlineCpe {
    pub device_id: String,
    pub login_pppoe: String,
}

/// A provisioned CPE with the fields the online table renders.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OnlineCpeDetail {
    pub device_id: String,
    pub mac: String,
    pub login_pppoe: String,
    pub ssid_24g: Option<String>,
    pub ssid_5g: Option<String>,
    pub model: String,
}

impl From<&OnlineCpeDetail> for OnlineCpe {
    fn from(detail: &OnlineCpeDetail) -> Self {
        OnlineCpe {
            device_id: detail.device_id.clone(),
            login_pppoe: detail.login_pppoe.clone(),
        }
    }
}

/// Fleet counters for the dashboard home page.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FleetStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub reset: usize,
}

/// The three projections derived from one inventory snapshot. `reset` and
/// `online` are disjoint subsets of `all`; devices without a usable PPPoE
/// username appear in `all` only.
pub struct FleetView {
    pub all: Vec<RawDevice>,
    pub reset: Vec<ResetCpe>,
    pub online: Vec<OnlineCpeDetail>,
}

impl FleetView {
    pub fn stats(&self) -> FleetStats {
        FleetStats {
            total: self.all.len(),
            online: self.online.len(),
            offline: self.all.len() - self.online.len(),
            reset: self.reset.len(),
        }
    }

    pub fn online_brief(&self) -> Vec<OnlineCpe> {
        self.online.iter().map(OnlineCpe::from).collect()
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("field '{path}' is not a string")]
    NonStringField { path: &'static str },

    #[error("device identity is missing")]
    MissingIdentity,
}

enum Projection {
    Reset(ResetCpe),
    Online(OnlineCpeDetail),
}

/// Classify every device of an inventory snapshot, preserving input order.
///
/// Classification is per device and isolated: a device whose tree has an
/// unexpected shape is logged and dropped from its projection, never
/// aborting the batch. It still counts in `all`.
pub fn classify(devices: Vec<RawDevice>) -> FleetView {
    let mut reset = Vec::new();
    let mut online = Vec::new();

    for device in &devices {
        match project(device) {
            Ok(Some(Projection::Reset(cpe))) => reset.push(cpe),
            Ok(Some(Projection::Online(cpe))) => online.push(cpe),
            Ok(None) => {}
            Err(e) => warn!("skipping device {}: {e}", device.id),
        }
    }

    FleetView {
        all: devices,
        reset,
        online,
    }
}

fn project(device: &RawDevice) -> Result<Option<Projection>, ExtractionError> {
    let Some(username) = pppoe_username(device)? else {
        return Ok(None);
    };

    if username == RESET_SENTINEL {
        let identity = device
            .identity
            .as_ref()
            .ok_or(ExtractionError::MissingIdentity)?;

        return Ok(Some(Projection::Reset(ResetCpe {
            mac: string_leaf(&device.tree, paths::LAN_MAC_ADDRESS),
            manufacturer: identity.manufacturer.clone(),
            product_class: identity.product_class.clone(),
            device_id: device.id.clone(),
        })));
    }

    Ok(Some(Projection::Online(OnlineCpeDetail {
        device_id: device.id.clone(),
        mac: string_leaf(&device.tree, paths::LAN_MAC_ADDRESS)
            .unwrap_or_else(|| "N/A".to_string()),
        login_pppoe: username,
        ssid_24g: string_leaf(&device.tree, paths::WLAN_SSID_24G),
        ssid_5g: string_leaf(&device.tree, paths::WLAN_SSID_5G),
        model: device
            .identity
            .as_ref()
            .and_then(|identity| identity.product_class.clone())
            .unwrap_or_else(|| "N/A".to_string()),
    })))
}

/// The normalized PPPoE username, `None` when the path is absent or the
/// trimmed value is empty. A present non-string leaf is an extraction error
/// so the device gets dropped from its projection instead of being
/// misclassified.
fn pppoe_username(device: &RawDevice) -> Result<Option<String>, ExtractionError> {
    let Some(value) = leaf_value(&device.tree, paths::WAN_PPPOE_USERNAME) else {
        return Ok(None);
    };

    let Some(raw) = value.as_str() else {
        return Err(ExtractionError::NonStringField {
            path: paths::WAN_PPPOE_USERNAME,
        });
    };

    let normalized = raw.trim().to_lowercase();
    Ok((!normalized.is_empty()).then_some(normalized))
}

/// Walk a dot-path into the vendor tree. Any absent segment, or a segment
/// that is not an object, resolves to `None`.
pub fn path_get<'a>(tree: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut node = tree.get(segments.next()?)?;

    for segment in segments {
        node = node.get(segment)?;
    }

    Some(node)
}

/// The `_value` leaf under an object-model path.
pub fn leaf_value<'a>(tree: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    path_get(tree, path)?.get("_value")
}

fn string_leaf(tree: &Map<String, Value>, path: &str) -> Option<String> {
    leaf_value(tree, path)?.as_str().map(str::to_owned)
}
