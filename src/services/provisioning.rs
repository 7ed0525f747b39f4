//! Provisioning gateway.
//!
//! Builds the ACS tasks that push Wi-Fi and PPPoE configuration to a single
//! CPE, and owns the tenant identifier conventions (SSID sanitization and
//! suffixes, PPPoE login domain). Tasks are fire-and-forget: the ACS status
//! is handed back verbatim and never retried here.

use crate::{
    config::AppConfig,
    genieacs_client::{AcsClient, AcsError, ParameterValue, Task, TaskOutcome},
    services::projection::paths,
};
use log::info;

/// Default object refreshed when the operator asks for a re-read of a CPE.
pub const DEFAULT_REFRESH_OBJECT: &str = "Device";

/// A requested parameter change for one device. The two SSIDs are always
/// written; passphrases and the PPPoE login only when provided non-empty.
#[derive(Clone, Debug, Default)]
pub struct ParameterChange {
    pub ssid_24g: String,
    pub ssid_5g: String,
    pub password_24g: Option<String>,
    pub password_5g: Option<String>,
    pub pppoe_login: Option<String>,
}

impl ParameterChange {
    pub fn to_task(&self) -> Task {
        let mut parameter_values = vec![
            ParameterValue::string(paths::WLAN_SSID_24G, &self.ssid_24g),
            ParameterValue::string(paths::WLAN_SSID_5G, &self.ssid_5g),
        ];

        if let Some(password) = non_empty(self.password_24g.as_deref()) {
            parameter_values.push(ParameterValue::string(paths::WLAN_KEY_24G, password));
        }
        if let Some(password) = non_empty(self.password_5g.as_deref()) {
            parameter_values.push(ParameterValue::string(paths::WLAN_KEY_5G, password));
        }
        if let Some(login) = non_empty(self.pppoe_login.as_deref()) {
            parameter_values.push(ParameterValue::string(paths::WAN_PPPOE_USERNAME, login));
        }

        Task::SetParameterValues { parameter_values }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Service for queueing configuration tasks on the ACS
pub struct ProvisioningService;

impl ProvisioningService {
    /// Queue a `setParameterValues` task for one device.
    pub async fn set_parameters<C: AcsClient>(
        client: &C,
        device_id: &str,
        change: &ParameterChange,
    ) -> Result<TaskOutcome, AcsError> {
        info!("queueing parameter change for {device_id}");
        client.submit_task(device_id, &change.to_task()).await
    }

    /// Queue a `refreshObject` task, asking the ACS to re-read `object_name`
    /// from the device.
    pub async fn refresh<C: AcsClient>(
        client: &C,
        device_id: &str,
        object_name: &str,
    ) -> Result<TaskOutcome, AcsError> {
        info!("queueing refresh of '{object_name}' for {device_id}");
        let task = Task::RefreshObject {
            object_name: object_name.to_string(),
        };
        client.submit_task(device_id, &task).await
    }
}

/// Strip everything outside `[A-Za-z0-9]` from an operator-entered SSID
/// base. Idempotent.
pub fn sanitize_ssid(input: &str) -> String {
    input.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// The pair of band SSIDs for a base name: sanitized base plus the tenant
/// 2.4 GHz and 5 GHz tags.
pub fn derive_ssids(base: &str) -> (String, String) {
    let tenant = &AppConfig::get().tenant;
    let sanitized = sanitize_ssid(base);

    (
        format!("{sanitized}{}", tenant.ssid_suffix_24g),
        format!("{sanitized}{}", tenant.ssid_suffix_5g),
    )
}

/// The full PPPoE login for an operator-entered user name: lowercased and
/// suffixed with the tenant domain.
pub fn derive_pppoe_login(user: &str) -> String {
    let tenant = &AppConfig::get().tenant;
    format!("{}@{}", user.trim().to_lowercase(), tenant.pppoe_domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod task_building {
        use super::*;

        #[test]
        fn ssids_alone_yield_two_tuples() {
            let change = ParameterChange {
                ssid_24g: "Casa@FIXANET".to_string(),
                ssid_5g: "Casa@FIXANET_5G".to_string(),
                ..Default::default()
            };

            let Task::SetParameterValues { parameter_values } = change.to_task() else {
                panic!("expected a setParameterValues task");
            };

            assert_eq!(
                parameter_values,
                vec![
                    ParameterValue::string(paths::WLAN_SSID_24G, "Casa@FIXANET"),
                    ParameterValue::string(paths::WLAN_SSID_5G, "Casa@FIXANET_5G"),
                ]
            );
        }

        #[test]
        fn all_fields_yield_five_tuples() {
            let change = ParameterChange {
                ssid_24g: "Casa@FIXANET".to_string(),
                ssid_5g: "Casa@FIXANET_5G".to_string(),
                password_24g: Some("hunter22".to_string()),
                password_5g: Some("hunter22".to_string()),
                pppoe_login: Some("cliente@fixanet.com".to_string()),
            };

            let Task::SetParameterValues { parameter_values } = change.to_task() else {
                panic!("expected a setParameterValues task");
            };

            assert_eq!(parameter_values.len(), 5);
            assert_eq!(
                parameter_values[2],
                ParameterValue::string(paths::WLAN_KEY_24G, "hunter22")
            );
            assert_eq!(
                parameter_values[3],
                ParameterValue::string(paths::WLAN_KEY_5G, "hunter22")
            );
            assert_eq!(
                parameter_values[4],
                ParameterValue::string(paths::WAN_PPPOE_USERNAME, "cliente@fixanet.com")
            );
        }

        #[test]
        fn empty_optionals_count_as_absent() {
            let change = ParameterChange {
                ssid_24g: "Casa@FIXANET".to_string(),
                ssid_5g: "Casa@FIXANET_5G".to_string(),
                password_24g: Some(String::new()),
                password_5g: Some(String::new()),
                pppoe_login: Some(String::new()),
            };

            let Task::SetParameterValues { parameter_values } = change.to_task() else {
                panic!("expected a setParameterValues task");
            };

            assert_eq!(parameter_values.len(), 2);
        }
    }

    mod wire_shape {
        use super::*;

        #[test]
        fn set_parameter_values_serializes_to_the_genieacs_payload() {
            let change = ParameterChange {
                ssid_24g: "Casa@FIXANET".to_string(),
                ssid_5g: "Casa@FIXANET_5G".to_string(),
                pppoe_login: Some("cliente@fixanet.com".to_string()),
                ..Default::default()
            };

            let payload = serde_json::to_value(change.to_task()).expect("serialize");
            assert_eq!(
                payload,
                json!({
                    "name": "setParameterValues",
                    "parameterValues": [
                        ["InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.SSID", "Casa@FIXANET", "xsd:string"],
                        ["InternetGatewayDevice.LANDevice.1.WLANConfiguration.6.SSID", "Casa@FIXANET_5G", "xsd:string"],
                        ["InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.2.Username", "cliente@fixanet.com", "xsd:string"],
                    ]
                })
            );
        }

        #[test]
        fn refresh_serializes_to_the_genieacs_payload() {
            let task = Task::RefreshObject {
                object_name: DEFAULT_REFRESH_OBJECT.to_string(),
            };

            let payload = serde_json::to_value(task).expect("serialize");
            assert_eq!(
                payload,
                json!({ "name": "refreshObject", "objectName": "Device" })
            );
        }
    }

    mod identifiers {
        use super::*;

        #[test]
        fn sanitize_keeps_ascii_alphanumerics_only() {
            assert_eq!(sanitize_ssid("Casa do João #42"), "CasadoJoo42");
            assert_eq!(sanitize_ssid("loja-centro_5G!"), "lojacentro5G");
        }

        #[test]
        fn sanitize_is_idempotent() {
            let once = sanitize_ssid("Casa do João #42");
            assert_eq!(sanitize_ssid(&once), once);
        }

        #[test]
        fn ssids_get_the_tenant_band_tags() {
            let (ssid_24g, ssid_5g) = derive_ssids("Casa do João");
            assert_eq!(ssid_24g, "CasadoJoo@FIXANET");
            assert_eq!(ssid_5g, "CasadoJoo@FIXANET_5G");
        }

        #[test]
        fn pppoe_login_is_lowercased_and_suffixed() {
            assert_eq!(derive_pppoe_login("Maria.Silva"), "maria.silva@fixanet.com");
            assert_eq!(derive_pppoe_login("  JOSE "), "jose@fixanet.com");
        }
    }
}
