use crate::{
    genieacs_client::AcsClient,
    http_client::handle_service_result,
    services::{
        projection::classify,
        provisioning::{
            DEFAULT_REFRESH_OBJECT, ParameterChange, ProvisioningService, derive_pppoe_login,
            derive_ssids, sanitize_ssid,
        },
    },
};
use actix_web::{HttpResponse, Responder, web};
use log::{debug, error};
use serde::Deserialize;
use serde_json::json;

/// Body of `POST /configure-cpe`. Field names are the ones the dashboard
/// sends; the single Wi-Fi password applies to both bands.
#[derive(Debug, Deserialize)]
pub struct ConfigureCpePayload {
    pub device_id: String,
    pub ssid_24: String,
    pub ssid_5g: String,
    #[serde(rename = "senhaWifi", default)]
    pub wifi_password: Option<String>,
    #[serde(rename = "loginPppoe", default)]
    pub pppoe_login: Option<String>,
}

/// Body of `POST /provision-cpe`: raw operator input, derived into tenant
/// identifiers server-side.
#[derive(Debug, Deserialize)]
pub struct ProvisionCpePayload {
    pub device_id: String,
    pub ssid_base: String,
    #[serde(default)]
    pub wifi_password: Option<String>,
    pub pppoe_user: String,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub mac: String,
}

#[derive(Clone)]
pub struct Api<C>
where
    C: AcsClient,
{
    pub acs: C,
}

impl<C> Api<C>
where
    C: AcsClient + 'static,
{
    pub fn new(acs: C) -> Self {
        Api { acs }
    }

    pub async fn devices(api: web::Data<Self>) -> impl Responder {
        debug!("devices() called");
        handle_service_result(api.acs.list_devices().await, "devices")
    }

    pub async fn reset_devices(api: web::Data<Self>) -> impl Responder {
        debug!("reset_devices() called");

        handle_service_result(
            api.acs.list_devices().await.map(|d| classify(d).reset),
            "reset_devices",
        )
    }

    pub async fn online_devices(api: web::Data<Self>) -> impl Responder {
        debug!("online_devices() called");

        handle_service_result(
            api.acs
                .list_devices()
                .await
                .map(|d| classify(d).online_brief()),
            "online_devices",
        )
    }

    pub async fn online_devices_detailed(api: web::Data<Self>) -> impl Responder {
        debug!("online_devices_detailed() called");

        handle_service_result(
            api.acs.list_devices().await.map(|d| classify(d).online),
            "online_devices_detailed",
        )
    }

    pub async fn stats(api: web::Data<Self>) -> impl Responder {
        debug!("stats() called");

        handle_service_result(
            api.acs.list_devices().await.map(|d| classify(d).stats()),
            "stats",
        )
    }

    pub async fn device_detail(path: web::Path<String>, api: web::Data<Self>) -> impl Responder {
        let device_id = path.into_inner();
        debug!("device_detail() called for {device_id}");

        match api.acs.list_devices().await {
            Ok(devices) => match devices.into_iter().find(|d| d.id == device_id) {
                Some(device) => HttpResponse::Ok().json(device),
                None => HttpResponse::NotFound().body("device not found"),
            },
            Err(e) => {
                error!("device_detail failed: {e}");
                HttpResponse::InternalServerError().body(e.to_string())
            }
        }
    }

    pub async fn lookup_device(
        query: web::Query<LookupQuery>,
        api: web::Data<Self>,
    ) -> impl Responder {
        debug!("lookup_device() called for {}", query.mac);

        match api.acs.find_device_id_by_mac(&query.mac).await {
            Some(device_id) => HttpResponse::Ok().json(json!({ "device_id": device_id })),
            None => HttpResponse::NotFound().body("no device found for that MAC"),
        }
    }

    pub async fn refresh_device(path: web::Path<String>, api: web::Data<Self>) -> impl Responder {
        let device_id = path.into_inner();
        debug!("refresh_device() called for {device_id}");

        handle_service_result(
            ProvisioningService::refresh(&api.acs, &device_id, DEFAULT_REFRESH_OBJECT).await,
            "refresh_device",
        )
    }

    pub async fn configure_cpe(
        body: web::Json<ConfigureCpePayload>,
        api: web::Data<Self>,
    ) -> impl Responder {
        debug!("configure_cpe() called for {}", body.device_id);

        let change = ParameterChange {
            ssid_24g: body.ssid_24.clone(),
            ssid_5g: body.ssid_5g.clone(),
            password_24g: body.wifi_password.clone(),
            password_5g: body.wifi_password.clone(),
            pppoe_login: body.pppoe_login.clone(),
        };

        Self::submit_change(&api, &body.device_id, &change, "configure_cpe").await
    }

    pub async fn provision_cpe(
        body: web::Json<ProvisionCpePayload>,
        api: web::Data<Self>,
    ) -> impl Responder {
        debug!("provision_cpe() called for {}", body.device_id);

        if sanitize_ssid(&body.ssid_base).is_empty() {
            return HttpResponse::BadRequest()
                .body("ssid_base must contain at least one alphanumeric character");
        }
        if body.pppoe_user.trim().is_empty() {
            return HttpResponse::BadRequest().body("pppoe_user must not be empty");
        }

        let (ssid_24g, ssid_5g) = derive_ssids(&body.ssid_base);
        let change = ParameterChange {
            ssid_24g,
            ssid_5g,
            password_24g: body.wifi_password.clone(),
            password_5g: body.wifi_password.clone(),
            pppoe_login: Some(derive_pppoe_login(&body.pppoe_user)),
        };

        Self::submit_change(&api, &body.device_id, &change, "provision_cpe").await
    }

    pub async fn healthcheck(api: web::Data<Self>) -> impl Responder {
        debug!("healthcheck() called");

        match api.acs.list_devices().await {
            Ok(devices) => {
                HttpResponse::Ok().json(json!({ "status": "ok", "devices": devices.len() }))
            }
            Err(e) => {
                error!("healthcheck failed: {e}");
                HttpResponse::ServiceUnavailable().body(e.to_string())
            }
        }
    }

    pub async fn version() -> impl Responder {
        HttpResponse::Ok().body(env!("CARGO_PKG_VERSION"))
    }

    async fn submit_change(
        api: &web::Data<Self>,
        device_id: &str,
        change: &ParameterChange,
        operation: &str,
    ) -> HttpResponse {
        match ProvisioningService::set_parameters(&api.acs, device_id, change).await {
            Ok(result) => HttpResponse::Ok().json(json!({ "status": "success", "result": result })),
            Err(e) => {
                error!("{operation} failed: {e}");
                HttpResponse::InternalServerError()
                    .json(json!({ "status": "error", "message": e.to_string() }))
            }
        }
    }
}
