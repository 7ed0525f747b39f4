use actix_cors::Cors;
use actix_server::ServerHandle;
use actix_web::{
    App, HttpServer,
    web::{self, Data},
};
use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use fixanet_ui::{api::Api, config::AppConfig, genieacs_client::GenieAcsClient};
use log::{debug, error, info};
use std::io::Write;
use tokio::signal::unix::{SignalKind, signal};

type UiApi = Api<GenieAcsClient>;

#[actix_web::main]
async fn main() {
    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    initialize();

    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    let acs_client = GenieAcsClient::new().context("failed to create ACS client")?;
    let (server_handle, server_task) = run_server(acs_client)?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            debug!("ctrl-c received");
        },
        _ = sigterm.recv() => {
            debug!("SIGTERM received");
        },
        result = server_task => {
            match result {
                Ok(Ok(())) => debug!("server stopped normally"),
                Ok(Err(e)) => error!("server stopped with error: {e}"),
                Err(e) => error!("server task panicked: {e}"),
            }
            return Ok(());
        }
    }

    server_handle.stop(true).await;
    info!("shutdown complete");

    Ok(())
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}

fn run_server(
    acs_client: GenieAcsClient,
) -> Result<(
    ServerHandle,
    tokio::task::JoinHandle<Result<(), std::io::Error>>,
)> {
    let api = UiApi::new(acs_client);
    let ui_port = AppConfig::get().ui.port;

    info!("starting server on port {ui_port}");

    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_header()
                    .allowed_methods(vec!["GET", "POST"])
                    .max_age(3600),
            )
            .app_data(Data::new(api.clone()))
            .route("/devices", web::get().to(UiApi::devices))
            .route("/devices/reset", web::get().to(UiApi::reset_devices))
            .route("/devices/online", web::get().to(UiApi::online_devices))
            .route(
                "/devices/online/detailed",
                web::get().to(UiApi::online_devices_detailed),
            )
            .route("/devices/lookup", web::get().to(UiApi::lookup_device))
            .route("/devices/{device_id}", web::get().to(UiApi::device_detail))
            .route(
                "/devices/{device_id}/refresh",
                web::post().to(UiApi::refresh_device),
            )
            .route("/configure-cpe", web::post().to(UiApi::configure_cpe))
            .route("/provision-cpe", web::post().to(UiApi::provision_cpe))
            .route("/stats", web::get().to(UiApi::stats))
            .route("/healthcheck", web::get().to(UiApi::healthcheck))
            .route("/version", web::get().to(UiApi::version))
    })
    .bind(("0.0.0.0", ui_port))
    .context("failed to bind server")?
    .disable_signals()
    .run();

    Ok((server.handle(), tokio::spawn(server)))
}
