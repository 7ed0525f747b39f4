use actix_web::HttpResponse;
use log::error;
use reqwest::Client;
use serde::Serialize;
use std::fmt::Display;

/// Create the HTTP client used for ACS communication
///
/// One client is shared across workers for connection pooling. No overall
/// request timeout is set: a slow ACS delays the caller's next poll cycle
/// instead of being cancelled mid-flight.
pub fn acs_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().build()
}

/// Handle a service Result and convert the data to a JSON response
///
/// This is a common utility for processing Results and transforming them to
/// HTTP responses. Data serializes to a 200 JSON body; an error is logged
/// with the operation name and returned as a 500 with the error text.
///
/// # Arguments
/// * `result` - The Result to handle
/// * `operation` - Context message describing the operation
pub fn handle_service_result<T, E>(result: Result<T, E>, operation: &str) -> HttpResponse
where
    T: Serialize,
    E: Display,
{
    match result {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(e) => {
            error!("{operation} failed: {e}");
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}
