use actix_web::{HttpResponse, Responder, route};

/// Health check route, probed by the dashboard connectivity monitor.
/// This route returns no content, the response status is enough.
#[route("/health", method = "GET", method = "HEAD")]
pub async fn health_route() -> impl Responder {
    HttpResponse::NoContent()
}
