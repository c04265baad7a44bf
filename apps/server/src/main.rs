#![warn(clippy::all, clippy::pedantic)]

use std::env;
use std::net::{IpAddr, SocketAddr};

use actix_web::{App, HttpServer};

mod error;
mod routes;

use error::AppError;
use logger::init_tracing;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let addr = bind_address()?;
    run_server(addr).await
}

/// Resolve the listen address from `BIND` and `PORT`, defaulting to
/// `0.0.0.0:8080`.
fn bind_address() -> Result<SocketAddr, AppError> {
    let bind: IpAddr = env::var("BIND").unwrap_or_else(|_| "0.0.0.0".into()).parse()?;
    let port = match env::var("PORT") {
        Ok(raw) => raw.parse::<u16>().map_err(|e| AppError::Port(raw, e))?,
        Err(_) => 8080,
    };

    Ok(SocketAddr::new(bind, port))
}

async fn run_server(addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!(%addr, "Starting fleet API server");

    HttpServer::new(|| App::new().configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}
