use crate::config::Config;
use crate::openapi;
use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

/// Health check endpoint
///
/// Liveness only: it does not touch the database.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "The service is running"))
)]
#[get("/health")]
pub async fn health(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": config.app_name
    }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service name and links"))
)]
#[get("/")]
pub async fn root(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": config.app_name,
        "docs": "/openapi.json",
        "health": "/health"
    }))
}

/// The OpenAPI document, with paths under the configured API prefix.
#[get("/openapi.json")]
pub async fn openapi_json(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(openapi::document(&config))
}
