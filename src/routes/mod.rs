pub mod health;
pub mod tasks;
pub mod users;

use actix_cors::Cors;
use actix_web::{error, web, HttpRequest, HttpResponse};

use crate::auth::AuthMiddleware;
use crate::config::Config;
use crate::error::AppError;

/// Registers every route. `/health`, `/` and `/openapi.json` are public; everything under `api_prefix`
/// requires a bearer token.
///
/// Expects `web::Data<PgPool>`, `web::Data<TokenVerifier>` and `web::Data<Config>`
/// in the application data.
pub fn config(cfg: &mut web::ServiceConfig, api_prefix: &str) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(health::health)
        .service(health::root)
        .service(health::openapi_json)
        .service(
            web::scope(api_prefix)
                .wrap(AuthMiddleware)
                .service(
                    web::scope("/todos")
                        .service(tasks::list_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task)
                        .service(tasks::toggle_task_complete),
                )
                .service(web::scope("/users").service(users::me)),
        )
        .default_service(web::to(not_found));
}

/// CORS for the configured origins. `*` allows any origin.
pub fn cors(config: &Config) -> Cors {
    let cors = if config.cors_origins.iter().any(|origin| origin == "*") {
        Cors::default().allow_any_origin()
    } else {
        config
            .cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound(format!("No route for {} {}", req.method(), req.path())))
}

// Malformed bodies, query strings and path segments are reported like any other
// validation failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req| {
        AppError::validation(format!("Invalid request body: {}", err)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req| {
        AppError::validation(format!("Invalid query parameters: {}", err)).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req| {
        AppError::validation(format!("Invalid path parameter: {}", err)).into()
    })
}
