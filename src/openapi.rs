//! OpenAPI description of the HTTP API, generated from the handlers and wire types.
//!
//! Paths are declared under the default `/api` prefix and rewritten to the configured
//! prefix when the document is served.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::error::ErrorResponse;
use crate::models::{Task, TaskCreate, TaskListResponse, TaskUpdate};
use crate::routes::{health, tasks, users};

const DOCUMENTED_PREFIX: &str = "/api";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Todo API",
        description = "Per-user task lists behind bearer-token authentication"
    ),
    paths(
        health::health,
        health::root,
        tasks::create_task,
        tasks::list_tasks,
        tasks::get_task,
        tasks::update_task,
        tasks::delete_task,
        tasks::toggle_task_complete,
        users::me,
    ),
    components(schemas(
        Task,
        TaskCreate,
        TaskUpdate,
        TaskListResponse,
        AuthenticatedUser,
        ErrorResponse,
    )),
    tags(
        (name = "health", description = "Liveness and service information"),
        (name = "todos", description = "The caller's tasks"),
        (name = "users", description = "The caller's profile"),
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// The document as served: titled with the application name, API paths moved under
/// `config.api_prefix`.
pub fn document(config: &Config) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = config.app_name.clone();

    let paths = std::mem::take(&mut doc.paths.paths);
    doc.paths.paths = paths
        .into_iter()
        .map(|(path, item)| match path.strip_prefix(DOCUMENTED_PREFIX) {
            Some(rest) if rest.starts_with('/') => (format!("{}{}", config.api_prefix, rest), item),
            _ => (path, item),
        })
        .collect();
    doc
}
