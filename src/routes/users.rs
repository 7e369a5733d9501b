use crate::auth::AuthenticatedUser;
use crate::error::ErrorResponse;
use actix_web::{get, HttpResponse, Responder};

/// Profile of the caller, taken from the verified token claims.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = AuthenticatedUser),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse)
    )
)]
#[get("/me")]
pub async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(user)
}
