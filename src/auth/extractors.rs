use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::token::Claims;
use crate::error::AppError;

/// The caller, as established by a verified bearer token.
///
/// Built only from token claims, never from the request body or URL. `AuthMiddleware`
/// inserts it into the request extensions; handlers take it as an argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| {
            AppError::InvalidToken(format!("subject {:?} is not a UUID", claims.sub))
        })?;

        Ok(Self {
            id,
            email: claims.resolved_email(),
            name: claims.resolved_name(),
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            // Only reachable when a route is mounted outside `AuthMiddleware`.
            None => ready(Err(
                AppError::Unauthorized("Authentication required".into()).into()
            )),
        }
    }
}
