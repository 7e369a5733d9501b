//! Bearer-token authentication.
//!
//! Tokens are issued by an external identity provider; this service only verifies them.

pub mod extractors;
pub mod jwks;
pub mod middleware;
pub mod token;

pub use extractors::AuthenticatedUser;
pub use jwks::JwksCache;
pub use middleware::AuthMiddleware;
pub use token::{Claims, TokenVerifier};
