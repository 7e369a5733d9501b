use crate::auth::extractors::AuthenticatedUser;
use crate::auth::jwks::JwksCache;
use crate::config::{Config, KeySourceConfig};
use crate::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by tokens from the external identity provider.
///
/// Only `sub` and `exp` are mandatory. Some providers put the profile under a nested
/// `user` object instead of top-level `email`/`name`, so that object is kept as raw JSON.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's UUID.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

impl Claims {
    fn nested_user_field(&self, field: &str) -> Option<String> {
        self.user
            .as_ref()
            .and_then(|user| user.get(field))
            .and_then(|value| value.as_str())
            .filter(|value| !value.is_empty())
            .map(String::from)
    }

    /// `email` claim, then `user.email`, then a `{sub}@user.local` placeholder.
    pub fn resolved_email(&self) -> String {
        self.email
            .clone()
            .filter(|email| !email.is_empty())
            .or_else(|| self.nested_user_field("email"))
            .unwrap_or_else(|| format!("{}@user.local", self.sub))
    }

    /// `name` claim, then `user.name`.
    pub fn resolved_name(&self) -> Option<String> {
        self.name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| self.nested_user_field("name"))
    }
}

enum KeySource {
    Secret(DecodingKey),
    Jwks(JwksCache),
}

/// Verifies bearer tokens against either a shared HS256 secret or a cached JWK Set.
pub struct TokenVerifier {
    keys: KeySource,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    pub fn with_secret(secret: &str) -> Self {
        Self {
            keys: KeySource::Secret(DecodingKey::from_secret(secret.as_bytes())),
            issuer: None,
            audience: None,
        }
    }

    pub fn with_jwks(cache: JwksCache) -> Self {
        Self {
            keys: KeySource::Jwks(cache),
            issuer: None,
            audience: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let verifier = match &config.key_source {
            KeySourceConfig::Secret(secret) => Self::with_secret(secret),
            KeySourceConfig::Jwks { url, ttl } => Self::with_jwks(JwksCache::new(url.clone(), *ttl)),
        };
        Self {
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            ..verifier
        }
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }

    /// Checks signature, expiry and required claims, returning the decoded claims.
    ///
    /// With a JWK Set the algorithm comes from the token header; `jsonwebtoken` rejects
    /// any algorithm whose family does not match the selected key.
    pub async fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let header = decode_header(token)?;

        let (key, algorithm) = match &self.keys {
            KeySource::Secret(key) => (key.clone(), Algorithm::HS256),
            KeySource::Jwks(cache) => (cache.decoding_key(header.kid.as_deref()).await?, header.alg),
        };

        let data = decode::<Claims>(token, &key, &self.validation(algorithm))?;
        Ok(data.claims)
    }

    /// Verifies the token and turns its claims into the request's user.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.verify(token).await?;
        AuthenticatedUser::try_from(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use uuid::Uuid;

    const SECRET: &str = "unit-test-secret";

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> i64 {
        (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp()
    }

    #[actix_rt::test]
    async fn test_valid_token_yields_user() {
        let user_id = Uuid::new_v4();
        let token = sign(
            json!({ "sub": user_id.to_string(), "exp": in_one_hour(), "email": "a@example.com", "name": "Ada" }),
            SECRET,
        );

        let user = TokenVerifier::with_secret(SECRET)
            .authenticate(&token)
            .await
            .unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.name.as_deref(), Some("Ada"));
    }

    #[actix_rt::test]
    async fn test_nested_user_claims_and_email_fallback() {
        let user_id = Uuid::new_v4();
        let nested = sign(
            json!({ "sub": user_id.to_string(), "exp": in_one_hour(), "user": { "email": "n@example.com", "name": "Nested" } }),
            SECRET,
        );
        let user = TokenVerifier::with_secret(SECRET).authenticate(&nested).await.unwrap();
        assert_eq!(user.email, "n@example.com");
        assert_eq!(user.name.as_deref(), Some("Nested"));

        let bare = sign(json!({ "sub": user_id.to_string(), "exp": in_one_hour() }), SECRET);
        let user = TokenVerifier::with_secret(SECRET).authenticate(&bare).await.unwrap();
        assert_eq!(user.email, format!("{}@user.local", user_id));
        assert!(user.name.is_none());
    }

    #[actix_rt::test]
    async fn test_expired_token() {
        let expired = (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp();
        let token = sign(json!({ "sub": Uuid::new_v4().to_string(), "exp": expired }), SECRET);

        match TokenVerifier::with_secret(SECRET).verify(&token).await {
            Err(AppError::TokenExpired) => {}
            other => panic!("expected TokenExpired, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[actix_rt::test]
    async fn test_invalid_signature() {
        let token = sign(
            json!({ "sub": Uuid::new_v4().to_string(), "exp": in_one_hour() }),
            "some-other-secret",
        );
        let result = TokenVerifier::with_secret(SECRET).verify(&token).await;
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[actix_rt::test]
    async fn test_missing_subject_and_garbage() {
        let no_sub = sign(json!({ "exp": in_one_hour() }), SECRET);
        let verifier = TokenVerifier::with_secret(SECRET);
        assert!(matches!(verifier.verify(&no_sub).await, Err(AppError::InvalidToken(_))));
        assert!(matches!(verifier.verify("not-a-jwt").await, Err(AppError::InvalidToken(_))));
    }

    #[actix_rt::test]
    async fn test_non_uuid_subject_rejected() {
        let token = sign(json!({ "sub": "user-42", "exp": in_one_hour() }), SECRET);
        let result = TokenVerifier::with_secret(SECRET).authenticate(&token).await;
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[actix_rt::test]
    async fn test_issuer_and_audience() {
        let sub = Uuid::new_v4().to_string();
        let verifier = TokenVerifier::with_secret(SECRET)
            .issuer("https://auth.example.com")
            .audience("todo-api");

        let good = sign(
            json!({ "sub": sub, "exp": in_one_hour(), "iss": "https://auth.example.com", "aud": "todo-api" }),
            SECRET,
        );
        assert!(verifier.verify(&good).await.is_ok());

        let wrong_issuer = sign(
            json!({ "sub": sub, "exp": in_one_hour(), "iss": "https://evil.example.com", "aud": "todo-api" }),
            SECRET,
        );
        assert!(matches!(verifier.verify(&wrong_issuer).await, Err(AppError::InvalidToken(_))));
    }

    #[actix_rt::test]
    async fn test_audience_ignored_when_not_configured() {
        let token = sign(
            json!({ "sub": Uuid::new_v4().to_string(), "exp": in_one_hour(), "aud": "authenticated" }),
            SECRET,
        );
        assert!(TokenVerifier::with_secret(SECRET).verify(&token).await.is_ok());
    }
}
