use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::domain::auth::{AuthConfig, AuthContext, AuthMode};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    #[serde(default)]
    roles: Vec<String>,
}

/// Guards the chat routes with an API key or an HMAC-signed JWT
pub struct AuthMiddleware {
    config: Arc<AuthConfig>,
}

impl AuthMiddleware {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        if !self.config.enabled {
            return Ok(AuthContext::default());
        }

        match self.config.mode {
            AuthMode::None => Ok(AuthContext::default()),
            AuthMode::ApiKey => self.validate_api_key(headers),
            AuthMode::BearerToken => self.validate_bearer_token(headers),
        }
    }

    fn validate_api_key(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let accepted = self
            .config
            .api_keys
            .as_deref()
            .ok_or(AuthError::ConfigurationError)?;

        if accepted.iter().any(|key| key == presented) {
            Ok(AuthContext {
                authenticated: true,
                user_id: None,
                roles: vec!["client".to_string()],
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn validate_bearer_token(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidCredentials)?;

        let secret = self
            .config
            .jwt_secret
            .as_ref()
            .ok_or(AuthError::ConfigurationError)?;

        let algorithm = match self.config.jwt_algorithm.as_deref() {
            Some("HS384") => Algorithm::HS384,
            Some("HS512") => Algorithm::HS512,
            _ => Algorithm::HS256,
        };

        let token_data = decode::<Claims>(
            token.trim(),
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(algorithm),
        )
        .map_err(|e| {
            tracing::debug!("rejected bearer token: {}", e);
            AuthError::InvalidCredentials
        })?;

        Ok(AuthContext {
            authenticated: true,
            user_id: Some(token_data.claims.sub),
            roles: token_data.claims.roles,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingCredentials,
    InvalidCredentials,
    ConfigurationError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "Missing credentials"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::ConfigurationError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Auth configuration error")
            }
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

pub async fn auth_middleware(
    State(auth): State<Arc<AuthMiddleware>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = auth.authenticate(request.headers())?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn api_key_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig {
            enabled: true,
            mode: AuthMode::ApiKey,
            api_keys: Some(vec!["test-key-123".to_string()]),
            ..AuthConfig::default()
        })
    }

    fn jwt_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig {
            enabled: true,
            mode: AuthMode::BearerToken,
            jwt_secret: Some("signing-secret".to_string()),
            ..AuthConfig::default()
        })
    }

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims {
            sub: "alice".to_string(),
            exp,
            roles: vec!["admin".to_string()],
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn api_key_accepted() {
        let middleware = AuthMiddleware::new(api_key_config());
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("test-key-123"));

        let context = middleware.authenticate(&headers).unwrap();
        assert!(context.authenticated);
    }

    #[test]
    fn wrong_or_missing_api_key_rejected() {
        let middleware = AuthMiddleware::new(api_key_config());
        let mut headers = HeaderMap::new();
        assert_eq!(
            middleware.authenticate(&headers).unwrap_err(),
            AuthError::MissingCredentials
        );

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("wrong-key"));
        assert_eq!(
            middleware.authenticate(&headers).unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn valid_jwt_yields_subject_and_roles() {
        let middleware = AuthMiddleware::new(jwt_config());
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", token("signing-secret", far_future()));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());

        let context = middleware.authenticate(&headers).unwrap();
        assert_eq!(context.user_id.as_deref(), Some("alice"));
        assert_eq!(context.roles, vec!["admin"]);
    }

    #[test]
    fn jwt_signed_with_other_secret_rejected() {
        let middleware = AuthMiddleware::new(jwt_config());
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", token("other-secret", far_future()));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());

        assert_eq!(
            middleware.authenticate(&headers).unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn disabled_auth_lets_everything_through() {
        let middleware = AuthMiddleware::new(Arc::new(AuthConfig::default()));
        let context = middleware.authenticate(&HeaderMap::new()).unwrap();
        assert!(!context.authenticated);
    }
}
