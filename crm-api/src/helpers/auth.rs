//! Session verification for tokens issued by the external identity provider.
//!
//! The provider signs HS256 JWTs with a shared secret. A request carries the token either
//! as `Authorization: Bearer <jwt>` or in the session cookie. [`require_session`] guards
//! every non-public route and stores the verified [`Claims`] in the request extensions,
//! where handlers pick them up through [`AuthenticatedUser`].

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::{header, Method};
use actix_web::middleware::Next;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared_types::ErrorResponse;
use std::future::{ready, Ready};

use crate::config::AuthConfig;
use crate::error::ApiError;

/// Routes reachable without a session.
const PUBLIC_PATHS: [&str; 5] = ["/", "/health", "/login", "/signup", "/forgot-password"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
    cookie_name: String,
    login_path: String,
}

impl SessionVerifier {
    pub fn new(auth: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &auth.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            validation,
            cookie_name: auth.session_cookie.clone(),
            login_path: auth.login_path.clone(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected session token: {}", e);
                ApiError::Unauthorized
            })
    }

    /// Bearer header first, then the session cookie.
    fn token_from(&self, req: &HttpRequest) -> Option<String> {
        let bearer = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        bearer.or_else(|| {
            req.cookie(&self.cookie_name)
                .map(|cookie| cookie.value().to_string())
                .filter(|token| !token.is_empty())
        })
    }

    pub fn authenticate(&self, req: &HttpRequest) -> Result<Claims, ApiError> {
        let token = self.token_from(req).ok_or(ApiError::Unauthorized)?;
        self.verify(&token)
    }
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Rejects requests without a valid session: API routes get a 401 JSON body, page
/// routes are redirected to the login page.
pub async fn require_session<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    if req.method() == Method::OPTIONS || is_public_path(req.path()) {
        return next.call(req).await.map(ServiceResponse::map_into_left_body);
    }

    let Some(verifier) = req.app_data::<web::Data<SessionVerifier>>().cloned() else {
        tracing::error!("No session verifier registered; refusing {}", req.path());
        let response = HttpResponse::InternalServerError()
            .json(ErrorResponse::new("Something went wrong"));
        return Ok(req.into_response(response).map_into_right_body());
    };

    match verifier.authenticate(req.request()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        Err(_) => {
            let response = if is_api_path(req.path()) {
                HttpResponse::Unauthorized().json(ErrorResponse::new("Unauthorized"))
            } else {
                HttpResponse::Found()
                    .insert_header((header::LOCATION, verifier.login_path().to_string()))
                    .finish()
            };
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}

/// The signed-in user, read from the claims [`require_session`] stored.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<Claims>()
            .map(|claims| AuthenticatedUser {
                user_id: claims.sub.clone(),
                email: claims.email.clone(),
            })
            .ok_or(ApiError::Unauthorized);
        ready(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn config(audience: Option<&str>) -> AuthConfig {
        AuthConfig {
            jwt_secret: SECRET.to_string(),
            audience: audience.map(str::to_string),
            ..AuthConfig::default()
        }
    }

    fn token(sub: &str, aud: Option<&str>, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            email: Some(format!("{sub}@example.com")),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            aud: aud.map(str::to_string),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_and_cookie_tokens() {
        let verifier = SessionVerifier::new(&config(Some("authenticated")));
        let jwt = token("alice", Some("authenticated"), 3600);

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, format!("Bearer {jwt}")))
            .to_http_request();
        assert_eq!(verifier.authenticate(&req).unwrap().sub, "alice");

        let req = TestRequest::default()
            .cookie(Cookie::new("sb-access-token", jwt))
            .to_http_request();
        let claims = verifier.authenticate(&req).unwrap();
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_rejects_bad_tokens() {
        let verifier = SessionVerifier::new(&config(Some("authenticated")));

        assert!(verifier.verify(&token("alice", Some("authenticated"), -3600)).is_err());
        assert!(verifier.verify(&token("alice", Some("other"), 3600)).is_err());
        assert!(verifier.verify("not-a-jwt").is_err());

        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            verifier.authenticate(&req),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_audience_check_can_be_disabled() {
        let verifier = SessionVerifier::new(&config(None));
        assert!(verifier.verify(&token("alice", None, 3600)).is_ok());
    }

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/login"));
        assert!(is_public_path("/health"));
        assert!(!is_public_path("/dashboard"));
        assert!(is_api_path("/api/contacts"));
        assert!(!is_api_path("/apis"));
    }
}
