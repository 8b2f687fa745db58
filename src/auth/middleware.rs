//! Token guard for protected routes
//!
//! `RequireAuth` wraps a scope: requests without a valid token are answered
//! with a 401 envelope and never reach the handler. Accepted claims are put
//! in the request extensions, where [`AuthenticatedUser`] picks them up.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::collections::HashMap;

use crate::auth::jwt::Claims;
use crate::user::error::UserError;
use crate::user::AppState;

pub const MISSING_TOKEN: &str = "无token，请重新登录";
pub const INVALID_TOKEN: &str = "token无效，请重新登录";

/// Where a token may be carried on the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Raw token in a named header
    Header(&'static str),
    /// `Authorization: Bearer <token>`
    Bearer,
    /// Named query-string parameter
    Query(&'static str),
}

/// Ordered list of token sources; the first non-empty one wins
#[derive(Debug, Clone)]
pub struct TokenExtractor {
    sources: Vec<TokenSource>,
}

impl TokenExtractor {
    pub fn new(sources: Vec<TokenSource>) -> Self {
        Self {
            sources,
        }
    }

    pub fn extract(&self, req: &HttpRequest) -> Option<String> {
        self.sources.iter().find_map(|source| Self::read(source, req))
    }

    fn read(source: &TokenSource, req: &HttpRequest) -> Option<String> {
        match source {
            TokenSource::Header(name) => req
                .headers()
                .get(*name)
                .and_then(|h| h.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            TokenSource::Bearer => req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            TokenSource::Query(name) => {
                web::Query::<HashMap<String, String>>::from_query(req.query_string())
                    .ok()
                    .and_then(|q| q.get(*name).cloned())
                    .filter(|v| !v.is_empty())
            },
        }
    }
}

impl Default for TokenExtractor {
    /// `token` header, then bearer auth, then `?token=`
    fn default() -> Self {
        Self::new(vec![TokenSource::Header("token"), TokenSource::Bearer, TokenSource::Query("token")])
    }
}

pub struct RequireAuth {
    extractor: TokenExtractor,
}

impl RequireAuth {
    pub fn new(extractor: TokenExtractor) -> Self {
        Self {
            extractor,
        }
    }
}

impl Default for RequireAuth {
    fn default() -> Self {
        Self::new(TokenExtractor::default())
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service,
            extractor: self.extractor.clone(),
        }))
    }
}

pub struct RequireAuthMiddleware<S> {
    service: S,
    extractor: TokenExtractor,
}

impl<S> RequireAuthMiddleware<S> {
    fn authorize(&self, req: &ServiceRequest) -> Result<Claims, UserError> {
        let token = self
            .extractor
            .extract(req.request())
            .ok_or_else(|| UserError::Unauthorized(MISSING_TOKEN.to_string()))?;

        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| UserError::Internal("AppState is not registered".to_string()))?;

        let claims = state.jwt.validate(&token).map_err(|err| {
            log::debug!("Rejected token on {}: {}", req.path(), err);
            UserError::Unauthorized(INVALID_TOKEN.to_string())
        })?;

        // The subject must name a user id, otherwise handlers can't use it
        claims.user_id().map_err(|_| UserError::Unauthorized(INVALID_TOKEN.to_string()))?;

        Ok(claims)
    }
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authorize(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);

                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            },
            Err(err) => {
                let response = err.error_response();
                Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
            },
        }
    }
}

/// Caller identity established by [`RequireAuth`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub claims: Claims,
}

impl AuthenticatedUser {
    fn from_request_parts(req: &HttpRequest) -> Result<Self, UserError> {
        let claims = req
            .extensions()
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| UserError::Unauthorized(MISSING_TOKEN.to_string()))?;

        let user_id =
            claims.user_id().map_err(|_| UserError::Unauthorized(INVALID_TOKEN.to_string()))?;

        Ok(Self {
            user_id,
            claims,
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = UserError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_request_parts(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_header_wins_over_query() {
        let req = TestRequest::default()
            .uri("/api/user/getCurrentUser?token=from-query")
            .insert_header(("token", "from-header"))
            .to_http_request();

        assert_eq!(TokenExtractor::default().extract(&req).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_bearer_token() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_http_request();

        assert_eq!(TokenExtractor::default().extract(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_query_token() {
        let req = TestRequest::default().uri("/x?token=abc").to_http_request();
        assert_eq!(TokenExtractor::default().extract(&req).as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_or_blank_token() {
        let req = TestRequest::default()
            .uri("/x?token=")
            .insert_header(("token", "  "))
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();

        assert_eq!(TokenExtractor::default().extract(&req), None);
    }

    #[test]
    fn test_custom_sources() {
        let extractor = TokenExtractor::new(vec![TokenSource::Header("x-auth")]);
        let req = TestRequest::default()
            .insert_header(("x-auth", "t1"))
            .insert_header(("token", "t2"))
            .to_http_request();

        assert_eq!(extractor.extract(&req).as_deref(), Some("t1"));
    }
}
