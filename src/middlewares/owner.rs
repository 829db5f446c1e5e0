use crate::error::AppError;
use crate::models::Owner;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// Paths served without a resolved owner
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// Resolves the currency owner for every request.
///
/// Authentication itself lives upstream: the session gateway verifies the
/// caller and forwards the resolved identity as `X-Owner-Kind` (`user` |
/// `circle`) and `X-Owner-Id`. This middleware validates the pair and
/// injects an `Owner` into the request extensions for the handlers.
pub struct OwnerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for OwnerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = OwnerMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(OwnerMiddlewareService {
            service,
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct OwnerMiddlewareService<S> {
    service: S,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for OwnerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight passes through
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        if self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        match resolve_owner(&req) {
            Ok(owner) => {
                req.extensions_mut().insert(owner);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(error) => Box::pin(async move { Err(error.into()) }),
        }
    }
}

fn resolve_owner(req: &ServiceRequest) -> Result<Owner, AppError> {
    let kind = header_value(req, "X-Owner-Kind")
        .ok_or_else(|| AppError::AuthError("Missing X-Owner-Kind header".to_string()))?;
    let kind = kind
        .parse()
        .map_err(|_| AppError::AuthError(format!("Unknown owner kind: {kind}")))?;

    let id = header_value(req, "X-Owner-Id")
        .ok_or_else(|| AppError::AuthError("Missing X-Owner-Id header".to_string()))?;
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::AuthError(format!("Invalid owner id: {id}")))?;
    if id <= 0 {
        return Err(AppError::AuthError(format!("Invalid owner id: {id}")));
    }

    Ok(Owner { kind, id })
}

fn header_value(req: &ServiceRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Fetch the owner injected by the middleware.
pub fn owner_from_request(req: &HttpRequest) -> Option<Owner> {
    req.extensions().get::<Owner>().copied()
}
