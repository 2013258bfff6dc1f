use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header::AUTHORIZATION, header::CONTENT_TYPE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{info, trace};

use crate::api::services::qrcodes::{ApiResponse, ErrorCode};
use crate::services::{CallerIdentity, OwnerDirectory};

/// 所有者认证中间件
///
/// 校验 `Authorization: Bearer <jwt>`，成功后把 [`CallerIdentity`] 写入
/// request extensions；缺失或无效时直接返回 401。
#[derive(Clone)]
pub struct OwnerAuth {
    directory: Arc<OwnerDirectory>,
}

impl OwnerAuth {
    pub fn new(directory: Arc<OwnerDirectory>) -> Self {
        Self { directory }
    }
}

impl<S, B> Transform<S, ServiceRequest> for OwnerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = OwnerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(OwnerAuthMiddleware {
            service: Rc::new(service),
            directory: self.directory.clone(),
        }))
    }
}

pub struct OwnerAuthMiddleware<S> {
    service: Rc<S>,
    directory: Arc<OwnerDirectory>,
}

impl<S, B> OwnerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// CORS 预检
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    fn handle_unauthorized(req: ServiceRequest, reason: &str) -> ServiceResponse<EitherBody<B>> {
        info!(
            "Owner authentication failed for {} {}: {}",
            req.method(),
            req.path(),
            reason
        );
        req.into_response(
            HttpResponse::Unauthorized()
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(ApiResponse::<()> {
                    code: ErrorCode::Unauthorized as i32,
                    message: "Unauthorized: Invalid or missing token".to_string(),
                    data: None,
                })
                .map_into_right_body(),
        )
    }

    /// 从 Authorization header 提取 Bearer token
    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl<S, B> Service<ServiceRequest> for OwnerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let directory = self.directory.clone();

        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            let Some(token) = Self::extract_bearer_token(&req) else {
                return Ok(Self::handle_unauthorized(req, "missing bearer token"));
            };

            match directory.verify_token(&token) {
                Ok(identity) => {
                    trace!("Owner '{}' authenticated", identity.owner_id);
                    req.extensions_mut().insert::<CallerIdentity>(identity);
                    let response = srv.call(req).await?.map_into_left_body();
                    Ok(response)
                }
                Err(e) => {
                    let reason = e.to_string();
                    Ok(Self::handle_unauthorized(req, &reason))
                }
            }
        })
    }
}
