use serde::{Deserialize, Serialize};

use crate::actix_web::{
    body::{EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web::Data,
    Error, HttpMessage,
};
use crate::context::UserInfo;
use crate::core::models::Role;
use crate::core::tokener::{Payload, Tokener};
use crate::error::Error as AppError;
use crate::impls::tokener::jwt::JWT;
use crate::session::Sessions;
use std::future::Future;
use std::pin::Pin;

pub static JWT_TOKEN: &str = "JWT_TOKEN";
pub static JWT_SECRET: &str = "JWT_SECRET";

#[derive(Debug, Deserialize, Serialize)]
pub struct Claim {
    pub user: String,
    pub sid: String,
    pub role: Role,
    pub exp: i64,
}

impl Payload for Claim {
    fn user(&self) -> &str {
        &self.user
    }
    fn session(&self) -> &str {
        &self.sid
    }
}

pub(crate) struct JWTMiddleware {
    secret: Vec<u8>,
}

impl JWTMiddleware {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JWTMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Error = Error;
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = JWTService<S>;
    type InitError = ();
    type Future = Pin<Box<dyn Future<Output = Result<Self::Transform, Self::InitError>>>>;
    fn new_transform(&self, service: S) -> Self::Future {
        let secret = self.secret.clone();
        Box::pin(async move {
            Ok(JWTService {
                tokener: JWT::new(secret),
                next_service: service,
            })
        })
    }
}

pub struct JWTService<S> {
    tokener: JWT,
    next_service: S,
}

/// Bearer token from the `Authorization` header, or the `JWT_TOKEN` cookie.
fn token(req: &ServiceRequest) -> Option<String> {
    if let Some(header) = req.headers().get("Authorization").and_then(|h| h.to_str().ok()) {
        return Some(header.strip_prefix("Bearer ").unwrap_or(header).trim().to_owned());
    }
    req.cookie(JWT_TOKEN).map(|c| c.value().to_owned())
}

impl<S> JWTService<S> {
    fn identify(&self, req: &ServiceRequest) -> Result<UserInfo, AppError> {
        let token = token(req).ok_or(AppError::Unauthorized)?;
        let claim: Claim = self.tokener.verify_token(&token)?;
        let sessions = req
            .app_data::<Data<Sessions>>()
            .ok_or_else(|| AppError::ServerError("session store is not configured".into()))?;
        // Logged out or restarted: the token outlives its session.
        let (username, role) = sessions.identity(claim.session()).ok_or(AppError::Unauthorized)?;
        if username != claim.user() || role != claim.role {
            return Err(AppError::Unauthorized);
        }
        Ok(UserInfo {
            sid: claim.sid,
            username,
            role,
        })
    }
}

impl<S, B> Service<ServiceRequest> for JWTService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    fn poll_ready(&self, ctx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.next_service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.identify(&req) {
            Err(e) => {
                let resp = req.error_response(e).map_into_right_body();
                return Box::pin(async move { Ok(resp) });
            }
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
        }

        let res_fut = self.next_service.call(req);
        Box::pin(async move {
            let resp = res_fut.await?;
            Ok(resp.map_into_left_body())
        })
    }
}
