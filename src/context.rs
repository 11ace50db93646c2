use crate::actix_web::{self, Error, FromRequest, HttpMessage};
use crate::core::models::Role;
use std::future::{ready, Ready};

/// Identity of the caller, put in the request extensions by the JWT middleware.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub sid: String,
    pub username: String,
    pub role: Role,
}

impl FromRequest for UserInfo {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<Self>() {
            ready(Ok(user.clone()))
        } else {
            ready(Err(crate::error::Error::Unauthorized.into()))
        }
    }
}

/// Same as [`UserInfo`] but only for administrators.
#[derive(Debug, Clone)]
pub struct AdminInfo(pub UserInfo);

impl FromRequest for AdminInfo {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<UserInfo>() {
            Some(user) if user.role.is_admin() => ready(Ok(AdminInfo(user.clone()))),
            Some(_) => ready(Err(crate::error::Error::Forbidden.into())),
            None => ready(Err(crate::error::Error::Unauthorized.into())),
        }
    }
}
