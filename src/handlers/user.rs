use crate::actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use crate::context::{AdminInfo, UserInfo};
use crate::core::models::user::{Create, PasswordChange, Profile};
use crate::core::ports::repository::UserCommon;
use crate::core::services::user as service;
use crate::error::Error;
use crate::response::List;
use crate::session::Sessions;

pub async fn list<S>(_: AdminInfo, store: Data<S>) -> Result<Json<List<Profile>>, Error>
where
    S: UserCommon + 'static,
{
    let users = service::list_users(store.get_ref()).await?;
    Ok(Json(List::new(users)))
}

pub async fn create<S>(_: AdminInfo, Json(body): Json<Create>, store: Data<S>) -> Result<Json<Profile>, Error>
where
    S: UserCommon + 'static,
{
    Ok(Json(service::create_user(store.get_ref(), body).await?))
}

pub async fn delete<S>(_: AdminInfo, username: Path<String>, store: Data<S>, sessions: Data<Sessions>) -> Result<HttpResponse, Error>
where
    S: UserCommon + 'static,
{
    let username = username.into_inner();
    service::delete_user(store.get_ref(), &username).await?;
    sessions.close_user(&username);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn change_password<S>(me: UserInfo, username: Path<String>, Json(PasswordChange { password }): Json<PasswordChange>, store: Data<S>) -> Result<HttpResponse, Error>
where
    S: UserCommon + 'static,
{
    service::change_password(store.get_ref(), &me.username, me.role, &username, &password).await?;
    Ok(HttpResponse::NoContent().finish())
}
