use crate::actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use crate::context::{AdminInfo, UserInfo};
use crate::core::models::question::{GroupCreate, GroupUpdate, QuestionCreate, QuestionUpdate};
use crate::core::models::{Catalog, Question, QuestionGroup};
use crate::core::ports::repository::QuestionCommon;
use crate::core::services::question as service;
use crate::error::Error;

pub async fn catalog<S>(_: UserInfo, store: Data<S>) -> Result<Json<Catalog>, Error>
where
    S: QuestionCommon + 'static,
{
    Ok(Json(store.catalog().await?))
}

pub async fn add_group<S>(_: AdminInfo, Json(body): Json<GroupCreate>, store: Data<S>) -> Result<Json<QuestionGroup>, Error>
where
    S: QuestionCommon + 'static,
{
    Ok(Json(service::add_group(store.get_ref(), body).await?))
}

pub async fn update_group<S>(_: AdminInfo, key: Path<String>, Json(body): Json<GroupUpdate>, store: Data<S>) -> Result<Json<QuestionGroup>, Error>
where
    S: QuestionCommon + 'static,
{
    Ok(Json(service::update_group(store.get_ref(), &key, body).await?))
}

pub async fn delete_group<S>(_: AdminInfo, key: Path<String>, store: Data<S>) -> Result<HttpResponse, Error>
where
    S: QuestionCommon + 'static,
{
    service::delete_group(store.get_ref(), &key).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn add_question<S>(_: AdminInfo, key: Path<String>, Json(body): Json<QuestionCreate>, store: Data<S>) -> Result<Json<Question>, Error>
where
    S: QuestionCommon + 'static,
{
    Ok(Json(service::add_question(store.get_ref(), &key, body).await?))
}

pub async fn update_question<S>(_: AdminInfo, path: Path<(String, usize)>, Json(body): Json<QuestionUpdate>, store: Data<S>) -> Result<Json<Question>, Error>
where
    S: QuestionCommon + 'static,
{
    let (key, index) = path.into_inner();
    Ok(Json(service::update_question(store.get_ref(), &key, index, body).await?))
}

pub async fn delete_question<S>(_: AdminInfo, path: Path<(String, usize)>, store: Data<S>) -> Result<Json<Question>, Error>
where
    S: QuestionCommon + 'static,
{
    let (key, index) = path.into_inner();
    Ok(Json(service::delete_question(store.get_ref(), &key, index).await?))
}
