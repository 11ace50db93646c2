use crate::actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use crate::context::UserInfo;
use crate::core::ports::repository::{AnswerCommon, QuestionCommon};
use crate::core::services::questionnaire::{self as service, AnswerSubmit, Finished, Start};
use crate::core::wizard::WizardView;
use crate::error::Error;
use crate::session::Sessions;

pub async fn start<S>(me: UserInfo, Json(body): Json<Start>, store: Data<S>, sessions: Data<Sessions>) -> Result<Json<WizardView>, Error>
where
    S: QuestionCommon + 'static,
{
    Ok(Json(service::start(store.get_ref(), &sessions, &me.sid, body).await?))
}

pub async fn view(me: UserInfo, sessions: Data<Sessions>) -> Result<Json<WizardView>, Error> {
    Ok(Json(service::view(&sessions, &me.sid)?))
}

pub async fn answer(me: UserInfo, index: Path<usize>, Json(body): Json<AnswerSubmit>, sessions: Data<Sessions>) -> Result<Json<WizardView>, Error> {
    Ok(Json(service::answer(&sessions, &me.sid, index.into_inner(), body)?))
}

pub async fn toggle_comment(me: UserInfo, index: Path<usize>, sessions: Data<Sessions>) -> Result<Json<WizardView>, Error> {
    Ok(Json(service::toggle_comment(&sessions, &me.sid, index.into_inner())?))
}

pub async fn next_group(me: UserInfo, sessions: Data<Sessions>) -> Result<Json<WizardView>, Error> {
    Ok(Json(service::next_group(&sessions, &me.sid)?))
}

pub async fn previous_group(me: UserInfo, sessions: Data<Sessions>) -> Result<Json<WizardView>, Error> {
    Ok(Json(service::previous_group(&sessions, &me.sid)?))
}

pub async fn finish<S>(me: UserInfo, store: Data<S>, sessions: Data<Sessions>) -> Result<Json<Finished>, Error>
where
    S: QuestionCommon + AnswerCommon + 'static,
{
    Ok(Json(service::finish(store.get_ref(), &sessions, &me.sid, &me.username).await?))
}

pub async fn reset(me: UserInfo, sessions: Data<Sessions>) -> Result<HttpResponse, Error> {
    service::reset(&sessions, &me.sid)?;
    Ok(HttpResponse::NoContent().finish())
}
