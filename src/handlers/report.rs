use chrono::Local;

use crate::actix_web::web::{Data, Json, Path, Query};
use crate::context::UserInfo;
use crate::core::models::report::{ClientComments, Dashboard, FilterOptions, Overview, QuestionStat};
use crate::core::models::ResponseQuery;
use crate::core::ports::repository::AnswerCommon;
use crate::core::services::report;
use crate::error::Error;
use crate::request::ReportFilter;

pub async fn overview<S>(me: UserInfo, Query(filter): Query<ReportFilter>, store: Data<S>) -> Result<Json<Overview>, Error>
where
    S: AnswerCommon + 'static,
{
    let records = report::visible_records(store.get_ref(), filter.try_into()?, &me.username, me.role).await?;
    Ok(Json(report::overview(&records, Local::now().naive_local())))
}

pub async fn dashboard<S>(me: UserInfo, Query(filter): Query<ReportFilter>, store: Data<S>) -> Result<Json<Dashboard>, Error>
where
    S: AnswerCommon + 'static,
{
    let records = report::visible_records(store.get_ref(), filter.try_into()?, &me.username, me.role).await?;
    Ok(Json(report::dashboard(&records)))
}

pub async fn comments<S>(me: UserInfo, Query(filter): Query<ReportFilter>, store: Data<S>) -> Result<Json<Vec<ClientComments>>, Error>
where
    S: AnswerCommon + 'static,
{
    let records = report::visible_records(store.get_ref(), filter.try_into()?, &me.username, me.role).await?;
    Ok(Json(report::comments(&records)))
}

/// Choices for the filter form, taken from everything the caller may see.
pub async fn filters<S>(me: UserInfo, store: Data<S>) -> Result<Json<FilterOptions>, Error>
where
    S: AnswerCommon + 'static,
{
    let records = report::visible_records(store.get_ref(), ResponseQuery::default(), &me.username, me.role).await?;
    Ok(Json(report::filter_options(&records, me.role.is_admin())))
}

pub async fn group_questions<S>(me: UserInfo, key: Path<String>, Query(filter): Query<ReportFilter>, store: Data<S>) -> Result<Json<Vec<QuestionStat>>, Error>
where
    S: AnswerCommon + 'static,
{
    let records = report::visible_records(store.get_ref(), filter.try_into()?, &me.username, me.role).await?;
    Ok(Json(report::question_stats(&records, Some(key.as_str()))))
}
