use chrono::Local;

use crate::actix_web::{
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web::{block, Data, Query},
    HttpResponse,
};
use crate::config::Config;
use crate::context::{AdminInfo, UserInfo};
use crate::core::ports::repository::{AnswerCommon, QuestionCommon};
use crate::core::services::report;
use crate::error::Error;
use crate::impls::export::{pdf, xlsx};
use crate::request::ReportFilter;

fn attachment(content: Vec<u8>, content_type: &str, filename: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(content)
}

pub async fn xlsx<S>(admin: AdminInfo, Query(filter): Query<ReportFilter>, store: Data<S>) -> Result<HttpResponse, Error>
where
    S: AnswerCommon + 'static,
{
    let me = admin.0;
    let records = report::visible_records(store.get_ref(), filter.try_into()?, &me.username, me.role).await?;
    let content = block(move || xlsx::workbook(&records, &report::group_stats(&records), &report::comments(&records))).await??;
    let filename = format!("responses_export_{}.xlsx", Local::now().format("%Y%m%d_%H%M"));
    Ok(attachment(content, "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", filename))
}

pub async fn pdf<S>(me: UserInfo, Query(filter): Query<ReportFilter>, store: Data<S>, config: Data<Config>) -> Result<HttpResponse, Error>
where
    S: AnswerCommon + QuestionCommon + 'static,
{
    let records = report::visible_records(store.get_ref(), filter.try_into()?, &me.username, me.role).await?;
    let catalog = store.catalog().await?;
    let results = report::weighted_results(&records, &catalog);
    let now = Local::now().naive_local();
    let fonts = config.fonts.clone();
    let content = block(move || pdf::report(&fonts, &records, &results, now)).await??;
    let filename = format!("report_{}.pdf", now.format("%Y%m%d_%H%M"));
    Ok(attachment(content, "application/pdf", filename))
}
