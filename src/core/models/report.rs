use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::core::models::answer::Answer;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub total_responses: usize,
    pub unique_clients: usize,
    pub positive_rate: f64,
    pub average_score: f64,
    pub last_response: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupStat {
    pub group_key: String,
    pub group_title: String,
    pub total: usize,
    pub yes: usize,
    pub no: usize,
    pub yes_percent: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionStat {
    pub group_key: String,
    pub question_text: String,
    pub total: usize,
    pub yes: usize,
    pub no: usize,
    pub yes_percent: f64,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub responses: usize,
    pub average_score: f64,
    pub positive_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupDailyPoint {
    pub date: NaiveDate,
    pub group_key: String,
    pub responses: usize,
    pub average_score: f64,
    pub positive_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupProgress {
    pub group_key: String,
    pub initial_rate: f64,
    pub final_rate: f64,
    pub mean_rate_change: Option<f64>,
    pub initial_score: f64,
    pub final_score: f64,
    pub mean_score_change: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentEntry {
    pub date: NaiveDateTime,
    pub username: String,
    pub question_text: String,
    pub response: Answer,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupComments {
    pub group_key: String,
    pub group_title: String,
    pub entries: Vec<CommentEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientComments {
    pub client_name: String,
    pub groups: Vec<GroupComments>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub clients: Vec<String>,
    pub users: Vec<String>,
    pub groups: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// One record scored with its question weight, used by the PDF report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeightedResult {
    pub group_key: String,
    pub group_title: String,
    pub question_text: String,
    pub response: Answer,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub summary: Summary,
    pub days_since_last: Option<i64>,
    pub daily_by_group: Vec<GroupDailyPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub groups: Vec<GroupStat>,
    pub questions: Vec<QuestionStat>,
    pub top_questions: Vec<QuestionStat>,
    pub daily: Vec<DailyPoint>,
    pub trends: Vec<GroupDailyPoint>,
    pub progress: Vec<GroupProgress>,
}
