use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Answer {
    #[serde(rename = "Oui")]
    Yes,
    #[serde(rename = "Non")]
    No,
}

impl Answer {
    /// 1 for a positive answer, 0 otherwise.
    pub fn coefficient(&self) -> f64 {
        match self {
            Answer::Yes => 1.0,
            Answer::No => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Answer::Yes => "Oui",
            Answer::No => "Non",
        }
    }
}

/// One answered question, as stored in `responses_history.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseRecord {
    pub date: NaiveDateTime,
    #[serde(alias = "user")]
    pub username: String,
    pub client_name: String,
    #[serde(alias = "group")]
    pub group_key: String,
    #[serde(default)]
    pub group_title: String,
    #[serde(alias = "question")]
    pub question_text: String,
    pub response: Answer,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let comment: Option<String> = Option::deserialize(deserializer)?;
    Ok(comment.filter(|c| !c.trim().is_empty()))
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub username_eq: Option<String>,
    pub client_name_eq: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub group_key_in: Option<Vec<String>>,
}

impl Query {
    pub fn matches(&self, record: &ResponseRecord) -> bool {
        let day = record.date.date();
        self.username_eq.as_ref().map_or(true, |u| &record.username == u)
            && self.client_name_eq.as_ref().map_or(true, |c| &record.client_name == c)
            && self.date_from.map_or(true, |from| day >= from)
            && self.date_to.map_or(true, |to| day <= to)
            && self.group_key_in.as_ref().map_or(true, |groups| groups.contains(&record.group_key))
    }
}
