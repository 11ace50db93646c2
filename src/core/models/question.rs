use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::models::answer::Answer;
use crate::error::Error;

pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 10.0;

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub text: String,
    #[serde(default, alias = "default")]
    pub default_answer: Option<Answer>,
    #[serde(default = "default_weight", alias = "coef")]
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionGroup {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionGroup {
    pub fn question(&self, index: usize) -> Result<&Question, Error> {
        self.questions
            .get(index)
            .ok_or_else(|| Error::NotFound(format!("question {} in group {}", index, self.key)))
    }
}

pub type Catalog = Vec<QuestionGroup>;

pub fn validate_weight(weight: f64) -> Result<(), Error> {
    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
        return Err(Error::BusinessError(format!("weight must be between {} and {}", MIN_WEIGHT, MAX_WEIGHT)));
    }
    Ok(())
}

/// Checks what the rest of the application relies on: unique group keys,
/// unique question texts inside a group, non-empty labels and sane weights.
pub fn validate_catalog(catalog: &[QuestionGroup]) -> Result<(), Error> {
    let mut keys = HashSet::new();
    for group in catalog {
        if group.key.trim().is_empty() {
            return Err(Error::BusinessError("group key must not be empty".into()));
        }
        if !keys.insert(group.key.as_str()) {
            return Err(Error::BusinessError(format!("duplicate group key {}", group.key)));
        }
        if group.title.trim().is_empty() {
            return Err(Error::BusinessError(format!("group {} has an empty title", group.key)));
        }
        let mut texts = HashSet::new();
        for q in &group.questions {
            if q.text.trim().is_empty() {
                return Err(Error::BusinessError(format!("group {} has an empty question", group.key)));
            }
            if !texts.insert(q.text.as_str()) {
                return Err(Error::BusinessError(format!("duplicate question in group {}: {}", group.key, q.text)));
            }
            validate_weight(q.weight)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionCreate {
    pub text: String,
    #[serde(default)]
    pub default_answer: Option<Answer>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionUpdate {
    pub text: Option<String>,
    pub default_answer: Option<Answer>,
    #[serde(default)]
    pub clear_default: bool,
    pub weight: Option<f64>,
}
