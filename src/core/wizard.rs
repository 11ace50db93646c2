//! Step-by-step questionnaire over the question catalog.
//!
//! A wizard lives in one session. It works on the catalog snapshot taken at
//! [`Wizard::start`]; answers are keyed by `(group key, question text)`.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::core::models::{Answer, Catalog, QuestionGroup, ResponseRecord};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
struct Pending {
    response: Answer,
    comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    InProgress,
    Submitting,
    Completed(Vec<ResponseRecord>),
}

#[derive(Debug, Clone)]
pub struct Wizard {
    client_name: String,
    groups: Catalog,
    current: usize,
    answers: HashMap<(String, String), Pending>,
    comment_visible: HashSet<(String, usize)>,
    stage: Stage,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub weight: f64,
    pub response: Option<Answer>,
    pub comment: Option<String>,
    pub comment_visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub key: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub client_name: String,
    pub group_index: usize,
    pub group_count: usize,
    pub group: GroupView,
    pub answered: usize,
    pub total: usize,
    pub progress: u8,
    pub can_previous: bool,
    pub can_next: bool,
    pub can_finish: bool,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<ResponseRecord>>,
}

impl Wizard {
    pub fn start(client_name: &str, groups: Catalog) -> Result<Self, Error> {
        let client_name = client_name.trim();
        if client_name.is_empty() {
            return Err(Error::BusinessError("client name is required".into()));
        }
        if groups.is_empty() {
            return Err(Error::BusinessError("no question is configured".into()));
        }
        let mut wizard = Self {
            client_name: client_name.to_owned(),
            groups,
            current: 0,
            answers: HashMap::new(),
            comment_visible: HashSet::new(),
            stage: Stage::InProgress,
        };
        wizard.seed_defaults();
        Ok(wizard)
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn snapshot(&self) -> &Catalog {
        &self.groups
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.questions.len()).sum()
    }

    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    pub fn progress(&self) -> u8 {
        match self.total() {
            0 => 0,
            total => (self.answered() * 100 / total) as u8,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.stage, Stage::Completed(_))
    }

    pub fn can_finish(&self) -> bool {
        self.stage == Stage::InProgress && self.answered() == self.total()
    }

    fn current_group(&self) -> &QuestionGroup {
        &self.groups[self.current]
    }

    fn ensure_in_progress(&self) -> Result<(), Error> {
        match self.stage {
            Stage::InProgress => Ok(()),
            Stage::Submitting => Err(Error::BusinessError("questionnaire is being submitted".into())),
            Stage::Completed(_) => Err(Error::BusinessError("questionnaire is already completed".into())),
        }
    }

    fn seed_defaults(&mut self) {
        let group = &self.groups[self.current];
        for q in &group.questions {
            if let Some(default) = q.default_answer {
                self.answers.entry((group.key.clone(), q.text.clone())).or_insert(Pending {
                    response: default,
                    comment: None,
                });
            }
        }
    }

    pub fn answer(&mut self, index: usize, response: Answer, comment: Option<String>) -> Result<(), Error> {
        self.ensure_in_progress()?;
        let group = self.current_group();
        let text = group.question(index)?.text.clone();
        let key = (group.key.clone(), text);
        let comment = comment.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty());
        self.answers.insert(key, Pending { response, comment });
        Ok(())
    }

    /// Flips the comment box of a question and returns the new visibility.
    pub fn toggle_comment(&mut self, index: usize) -> Result<bool, Error> {
        self.ensure_in_progress()?;
        let group = self.current_group();
        group.question(index)?;
        let key = (group.key.clone(), index);
        if self.comment_visible.remove(&key) {
            Ok(false)
        } else {
            self.comment_visible.insert(key);
            Ok(true)
        }
    }

    pub fn next_group(&mut self) -> Result<(), Error> {
        self.ensure_in_progress()?;
        if self.current + 1 >= self.groups.len() {
            return Err(Error::BusinessError("already at the last group".into()));
        }
        self.current += 1;
        self.seed_defaults();
        Ok(())
    }

    pub fn previous_group(&mut self) -> Result<(), Error> {
        self.ensure_in_progress()?;
        if self.current == 0 {
            return Err(Error::BusinessError("already at the first group".into()));
        }
        self.current -= 1;
        self.seed_defaults();
        Ok(())
    }

    /// Builds one record per question, in catalog order, and locks the wizard
    /// until [`Wizard::complete`] or [`Wizard::abort_finish`] is called.
    pub fn begin_finish(&mut self, username: &str, now: NaiveDateTime) -> Result<Vec<ResponseRecord>, Error> {
        self.ensure_in_progress()?;
        if self.answered() != self.total() {
            return Err(Error::BusinessError(format!(
                "please answer every question before finishing ({}/{})",
                self.answered(),
                self.total()
            )));
        }
        let mut records = Vec::with_capacity(self.total());
        for group in &self.groups {
            for q in &group.questions {
                let pending = self
                    .answers
                    .get(&(group.key.clone(), q.text.clone()))
                    .ok_or_else(|| Error::ServerError(format!("missing answer for {}", q.text)))?;
                records.push(ResponseRecord {
                    date: now,
                    username: username.to_owned(),
                    client_name: self.client_name.clone(),
                    group_key: group.key.clone(),
                    group_title: group.title.clone(),
                    question_text: q.text.clone(),
                    response: pending.response,
                    comment: pending.comment.clone(),
                });
            }
        }
        self.stage = Stage::Submitting;
        Ok(records)
    }

    pub fn abort_finish(&mut self) {
        if self.stage == Stage::Submitting {
            self.stage = Stage::InProgress;
        }
    }

    pub fn complete(&mut self, records: Vec<ResponseRecord>) {
        self.stage = Stage::Completed(records);
    }

    pub fn view(&self) -> WizardView {
        let group = self.current_group();
        let questions = group
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| {
                let pending = self.answers.get(&(group.key.clone(), q.text.clone()));
                QuestionView {
                    index,
                    text: q.text.clone(),
                    weight: q.weight,
                    response: pending.map(|p| p.response),
                    comment: pending.and_then(|p| p.comment.clone()),
                    comment_visible: self.comment_visible.contains(&(group.key.clone(), index)),
                }
            })
            .collect();
        let summary = match &self.stage {
            Stage::Completed(records) => Some(records.clone()),
            _ => None,
        };
        WizardView {
            client_name: self.client_name.clone(),
            group_index: self.current,
            group_count: self.groups.len(),
            group: GroupView {
                key: group.key.clone(),
                title: group.title.clone(),
                description: group.description.clone(),
                questions,
            },
            answered: self.answered(),
            total: self.total(),
            progress: self.progress(),
            can_previous: self.stage == Stage::InProgress && self.current > 0,
            can_next: self.stage == Stage::InProgress && self.current + 1 < self.groups.len(),
            can_finish: self.can_finish(),
            completed: self.is_completed(),
            summary,
        }
    }
}
