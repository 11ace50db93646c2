use log::info;

use crate::core::models::question::{validate_weight, GroupCreate, GroupUpdate, QuestionCreate, QuestionUpdate};
use crate::core::models::{Catalog, Question, QuestionGroup};
use crate::core::ports::repository::QuestionCommon;
use crate::error::Error;

/// `G<n>` with the smallest `n` not taken yet.
pub fn next_group_key(catalog: &Catalog) -> String {
    (1..)
        .map(|n| format!("G{}", n))
        .find(|key| catalog.iter().all(|g| &g.key != key))
        .unwrap_or_default()
}

fn group_mut<'c>(catalog: &'c mut Catalog, key: &str) -> Result<&'c mut QuestionGroup, Error> {
    catalog
        .iter_mut()
        .find(|g| g.key == key)
        .ok_or_else(|| Error::NotFound(format!("group {}", key)))
}

fn non_empty(value: &str, what: &str) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::BusinessError(format!("{} must not be empty", what)));
    }
    Ok(value.to_owned())
}

pub async fn add_group<S>(store: &S, GroupCreate { title, description }: GroupCreate) -> Result<QuestionGroup, Error>
where
    S: QuestionCommon,
{
    let title = non_empty(&title, "title")?;
    let group = store
        .update_catalog(|catalog| {
            let group = QuestionGroup {
                key: next_group_key(catalog),
                title,
                description,
                questions: Vec::new(),
            };
            catalog.push(group.clone());
            Ok(group)
        })
        .await?;
    info!("question group {} added", group.key);
    Ok(group)
}

pub async fn update_group<S>(store: &S, key: &str, GroupUpdate { title, description }: GroupUpdate) -> Result<QuestionGroup, Error>
where
    S: QuestionCommon,
{
    let title = title.map(|t| non_empty(&t, "title")).transpose()?;
    store
        .update_catalog(|catalog| {
            let group = group_mut(catalog, key)?;
            if let Some(title) = title {
                group.title = title;
            }
            if let Some(description) = description {
                group.description = description;
            }
            Ok(group.clone())
        })
        .await
}

pub async fn delete_group<S>(store: &S, key: &str) -> Result<(), Error>
where
    S: QuestionCommon,
{
    store
        .update_catalog(|catalog| {
            let before = catalog.len();
            catalog.retain(|g| g.key != key);
            if catalog.len() == before {
                return Err(Error::NotFound(format!("group {}", key)));
            }
            Ok(())
        })
        .await?;
    info!("question group {} deleted", key);
    Ok(())
}

pub async fn add_question<S>(store: &S, key: &str, QuestionCreate { text, default_answer, weight }: QuestionCreate) -> Result<Question, Error>
where
    S: QuestionCommon,
{
    let weight = weight.unwrap_or(1.0);
    validate_weight(weight)?;
    let question = Question {
        text: non_empty(&text, "question")?,
        default_answer,
        weight,
    };
    store
        .update_catalog(|catalog| {
            let group = group_mut(catalog, key)?;
            if group.questions.iter().any(|q| q.text == question.text) {
                return Err(Error::BusinessError(format!("question already exists in group {}", key)));
            }
            group.questions.push(question.clone());
            Ok(question)
        })
        .await
}

pub async fn update_question<S>(store: &S, key: &str, index: usize, update: QuestionUpdate) -> Result<Question, Error>
where
    S: QuestionCommon,
{
    let text = update.text.as_deref().map(|t| non_empty(t, "question")).transpose()?;
    if let Some(weight) = update.weight {
        validate_weight(weight)?;
    }
    store
        .update_catalog(|catalog| {
            let group = group_mut(catalog, key)?;
            group.question(index)?;
            let question = &mut group.questions[index];
            if let Some(text) = text {
                question.text = text;
            }
            if update.clear_default {
                question.default_answer = None;
            } else if update.default_answer.is_some() {
                question.default_answer = update.default_answer;
            }
            if let Some(weight) = update.weight {
                question.weight = weight;
            }
            Ok(question.clone())
        })
        .await
}

pub async fn delete_question<S>(store: &S, key: &str, index: usize) -> Result<Question, Error>
where
    S: QuestionCommon,
{
    store
        .update_catalog(|catalog| {
            let group = group_mut(catalog, key)?;
            group.question(index)?;
            Ok(group.questions.remove(index))
        })
        .await
}
