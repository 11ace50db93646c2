use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::models::Answer;
use crate::core::ports::repository::{AnswerCommon, QuestionCommon};
use crate::core::wizard::{Wizard, WizardView};
use crate::error::Error;
use crate::session::Sessions;

#[derive(Debug, Clone, Deserialize)]
pub struct Start {
    pub client_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmit {
    pub response: Answer,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finished {
    pub records_added: usize,
    /// The catalog was edited while this questionnaire was being filled.
    pub catalog_changed: bool,
    pub questionnaire: WizardView,
}

fn with_active<F, R>(sessions: &Sessions, sid: &str, f: F) -> Result<R, Error>
where
    F: FnOnce(&mut Wizard) -> Result<R, Error>,
{
    sessions.with_wizard(sid, |slot| match slot {
        Some(wizard) => f(wizard),
        None => Err(Error::NotFound("no questionnaire in progress".into())),
    })
}

/// Starts a questionnaire. A session holds at most one, finished or not,
/// until it is reset.
pub async fn start<S>(store: &S, sessions: &Sessions, sid: &str, Start { client_name }: Start) -> Result<WizardView, Error>
where
    S: QuestionCommon,
{
    let catalog = store.catalog().await?;
    let wizard = Wizard::start(&client_name, catalog)?;
    let view = wizard.view();
    sessions.with_wizard(sid, |slot| {
        if slot.is_some() {
            return Err(Error::BusinessError("a questionnaire is already open, reset it first".into()));
        }
        *slot = Some(wizard);
        Ok(())
    })?;
    Ok(view)
}

pub fn view(sessions: &Sessions, sid: &str) -> Result<WizardView, Error> {
    with_active(sessions, sid, |w| Ok(w.view()))
}

pub fn answer(sessions: &Sessions, sid: &str, index: usize, AnswerSubmit { response, comment }: AnswerSubmit) -> Result<WizardView, Error> {
    with_active(sessions, sid, |w| {
        w.answer(index, response, comment)?;
        Ok(w.view())
    })
}

pub fn toggle_comment(sessions: &Sessions, sid: &str, index: usize) -> Result<WizardView, Error> {
    with_active(sessions, sid, |w| {
        w.toggle_comment(index)?;
        Ok(w.view())
    })
}

pub fn next_group(sessions: &Sessions, sid: &str) -> Result<WizardView, Error> {
    with_active(sessions, sid, |w| {
        w.next_group()?;
        Ok(w.view())
    })
}

pub fn previous_group(sessions: &Sessions, sid: &str) -> Result<WizardView, Error> {
    with_active(sessions, sid, |w| {
        w.previous_group()?;
        Ok(w.view())
    })
}

/// Appends one record per question. The wizard stays locked while the
/// history file is written so a concurrent finish cannot append twice.
pub async fn finish<S>(store: &S, sessions: &Sessions, sid: &str, username: &str) -> Result<Finished, Error>
where
    S: QuestionCommon + AnswerCommon,
{
    let now = Local::now().naive_local();
    let (records, snapshot) = with_active(sessions, sid, |w| {
        let records = w.begin_finish(username, now)?;
        Ok((records, w.snapshot().clone()))
    })?;

    let catalog_changed = match store.catalog().await {
        Ok(current) => current != snapshot,
        Err(e) => {
            warn!("could not re-read the catalog: {}", e);
            true
        }
    };
    let client_name = records.first().map(|r| r.client_name.clone()).unwrap_or_default();
    if catalog_changed {
        warn!("questionnaire for {} by {} finished against a stale catalog", client_name, username);
    }

    match store.append(records.clone()).await {
        Ok(records_added) => {
            let questionnaire = with_active(sessions, sid, |w| {
                w.complete(records);
                Ok(w.view())
            })?;
            info!("{} responses recorded for {} by {}", records_added, client_name, username);
            Ok(Finished {
                records_added,
                catalog_changed,
                questionnaire,
            })
        }
        Err(e) => {
            // Session may be gone by now; the answers stay editable if it is not.
            let _ = with_active(sessions, sid, |w| {
                w.abort_finish();
                Ok(())
            });
            Err(e)
        }
    }
}

pub fn reset(sessions: &Sessions, sid: &str) -> Result<(), Error> {
    sessions.with_wizard(sid, |slot| {
        *slot = None;
        Ok(())
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DataPaths;
    use crate::core::models::question::{GroupCreate, QuestionCreate};
    use crate::core::models::{ResponseQuery, Role};
    use crate::core::services::question::{add_group, add_question};
    use crate::impls::store::json::JsonStore;

    async fn setup() -> (tempfile::TempDir, JsonStore, Sessions, String) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(DataPaths::new(dir.path())).unwrap();
        for title in ["Communication", "Sales"] {
            let group = add_group(
                &store,
                GroupCreate {
                    title: title.into(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();
            for text in ["first", "second"] {
                add_question(
                    &store,
                    &group.key,
                    QuestionCreate {
                        text: format!("{} {}", title, text),
                        default_answer: None,
                        weight: None,
                    },
                )
                .await
                .unwrap();
            }
        }
        let sessions = Sessions::new();
        let sid = sessions.open("alice", Role::User, chrono::Utc::now().timestamp() + 3600);
        (dir, store, sessions, sid)
    }

    fn yes() -> AnswerSubmit {
        AnswerSubmit {
            response: Answer::Yes,
            comment: None,
        }
    }

    fn answer_all(sessions: &Sessions, sid: &str) {
        answer(sessions, sid, 0, yes()).unwrap();
        answer(sessions, sid, 1, yes()).unwrap();
        next_group(sessions, sid).unwrap();
        answer(sessions, sid, 0, yes()).unwrap();
        let view = answer(sessions, sid, 1, yes()).unwrap();
        assert!(view.can_finish);
    }

    #[actix_web::test]
    async fn test_finish_appends_once() {
        let (_dir, store, sessions, sid) = setup().await;
        assert!(matches!(view(&sessions, &sid), Err(Error::NotFound(_))));
        start(&store, &sessions, &sid, Start { client_name: "ACME".into() }).await.unwrap();
        assert!(finish(&store, &sessions, &sid, "alice").await.is_err());
        answer_all(&sessions, &sid);

        let done = finish(&store, &sessions, &sid, "alice").await.unwrap();
        assert_eq!(done.records_added, 4);
        assert!(!done.catalog_changed);
        assert!(done.questionnaire.completed);
        assert!(finish(&store, &sessions, &sid, "alice").await.is_err());
        assert_eq!(store.query(&ResponseQuery::default()).await.unwrap().len(), 4);
    }

    #[actix_web::test]
    async fn test_catalog_change_is_flagged() {
        let (_dir, store, sessions, sid) = setup().await;
        start(&store, &sessions, &sid, Start { client_name: "ACME".into() }).await.unwrap();
        answer_all(&sessions, &sid);
        add_group(
            &store,
            GroupCreate {
                title: "Late".into(),
                description: String::new(),
            },
        )
        .await
        .unwrap();
        let done = finish(&store, &sessions, &sid, "alice").await.unwrap();
        assert!(done.catalog_changed);
        assert_eq!(done.records_added, 4);
    }

    #[actix_web::test]
    async fn test_reset_and_closed_session() {
        let (_dir, store, sessions, sid) = setup().await;
        start(&store, &sessions, &sid, Start { client_name: "ACME".into() }).await.unwrap();
        reset(&sessions, &sid).unwrap();
        assert!(matches!(view(&sessions, &sid), Err(Error::NotFound(_))));

        start(&store, &sessions, &sid, Start { client_name: "ACME".into() }).await.unwrap();
        sessions.close(&sid);
        assert!(matches!(view(&sessions, &sid), Err(Error::Unauthorized)));
    }

    #[actix_web::test]
    async fn test_start_needs_reset() {
        let (_dir, store, sessions, sid) = setup().await;
        start(&store, &sessions, &sid, Start { client_name: "ACME".into() }).await.unwrap();
        answer(&sessions, &sid, 0, yes()).unwrap();
        let again = start(&store, &sessions, &sid, Start { client_name: "Other".into() }).await;
        assert!(matches!(again, Err(Error::BusinessError(_))));
        assert_eq!(view(&sessions, &sid).unwrap().answered, 1);

        answer_all(&sessions, &sid);
        finish(&store, &sessions, &sid, "alice").await.unwrap();
        let again = start(&store, &sessions, &sid, Start { client_name: "Other".into() }).await;
        assert!(matches!(again, Err(Error::BusinessError(_))));
        assert!(view(&sessions, &sid).unwrap().completed);

        reset(&sessions, &sid).unwrap();
        let fresh = start(&store, &sessions, &sid, Start { client_name: "Other".into() }).await.unwrap();
        assert!(!fresh.completed);
        assert_eq!(fresh.answered, 0);
    }
}
