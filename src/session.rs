use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::core::models::Role;
use crate::core::wizard::Wizard;
use crate::error::Error;

#[derive(Debug)]
pub struct Session {
    pub username: String,
    pub role: Role,
    /// Expiry of the token issued with the session, in Unix seconds.
    pub exp: i64,
    pub wizard: Option<Wizard>,
}

impl Session {
    fn live(&self, now: i64) -> bool {
        self.exp > now
    }
}

/// In-memory sessions, one per successful login. Everything here is lost on
/// logout, token expiry or restart, unfinished questionnaires included.
#[derive(Debug, Default)]
pub struct Sessions {
    inner: Mutex<HashMap<String, Session>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a session that lives until `exp`. Expired sessions are dropped
    /// on the way.
    pub fn open(&self, username: &str, role: Role, exp: i64) -> String {
        let sid = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();
        let mut sessions = self.lock();
        sessions.retain(|_, s| s.live(now));
        sessions.insert(
            sid.clone(),
            Session {
                username: username.to_owned(),
                role,
                exp,
                wizard: None,
            },
        );
        sid
    }

    /// Identity of a live session.
    pub fn identity(&self, sid: &str) -> Option<(String, Role)> {
        let now = Utc::now().timestamp();
        self.lock()
            .get(sid)
            .filter(|s| s.live(now))
            .map(|s| (s.username.clone(), s.role))
    }

    pub fn close(&self, sid: &str) -> bool {
        self.lock().remove(sid).is_some()
    }

    pub fn close_user(&self, username: &str) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.username != username);
        before - sessions.len()
    }

    /// Runs `f` on the wizard slot of a session while holding the session lock.
    pub fn with_wizard<F, R>(&self, sid: &str, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Option<Wizard>) -> Result<R, Error>,
    {
        let mut sessions = self.lock();
        let now = Utc::now().timestamp();
        let session = sessions.get_mut(sid).filter(|s| s.live(now)).ok_or(Error::Unauthorized)?;
        f(&mut session.wizard)
    }
}
