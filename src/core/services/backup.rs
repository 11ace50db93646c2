use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;

use crate::core::models::backup::{BackupRecord, BackupStats, Comparison, Delta};
use crate::core::models::{ResponseQuery, ResponseRecord};
use crate::core::ports::repository::{AnswerCommon, BackupCommon, Store};
use crate::core::services::report::round1;
use crate::error::Error;

pub fn stats(history: &[BackupRecord], now: NaiveDateTime) -> BackupStats {
    let count = history.len();
    let average_size_kb = match count {
        0 => 0.0,
        n => round1(history.iter().map(|b| b.size_bytes as f64).sum::<f64>() / n as f64 / 1024.0),
    };
    let last_backup = history.iter().map(|b| b.date).max();
    BackupStats {
        count,
        average_size_kb,
        last_backup,
        days_since_last: last_backup.map(|d| (now.date() - d.date()).num_days()),
    }
}

pub async fn backup_stats<S>(store: &S) -> Result<BackupStats, Error>
where
    S: Store,
{
    let history = store.backup_history().await?;
    Ok(stats(&history, Local::now().naive_local()))
}

fn unique_clients(records: &[ResponseRecord]) -> usize {
    records.iter().map(|r| r.client_name.as_str()).collect::<HashSet<_>>().len()
}

/// Current response history against the one stored in an archive.
pub async fn compare<S>(store: &S, filename: &str) -> Result<Comparison, Error>
where
    S: Store,
{
    let current = store.query(&ResponseQuery::default()).await?;
    let archived = store.archived_responses(filename).await?;
    Ok(Comparison {
        total_responses: Delta::new(current.len(), archived.len()),
        unique_clients: Delta::new(unique_clients(&current), unique_clients(&archived)),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DataPaths;
    use crate::core::models::Answer;
    use crate::impls::store::json::JsonStore;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn backup(day: u32, size_bytes: u64) -> BackupRecord {
        BackupRecord {
            date: at(day),
            filename: format!("backup_{}.zip", day),
            size_bytes,
            path: String::new(),
            created_by: "admin".into(),
        }
    }

    #[test]
    fn test_stats() {
        let empty = stats(&[], at(10));
        assert_eq!(empty.count, 0);
        assert_eq!(empty.average_size_kb, 0.0);
        assert_eq!(empty.days_since_last, None);

        let s = stats(&[backup(1, 1024), backup(4, 2048)], at(10));
        assert_eq!(s.count, 2);
        assert_eq!(s.average_size_kb, 1.5);
        assert_eq!(s.last_backup, Some(at(4)));
        assert_eq!(s.days_since_last, Some(6));
    }

    #[actix_web::test]
    async fn test_compare_with_archive() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(DataPaths::new(dir.path())).unwrap();
        let record = |client: &str| ResponseRecord {
            date: at(1),
            username: "alice".into(),
            client_name: client.into(),
            group_key: "G1".into(),
            group_title: "A".into(),
            question_text: "Q".into(),
            response: Answer::Yes,
            comment: None,
        };
        store.append(vec![record("ACME")]).await.unwrap();
        let backup = store.create_backup("admin").await.unwrap();
        store.append(vec![record("ACME"), record("Globex")]).await.unwrap();

        let cmp = compare(&store, &backup.filename).await.unwrap();
        assert_eq!(cmp.total_responses, Delta::new(3, 1));
        assert_eq!(cmp.total_responses.difference, 2);
        assert_eq!(cmp.unique_clients.difference, 1);
        assert!(compare(&store, "missing.zip").await.is_err());
    }
}
