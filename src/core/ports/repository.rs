use crate::core::models::{
    backup::{ArchiveEntry, BackupFile, BackupRecord, RestoreReport},
    Catalog, ResponseQuery, ResponseRecord, Users,
};
use crate::error::Error;
use std::path::PathBuf;

pub trait UserCommon {
    async fn users(&self) -> Result<Users, Error>;
    /// Read-modify-write of the whole user map under the store's write lock.
    async fn update_users<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Users) -> Result<R, Error>;
}

pub trait QuestionCommon {
    async fn catalog(&self) -> Result<Catalog, Error>;
    async fn update_catalog<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Catalog) -> Result<R, Error>;
}

pub trait AnswerCommon {
    async fn query(&self, query: &ResponseQuery) -> Result<Vec<ResponseRecord>, Error>;
    async fn append(&self, records: Vec<ResponseRecord>) -> Result<usize, Error>;
}

pub trait BackupCommon {
    async fn create_backup(&self, created_by: &str) -> Result<BackupRecord, Error>;
    async fn restore_backup(&self, filename: &str) -> Result<RestoreReport, Error>;
    async fn backup_files(&self) -> Result<Vec<BackupFile>, Error>;
    async fn backup_history(&self) -> Result<Vec<BackupRecord>, Error>;
    async fn archive_entries(&self, filename: &str) -> Result<Vec<ArchiveEntry>, Error>;
    async fn archived_responses(&self, filename: &str) -> Result<Vec<ResponseRecord>, Error>;
    async fn import_archive(&self, filename: &str, content: Vec<u8>) -> Result<BackupFile, Error>;
    fn archive_path(&self, filename: &str) -> Result<PathBuf, Error>;
}

pub trait Common: UserCommon + QuestionCommon + AnswerCommon {}

pub trait Store: Common + BackupCommon {}
