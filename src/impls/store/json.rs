use chrono::{DateTime, Local, NaiveDateTime};
use log::{info, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::DataPaths;
use crate::core::models::{
    backup::{ArchiveEntry, BackupFile, BackupRecord, RestoreFailure, RestoreReport},
    question::validate_catalog,
    Catalog, ResponseQuery, ResponseRecord, Users,
};
use crate::core::ports::repository::{AnswerCommon, BackupCommon, Common, QuestionCommon, Store, UserCommon};
use crate::error::Error;
use crate::impls::store::archive;

/// File-backed store: one JSON document per entity, one lock per document.
pub struct JsonStore {
    paths: DataPaths,
    users_lock: Mutex<()>,
    catalog_lock: Mutex<()>,
    responses_lock: Mutex<()>,
    backups_lock: Mutex<()>,
}

fn guard(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A missing file reads as an empty collection.
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, Error> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn modified_at(meta: &fs::Metadata) -> Option<NaiveDateTime> {
    meta.modified().ok().map(|t| DateTime::<Local>::from(t).naive_local())
}

/// The data files a backup archive may carry.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DataFile {
    Users,
    Questions,
    Responses,
}

impl DataFile {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "users.json" => Some(DataFile::Users),
            "questions.json" => Some(DataFile::Questions),
            "responses_history.json" => Some(DataFile::Responses),
            _ => None,
        }
    }

    fn destination<'p>(&self, paths: &'p DataPaths) -> &'p Path {
        match self {
            DataFile::Users => &paths.users,
            DataFile::Questions => &paths.questions,
            DataFile::Responses => &paths.responses,
        }
    }

    /// Parses the content as the entity it claims to be.
    fn validate(&self, content: &[u8]) -> Result<(), Error> {
        match self {
            DataFile::Users => {
                serde_json::from_slice::<Users>(content)?;
            }
            DataFile::Questions => {
                let catalog: Catalog = serde_json::from_slice(content)?;
                validate_catalog(&catalog)?;
            }
            DataFile::Responses => {
                serde_json::from_slice::<Vec<ResponseRecord>>(content)?;
            }
        }
        Ok(())
    }
}

impl JsonStore {
    pub fn new(paths: DataPaths) -> Result<Self, Error> {
        paths.ensure_dirs()?;
        Ok(Self {
            paths,
            users_lock: Mutex::new(()),
            catalog_lock: Mutex::new(()),
            responses_lock: Mutex::new(()),
            backups_lock: Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    fn read_catalog(&self) -> Result<Catalog, Error> {
        let catalog: Catalog = read_json(&self.paths.questions)?;
        validate_catalog(&catalog)?;
        Ok(catalog)
    }

    fn restore_one(&self, name: &str, extracted: &Path) -> Result<(), Error> {
        let kind = DataFile::from_name(name).ok_or_else(|| Error::BusinessError("not a data file".into()))?;
        kind.validate(&fs::read(extracted)?)?;
        let dest = kind.destination(&self.paths);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        if dest.exists() {
            fs::rename(dest, dest.with_file_name(format!("{}.bak", name)))?;
        }
        if fs::rename(extracted, dest).is_err() {
            fs::copy(extracted, dest)?;
        }
        Ok(())
    }

    fn open_archive(&self, filename: &str) -> Result<File, Error> {
        let path = self.archive_path(filename)?;
        match File::open(&path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound(format!("backup {}", filename))),
            Err(e) => Err(e.into()),
        }
    }
}

impl UserCommon for JsonStore {
    async fn users(&self) -> Result<Users, Error> {
        read_json(&self.paths.users)
    }

    async fn update_users<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Users) -> Result<R, Error>,
    {
        let _guard = guard(&self.users_lock);
        let mut users: Users = read_json(&self.paths.users)?;
        let res = f(&mut users)?;
        write_json(&self.paths.users, &users)?;
        Ok(res)
    }
}

impl QuestionCommon for JsonStore {
    async fn catalog(&self) -> Result<Catalog, Error> {
        self.read_catalog()
    }

    async fn update_catalog<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Catalog) -> Result<R, Error>,
    {
        let _guard = guard(&self.catalog_lock);
        let mut catalog = self.read_catalog()?;
        let res = f(&mut catalog)?;
        validate_catalog(&catalog)?;
        write_json(&self.paths.questions, &catalog)?;
        Ok(res)
    }
}

impl AnswerCommon for JsonStore {
    async fn query(&self, query: &ResponseQuery) -> Result<Vec<ResponseRecord>, Error> {
        let records: Vec<ResponseRecord> = read_json(&self.paths.responses)?;
        Ok(records.into_iter().filter(|r| query.matches(r)).collect())
    }

    async fn append(&self, records: Vec<ResponseRecord>) -> Result<usize, Error> {
        let _guard = guard(&self.responses_lock);
        let mut history: Vec<ResponseRecord> = read_json(&self.paths.responses)?;
        let added = records.len();
        history.extend(records);
        write_json(&self.paths.responses, &history)?;
        Ok(added)
    }
}

impl BackupCommon for JsonStore {
    async fn create_backup(&self, created_by: &str) -> Result<BackupRecord, Error> {
        let _users = guard(&self.users_lock);
        let _catalog = guard(&self.catalog_lock);
        let _responses = guard(&self.responses_lock);
        let _backups = guard(&self.backups_lock);

        let now = Local::now().naive_local();
        fs::create_dir_all(&self.paths.backups)?;
        let filename = archive::archive_name(&self.paths.backups, now);
        let path = self.paths.backups.join(&filename);
        let size_bytes = archive::write_archive(&path, &self.paths.data_files())?;

        let record = BackupRecord {
            date: now,
            filename,
            size_bytes,
            path: path.display().to_string(),
            created_by: created_by.to_owned(),
        };
        let mut history: Vec<BackupRecord> = read_json(&self.paths.backup_history)?;
        history.push(record.clone());
        write_json(&self.paths.backup_history, &history)?;
        info!("backup {} created by {} ({} bytes)", record.filename, created_by, size_bytes);
        Ok(record)
    }

    async fn restore_backup(&self, filename: &str) -> Result<RestoreReport, Error> {
        let archive_file = self.open_archive(filename)?;
        let _users = guard(&self.users_lock);
        let _catalog = guard(&self.catalog_lock);
        let _responses = guard(&self.responses_lock);

        let scratch = tempfile::Builder::new().prefix("restore_").tempdir_in(&self.paths.backups)?;
        let mut report = RestoreReport::default();
        for extracted in archive::extract_all(archive_file, scratch.path())? {
            let (name, path) = match extracted {
                Ok(entry) => entry,
                Err(failure) => {
                    warn!("restore of {} skipped {}: {}", filename, failure.file, failure.reason);
                    report.failed.push(failure);
                    continue;
                }
            };
            match self.restore_one(&name, &path) {
                Ok(()) => report.restored.push(name),
                Err(e) => {
                    warn!("restore of {} rejected {}: {}", filename, name, e);
                    report.failed.push(RestoreFailure {
                        file: name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!("backup {} restored: {:?}", filename, report.restored);
        Ok(report)
    }

    async fn backup_files(&self) -> Result<Vec<BackupFile>, Error> {
        let mut files = Vec::new();
        let dir = match fs::read_dir(&self.paths.backups) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };
        for entry in dir {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata()?;
            if !meta.is_file() || !filename.ends_with(".zip") {
                continue;
            }
            files.push(BackupFile {
                filename,
                size_bytes: meta.len(),
                modified: modified_at(&meta),
            });
        }
        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.filename.cmp(&a.filename)));
        Ok(files)
    }

    async fn backup_history(&self) -> Result<Vec<BackupRecord>, Error> {
        read_json(&self.paths.backup_history)
    }

    async fn archive_entries(&self, filename: &str) -> Result<Vec<ArchiveEntry>, Error> {
        archive::entries(self.open_archive(filename)?)
    }

    async fn archived_responses(&self, filename: &str) -> Result<Vec<ResponseRecord>, Error> {
        match archive::read_entry(self.open_archive(filename)?, "responses_history.json")? {
            Some(content) => Ok(serde_json::from_slice(&content)?),
            None => Ok(Vec::new()),
        }
    }

    async fn import_archive(&self, filename: &str, content: Vec<u8>) -> Result<BackupFile, Error> {
        let path = self.archive_path(filename)?;
        archive::entries(Cursor::new(&content)).map_err(|e| Error::BusinessError(format!("not a valid archive: {}", e)))?;
        let _backups = guard(&self.backups_lock);
        if path.exists() {
            return Err(Error::BusinessError(format!("backup {} already exists", filename)));
        }
        fs::write(&path, &content)?;
        let meta = fs::metadata(&path)?;
        info!("backup {} uploaded ({} bytes)", filename, meta.len());
        Ok(BackupFile {
            filename: filename.to_owned(),
            size_bytes: meta.len(),
            modified: modified_at(&meta),
        })
    }

    fn archive_path(&self, filename: &str) -> Result<PathBuf, Error> {
        archive::check_filename(filename)?;
        Ok(self.paths.backups.join(filename))
    }
}

impl Common for JsonStore {}

impl Store for JsonStore {}
