use actix_files::NamedFile;
use log::info;

use crate::actix_multipart::{Multipart, MultipartError};
use crate::actix_web::web::{Data, Json, Path};
use crate::context::AdminInfo;
use crate::core::models::backup::{ArchiveEntry, BackupFile, BackupRecord, BackupStats, Comparison, RestoreReport};
use crate::core::ports::repository::Store;
use crate::core::services::backup as service;
use crate::error::Error;
use crate::futures_util::TryStreamExt;
use crate::response::List;

pub async fn list<S>(_: AdminInfo, store: Data<S>) -> Result<Json<List<BackupFile>>, Error>
where
    S: Store + 'static,
{
    Ok(Json(List::new(store.backup_files().await?)))
}

pub async fn create<S>(admin: AdminInfo, store: Data<S>) -> Result<Json<BackupRecord>, Error>
where
    S: Store + 'static,
{
    Ok(Json(store.create_backup(&admin.0.username).await?))
}

pub async fn history<S>(_: AdminInfo, store: Data<S>) -> Result<Json<List<BackupRecord>>, Error>
where
    S: Store + 'static,
{
    Ok(Json(List::new(store.backup_history().await?)))
}

pub async fn stats<S>(_: AdminInfo, store: Data<S>) -> Result<Json<BackupStats>, Error>
where
    S: Store + 'static,
{
    Ok(Json(service::backup_stats(store.get_ref()).await?))
}

fn upload_error(e: MultipartError) -> Error {
    Error::BusinessError(format!("invalid upload: {}", e))
}

/// Stores every `.zip` part of the form in the backups directory.
pub async fn upload<S>(admin: AdminInfo, mut payload: Multipart, store: Data<S>) -> Result<Json<Vec<BackupFile>>, Error>
where
    S: Store + 'static,
{
    let mut files = Vec::new();
    while let Some(mut field) = payload.try_next().await.map_err(upload_error)? {
        let filename = match field.content_disposition().and_then(|cd| cd.get_filename()) {
            Some(name) => name.to_owned(),
            None => continue,
        };
        let mut content = Vec::new();
        while let Some(b) = field.try_next().await.map_err(upload_error)? {
            content.extend_from_slice(&b);
        }
        files.push(store.import_archive(&filename, content).await?);
    }
    if files.is_empty() {
        return Err(Error::BusinessError("no archive in upload".into()));
    }
    info!("{} uploaded {} backup(s)", admin.0.username, files.len());
    Ok(Json(files))
}

pub async fn download<S>(_: AdminInfo, filename: Path<String>, store: Data<S>) -> Result<NamedFile, Error>
where
    S: Store + 'static,
{
    let path = store.archive_path(&filename)?;
    if !path.is_file() {
        return Err(Error::NotFound(format!("backup {}", filename)));
    }
    Ok(NamedFile::open(path)?)
}

pub async fn entries<S>(_: AdminInfo, filename: Path<String>, store: Data<S>) -> Result<Json<Vec<ArchiveEntry>>, Error>
where
    S: Store + 'static,
{
    Ok(Json(store.archive_entries(&filename).await?))
}

pub async fn compare<S>(_: AdminInfo, filename: Path<String>, store: Data<S>) -> Result<Json<Comparison>, Error>
where
    S: Store + 'static,
{
    Ok(Json(service::compare(store.get_ref(), &filename).await?))
}

pub async fn restore<S>(admin: AdminInfo, filename: Path<String>, store: Data<S>) -> Result<Json<RestoreReport>, Error>
where
    S: Store + 'static,
{
    info!("{} restores {}", admin.0.username, filename);
    Ok(Json(store.restore_backup(&filename).await?))
}
