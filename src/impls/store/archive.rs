use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::models::backup::{ArchiveEntry, RestoreFailure};
use crate::error::Error;

/// Rejects anything that is not a plain `*.zip` file name.
pub fn check_filename(filename: &str) -> Result<(), Error> {
    let valid = filename.ends_with(".zip")
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\'])
        && !filename.contains("..");
    if !valid {
        return Err(Error::BusinessError(format!("invalid backup file name: {}", filename)));
    }
    Ok(())
}

/// `backup_<timestamp>.zip`, with a numeric suffix when that name is taken.
pub fn archive_name(dir: &Path, now: NaiveDateTime) -> String {
    let stem = format!("backup_{}", now.format("%Y%m%d_%H%M%S"));
    let mut name = format!("{}.zip", stem);
    let mut n = 1;
    while dir.join(&name).exists() {
        name = format!("{}_{}.zip", stem, n);
        n += 1;
    }
    name
}

/// Writes every existing file of `files` into a deflated archive at `dest`,
/// each entry named after the file's base name. Returns the archive size.
pub fn write_archive(dest: &Path, files: &[&Path]) -> Result<u64, Error> {
    let mut writer = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for file in files.iter().filter(|f| f.exists()) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::ServerError(format!("not a file: {}", file.display())))?;
        writer.start_file(name, options)?;
        writer.write_all(&std::fs::read(file)?)?;
    }
    writer.finish()?;
    Ok(std::fs::metadata(dest)?.len())
}

fn zip_time(dt: zip::DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)?.and_hms_opt(dt.hour() as u32, dt.minute() as u32, dt.second() as u32)
}

pub fn entries<R: Read + Seek>(reader: R) -> Result<Vec<ArchiveEntry>, Error> {
    let mut archive = ZipArchive::new(reader)?;
    let mut list = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        list.push(ArchiveEntry {
            name: file.name().to_owned(),
            size: file.size(),
            modified: file.last_modified().and_then(zip_time),
        });
    }
    Ok(list)
}

pub fn read_entry<R: Read + Seek>(reader: R, name: &str) -> Result<Option<Vec<u8>>, Error> {
    let mut archive = ZipArchive::new(reader)?;
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}

pub type Extracted = Result<(String, PathBuf), RestoreFailure>;

/// Extracts every file entry into `scratch`, flattened to its base name.
/// An entry that cannot be extracted is reported, not raised. Only the first
/// entry of a given base name is extracted.
pub fn extract_all<R: Read + Seek>(reader: R, scratch: &Path) -> Result<Vec<Extracted>, Error> {
    let mut archive = ZipArchive::new(reader)?;
    let mut extracted = Vec::with_capacity(archive.len());
    let mut seen = HashSet::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let raw_name = file.name().to_owned();
        let name = match file.enclosed_name().and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())) {
            Some(name) => name,
            None => {
                extracted.push(Err(RestoreFailure {
                    file: raw_name,
                    reason: "unsafe entry name".into(),
                }));
                continue;
            }
        };
        if !seen.insert(name.clone()) {
            extracted.push(Err(RestoreFailure {
                file: raw_name,
                reason: format!("duplicate entry for {}", name),
            }));
            continue;
        }
        let target = scratch.join(&name);
        let mut content = Vec::new();
        let res = file.read_to_end(&mut content).and_then(|_| std::fs::write(&target, &content));
        extracted.push(match res {
            Ok(()) => Ok((name, target)),
            Err(e) => Err(RestoreFailure {
                file: name,
                reason: e.to_string(),
            }),
        });
    }
    Ok(extracted)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_check_filename() {
        assert!(check_filename("backup_20240101_101010.zip").is_ok());
        assert!(check_filename("../users.zip").is_err());
        assert!(check_filename("a/b.zip").is_err());
        assert!(check_filename("backup.tar").is_err());
        assert!(check_filename(".zip").is_err());
    }

    #[test]
    fn test_archive_name_avoids_clash() {
        let dir = tempfile::tempdir().unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        let first = archive_name(dir.path(), now);
        assert_eq!(first, "backup_20240102_030405.zip");
        std::fs::write(dir.path().join(&first), b"").unwrap();
        assert_eq!(archive_name(dir.path(), now), "backup_20240102_030405_1.zip");
    }

    #[test]
    fn test_write_and_list_entries() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("users.json");
        std::fs::write(&a, b"{}").unwrap();
        let missing = dir.path().join("questions.json");
        let dest = dir.path().join("backup.zip");
        let size = write_archive(&dest, &[a.as_path(), missing.as_path()]).unwrap();
        assert!(size > 0);

        let list = entries(File::open(&dest).unwrap()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "users.json");
        assert_eq!(list[0].size, 2);

        let content = read_entry(File::open(&dest).unwrap(), "users.json").unwrap();
        assert_eq!(content.as_deref(), Some(&b"{}"[..]));
        assert!(read_entry(File::open(&dest).unwrap(), "questions.json").unwrap().is_none());
    }

    #[test]
    fn test_extract_flattens_and_rejects_traversal() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default();
            writer.start_file("nested/users.json", options).unwrap();
            writer.write_all(b"{}").unwrap();
            writer.start_file("../evil.json", options).unwrap();
            writer.write_all(b"[]").unwrap();
            writer.finish().unwrap();
        }
        let scratch = tempfile::tempdir().unwrap();
        let extracted = extract_all(Cursor::new(buf.into_inner()), scratch.path()).unwrap();
        assert_eq!(extracted.len(), 2);
        let (name, path) = extracted[0].clone().unwrap();
        assert_eq!(name, "users.json");
        assert_eq!(std::fs::read(path).unwrap(), b"{}");
        assert_eq!(extracted[1].clone().unwrap_err().file, "../evil.json");
    }

    #[test]
    fn test_extract_reports_duplicate_base_names() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default();
            writer.start_file("a/users.json", options).unwrap();
            writer.write_all(b"{}").unwrap();
            writer.start_file("b/users.json", options).unwrap();
            writer.write_all(b"[]").unwrap();
            writer.finish().unwrap();
        }
        let scratch = tempfile::tempdir().unwrap();
        let extracted = extract_all(Cursor::new(buf.into_inner()), scratch.path()).unwrap();
        assert_eq!(extracted.len(), 2);
        let (_, path) = extracted[0].clone().unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"{}");
        let failure = extracted[1].clone().unwrap_err();
        assert_eq!(failure.file, "b/users.json");
        assert!(failure.reason.contains("duplicate"));
    }
}
