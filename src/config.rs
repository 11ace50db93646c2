use std::path::{Path, PathBuf};

use crate::dotenv;
use crate::error::Error;

pub static DATA_ROOT: &str = "DATA_ROOT";
pub static BIND_ADDR: &str = "BIND_ADDR";
pub static TOKEN_TTL_HOURS: &str = "TOKEN_TTL_HOURS";
pub static ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
pub static FONT_DIR: &str = "FONT_DIR";
pub static FONT_FAMILY: &str = "FONT_FAMILY";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_root: PathBuf,
    pub bind_addr: String,
    pub jwt_secret: Vec<u8>,
    pub token_ttl_hours: i64,
    pub admin_password: String,
    pub fonts: FontConfig,
}

#[derive(Debug, Clone)]
pub struct FontConfig {
    pub dir: PathBuf,
    pub family: String,
}

impl Config {
    /// Reads `.env` (if any) and the process environment. Only `JWT_SECRET` is mandatory.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        let jwt_secret = dotenv::var(crate::middlewares::jwt::JWT_SECRET)?;
        let token_ttl_hours = match dotenv::var(TOKEN_TTL_HOURS) {
            Ok(v) => v
                .parse::<i64>()
                .map_err(|e| Error::ServerError(format!("invalid {}: {}", TOKEN_TTL_HOURS, e)))?,
            Err(_) => 12,
        };
        Ok(Self {
            data_root: PathBuf::from(var_or(DATA_ROOT, "database")),
            bind_addr: var_or(BIND_ADDR, "0.0.0.0:8000"),
            jwt_secret: jwt_secret.into_bytes(),
            token_ttl_hours,
            admin_password: var_or(ADMIN_PASSWORD, "admin123"),
            fonts: FontConfig {
                dir: PathBuf::from(var_or(FONT_DIR, "./fonts")),
                family: var_or(FONT_FAMILY, "LiberationSans"),
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    dotenv::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Locations of every persisted file under the data root.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub users: PathBuf,
    pub questions: PathBuf,
    pub responses: PathBuf,
    pub backups: PathBuf,
    pub backup_history: PathBuf,
}

impl DataPaths {
    pub fn new(root: &Path) -> Self {
        let backups = root.join("backups");
        Self {
            users: root.join("users").join("users.json"),
            questions: root.join("responses").join("questions.json"),
            responses: root.join("responses").join("responses_history.json"),
            backup_history: backups.join("backup_history.json"),
            backups,
        }
    }

    /// The files bundled into a backup archive, in archive order.
    pub fn data_files(&self) -> [&Path; 3] {
        [self.questions.as_path(), self.responses.as_path(), self.users.as_path()]
    }

    pub fn ensure_dirs(&self) -> Result<(), Error> {
        for p in [&self.users, &self.questions, &self.responses] {
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir_all(&self.backups)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_data_paths_layout() {
        let paths = DataPaths::new(Path::new("database"));
        assert_eq!(paths.users, Path::new("database/users/users.json"));
        assert_eq!(paths.questions, Path::new("database/responses/questions.json"));
        assert_eq!(paths.responses, Path::new("database/responses/responses_history.json"));
        assert_eq!(paths.backup_history, Path::new("database/backups/backup_history.json"));
    }
}
