use chrono::Local;
use log::{info, warn};

use crate::core::auth::{hash_password, random_salt, verify_password};
use crate::core::models::user::{Create, Login, Profile, ADMIN_USERNAME};
use crate::core::models::{Role, User};
use crate::core::ports::repository::UserCommon;
use crate::error::Error;

pub async fn authenticate<S>(store: &S, Login { username, password }: &Login) -> Result<Profile, Error>
where
    S: UserCommon,
{
    let users = store.users().await?;
    match users.get(username) {
        Some(user) if verify_password(user, password) => Ok(Profile::new(username, user)),
        _ => {
            warn!("failed login for {}", username);
            Err(Error::Unauthorized)
        }
    }
}

pub async fn list_users<S>(store: &S) -> Result<Vec<Profile>, Error>
where
    S: UserCommon,
{
    let users = store.users().await?;
    Ok(users.iter().map(|(name, user)| Profile::new(name, user)).collect())
}

fn new_user(password: &str, role: Role) -> Result<User, Error> {
    if password.is_empty() {
        return Err(Error::BusinessError("password must not be empty".into()));
    }
    let salt = random_salt();
    Ok(User {
        password_hash: hash_password(password, Some(&salt)),
        salt: Some(salt),
        role,
        last_modified: Some(Local::now().naive_local()),
    })
}

pub async fn create_user<S>(store: &S, Create { username, password, role }: Create) -> Result<Profile, Error>
where
    S: UserCommon,
{
    let username = username.trim().to_owned();
    if username.is_empty() {
        return Err(Error::BusinessError("username must not be empty".into()));
    }
    let user = new_user(&password, role)?;
    let profile = Profile::new(&username, &user);
    store
        .update_users(|users| {
            if users.contains_key(&username) {
                return Err(Error::BusinessError(format!("user {} already exists", username)));
            }
            users.insert(username.clone(), user);
            Ok(())
        })
        .await?;
    info!("user {} created with role {:?}", username, role);
    Ok(profile)
}

/// The `admin` account can never be deleted.
pub async fn delete_user<S>(store: &S, username: &str) -> Result<(), Error>
where
    S: UserCommon,
{
    if username == ADMIN_USERNAME {
        return Err(Error::BusinessError("the admin account cannot be deleted".into()));
    }
    store
        .update_users(|users| match users.remove(username) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("user {}", username))),
        })
        .await?;
    info!("user {} deleted", username);
    Ok(())
}

/// Admins may change any password, users only their own.
pub async fn change_password<S>(store: &S, caller: &str, caller_role: Role, username: &str, password: &str) -> Result<(), Error>
where
    S: UserCommon,
{
    if !caller_role.is_admin() && caller != username {
        return Err(Error::Forbidden);
    }
    store
        .update_users(|users| {
            let user = users.get_mut(username).ok_or_else(|| Error::NotFound(format!("user {}", username)))?;
            *user = new_user(password, user.role)?;
            Ok(())
        })
        .await?;
    info!("password of {} changed by {}", username, caller);
    Ok(())
}

/// Creates the `admin` account when the store has no user at all.
pub async fn ensure_admin<S>(store: &S, password: &str) -> Result<bool, Error>
where
    S: UserCommon,
{
    if !store.users().await?.is_empty() {
        return Ok(false);
    }
    let user = new_user(password, Role::Admin)?;
    let created = store
        .update_users(|users| {
            if !users.is_empty() {
                return Ok(false);
            }
            users.insert(ADMIN_USERNAME.to_owned(), user);
            Ok(true)
        })
        .await?;
    if created {
        warn!("no user found, created the {} account with the configured default password", ADMIN_USERNAME);
    }
    Ok(created)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DataPaths;
    use crate::impls::store::json::JsonStore;

    fn store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(DataPaths::new(dir.path())).unwrap();
        (dir, store)
    }

    fn login(username: &str, password: &str) -> Login {
        Login {
            username: username.into(),
            password: password.into(),
        }
    }

    #[actix_web::test]
    async fn test_bootstrap_admin_once() {
        let (_dir, store) = store();
        assert!(ensure_admin(&store, "admin123").await.unwrap());
        assert!(!ensure_admin(&store, "other").await.unwrap());
        let admin = authenticate(&store, &login("admin", "admin123")).await.unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(matches!(authenticate(&store, &login("admin", "other")).await, Err(Error::Unauthorized)));
    }

    #[actix_web::test]
    async fn test_legacy_unsalted_login() {
        let (_dir, store) = store();
        std::fs::write(
            &store.paths().users,
            r#"{"admin": {"password": "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9", "role": "admin"}}"#,
        )
        .unwrap();
        assert!(authenticate(&store, &login("admin", "admin123")).await.is_ok());
        assert!(authenticate(&store, &login("ghost", "admin123")).await.is_err());
    }

    #[actix_web::test]
    async fn test_create_and_delete_user() {
        let (_dir, store) = store();
        ensure_admin(&store, "admin123").await.unwrap();
        let create = |name: &str| Create {
            username: name.into(),
            password: "pw".into(),
            role: Role::User,
        };
        let bob = create_user(&store, create("bob")).await.unwrap();
        assert!(bob.last_modified.is_some());
        assert!(create_user(&store, create("bob")).await.is_err());
        assert!(create_user(&store, Create { password: String::new(), ..create("carol") }).await.is_err());
        assert_eq!(list_users(&store).await.unwrap().len(), 2);

        assert!(matches!(delete_user(&store, "admin").await, Err(Error::BusinessError(_))));
        assert!(matches!(delete_user(&store, "ghost").await, Err(Error::NotFound(_))));
        delete_user(&store, "bob").await.unwrap();
        assert_eq!(list_users(&store).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_change_password_rights() {
        let (_dir, store) = store();
        ensure_admin(&store, "admin123").await.unwrap();
        create_user(
            &store,
            Create {
                username: "bob".into(),
                password: "old".into(),
                role: Role::User,
            },
        )
        .await
        .unwrap();
        assert!(matches!(change_password(&store, "bob", Role::User, "admin", "x").await, Err(Error::Forbidden)));
        change_password(&store, "bob", Role::User, "bob", "new").await.unwrap();
        assert!(authenticate(&store, &login("bob", "new")).await.is_ok());
        change_password(&store, "admin", Role::Admin, "bob", "reset").await.unwrap();
        let bob = authenticate(&store, &login("bob", "reset")).await.unwrap();
        assert_eq!(bob.role, Role::User);
    }

    #[actix_web::test]
    async fn test_ensure_admin_leaves_existing_file_alone() {
        let (_dir, store) = store();
        let legacy = r#"{"zoe": {"password": "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8", "role": "user"}}"#;
        std::fs::write(&store.paths().users, legacy).unwrap();
        assert!(!ensure_admin(&store, "admin123").await.unwrap());
        assert_eq!(std::fs::read_to_string(&store.paths().users).unwrap(), legacy);
    }
}
