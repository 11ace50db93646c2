use crate::hex::ToHex;
use crate::rand::{thread_rng, Rng};
use crate::sha2::{Digest, Sha256};

use crate::core::models::User;

pub fn hash_password(pass: &str, salt: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pass);
    if let Some(salt) = salt {
        hasher.update(salt);
    }
    hasher.finalize().encode_hex()
}

pub fn random_salt() -> String {
    const CHARS: &[u8] = b"1234567890abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = thread_rng();
    (0..32).map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char).collect()
}

/// Accounts written before salts existed hash the bare password.
pub fn verify_password(user: &User, pass: &str) -> bool {
    hash_password(pass, user.salt.as_deref()) == user.password_hash
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::Role;

    #[test]
    fn test_unsalted_hash_is_plain_sha256() {
        assert_eq!(hash_password("admin123", None), "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9");
    }

    #[test]
    fn test_verify_password() {
        let salt = random_salt();
        assert_eq!(salt.len(), 32);
        let user = User {
            password_hash: hash_password("secret", Some(&salt)),
            salt: Some(salt),
            role: Role::User,
            last_modified: None,
        };
        assert!(verify_password(&user, "secret"));
        assert!(!verify_password(&user, "Secret"));
        assert!(!verify_password(&user, ""));
    }
}
