use crate::core::tokener::{Payload, Tokener};
use crate::error::Error;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JWT {
    secret: Vec<u8>,
}

impl JWT {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

impl<P> Tokener<P> for JWT
where
    P: Payload,
{
    fn gen_token(&self, payload: &P) -> Result<String, Error> {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(&self.secret);
        let token = encode(&header, payload, &key)?;
        Ok(token)
    }
    fn verify_token(&self, token: &str) -> Result<P, Error> {
        let key = DecodingKey::from_secret(&self.secret);
        let validation = Validation::new(Algorithm::HS256);
        let payload = decode(token, &key, &validation)?;
        Ok(payload.claims)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    struct Claim {
        user: String,
        sid: String,
        exp: i64,
    }

    impl Payload for Claim {
        fn user(&self) -> &str {
            &self.user
        }
        fn session(&self) -> &str {
            &self.sid
        }
    }

    fn claim(user: &str, sid: &str, offset: i64) -> Claim {
        Claim {
            user: user.into(),
            sid: sid.into(),
            exp: chrono::offset::Utc::now().timestamp() + offset,
        }
    }

    #[test]
    fn test_gen_and_verify_token() {
        let jwt = JWT::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim = claim("alice", "s-1", 3600);
        let token = jwt.gen_token(&claim).unwrap();
        let c: Claim = jwt.verify_token(&token).unwrap();
        assert_eq!(claim.user, c.user);
        assert_eq!(c.session(), "s-1");
    }

    #[test]
    fn test_different_tokens() {
        let jwt = JWT::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim_a = claim("a", "s-a", 3600);
        let token_a = jwt.gen_token(&claim_a).unwrap();
        let claim_b = claim("b", "s-b", 3600);
        let token_b = jwt.gen_token(&claim_b).unwrap();
        assert_ne!(token_a, token_b);
        let c_a: Claim = jwt.verify_token(&token_a).unwrap();
        let c_b: Claim = jwt.verify_token(&token_b).unwrap();
        assert_eq!(c_a.user, claim_a.user);
        assert_eq!(c_b.user, claim_b.user);
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let jwt = JWT::new(b"secret-a".to_vec());
        let other = JWT::new(b"secret-b".to_vec());
        let token = jwt.gen_token(&claim("a", "s", 3600)).unwrap();
        assert!(<JWT as Tokener<Claim>>::verify_token(&other, &token).is_err());

        let expired = jwt.gen_token(&claim("a", "s", -3600)).unwrap();
        assert!(matches!(<JWT as Tokener<Claim>>::verify_token(&jwt, &expired), Err(Error::JWTError(_))));
    }
}
