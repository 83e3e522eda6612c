//! Argon2id password hashes in PHC string format.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};

use inkpost_core::ports::{AuthError, PasswordService};

#[derive(Default)]
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

fn hashing_error(err: HashError) -> AuthError {
    AuthError::HashingError(err.to_string())
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(hashing_error)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash).map_err(hashing_error)?;
        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(hashing_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_accepts_only_the_hashed_password() {
        let passwords = Argon2PasswordService::new();

        let hash = passwords.hash("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify("correct horse battery", &hash).unwrap());
        assert!(!passwords.verify("correct horse", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let passwords = Argon2PasswordService::new();

        assert_ne!(
            passwords.hash("same").unwrap(),
            passwords.hash("same").unwrap()
        );
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let passwords = Argon2PasswordService::new();

        assert!(matches!(
            passwords.verify("password", "not-a-phc-string"),
            Err(AuthError::HashingError(_))
        ));
    }
}
