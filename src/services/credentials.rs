use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::config::HashingConfig;
use crate::errors::AppError;

/// Salted Argon2id hashing of account passwords. Work runs on the blocking pool.
#[derive(Clone)]
pub struct CredentialStore {
    argon2: Argon2<'static>,
}

impl CredentialStore {
    pub fn new(config: &HashingConfig) -> Result<Self, AppError> {
        let params = Params::new(config.memory_kib, config.iterations, 1, None)
            .map_err(|e| AppError::Internal(format!("invalid argon2 parameters: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let store = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || store.hash_blocking(&password))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
    }

    pub async fn verify(&self, hash: &str, password: &str) -> Result<bool, AppError> {
        let store = self.clone();
        let hash = hash.to_owned();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || store.verify_blocking(&hash, &password))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))
    }

    fn hash_blocking(&self, password: &str) -> Result<String, AppError> {
        let salt_bytes: [u8; 16] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AppError::Internal(format!("salt encoding failed: {}", e)))?;
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    }

    // An unparseable stored hash never verifies.
    fn verify_blocking(&self, hash: &str, password: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(&HashingConfig { memory_kib: 64, iterations: 1 }).unwrap()
    }

    #[tokio::test]
    async fn hash_verifies_only_the_original_password() {
        let store = store();
        let hash = store.hash("hunter2").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(store.verify(&hash, "hunter2").await.unwrap());
        assert!(!store.verify(&hash, "hunter3").await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let store = store();
        let a = store.hash("pw").await.unwrap();
        let b = store.hash("pw").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_hash_never_verifies() {
        assert!(!store().verify("---", "anything").await.unwrap());
    }
}
