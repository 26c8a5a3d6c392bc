use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Account, SessionToken};

/// The authenticated caller of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub account_id: i64,
    pub username: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    jti: String,
    iat: i64,
    exp: i64,
}

/// Issues and checks signed session tokens. Logged-out sessions stay in the
/// revocation set until their token would have expired anyway.
#[derive(Clone)]
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    revoked: Arc<DashMap<String, DateTime<Utc>>>,
}

impl SessionManager {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            revoked: Arc::new(DashMap::new()),
        }
    }

    pub fn issue(&self, account: &Account) -> Result<SessionToken, AppError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token encoding failed: {}", e)))?;

        Ok(SessionToken {
            token,
            username: account.username.clone(),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            debug!("Rejected session token: {}", e);
            AppError::Unauthorized
        })?;
        let claims = data.claims;

        if self.revoked.contains_key(&claims.jti) {
            return Err(AppError::Unauthorized);
        }

        let account_id = claims.sub.parse::<i64>().map_err(|_| AppError::Unauthorized)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AppError::Unauthorized)?;

        Ok(Identity {
            account_id,
            username: claims.username,
            session_id: claims.jti,
            expires_at,
        })
    }

    pub fn revoke(&self, identity: &Identity) {
        let now = Utc::now();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        self.revoked.insert(identity.session_id.clone(), identity.expires_at);
    }

    #[cfg(test)]
    pub(crate) fn revoked_count(&self) -> usize {
        self.revoked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: 42,
            username: "alice@example.com".into(),
            password_hash: "---".into(),
            cash: 0.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_to_the_account() {
        let sessions = SessionManager::new("secret", Duration::hours(1));
        let token = sessions.issue(&account()).unwrap();

        let identity = sessions.verify(&token.token).unwrap();
        assert_eq!(identity.account_id, 42);
        assert_eq!(identity.username, "alice@example.com");
    }

    #[test]
    fn revoked_token_is_rejected() {
        let sessions = SessionManager::new("secret", Duration::hours(1));
        let token = sessions.issue(&account()).unwrap();
        let identity = sessions.verify(&token.token).unwrap();

        sessions.revoke(&identity);
        assert!(matches!(sessions.verify(&token.token), Err(AppError::Unauthorized)));

        // a fresh login is unaffected
        let again = sessions.issue(&account()).unwrap();
        assert!(sessions.verify(&again.token).is_ok());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = SessionManager::new("secret", Duration::hours(1));
        let theirs = SessionManager::new("other-secret", Duration::hours(1));
        let token = theirs.issue(&account()).unwrap();

        assert!(matches!(ours.verify(&token.token), Err(AppError::Unauthorized)));
        assert!(matches!(ours.verify("not-a-jwt"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // beyond the default 60s validation leeway
        let sessions = SessionManager::new("secret", Duration::minutes(-5));
        let token = sessions.issue(&account()).unwrap();
        assert!(matches!(sessions.verify(&token.token), Err(AppError::Unauthorized)));
    }
}
