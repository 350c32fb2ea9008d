//! Credentials and sessions.
//!
//! Passwords are stored as Argon2id PHC strings. Session tokens are opaque
//! and random; only their SHA-256 digest is persisted.

use crate::{
    config::PasswordHashingConfig,
    desk::GuaranteeDesk,
    error::{DeskError, DeskResult},
    store::UserRow,
    types::{Actor, Role},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub fn hash_password(cost: &PasswordHashingConfig, password: &str) -> DeskResult<String> {
    let params = argon2::Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
        .map_err(|e| DeskError::Credential(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DeskError::Credential(format!("password hash error: {e}")))?;
    Ok(hash.to_string())
}

/// Cost parameters are read back from the stored hash.
pub fn verify_password(password: &str, hash: &str) -> DeskResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| DeskError::Credential(format!("invalid hash format: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DeskError::Credential(format!("verify error: {e}"))),
    }
}

/// Hex SHA-256 of a raw session token. This is what the session table keys on.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn new_session_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// What callers may see of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub email: String,
    pub role: Role,
    pub bank: Option<String>,
}

impl From<&UserRow> for UserProfile {
    fn from(u: &UserRow) -> Self {
        Self {
            email: u.email.clone(),
            role: u.role,
            bank: u.bank.clone(),
        }
    }
}

impl From<UserProfile> for Actor {
    fn from(p: UserProfile) -> Self {
        Self {
            email: p.email,
            role: p.role,
            bank: p.bank,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

/// An Argon2id PHC string. Hashing is slow on purpose, so callers that share
/// the desk build this before taking it.
#[derive(Debug, Clone)]
pub struct HashedPassword(String);

impl HashedPassword {
    pub fn new(cost: &PasswordHashingConfig, password: &str) -> DeskResult<Self> {
        hash_password(cost, password).map(Self)
    }
}

/// Compare a password against a looked-up user. Unauthorized on mismatch.
pub fn check_password(user: &UserRow, password: &str) -> DeskResult<()> {
    if verify_password(password, &user.password_hash)? {
        Ok(())
    } else {
        log::info!("Login refused for {}: wrong password", user.email);
        Err(DeskError::Unauthorized)
    }
}

impl GuaranteeDesk {
    /// Callers sharing the desk run these steps separately so the Argon2
    /// verify happens without it.
    pub fn login(&self, email: &str, password: &str) -> DeskResult<SessionGrant> {
        let user = self.login_candidate(email, password)?;
        check_password(&user, password)?;
        self.open_session(&user)
    }

    /// The user a login attempt names. Unauthorized when there is none.
    pub fn login_candidate(&self, email: &str, password: &str) -> DeskResult<UserRow> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(DeskError::invalid("email and password are required"));
        }
        match self.store.user_by_email(email.trim())? {
            Some(u) => Ok(u),
            None => {
                log::info!("Login refused for unknown user {}", email.trim());
                Err(DeskError::Unauthorized)
            }
        }
    }

    /// Open a session for a user whose password was already checked. The row
    /// is read again; a user removed or re-hashed in between is refused.
    pub fn open_session(&self, verified: &UserRow) -> DeskResult<SessionGrant> {
        let user = match self.store.user_by_email(&verified.email)? {
            Some(u) if u.password_hash == verified.password_hash => u,
            _ => {
                log::info!("Login refused for {}: credential changed", verified.email);
                return Err(DeskError::Unauthorized);
            }
        };

        let now = self.now();
        let purged = self.store.delete_expired_sessions(now)?;
        if purged > 0 {
            log::debug!("Purged {purged} expired sessions");
        }
        let expires_at = now + Duration::hours(self.config.session_ttl_hours);
        let token = new_session_token();
        self.store
            .insert_session(&token_digest(&token), &user.email, now, expires_at)?;
        log::info!("Session opened for {} ({})", user.email, user.role.as_str());

        Ok(SessionGrant {
            token,
            user: UserProfile::from(&user),
            expires_at,
        })
    }

    /// Resolve a raw token to its caller. Expired sessions are removed.
    pub fn authenticate(&self, token: &str) -> DeskResult<Actor> {
        if token.is_empty() {
            return Err(DeskError::Unauthorized);
        }
        let digest = token_digest(token);
        let (user, expires_at) = self
            .store
            .session_user(&digest)?
            .ok_or(DeskError::Unauthorized)?;
        if expires_at <= self.now() {
            self.store.delete_session(&digest)?;
            log::debug!("Session for {} expired at {expires_at}", user.email);
            return Err(DeskError::Unauthorized);
        }
        Ok(UserProfile::from(&user).into())
    }

    pub fn logout(&self, token: &str) -> DeskResult<()> {
        self.store.delete_session(&token_digest(token))
    }

    pub(crate) fn new_user_row(
        &self,
        email: &str,
        password: HashedPassword,
        role: Role,
        bank: Option<&str>,
    ) -> UserRow {
        UserRow {
            email: email.to_string(),
            role,
            bank: bank.map(str::to_string),
            password_hash: password.0,
            created_at: self.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHashingConfig {
        PasswordHashingConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password(&cheap(), "maker123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("maker123", &hash).unwrap());
        assert!(!verify_password("maker124", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_a_credential_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(DeskError::Credential(_))
        ));
    }

    #[test]
    fn check_password_refuses_a_mismatch() {
        let user = UserRow {
            email: "maker@accessbank.com".into(),
            role: Role::BankMaker,
            bank: Some("Access Bank".into()),
            password_hash: hash_password(&cheap(), "maker123").unwrap(),
            created_at: Utc::now(),
        };
        check_password(&user, "maker123").unwrap();
        assert!(matches!(
            check_password(&user, "maker321"),
            Err(DeskError::Unauthorized)
        ));
    }

    #[test]
    fn digest_is_hex_sha256() {
        let d = token_digest("abc");
        assert_eq!(
            d,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(new_session_token().len(), 64);
    }
}
