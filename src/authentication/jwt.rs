use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::ApiError;
use crate::schema::{Id, User, UserRole};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(user: &User, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: user.id,
            username: user.username.to_owned(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}

/// The authenticated actor of a request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

/// Signs and verifies session tokens with a process-wide HMAC key.
#[derive(Clone)]
pub struct TokenKeys {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, ApiError> {
        let key = Hmac::new_from_slice(secret)
            .map_err(|e| ApiError::Internal(format!("Invalid token secret: {e}")))?;

        Ok(Self { key, lifetime })
    }

    pub fn generate_session(&self, user: &User) -> Result<String, ApiError> {
        JwtSessionData::new(user, self.lifetime)
            .sign_with_key(&self.key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
    }

    pub fn verify_session(&self, token: &str) -> Result<JwtSessionData, ApiError> {
        let session: JwtSessionData = token.verify_with_key(&self.key).map_err(|_| {
            log::debug!("Rejected token with invalid signature");
            ApiError::Unauthorized
        })?;

        if session.exp < Utc::now().timestamp() {
            log::debug!("Rejected expired token of user {}", session.user_id);
            return Err(ApiError::Unauthorized);
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Ann"),
            last_name: String::from("Cook"),
            password: String::new(),
            role: UserRole::User,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let keys = TokenKeys::new(b"secret", Duration::hours(1)).unwrap();
        let token = keys.generate_session(&user()).unwrap();

        let session: SessionData = keys.verify_session(&token).unwrap().into();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "cook");
        assert!(!session.is_admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new(b"secret", Duration::hours(-1)).unwrap();
        let token = keys.generate_session(&user()).unwrap();

        assert!(matches!(
            keys.verify_session(&token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let issuer = TokenKeys::new(b"secret", Duration::hours(1)).unwrap();
        let verifier = TokenKeys::new(b"other", Duration::hours(1)).unwrap();
        let token = issuer.generate_session(&user()).unwrap();

        assert!(verifier.verify_session(&token).is_err());
    }
}
