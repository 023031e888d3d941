//! Authentication entities: users, passwords and access tokens.

use crate::entity::{Identity, PersistenceState};
use crate::table::UniqueKey;
use serde::Serialize;
use std::time::SystemTime;
use uuid::Uuid;

/// Role granted to a user or carried by a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum UserRole {
    /// Regular user.
    #[default]
    User,
    /// Administrator.
    Administrator,
}

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    /// Record identity.
    #[serde(rename = "id")]
    pub identity: Identity<User>,
    /// Login name.
    pub login: String,
    /// Granted role.
    pub role: UserRole,
    /// First name.
    pub first_name: String,
    /// Surname.
    pub surname: String,
    /// Email address.
    pub email: String,
    /// Free text kept for the user.
    pub personal_note: String,
}

impl PersistenceState for User {
    const KIND: &'static str = "User";

    fn identity(&self) -> &Identity<Self> {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity<Self> {
        &mut self.identity
    }
}

impl User {
    /// One account per login.
    pub fn by_login() -> UniqueKey<Self> {
        UniqueKey::new("login", |u: &User| u.login.clone())
    }

    /// One account per email address.
    pub fn by_email() -> UniqueKey<Self> {
        UniqueKey::new("email", |u: &User| u.email.clone())
    }
}

/// A hashed password of a login.
///
/// A login keeps its previous passwords; the current one has no end of
/// validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Password {
    /// Record identity.
    #[serde(rename = "id")]
    pub identity: Identity<Password>,
    /// Login the password belongs to.
    pub login: String,
    /// Password hash.
    pub hashed_password: String,
    /// Creation time.
    pub created_utc: SystemTime,
    /// End of validity, `None` while current.
    pub end_of_validity_utc: Option<SystemTime>,
}

impl Default for Password {
    fn default() -> Self {
        Self {
            identity: Identity::detached(),
            login: String::new(),
            hashed_password: String::new(),
            created_utc: SystemTime::UNIX_EPOCH,
            end_of_validity_utc: None,
        }
    }
}

impl PersistenceState for Password {
    const KIND: &'static str = "Password";

    fn identity(&self) -> &Identity<Self> {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity<Self> {
        &mut self.identity
    }
}

impl Password {
    /// Returns true while the password has no end of validity.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.end_of_validity_utc.is_none()
    }
}

/// An access token issued to a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    /// Record identity.
    #[serde(rename = "id")]
    pub identity: Identity<AccessToken>,
    /// Login the token was issued to.
    pub login: String,
    /// Token value.
    pub guid: Uuid,
    /// Role granted by the token.
    pub role: UserRole,
    /// Issue time.
    pub created_utc: SystemTime,
    /// Expiry time.
    pub end_of_validity_utc: SystemTime,
    /// Why the token was issued or revoked.
    pub info_or_reason: String,
}

impl Default for AccessToken {
    fn default() -> Self {
        Self {
            identity: Identity::detached(),
            login: String::new(),
            guid: Uuid::nil(),
            role: UserRole::default(),
            created_utc: SystemTime::UNIX_EPOCH,
            end_of_validity_utc: SystemTime::UNIX_EPOCH,
            info_or_reason: String::new(),
        }
    }
}

impl PersistenceState for AccessToken {
    const KIND: &'static str = "AccessToken";

    fn identity(&self) -> &Identity<Self> {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity<Self> {
        &mut self.identity
    }
}

impl AccessToken {
    /// Token values are never shared.
    pub fn by_guid() -> UniqueKey<Self> {
        UniqueKey::new("guid", |t: &AccessToken| t.guid)
    }

    /// Returns true if the token is still valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        now < self.end_of_validity_utc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn drafts_are_detached() {
        assert!(!User::default().has_id());
        assert!(!Password::default().has_id());
        assert!(!AccessToken::default().has_id());
        assert_eq!(User::default().role, UserRole::User);
    }

    #[test]
    fn user_keys_extract_fields() {
        let user = User {
            login: "alice".into(),
            email: "alice@example.com".into(),
            ..User::default()
        };
        assert_eq!(User::by_login().value_of(&user), "alice".into());
        assert_eq!(User::by_email().value_of(&user), "alice@example.com".into());
    }

    #[test]
    fn password_currency() {
        let mut password = Password::default();
        assert!(password.is_current());
        password.end_of_validity_utc = Some(SystemTime::now());
        assert!(!password.is_current());
    }

    #[test]
    fn token_validity_window() {
        let now = SystemTime::now();
        let token = AccessToken {
            guid: Uuid::new_v4(),
            created_utc: now,
            end_of_validity_utc: now + Duration::from_secs(60),
            ..AccessToken::default()
        };
        assert!(token.is_valid_at(now));
        assert!(!token.is_valid_at(now + Duration::from_secs(61)));
    }

    #[test]
    fn serializes_detached_id_as_null() {
        let json = serde_json::to_value(User::default()).unwrap();
        assert!(json["id"].is_null());
        assert_eq!(json["role"], "User");
    }
}
