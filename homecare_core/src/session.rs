//! Session provider backed by a mock user directory.
//!
//! Credentials are checked against a fixed directory; the signed-in user
//! (without password) is persisted under the session storage key.

use crate::storage::LocalStorage;
use crate::{Error, Result, Role, User};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Identity of the acting user, as seen by the booking engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    /// Provider operated by a pharmacy session
    pub provider_id: Option<String>,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            provider_id: user.provider_id.clone(),
        }
    }
}

struct DirectoryEntry {
    user: User,
    password: &'static str,
}

static MOCK_DIRECTORY: Lazy<Vec<DirectoryEntry>> = Lazy::new(|| {
    let created_at = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default();
    vec![
        DirectoryEntry {
            user: User {
                id: "1".into(),
                name: "أحمد محمد".into(),
                email: "ahmed@example.com".into(),
                phone: "01234567890".into(),
                role: Role::User,
                provider_id: None,
                created_at,
            },
            password: "123456",
        },
        DirectoryEntry {
            user: User {
                id: "2".into(),
                name: "صيدلية النور".into(),
                email: "nour@pharmacy.com".into(),
                phone: "01987654321".into(),
                role: Role::Pharmacy,
                provider_id: Some("1".into()),
                created_at,
            },
            password: "123456",
        },
    ]
});

/// Fields supplied when creating an account
#[derive(Clone, Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

/// Profile fields a signed-in user may change
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Login, registration and the persisted current session
pub struct SessionProvider {
    storage: LocalStorage,
    key: String,
}

impl SessionProvider {
    pub fn new(storage: LocalStorage, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Sign in; returns false when no directory entry matches all three fields
    pub fn login(&self, email: &str, password: &str, role: Role) -> Result<bool> {
        let email = email.trim();
        let found = MOCK_DIRECTORY
            .iter()
            .find(|e| e.user.email == email && e.password == password && e.user.role == role);

        match found {
            Some(entry) => {
                self.store(&entry.user)?;
                tracing::info!("User '{}' logged in as {}", entry.user.id, role);
                Ok(true)
            }
            None => {
                tracing::info!("Login rejected for '{}' as {}", email, role);
                Ok(false)
            }
        }
    }

    /// Create an account and sign it in
    ///
    /// The directory itself is not extended: the new account lives for the
    /// duration of the session. Pharmacy accounts are rejected because a new
    /// account is not linked to any provider.
    pub fn register(&self, registration: Registration, password: &str) -> Result<bool> {
        if registration.role == Role::Pharmacy {
            return Err(Error::Validation(
                "pharmacy accounts cannot self-register; they must be linked to a provider".into(),
            ));
        }

        let name = registration.name.trim();
        let email = registration.email.trim();
        if name.is_empty() {
            return Err(Error::Validation("name must not be empty".into()));
        }
        if email.is_empty() {
            return Err(Error::Validation("email must not be empty".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: registration.phone.trim().to_string(),
            role: registration.role,
            provider_id: None,
            created_at: Utc::now(),
        };
        self.store(&user)?;
        tracing::info!("Registered user '{}' as {}", user.id, user.role);
        Ok(true)
    }

    pub fn logout(&self) -> Result<()> {
        self.storage.remove(&self.key)?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// The signed-in user, if any
    pub fn current(&self) -> Result<Option<User>> {
        let Some(contents) = self.storage.get(&self.key)? else {
            return Ok(None);
        };
        let user = serde_json::from_str(&contents).map_err(|e| {
            Error::Persistence(format!("session '{}' is corrupt: {}", self.key, e))
        })?;
        Ok(Some(user))
    }

    /// The acting session; fails when nobody is signed in
    pub fn require(&self) -> Result<Session> {
        self.current()?
            .as_ref()
            .map(Session::from)
            .ok_or_else(|| Error::Unauthorized("not logged in".into()))
    }

    /// Edit name, email or phone of the signed-in user
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        let mut user = self
            .current()?
            .ok_or_else(|| Error::Unauthorized("not logged in".into()))?;

        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Validation("name must not be empty".into()));
            }
            user.name = name.to_string();
        }
        if let Some(email) = update.email {
            let email = email.trim();
            if email.is_empty() {
                return Err(Error::Validation("email must not be empty".into()));
            }
            user.email = email.to_string();
        }
        if let Some(phone) = update.phone {
            user.phone = phone.trim().to_string();
        }

        self.store(&user)?;
        tracing::info!("Updated profile of user '{}'", user.id);
        Ok(user)
    }

    fn store(&self, user: &User) -> Result<()> {
        let contents = serde_json::to_string(user)?;
        self.storage.set(&self.key, &contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(dir: &std::path::Path) -> SessionProvider {
        SessionProvider::new(LocalStorage::new(dir), "healthApp_user")
    }

    #[test]
    fn test_login_requires_matching_role() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());

        assert!(!sessions
            .login("ahmed@example.com", "123456", Role::Pharmacy)
            .unwrap());
        assert!(sessions.current().unwrap().is_none());

        assert!(sessions
            .login("ahmed@example.com", "123456", Role::User)
            .unwrap());
        let session = sessions.require().unwrap();
        assert_eq!(session.user_id, "1");
        assert_eq!(session.role, Role::User);
    }

    #[test]
    fn test_wrong_password_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        assert!(!sessions
            .login("ahmed@example.com", "wrong", Role::User)
            .unwrap());
    }

    #[test]
    fn test_pharmacy_session_carries_provider() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        sessions
            .login("nour@pharmacy.com", "123456", Role::Pharmacy)
            .unwrap();

        let session = sessions.require().unwrap();
        assert_eq!(session.provider_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_session_never_stores_password() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        sessions
            .login("ahmed@example.com", "123456", Role::User)
            .unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join("healthApp_user.json")).unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let fields = stored.as_object().unwrap();
        assert!(fields.keys().all(|k| !k.to_lowercase().contains("password")));
        assert!(fields.values().all(|v| v != "123456"));
        assert_eq!(stored["role"], "user");
    }

    #[test]
    fn test_logout_clears_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        sessions
            .login("ahmed@example.com", "123456", Role::User)
            .unwrap();
        sessions.logout().unwrap();

        assert!(sessions.current().unwrap().is_none());
        assert!(matches!(sessions.require(), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_register_signs_in() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        let registration = Registration {
            name: "سارة".into(),
            email: "sara@example.com".into(),
            phone: "0550000000".into(),
            role: Role::User,
        };

        assert!(sessions.register(registration, "secret1").unwrap());
        let user = sessions.current().unwrap().unwrap();
        assert_eq!(user.email, "sara@example.com");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_register_rejects_short_password() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        let registration = Registration {
            name: "سارة".into(),
            email: "sara@example.com".into(),
            phone: String::new(),
            role: Role::User,
        };

        let result = sessions.register(registration, "123");
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(sessions.current().unwrap().is_none());
    }

    #[test]
    fn test_register_rejects_pharmacy_role() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        let registration = Registration {
            name: "صيدلية جديدة".into(),
            email: "new@pharmacy.com".into(),
            phone: String::new(),
            role: Role::Pharmacy,
        };

        let result = sessions.register(registration, "secret1");
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(sessions.current().unwrap().is_none());
    }

    #[test]
    fn test_update_profile() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        sessions
            .login("ahmed@example.com", "123456", Role::User)
            .unwrap();

        let updated = sessions
            .update_profile(ProfileUpdate {
                phone: Some("0509999999".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.phone, "0509999999");
        assert_eq!(updated.name, "أحمد محمد");
        assert_eq!(sessions.current().unwrap().unwrap().phone, "0509999999");
    }

    #[test]
    fn test_update_profile_requires_login() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = provider(temp_dir.path());
        let result = sessions.update_profile(ProfileUpdate::default());
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }
}
