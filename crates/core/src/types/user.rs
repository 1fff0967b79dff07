//! Application users.

use serde::{Deserialize, Serialize};

/// Username that carries the admin role.
pub const ADMIN_USERNAME: &str = "admin";

/// Whether a username carries the admin role.
#[must_use]
pub fn is_admin_username(username: &str) -> bool {
    username == ADMIN_USERNAME
}

/// A user account.
///
/// Passwords are stored as entered; the users file is expected to live on a
/// host only the operator can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl User {
    /// Name shown in the UI, falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }

    /// Whether this user is the administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        is_admin_username(&self.username)
    }

    /// Compare a submitted password.
    #[must_use]
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

/// Find a user by username.
#[must_use]
pub fn find<'a>(users: &'a [User], username: &str) -> Option<&'a User> {
    users.iter().find(|u| u.username == username)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_user_without_contact_fields() {
        let user: User =
            serde_json::from_str(r#"{"username": "admin", "password": "admin123", "name": "Administrador"}"#)
                .unwrap();
        assert!(user.is_admin());
        assert_eq!(user.display_name(), "Administrador");
        assert_eq!(user.email, "");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user = User {
            username: "maria".to_string(),
            password: "pw".to_string(),
            name: "  ".to_string(),
            email: String::new(),
            phone: String::new(),
        };
        assert_eq!(user.display_name(), "maria");
        assert!(!user.is_admin());
    }

    #[test]
    fn test_find() {
        let users = vec![User {
            username: "maria".to_string(),
            password: "pw".to_string(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
        }];
        assert!(find(&users, "maria").is_some());
        assert!(find(&users, "Maria").is_none());
    }
}
