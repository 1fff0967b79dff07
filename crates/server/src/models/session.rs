//! Session-related types.
//!
//! Types stored in the session for authentication state and one-shot
//! messages.

use serde::{Deserialize, Serialize};

use stockroom_core::{User, is_admin_username};

/// Session-stored user identity.
///
/// Snapshot of the account taken at login; checkout uses it as the buyer's
/// identity and as the seller name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        is_admin_username(&self.username)
    }

    /// Where this user lands after login or a wrong-role redirect.
    #[must_use]
    pub fn landing_page(&self) -> &'static str {
        if self.is_admin() { "/sales" } else { "/shop" }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            display_name: user.display_name().to_owned(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// Severity of a flash message; doubles as its CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    /// CSS class for templates.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        self.level.as_str()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending flash messages.
    pub const FLASHES: &str = "flashes";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_user_uses_display_name() {
        let user = User {
            username: "maria".to_string(),
            password: "pw".to_string(),
            name: String::new(),
            email: "maria@example.com".to_string(),
            phone: String::new(),
        };
        let current = CurrentUser::from(&user);
        assert_eq!(current.display_name, "maria");
        assert_eq!(current.landing_page(), "/shop");
        assert!(!current.is_admin());
    }

    #[test]
    fn test_admin_lands_on_sales() {
        let current = CurrentUser {
            username: "admin".to_string(),
            display_name: "Administrator".to_string(),
            email: String::new(),
            phone: String::new(),
        };
        assert!(current.is_admin());
        assert_eq!(current.landing_page(), "/sales");
    }
}
