//! Mock sign-in session.
//!
//! There is no credential verification: any non-empty email and password
//! signs in. The role decides which actions the list view offers.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Guest,
}

impl Role {
    pub fn can_delete(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
    admin_emails: Vec<String>,
}

impl Session {
    /// Session whose admins are the given emails (case-insensitive).
    pub fn new(admin_emails: Vec<String>) -> Self {
        Self {
            user: None,
            admin_emails: admin_emails
                .into_iter()
                .map(|e| e.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<&User, StateError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(StateError::NotAuthenticated(
                "email and password are required".to_string(),
            ));
        }

        let role = if self.admin_emails.contains(&email.to_lowercase()) {
            Role::Admin
        } else {
            Role::Guest
        };
        info!(%email, %role, "Signed in");
        Ok(self.user.insert(User {
            email: email.to_string(),
            role,
        }))
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(email = %user.email, "Signed out");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Role of the signed-in user; anonymous sessions are guests.
    pub fn role(&self) -> Role {
        self.user.as_ref().map_or(Role::Guest, |u| u.role)
    }
}
