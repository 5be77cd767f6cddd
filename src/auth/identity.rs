// Identity
// Resolved user profile shared by the auth state provider and the backend client

use serde::{Deserialize, Serialize};

/// A signed-in user: provider identity joined with the backend profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Internal numeric id from the backend (0 when the profile is unknown)
    pub user_id: i64,
    /// Provider-issued unique id
    pub uid: String,
    pub email: Option<String>,
    pub name: String,
}

impl Identity {
    /// Degraded identity used when the backend profile cannot be resolved
    pub fn placeholder(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: 0,
            uid: uid.into(),
            email,
            name: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.user_id == 0 && self.name.is_empty()
    }

    /// Greeting name: display name, else the numeric id, else "User"
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            self.name.clone()
        } else if self.user_id != 0 {
            self.user_id.to_string()
        } else {
            "User".to_string()
        }
    }
}

/// Body of `POST /auth/register` on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRegistration {
    pub token: String,
    pub uid: String,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_shape() {
        let identity: Identity = serde_json::from_str(
            r#"{"userId": 42, "uid": "abc", "email": "a@b.co", "name": "Ayu"}"#,
        )
        .unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.email.as_deref(), Some("a@b.co"));
        assert!(!identity.is_placeholder());
    }

    #[test]
    fn test_placeholder() {
        let identity = Identity::placeholder("abc", None);
        assert!(identity.is_placeholder());
        assert_eq!(identity.display_name(), "User");
    }
}
