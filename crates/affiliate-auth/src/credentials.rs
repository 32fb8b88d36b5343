//! API account credentials.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

/// Mask used wherever the password would otherwise appear in diagnostics.
pub const PASSWORD_MASK: &str = "********";

/// Email/password pair for the affiliate API account.
///
/// `Debug` never reveals the password.
#[derive(Clone)]
pub struct Credentials {
    /// Account email
    pub email: String,

    /// Account password
    password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &PASSWORD_MASK)
            .finish()
    }
}

impl Credentials {
    /// Create credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Expose the password for building a login request body.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Login body using `field` as the name of the identity field.
    pub fn payload(&self, field: &str) -> Value {
        json!({
            field: self.email,
            "password": self.password(),
        })
    }

    /// Same shape as [`Credentials::payload`] with the password masked.
    pub fn masked_payload(&self, field: &str) -> Value {
        json!({
            field: self.email,
            "password": PASSWORD_MASK,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_password() {
        let credentials = Credentials::new("ops@example.com", "hunter2");
        let rendered = format!("{:?}", credentials);

        assert!(rendered.contains("ops@example.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_payload_shapes() {
        let credentials = Credentials::new("ops@example.com", "hunter2");

        let login = credentials.payload("login");
        assert_eq!(login["login"], "ops@example.com");
        assert_eq!(login["password"], "hunter2");

        let masked = credentials.masked_payload("email");
        assert_eq!(masked["email"], "ops@example.com");
        assert_eq!(masked["password"], PASSWORD_MASK);
    }
}
