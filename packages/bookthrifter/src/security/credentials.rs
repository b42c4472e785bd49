//! Login credentials with secure memory.
//!
//! The password lives in a `secrecy::SecretBox` and is only exposed when it
//! is typed into the login form.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A string that never shows up in `Debug` or `Display` output.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret. Only call this at the point of use.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Store account used for the wish-list login.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug_or_display() {
        let secret = SecretString::new("hunter2-correct-horse");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose(), "hunter2-correct-horse");
    }

    #[test]
    fn test_credentials_debug_keeps_email() {
        let creds = Credentials::new("reader@example.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("reader@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_clone_preserves_secret() {
        let creds = Credentials::new("reader@example.com", String::from("pw"));
        assert_eq!(creds.clone().password.expose(), "pw");
        assert!(!creds.password.is_empty());
    }
}
