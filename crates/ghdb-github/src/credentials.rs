//! Caller credentials, passed per call so one client can serve many users.

use zeroize::Zeroizing;

/// An access token plus the identity it belongs to.
///
/// `Debug` redacts the token.
#[derive(Clone)]
pub struct Credentials {
    token: Zeroizing<String>,
    login: String,
    email: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("login", &self.login)
            .field("email", &self.email)
            .finish()
    }
}

impl Credentials {
    pub fn new(token: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
            login: login.into(),
            email: None,
        }
    }

    /// Attach the email used as committer address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.email = (!email.trim().is_empty()).then_some(email);
        self
    }

    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Committer email: the configured address, or the hosting service's
    /// no-reply address for the login.
    pub fn committer_email(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("{}@users.noreply.github.com", self.login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let creds = Credentials::new("ghp_secret", "alice");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("alice"));
    }

    #[test]
    fn committer_email_falls_back_to_noreply() {
        let creds = Credentials::new("t", "alice");
        assert_eq!(creds.committer_email(), "alice@users.noreply.github.com");
        let creds = creds.with_email("alice@example.com");
        assert_eq!(creds.committer_email(), "alice@example.com");
        assert_eq!(Credentials::new("t", "bob").with_email("  ").email(), None);
    }
}
