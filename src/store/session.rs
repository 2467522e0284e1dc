//! User/session state
//!
//! The small persisted partition describing who is signed in to the catalog
//! backend. Lives apart from download state so wiping downloads never logs
//! the user out (and vice versa).

use serde::{Deserialize, Serialize};

/// Persisted user session for the streaming backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub logged_in: bool,
    pub email: Option<String>,
    /// Auth token attached to backend requests
    pub auth_key: Option<String>,
    /// Base URL of the user's preferred streaming addon
    pub streaming_url: Option<String>,
}

impl Session {
    /// Record a successful login
    pub fn login(&mut self, email: impl Into<String>, auth_key: impl Into<String>) {
        self.logged_in = true;
        self.email = Some(email.into());
        self.auth_key = Some(auth_key.into());
    }

    /// Drop all session state back to the logged-out default
    pub fn logout(&mut self) {
        *self = Session::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_logout() {
        let mut session = Session::default();
        assert!(!session.logged_in);

        session.login("user@example.com", "authkey123");
        assert!(session.logged_in);
        assert_eq!(session.email.as_deref(), Some("user@example.com"));
        assert_eq!(session.auth_key.as_deref(), Some("authkey123"));

        session.logout();
        assert_eq!(session, Session::default());
    }
}
