use std::sync::{Arc, Mutex};

/// Bearer-token session state for a Central server.
///
/// Empty strings mean "absent". The session is owned by the top-level client
/// and shared mutably with every handler, so a token rotation after a fresh
/// log-in is visible to already-constructed entity clients.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: String,
    csrf: String,
}

/// Session handle shared between the Authentication client and entity clients
pub type SharedSession = Arc<Mutex<Session>>;

impl Session {
    /// Create an empty (logged-out) session
    pub fn new() -> Self {
        Session::default()
    }

    /// Create a session around a pre-issued token (`app_user` authentication)
    pub fn with_token(token: impl Into<String>) -> Self {
        Session {
            token: token.into(),
            csrf: String::new(),
        }
    }

    /// The current bearer token, empty when logged out
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The CSRF token returned alongside the bearer token, empty when absent
    pub fn csrf(&self) -> &str {
        &self.csrf
    }

    /// Store the credentials obtained from a successful log-in
    pub fn set(&mut self, token: impl Into<String>, csrf: impl Into<String>) {
        self.token = token.into();
        self.csrf = csrf.into();
    }

    /// Blank both tokens
    pub fn clear(&mut self) {
        self.token.clear();
        self.csrf.clear();
    }

    /// Whether a bearer token is currently held
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}
