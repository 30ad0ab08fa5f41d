use crate::auth::Authentication;
use crate::dispatch::Dispatcher;
use crate::form::Form;
use crate::project::Project;
use crate::session::{Session, SharedSession};
use crate::user::User;
use reqwest::blocking::{Client, ClientBuilder};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Create the default HTTP client for API requests.
///
/// The source left the transport unbounded; an explicit timeout keeps a dead
/// server from blocking a call forever.
pub fn create_http_client() -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

/// How the client authenticates against the Central server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    /// Token-based sessions via log-in/log-out
    #[default]
    Session,
    /// Credentials supplied per request as transport-level basic auth
    HttpsBasic,
    /// Pre-issued app-user token supplied via [`Config::with_token`]
    AppUser,
}

/// Configuration for an ODK Central client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL where the Central server is hosted, e.g. `https://central.example.com`
    pub base_url: String,
    /// Authentication mode
    pub auth_type: AuthType,
    /// Pre-issued token for `AppUser` authentication
    pub token: Option<String>,
    /// Credentials for `HttpsBasic` authentication
    pub email: Option<String>,
    pub password: Option<String>,
    /// Enable debug logging of dispatched requests
    pub debug: bool,
}

impl Config {
    /// Create a configuration for session authentication against `base_url`.
    ///
    /// The base URL is not validated here; a malformed one fails at request
    /// time.
    pub fn new(base_url: impl Into<String>) -> Self {
        Config {
            base_url: base_url.into(),
            auth_type: AuthType::Session,
            token: None,
            email: None,
            password: None,
            debug: false,
        }
    }

    /// Set the authentication mode
    pub fn with_auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = auth_type;
        self
    }

    /// Set a pre-issued app-user token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the credentials used for `HttpsBasic` authentication
    pub fn with_basic_credentials(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.email = Some(email.into());
        self.password = Some(password.into());
        self
    }

    /// Set debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Top-level handler for an ODK Central server.
///
/// Owns the shared session and the dispatcher, and hands out the per-entity
/// clients. All clients dispatch through the same session, so a token obtained
/// by [`Authentication::login`] is immediately visible to entity clients
/// created before or after the log-in.
pub struct OdkCentral {
    config: Config,
    session: SharedSession,
    dispatcher: Dispatcher,
}

impl OdkCentral {
    /// Create a client from a configuration
    pub fn new(config: Config) -> Self {
        let session = match (&config.auth_type, &config.token) {
            (AuthType::AppUser, Some(token)) => Session::with_token(token.clone()),
            _ => Session::new(),
        };
        let session: SharedSession = Arc::new(Mutex::new(session));

        let mut dispatcher = Dispatcher::new(Arc::clone(&session)).with_debug(config.debug);
        if config.auth_type == AuthType::HttpsBasic {
            let email = config.email.clone().unwrap_or_default();
            let password = config.password.clone().unwrap_or_default();
            dispatcher = dispatcher.with_basic_auth(email, password);
        }

        OdkCentral {
            config,
            session,
            dispatcher,
        }
    }

    /// The configuration this client was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle on the shared session
    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    /// The "Authentication" handler
    pub fn auth(&self) -> Authentication {
        Authentication::new(
            &self.config.base_url,
            self.config.auth_type,
            self.dispatcher.clone(),
            Arc::clone(&self.session),
        )
    }

    /// The "Project" handler
    pub fn project(&self) -> Project {
        Project::new(&self.config.base_url, self.dispatcher.clone())
    }

    /// The "Form" handler
    pub fn form(&self) -> Form {
        Form::new(&self.config.base_url, self.dispatcher.clone())
    }

    /// The "User" handler
    pub fn user(&self) -> User {
        User::new(&self.config.base_url, self.dispatcher.clone())
    }
}
