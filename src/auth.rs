use crate::client::AuthType;
use crate::dispatch::{ApiResponse, Body, Dispatcher};
use crate::endpoint::{auth_endpoints, placeholder, Endpoints};
use crate::error::{OdkError, Result};
use crate::session::SharedSession;
use serde_json::{json, Value};

/// Central error code the router answers with for an authenticated request to
/// a nonexistent resource. An unauthenticated request gets a different code,
/// which is what `check()` keys on.
const AUTHENTICATED_NOT_FOUND: &str = "404.1";

/// The Authentication handler.
///
/// Owns the session lifecycle: log-in stores the bearer/CSRF tokens in the
/// shared session, log-out blanks them. For `https_basic` and `app_user`
/// authentication there is no log-in/log-out flow; only `check()` applies.
pub struct Authentication {
    auth_type: AuthType,
    endpoints: Endpoints,
    dispatcher: Dispatcher,
    session: SharedSession,
}

impl Authentication {
    pub(crate) fn new(
        base_url: &str,
        auth_type: AuthType,
        dispatcher: Dispatcher,
        session: SharedSession,
    ) -> Self {
        Authentication {
            auth_type,
            endpoints: auth_endpoints(base_url, auth_type == AuthType::Session),
            dispatcher,
            session,
        }
    }

    /// Request a log-in at the Central server.
    ///
    /// POSTs the credentials as JSON; the call itself is unauthenticated. On a
    /// response carrying a `token` field the session stores the token and any
    /// `csrf` alongside it. On any other response the session is left blank,
    /// so callers must consult [`Authentication::is_authenticated`] before
    /// using the entity clients.
    pub fn login(&self, email: &str, password: &str) -> Result<ApiResponse> {
        let endpoint = self.endpoints.get("logIn").ok_or_else(|| {
            OdkError::Auth(format!(
                "log-in is only available for session authentication, not {:?}",
                self.auth_type
            ))
        })?;

        // Blank any previous token first; the log-in request must go out
        // unauthenticated, and a failed log-in must not leave a stale token.
        self.session.lock().expect("session lock").clear();

        let credentials = json!({ "email": email, "password": password });
        let response = self.dispatcher.send(endpoint, &[], Body::Json(credentials))?;

        let mut session = self.session.lock().expect("session lock");
        match response.body.get("token").and_then(Value::as_str) {
            Some(token) => {
                let csrf = response
                    .body
                    .get("csrf")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                session.set(token, csrf);
            }
            None => session.clear(),
        }

        Ok(response)
    }

    /// Request a log-out at the Central server.
    ///
    /// DELETEs the session resource with the current token substituted into
    /// the URL. The local session is blanked unconditionally, whatever the
    /// server answered, so a stale credential can never be reused.
    pub fn logout(&self) -> Result<ApiResponse> {
        let endpoint = self.endpoints.get("logOut").ok_or_else(|| {
            OdkError::Auth(format!(
                "log-out is only available for session authentication, not {:?}",
                self.auth_type
            ))
        })?;

        let token = self.dispatcher.token();
        let result = self
            .dispatcher
            .send(endpoint, &[(placeholder::TOKEN, &token)], Body::None);

        self.session.lock().expect("session lock").clear();

        result
    }

    /// The log-out URL with the current token substituted for `%TOKEN%`
    pub fn logout_url(&self) -> Option<String> {
        let endpoint = self.endpoints.get("logOut")?;
        let token = self.dispatcher.token();
        Some(endpoint.fill(&[(placeholder::TOKEN, &token)]))
    }

    /// Probe whether the held credential is accepted by the server.
    ///
    /// GETs a path that never routes. Central's router reports code `404.1`
    /// for an authenticated request to a nonexistent resource; any other
    /// answer, including a transport failure, means not authenticated.
    pub fn check(&self) -> bool {
        match self
            .dispatcher
            .send(self.endpoints.require("check"), &[], Body::None)
        {
            Ok(response) => is_authenticated_probe(&response.body),
            Err(_) => false,
        }
    }

    /// The bearer token of the current session, empty when logged out
    pub fn token(&self) -> String {
        self.session.lock().expect("session lock").token().to_string()
    }

    /// The CSRF token of the current session, empty when absent
    pub fn csrf(&self) -> String {
        self.session.lock().expect("session lock").csrf().to_string()
    }

    /// Whether a bearer token is currently held
    pub fn is_authenticated(&self) -> bool {
        self.session.lock().expect("session lock").is_authenticated()
    }

    /// The authentication mode this handler was built for
    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }
}

/// Classify a `check()` probe response body.
///
/// Authenticated means exactly: an object carrying both `message` and `code`,
/// with `code == "404.1"`.
pub(crate) fn is_authenticated_probe(body: &Value) -> bool {
    body.get("message").is_some()
        && body.get("code").and_then(Value::as_str) == Some(AUTHENTICATED_NOT_FOUND)
}
