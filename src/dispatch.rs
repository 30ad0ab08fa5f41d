use crate::client::create_http_client;
use crate::endpoint::{Endpoint, Method};
use crate::error::{OdkError, Result};
use crate::session::SharedSession;
use reqwest::blocking::Client;
use serde_json::Value;
use url::Url;

/// Request body for a dispatched call.
///
/// The content type is fixed per operation: form create/draft submit raw XML,
/// everything else submits JSON or nothing.
#[derive(Debug, Clone)]
pub enum Body {
    None,
    Json(Value),
    Xml(String),
}

/// Decoded response from a dispatched call.
///
/// The body is the server's JSON payload verbatim, with no schema mapping. A
/// body that failed to decode as JSON is `Value::Null`; callers treat that the
/// same as an empty result. The HTTP status is captured so callers are not
/// limited to inferring failure from the body shape.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code of the response
    pub status: u16,
    /// Decoded JSON body, `Value::Null` when the body was not valid JSON
    pub body: Value,
}

impl ApiResponse {
    /// Whether the body carries a Central error (`code` key present)
    pub fn is_error(&self) -> bool {
        self.body.get("code").is_some()
    }

    /// The Central error code from the body, if any
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }

    /// The Central error message from the body, if any
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// Turns `(Endpoint, placeholder map, body)` into a decoded JSON response.
///
/// Holds the blocking HTTP client and the shared session; every entity client
/// dispatches through a clone of this. The bearer token is read from the
/// session at call time, so a log-in after construction is picked up
/// automatically.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    http: Client,
    session: SharedSession,
    /// Transport-level credentials for `https_basic` authentication
    basic: Option<(String, String)>,
    debug: bool,
}

impl Dispatcher {
    /// Create a dispatcher around a shared session
    pub fn new(session: SharedSession) -> Self {
        Dispatcher {
            http: create_http_client(),
            session,
            basic: None,
            debug: false,
        }
    }

    /// Send credentials as transport-level basic auth instead of a bearer token
    pub fn with_basic_auth(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic = Some((email.into(), password.into()));
        self
    }

    /// Enable debug logging of dispatched requests
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The bearer token currently held by the shared session
    pub fn token(&self) -> String {
        self.session.lock().expect("session lock").token().to_string()
    }

    /// Resolve and send a request, decoding the response body as JSON.
    ///
    /// Placeholders absent from the map stay literal in the URL and the server
    /// will 404. Transport failures surface as [`OdkError::Transport`]; a
    /// non-JSON body decodes to `Value::Null` rather than erroring.
    pub fn send(
        &self,
        endpoint: &Endpoint,
        placeholders: &[(&str, &str)],
        body: Body,
    ) -> Result<ApiResponse> {
        self.dispatch(endpoint, placeholders, body, false)
    }

    /// Send a listing GET with the `X-Extended-Metadata: true` header set
    pub fn send_extended(
        &self,
        endpoint: &Endpoint,
        placeholders: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        self.dispatch(endpoint, placeholders, Body::None, true)
    }

    fn dispatch(
        &self,
        endpoint: &Endpoint,
        placeholders: &[(&str, &str)],
        body: Body,
        extended_metadata: bool,
    ) -> Result<ApiResponse> {
        let url = Url::parse(&endpoint.fill(placeholders))?;

        let method = match endpoint.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self.http.request(method.clone(), url.clone());

        // Auth: basic credentials for https_basic, otherwise a bearer token
        // when the session holds one. Unauthenticated calls get no header.
        if let Some((email, password)) = &self.basic {
            request = request.basic_auth(email, Some(password));
        } else {
            let token = self.token();
            if !token.is_empty() {
                request = request.header("Authorization", format!("Bearer {token}"));
            }
        }

        if extended_metadata {
            request = request.header("X-Extended-Metadata", "true");
        }

        request = match body {
            Body::None => request,
            Body::Json(value) => request
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&value)?),
            Body::Xml(xml) => request
                .header("Content-Type", "application/xml")
                .body(xml),
        };

        let start = std::time::Instant::now();
        let response = request.send()?;
        let status = response.status().as_u16();
        let bytes = response.bytes()?;

        if self.debug {
            eprintln!(
                "[odk] {} {} => {:?} (status: {})",
                method,
                url,
                start.elapsed(),
                status
            );
        }

        // Central answers JSON on every API route; anything else counts as an
        // empty result.
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Ok(ApiResponse { status, body })
    }
}

/// Linear scan of a listing response for the first element whose `field`
/// matches `value`.
///
/// The list endpoint's own error body (a `code` key instead of an array)
/// surfaces as [`OdkError::Api`]; a list with no match yields `Value::Null`.
/// O(n) per lookup, no caching across calls.
pub(crate) fn find_by_field(response: &ApiResponse, field: &str, value: &Value) -> Result<Value> {
    if let Some(error) = OdkError::from_error_body(response.status, &response.body) {
        return Err(error);
    }

    let found = response
        .body
        .as_array()
        .and_then(|items| items.iter().find(|item| item.get(field) == Some(value)))
        .cloned();

    Ok(found.unwrap_or(Value::Null))
}
