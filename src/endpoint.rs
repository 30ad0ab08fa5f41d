use std::collections::HashMap;

/// Placeholder tokens substituted into endpoint URL templates.
pub mod placeholder {
    pub const TOKEN: &str = "%TOKEN%";
    pub const PROJECT_ID: &str = "%PROJECT_ID%";
    pub const XML_FORM_ID: &str = "%XML_FORM_ID%";
    pub const USER_ID: &str = "%USER_ID%";
    pub const ENKETO_ID: &str = "%ENKETO_ID%";
    pub const ROLE_ID: &str = "%ROLE_ID%";
    pub const ACTOR_ID: &str = "%ACTOR_ID%";
}

/// HTTP method used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A named API endpoint: a URL template plus the HTTP method it is called with.
///
/// Templates may contain `%TOKEN%`-style placeholders that are substituted at
/// request time via [`Endpoint::fill`]. Endpoints are immutable once built.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// URL template, `base_url` + path, possibly containing placeholders
    pub url: String,
    /// HTTP method
    pub method: Method,
}

impl Endpoint {
    /// Create a new endpoint from a URL template and method
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Endpoint {
            url: url.into(),
            method,
        }
    }

    /// Substitute placeholder tokens into the URL template.
    ///
    /// Every `(token, value)` pair present in both the template and the map is
    /// replaced. Tokens in the template with no entry in the map are left
    /// untouched; the resulting URL will 404 on the server.
    pub fn fill(&self, placeholders: &[(&str, &str)]) -> String {
        let mut url = self.url.clone();
        for (token, value) in placeholders {
            url = url.replace(token, value);
        }
        url
    }
}

/// Registry of named endpoints for one entity type.
///
/// Built once at client construction by the `*_endpoints` functions below;
/// pure data, no I/O. The set of names per entity is fixed, so lookups via
/// [`Endpoints::require`] treat a missing name as a programming error.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    inner: HashMap<&'static str, Endpoint>,
}

impl Endpoints {
    fn insert(&mut self, name: &'static str, endpoint: Endpoint) {
        self.inner.insert(name, endpoint);
    }

    /// Look up an endpoint by name
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.inner.get(name)
    }

    /// Look up an endpoint that is always registered for this entity type
    pub fn require(&self, name: &str) -> &Endpoint {
        self.inner
            .get(name)
            .expect("endpoint registered at construction")
    }

    /// Number of registered endpoints
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Build the session-authentication endpoints.
///
/// Only `session` authentication registers the log-in/log-out pair; the
/// `https_basic` and `app_user` modes carry their credential per request and
/// get just the probe endpoint used by `check()`.
pub fn auth_endpoints(base_url: &str, session: bool) -> Endpoints {
    let mut endpoints = Endpoints::default();
    if session {
        endpoints.insert(
            "logIn",
            Endpoint::new(format!("{base_url}/v1/sessions"), Method::Post),
        );
        endpoints.insert(
            "logOut",
            Endpoint::new(format!("{base_url}/v1/sessions/%TOKEN%"), Method::Delete),
        );
    }
    // A path that never routes; the server answers 404.1 only when the
    // request is authenticated.
    endpoints.insert(
        "check",
        Endpoint::new(format!("{base_url}/v1/nonexistent"), Method::Get),
    );
    endpoints
}

/// Build the Project endpoints
pub fn project_endpoints(base_url: &str) -> Endpoints {
    let mut endpoints = Endpoints::default();
    endpoints.insert(
        "create",
        Endpoint::new(format!("{base_url}/v1/projects"), Method::Post),
    );
    endpoints.insert(
        "delete",
        Endpoint::new(format!("{base_url}/v1/projects/%PROJECT_ID%"), Method::Delete),
    );
    endpoints.insert(
        "all",
        Endpoint::new(format!("{base_url}/v1/projects"), Method::Get),
    );
    endpoints.insert(
        "assignment",
        Endpoint::new(
            format!("{base_url}/v1/projects/%PROJECT_ID%/assignments/%ROLE_ID%/%ACTOR_ID%"),
            Method::Post,
        ),
    );
    endpoints.insert(
        "appUsers",
        Endpoint::new(
            format!("{base_url}/v1/projects/%PROJECT_ID%/app-users"),
            Method::Get,
        ),
    );
    endpoints
}

/// Build the Form endpoints
pub fn form_endpoints(base_url: &str) -> Endpoints {
    let mut endpoints = Endpoints::default();
    endpoints.insert(
        "create",
        Endpoint::new(
            format!("{base_url}/v1/projects/%PROJECT_ID%/forms?ignoreWarnings=false&publish=false"),
            Method::Post,
        ),
    );
    endpoints.insert(
        "draft",
        Endpoint::new(
            format!(
                "{base_url}/v1/projects/%PROJECT_ID%/forms/%XML_FORM_ID%/draft?ignoreWarnings=false"
            ),
            Method::Post,
        ),
    );
    endpoints.insert(
        "all",
        Endpoint::new(
            format!("{base_url}/v1/projects/%PROJECT_ID%/forms"),
            Method::Get,
        ),
    );
    endpoints.insert(
        "details",
        Endpoint::new(
            format!("{base_url}/v1/projects/%PROJECT_ID%/forms/%XML_FORM_ID%"),
            Method::Get,
        ),
    );
    endpoints.insert(
        "enketo",
        Endpoint::new(format!("{base_url}/-/preview/%ENKETO_ID%"), Method::Get),
    );
    // Server URLs embedded in Collect provisioning QR codes
    endpoints.insert(
        "draftServer",
        Endpoint::new(
            format!("{base_url}/v1/test/%TOKEN%/projects/%PROJECT_ID%/forms/%XML_FORM_ID%/draft"),
            Method::Get,
        ),
    );
    endpoints.insert(
        "appUserServer",
        Endpoint::new(
            format!("{base_url}/v1/key/%TOKEN%/projects/%PROJECT_ID%"),
            Method::Get,
        ),
    );
    endpoints
}

/// Build the User endpoints
pub fn user_endpoints(base_url: &str) -> Endpoints {
    let mut endpoints = Endpoints::default();
    endpoints.insert(
        "create",
        Endpoint::new(format!("{base_url}/v1/users"), Method::Post),
    );
    endpoints.insert(
        "delete",
        Endpoint::new(format!("{base_url}/v1/users/%USER_ID%"), Method::Delete),
    );
    endpoints.insert(
        "all",
        Endpoint::new(format!("{base_url}/v1/users"), Method::Get),
    );
    endpoints
}
