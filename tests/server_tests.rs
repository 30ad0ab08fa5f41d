//! End-to-end tests against a local canned-response HTTP server.
//!
//! Each test binds a listener on a random port, serves a fixed sequence of
//! JSON bodies, and captures the raw requests so headers and paths can be
//! asserted on.

use odk_central::{AuthType, Config, OdkCentral};
use serde_json::json;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;

struct Canned {
    status: u16,
    body: String,
}

impl Canned {
    fn ok(body: serde_json::Value) -> Self {
        Canned {
            status: 200,
            body: body.to_string(),
        }
    }

    fn with_status(status: u16, body: serde_json::Value) -> Self {
        Canned {
            status,
            body: body.to_string(),
        }
    }

    fn raw(status: u16, body: &str) -> Self {
        Canned {
            status,
            body: body.to_string(),
        }
    }
}

struct Received {
    head: String,
    body: String,
}

impl Received {
    fn has_header(&self, line: &str) -> bool {
        self.head.to_lowercase().contains(&line.to_lowercase())
    }

    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }
}

/// Serve the canned responses one connection at a time, returning the base
/// URL and a channel of captured requests.
fn serve(responses: Vec<Canned>) -> (String, mpsc::Receiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for canned in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            if let Some(received) = read_request(&mut stream) {
                tx.send(received).ok();
            }
            let reason = match canned.status {
                200 => "OK",
                401 => "Unauthorized",
                403 => "Forbidden",
                404 => "Not Found",
                _ => "OK",
            };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                canned.status,
                reason,
                canned.body.len(),
                canned.body
            );
            stream.write_all(response.as_bytes()).ok();
        }
    });

    (format!("http://{addr}"), rx)
}

fn read_request(stream: &mut TcpStream) -> Option<Received> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };

        let head = String::from_utf8_lossy(&buf[..end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);

        let mut body = buf[end + 4..].to_vec();
        while body.len() < content_length {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        return Some(Received {
            head,
            body: String::from_utf8_lossy(&body).to_string(),
        });
    }
}

#[test]
fn login_success_stores_token_and_fills_logout_url() {
    let (base_url, rx) = serve(vec![Canned::ok(json!({"token": "abc", "csrf": "xyz"}))]);
    let central = OdkCentral::new(Config::new(base_url));

    central
        .auth()
        .login("admin@example.com", "secret")
        .expect("login");

    let auth = central.auth();
    assert_eq!(auth.token(), "abc");
    assert_eq!(auth.csrf(), "xyz");
    assert!(auth.is_authenticated());
    assert!(auth
        .logout_url()
        .expect("session auth has a logout endpoint")
        .ends_with("/v1/sessions/abc"));

    let request = rx.recv().expect("captured request");
    assert!(request.request_line().starts_with("POST /v1/sessions"));
    assert!(request.has_header("content-type: application/json"));
    assert!(
        !request.has_header("authorization:"),
        "login itself must be unauthenticated"
    );
    assert!(request.body.contains("admin@example.com"));
}

#[test]
fn login_failure_leaves_session_blank() {
    let (base_url, _rx) = serve(vec![Canned::with_status(
        401,
        json!({"code": "401.2", "message": "Could not authenticate with the provided credentials."}),
    )]);
    let central = OdkCentral::new(Config::new(base_url));

    // Seed a stale token; a failed login must not leave it behind.
    central
        .session()
        .lock()
        .unwrap()
        .set("stale-token", "stale-csrf");

    central.auth().login("admin@example.com", "wrong").expect("login call");

    assert_eq!(central.auth().token(), "");
    assert!(!central.auth().is_authenticated());
}

#[test]
fn logout_clears_session_whatever_the_server_says() {
    let (base_url, rx) = serve(vec![Canned::with_status(
        403,
        json!({"code": "403.1", "message": "The authentication you provided does not have rights to perform that action."}),
    )]);
    let central = OdkCentral::new(Config::new(base_url));
    central.session().lock().unwrap().set("abc", "");

    central.auth().logout().expect("logout call");

    assert_eq!(central.auth().token(), "");
    assert!(!central.auth().is_authenticated());

    let request = rx.recv().expect("captured request");
    assert!(request.request_line().starts_with("DELETE /v1/sessions/abc"));
    assert!(request.has_header("authorization: bearer abc"));
}

#[test]
fn token_rotation_reaches_entity_clients_built_earlier() {
    let (base_url, rx) = serve(vec![
        Canned::ok(json!({"token": "fresh", "csrf": ""})),
        Canned::ok(json!([])),
    ]);
    let central = OdkCentral::new(Config::new(base_url));

    // Built before login; must still pick up the fresh token.
    let project = central.project();

    central.auth().login("admin@example.com", "secret").expect("login");
    project.get_all().expect("list projects");

    rx.recv().expect("login request");
    let listing = rx.recv().expect("listing request");
    assert!(listing.request_line().starts_with("GET /v1/projects"));
    assert!(listing.has_header("authorization: bearer fresh"));
    assert!(listing.has_header("x-extended-metadata: true"));
}

#[test]
fn unauthenticated_requests_carry_no_auth_header() {
    let (base_url, rx) = serve(vec![Canned::ok(json!([]))]);
    let central = OdkCentral::new(Config::new(base_url));

    central.project().get_all().expect("list projects");

    let request = rx.recv().expect("captured request");
    assert!(!request.has_header("authorization:"));
}

#[test]
fn get_by_name_scans_the_listing() {
    let listing = json!([
        {"id": 1, "name": "default"},
        {"id": 7, "name": "household survey"},
        {"id": 9, "name": "water points"}
    ]);
    let (base_url, _rx) = serve(vec![Canned::ok(listing)]);
    let central = OdkCentral::new(Config::new(base_url));

    let found = central
        .project()
        .get_by_name("household survey")
        .expect("lookup");
    assert_eq!(found["id"], json!(7));
}

#[test]
fn get_by_name_without_match_is_null() {
    let (base_url, _rx) = serve(vec![Canned::ok(json!([
        {"id": 1, "name": "default"}
    ]))]);
    let central = OdkCentral::new(Config::new(base_url));

    let found = central.project().get_by_name("missing").expect("lookup");
    assert!(found.is_null());
}

#[test]
fn get_by_name_surfaces_listing_error_body() {
    let (base_url, _rx) = serve(vec![Canned::with_status(
        401,
        json!({"code": "401.2", "message": "Could not authenticate with the provided credentials."}),
    )]);
    let central = OdkCentral::new(Config::new(base_url));

    let error = central
        .project()
        .get_by_name("default")
        .expect_err("listing error must surface");
    assert_eq!(error.code(), Some("401.2"));
    assert!(error.is_unauthorized());
}

#[test]
fn delete_substitutes_the_entity_id() {
    let (base_url, rx) = serve(vec![Canned::ok(json!({"success": true}))]);
    let central = OdkCentral::new(Config::new(base_url));

    central.project().delete("42").expect("delete");

    let request = rx.recv().expect("captured request");
    assert!(request.request_line().starts_with("DELETE /v1/projects/42"));
}

#[test]
fn user_assignment_substitutes_all_three_ids() {
    let (base_url, rx) = serve(vec![Canned::ok(json!({"success": true}))]);
    let central = OdkCentral::new(Config::new(base_url));

    central
        .project()
        .user_assignment("7", "2", "115")
        .expect("assignment");

    let request = rx.recv().expect("captured request");
    assert!(request
        .request_line()
        .starts_with("POST /v1/projects/7/assignments/2/115"));
}

#[test]
fn form_create_sends_raw_xml() {
    let (base_url, rx) = serve(vec![Canned::ok(json!({"xmlFormId": "hh"}))]);
    let central = OdkCentral::new(Config::new(base_url));

    let xml = "<h:html><h:head><h:title>hh</h:title></h:head></h:html>";
    central.form().create("7", xml).expect("form create");

    let request = rx.recv().expect("captured request");
    assert!(request
        .request_line()
        .starts_with("POST /v1/projects/7/forms?ignoreWarnings=false&publish=false"));
    assert!(request.has_header("content-type: application/xml"));
    assert_eq!(request.body, xml);
}

#[test]
fn form_details_derive_an_enketo_preview() {
    let (base_url, _rx) = serve(vec![Canned::ok(json!({
        "xmlFormId": "household_survey",
        "enketoId": "AbCdEf"
    }))]);
    let central = OdkCentral::new(Config::new(base_url.clone()));

    let response = central
        .form()
        .get_by_id("7", "household_survey")
        .expect("details");

    assert_eq!(
        response.body["enketoPreview"],
        json!(format!("{base_url}/-/preview/AbCdEf"))
    );
}

#[test]
fn check_accepts_only_the_authenticated_not_found_code() {
    let (base_url, _rx) = serve(vec![Canned::with_status(
        404,
        json!({"message": "Could not find the resource you were looking for.", "code": "404.1"}),
    )]);
    let central = OdkCentral::new(Config::new(base_url));
    assert!(central.auth().check());

    let (base_url, _rx) = serve(vec![Canned::with_status(
        404,
        json!({"message": "gone", "code": "404.2"}),
    )]);
    let central = OdkCentral::new(Config::new(base_url));
    assert!(!central.auth().check());

    // Not JSON at all
    let (base_url, _rx) = serve(vec![Canned::raw(404, "<html>not found</html>")]);
    let central = OdkCentral::new(Config::new(base_url));
    assert!(!central.auth().check());
}

#[test]
fn check_is_false_on_transport_failure() {
    // Bind then drop the listener so the port refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let central = OdkCentral::new(Config::new(base_url));
    assert!(!central.auth().check());
}

#[test]
fn https_basic_sends_credentials_per_request() {
    let (base_url, rx) = serve(vec![Canned::ok(json!([]))]);
    let central = OdkCentral::new(
        Config::new(base_url)
            .with_auth_type(AuthType::HttpsBasic)
            .with_basic_credentials("admin@example.com", "secret"),
    );

    central.user().get_all().expect("list users");

    let request = rx.recv().expect("captured request");
    assert!(request.has_header("authorization: basic "));
    assert!(!request.has_header("authorization: bearer"));
}

#[test]
fn app_user_token_is_sent_as_bearer() {
    let (base_url, rx) = serve(vec![Canned::ok(json!([]))]);
    let central = OdkCentral::new(
        Config::new(base_url)
            .with_auth_type(AuthType::AppUser)
            .with_token("pre-issued"),
    );

    central.project().get_all().expect("list projects");

    let request = rx.recv().expect("captured request");
    assert!(request.has_header("authorization: bearer pre-issued"));
}

#[test]
fn login_is_rejected_outside_session_auth() {
    let central = OdkCentral::new(
        Config::new("http://127.0.0.1:1")
            .with_auth_type(AuthType::AppUser)
            .with_token("pre-issued"),
    );

    let error = central
        .auth()
        .login("admin@example.com", "secret")
        .expect_err("app_user auth has no login flow");
    assert!(error.to_string().contains("session authentication"));
}

#[test]
fn non_json_body_decodes_to_null() {
    let (base_url, _rx) = serve(vec![Canned::raw(200, "not json")]);
    let central = OdkCentral::new(Config::new(base_url));

    let response = central.project().get_all().expect("request succeeds");
    assert_eq!(response.status, 200);
    assert!(response.body.is_null());
}
