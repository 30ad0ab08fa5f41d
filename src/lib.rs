//! # odk-central - ODK Central API client for Rust
//!
//! A blocking client for the [ODK Central](https://docs.getodk.org/central-intro/)
//! v1 REST API: session management and CRUD handlers over projects, forms,
//! users, and app-users, plus QR-code provisioning for ODK Collect.
//!
//! Every handler dispatches the same way: a named URL template with
//! `%TOKEN%`-style placeholders is resolved against a per-call parameter map,
//! the session's bearer token is attached, and the JSON response is returned
//! verbatim as a [`serde_json::Value`].
//!
//! ## Basic Usage
//!
//! ```no_run
//! use odk_central::{Config, OdkCentral};
//!
//! fn main() -> odk_central::Result<()> {
//!     let central = OdkCentral::new(Config::new("https://central.example.com"));
//!
//!     central.auth().login("admin@example.com", "secret")?;
//!     assert!(central.auth().is_authenticated());
//!
//!     let projects = central.project().get_all()?;
//!     println!("projects: {}", projects.body);
//!
//!     central.auth().logout()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Authentication modes
//!
//! `session` is the full log-in/log-out flow above. The other two modes carry
//! their credential on every request and have no session lifecycle:
//!
//! ```no_run
//! use odk_central::{AuthType, Config, OdkCentral};
//!
//! // Transport-level basic auth
//! let central = OdkCentral::new(
//!     Config::new("https://central.example.com")
//!         .with_auth_type(AuthType::HttpsBasic)
//!         .with_basic_credentials("admin@example.com", "secret"),
//! );
//!
//! // Pre-issued app-user token
//! let central = OdkCentral::new(
//!     Config::new("https://central.example.com")
//!         .with_auth_type(AuthType::AppUser)
//!         .with_token("token-from-central"),
//! );
//! ```
//!
//! ## Collect provisioning QR codes
//!
//! ```no_run
//! use odk_central::{Config, OdkCentral};
//!
//! # fn main() -> odk_central::Result<()> {
//! let central = OdkCentral::new(Config::new("https://central.example.com"));
//! let qr = central.form().get_qr_code("7", "app-user-token", "household survey")?;
//! std::fs::write("provision.png", qr.png()?)?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod form;
pub mod project;
pub mod qr;
pub mod session;
pub mod user;

// Re-export main types for convenience
pub use auth::Authentication;
pub use client::{AuthType, Config, OdkCentral};
pub use dispatch::{ApiResponse, Body, Dispatcher};
pub use endpoint::{placeholder, Endpoint, Endpoints, Method};
pub use error::{OdkError, Result};
pub use form::Form;
pub use project::Project;
pub use qr::{decode_settings, encode_settings, read_qr, CollectSettings, ProvisionedQr};
pub use session::{Session, SharedSession};
pub use user::User;

// Re-export serde_json for convenience
pub use serde_json::json;
