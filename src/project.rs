use crate::dispatch::{find_by_field, ApiResponse, Body, Dispatcher};
use crate::endpoint::{placeholder, project_endpoints, Endpoints};
use crate::error::Result;
use serde_json::{json, Value};

/// The Project handler.
///
/// CRUD over `/v1/projects` plus role assignments and per-project app-users.
/// All operations return the server's decoded JSON verbatim.
pub struct Project {
    endpoints: Endpoints,
    dispatcher: Dispatcher,
}

impl Project {
    pub(crate) fn new(base_url: &str, dispatcher: Dispatcher) -> Self {
        Project {
            endpoints: project_endpoints(base_url),
            dispatcher,
        }
    }

    /// Request a new Project creation at the Central server
    pub fn create(&self, name: &str) -> Result<ApiResponse> {
        self.dispatcher.send(
            self.endpoints.require("create"),
            &[],
            Body::Json(json!({ "name": name })),
        )
    }

    /// Request deletion of the Project with the given id
    pub fn delete(&self, project_id: &str) -> Result<ApiResponse> {
        self.dispatcher.send(
            self.endpoints.require("delete"),
            &[(placeholder::PROJECT_ID, project_id)],
            Body::None,
        )
    }

    /// List every Project the authenticated user has access to
    pub fn get_all(&self) -> Result<ApiResponse> {
        self.dispatcher.send_extended(self.endpoints.require("all"), &[])
    }

    /// Find a Project by its `name` field.
    ///
    /// Central has no server-side filter for this, so the listing is scanned
    /// client-side; `Value::Null` when nothing matches.
    pub fn get_by_name(&self, name: &str) -> Result<Value> {
        let response = self.get_all()?;
        find_by_field(&response, "name", &json!(name))
    }

    /// Find a Project by its numeric `id` field, scanning like [`Project::get_by_name`]
    pub fn get_by_id(&self, project_id: i64) -> Result<Value> {
        let response = self.get_all()?;
        find_by_field(&response, "id", &json!(project_id))
    }

    /// Assign an actor to a project role
    pub fn user_assignment(
        &self,
        project_id: &str,
        role_id: &str,
        actor_id: &str,
    ) -> Result<ApiResponse> {
        self.dispatcher.send(
            self.endpoints.require("assignment"),
            &[
                (placeholder::PROJECT_ID, project_id),
                (placeholder::ROLE_ID, role_id),
                (placeholder::ACTOR_ID, actor_id),
            ],
            Body::None,
        )
    }

    /// List the App-Users of a project
    pub fn get_app_users(&self, project_id: &str) -> Result<ApiResponse> {
        self.dispatcher.send_extended(
            self.endpoints.require("appUsers"),
            &[(placeholder::PROJECT_ID, project_id)],
        )
    }

    /// Find a project App-User by display name, scanning the listing client-side
    pub fn get_app_user_by_name(&self, project_id: &str, name: &str) -> Result<Value> {
        let response = self.get_app_users(project_id)?;
        find_by_field(&response, "displayName", &json!(name))
    }
}
