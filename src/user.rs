use crate::dispatch::{find_by_field, ApiResponse, Body, Dispatcher};
use crate::endpoint::{placeholder, user_endpoints, Endpoints};
use crate::error::Result;
use serde_json::{json, Value};

/// The User handler: CRUD over `/v1/users` (standard web accounts, not
/// App-Users).
pub struct User {
    endpoints: Endpoints,
    dispatcher: Dispatcher,
}

impl User {
    pub(crate) fn new(base_url: &str, dispatcher: Dispatcher) -> Self {
        User {
            endpoints: user_endpoints(base_url),
            dispatcher,
        }
    }

    /// Request a new User creation at the Central server.
    ///
    /// The payload carries at least `email`, optionally `password`; it is
    /// forwarded as the JSON body unchanged.
    pub fn create(&self, payload: Value) -> Result<ApiResponse> {
        self.dispatcher
            .send(self.endpoints.require("create"), &[], Body::Json(payload))
    }

    /// Request deletion of the User with the given id
    pub fn delete(&self, user_id: &str) -> Result<ApiResponse> {
        self.dispatcher.send(
            self.endpoints.require("delete"),
            &[(placeholder::USER_ID, user_id)],
            Body::None,
        )
    }

    /// List every User on the server
    pub fn get_all(&self) -> Result<ApiResponse> {
        self.dispatcher.send_extended(self.endpoints.require("all"), &[])
    }

    /// Find a User by display name, scanning the listing client-side
    pub fn get_by_name(&self, name: &str) -> Result<Value> {
        let response = self.get_all()?;
        find_by_field(&response, "displayName", &json!(name))
    }

    /// Find a User by numeric actor id, scanning the listing client-side
    pub fn get_by_id(&self, user_id: i64) -> Result<Value> {
        let response = self.get_all()?;
        find_by_field(&response, "id", &json!(user_id))
    }
}
