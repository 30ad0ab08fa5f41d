use crate::dispatch::{find_by_field, ApiResponse, Body, Dispatcher};
use crate::endpoint::{form_endpoints, placeholder, Endpoint, Endpoints};
use crate::error::Result;
use crate::qr::{CollectSettings, ProvisionedQr};
use serde_json::{json, Value};

/// The Form handler.
///
/// Forms live under a project; every operation takes the owning project's id.
/// Form creation and draft submission send the raw XForm XML body, not JSON.
pub struct Form {
    endpoints: Endpoints,
    dispatcher: Dispatcher,
}

impl Form {
    pub(crate) fn new(base_url: &str, dispatcher: Dispatcher) -> Self {
        Form {
            endpoints: form_endpoints(base_url),
            dispatcher,
        }
    }

    /// Upload a new XForm to a project.
    ///
    /// The form is neither published nor warnings-ignored; Central assigns the
    /// form id from the XML's `formId` attribute.
    pub fn create(&self, project_id: &str, form_xml: &str) -> Result<ApiResponse> {
        self.dispatcher.send(
            self.endpoints.require("create"),
            &[(placeholder::PROJECT_ID, project_id)],
            Body::Xml(form_xml.to_string()),
        )
    }

    /// Submit a new draft revision of an already-created form
    pub fn draft(&self, project_id: &str, xml_form_id: &str, form_xml: &str) -> Result<ApiResponse> {
        self.dispatcher.send(
            self.endpoints.require("draft"),
            &[
                (placeholder::PROJECT_ID, project_id),
                (placeholder::XML_FORM_ID, xml_form_id),
            ],
            Body::Xml(form_xml.to_string()),
        )
    }

    /// List the forms of a project
    pub fn get_all(&self, project_id: &str) -> Result<ApiResponse> {
        self.dispatcher.send_extended(
            self.endpoints.require("all"),
            &[(placeholder::PROJECT_ID, project_id)],
        )
    }

    /// Get a form's details.
    ///
    /// When the response carries an `enketoId`, an `enketoPreview` URL is
    /// derived from it and inserted into the returned object.
    pub fn get_by_id(&self, project_id: &str, xml_form_id: &str) -> Result<ApiResponse> {
        let mut response = self.dispatcher.send(
            self.endpoints.require("details"),
            &[
                (placeholder::PROJECT_ID, project_id),
                (placeholder::XML_FORM_ID, xml_form_id),
            ],
            Body::None,
        )?;

        attach_enketo_preview(self.endpoints.require("enketo"), &mut response.body);

        Ok(response)
    }

    /// Find a form by its `name` field, scanning the project's listing client-side
    pub fn get_by_name(&self, project_id: &str, name: &str) -> Result<Value> {
        let response = self.get_all(project_id)?;
        find_by_field(&response, "name", &json!(name))
    }

    /// Build the provisioning QR code for a form draft.
    ///
    /// The payload points Collect at the draft testing endpoint using the
    /// `draftToken` Central issued for the draft. No request is made; this is
    /// a local transform.
    pub fn get_draft_qr_code(
        &self,
        project_id: &str,
        xml_form_id: &str,
        draft_token: &str,
    ) -> Result<ProvisionedQr> {
        let server_url = self.endpoints.require("draftServer").fill(&[
            (placeholder::TOKEN, draft_token),
            (placeholder::PROJECT_ID, project_id),
            (placeholder::XML_FORM_ID, xml_form_id),
        ]);

        let settings = CollectSettings::new()
            .with_server_url(server_url)
            .with_general("form_update_mode", json!("match_exactly"))
            .with_general("autosend", json!("wifi_and_cellular"))
            .with_project("name", json!(format!("[Draft] {xml_form_id}")));

        ProvisionedQr::from_settings(settings)
    }

    /// Build the provisioning QR code for an App-User.
    ///
    /// The payload points Collect at the project's key endpoint using the
    /// App-User's token, the same code Central's frontend displays.
    pub fn get_qr_code(
        &self,
        project_id: &str,
        app_user_token: &str,
        project_name: &str,
    ) -> Result<ProvisionedQr> {
        let server_url = self.endpoints.require("appUserServer").fill(&[
            (placeholder::TOKEN, app_user_token),
            (placeholder::PROJECT_ID, project_id),
        ]);

        let settings = CollectSettings::new()
            .with_server_url(server_url)
            .with_general("form_update_mode", json!("match_exactly"))
            .with_general("autosend", json!("wifi_and_cellular"))
            .with_project("name", json!(project_name));

        ProvisionedQr::from_settings(settings)
    }
}

/// Insert an `enketoPreview` URL into a form details body carrying an `enketoId`
fn attach_enketo_preview(enketo: &Endpoint, body: &mut Value) {
    let Some(enketo_id) = body.get("enketoId").and_then(Value::as_str) else {
        return;
    };
    let preview = enketo.fill(&[(placeholder::ENKETO_ID, enketo_id)]);
    if let Some(object) = body.as_object_mut() {
        object.insert("enketoPreview".to_string(), Value::String(preview));
    }
}
