//! Contact form submission.
//!
//! A submit is a single attempt: the button is disabled while the request is
//! in flight and the outcome is mapped to one status message.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub const SUCCESS_MESSAGE: &str = "Vielen Dank! Ihre Nachricht wurde erfolgreich versendet.";
pub const FAILURE_MESSAGE: &str = "Hoppla! Da ist etwas schiefgelaufen.";
pub const NETWORK_MESSAGE: &str = "Hoppla! Da ist ein Netzwerkfehler aufgetreten.";

pub const SUBMIT_LABEL: &str = "Jetzt Senden";
pub const SENDING_LABEL: &str = "Wird gesendet...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormResponse {
    pub status: u16,
    pub body: String,
}

impl FormResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("request to the form endpoint failed: {0}")]
pub struct TransportError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Sent,
    Rejected(Vec<String>), // Endpoint listed what was wrong
    Failed,                // Endpoint refused without details
    NetworkError,
}

impl FormOutcome {
    pub fn from_result(result: Result<FormResponse, TransportError>) -> Self {
        match result {
            Ok(response) => Self::from_response(&response),
            Err(err) => {
                warn!(error = %err, "contact form submission failed");
                FormOutcome::NetworkError
            }
        }
    }

    /// Non-success bodies are expected to be JSON like `{"errors":[{"message":"..."}]}`.
    /// A body that is not JSON at all counts as a network failure.
    pub fn from_response(response: &FormResponse) -> Self {
        if response.is_success() {
            return FormOutcome::Sent;
        }
        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(err) => {
                warn!(status = response.status, error = %err, "unreadable error body from form endpoint");
                return FormOutcome::NetworkError;
            }
        };
        let messages: Vec<String> = body
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|error| error.get("message").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if messages.is_empty() {
            FormOutcome::Failed
        } else {
            FormOutcome::Rejected(messages)
        }
    }

    pub fn message(&self) -> String {
        match self {
            FormOutcome::Sent => SUCCESS_MESSAGE.to_string(),
            FormOutcome::Rejected(messages) => messages.join(", "),
            FormOutcome::Failed => FAILURE_MESSAGE.to_string(),
            FormOutcome::NetworkError => NETWORK_MESSAGE.to_string(),
        }
    }

    pub fn class(&self) -> StatusClass {
        match self {
            FormOutcome::Sent => StatusClass::Success,
            _ => StatusClass::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Error,
}

impl StatusClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::Success => "success",
            StatusClass::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStatus {
    pub text: String,
    pub class: StatusClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitButton {
    pub label: &'static str,
    pub disabled: bool,
}

impl Default for SubmitButton {
    fn default() -> Self {
        Self { label: SUBMIT_LABEL, disabled: false }
    }
}

pub type Fields = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct ContactForm {
    endpoint: String,
    fields: Fields,
    button: SubmitButton,
    status: Option<FormStatus>,
}

impl ContactForm {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            fields: Fields::new(),
            button: SubmitButton::default(),
            status: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn button(&self) -> SubmitButton {
        self.button
    }

    /// The status block, once a submission has finished.
    pub fn status(&self) -> Option<&FormStatus> {
        self.status.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.button.disabled
    }

    /// Disables the button. Returns None if a submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<Fields> {
        if self.button.disabled {
            return None;
        }
        self.button = SubmitButton { label: SENDING_LABEL, disabled: true };
        Some(self.fields.clone())
    }

    pub fn finish(&mut self, result: Result<FormResponse, TransportError>) -> FormOutcome {
        let outcome = FormOutcome::from_result(result);
        if outcome == FormOutcome::Sent {
            self.fields.clear();
        }
        self.status = Some(FormStatus { text: outcome.message(), class: outcome.class() });
        self.button = SubmitButton::default();
        info!(outcome = ?outcome, "contact form submitted");
        outcome
    }

    /// Posts the fields once through `send`. None if a submission is already in flight.
    pub fn submit<F>(&mut self, send: F) -> Option<FormOutcome>
    where
        F: FnOnce(&str, &Fields) -> Result<FormResponse, TransportError>,
    {
        let fields = self.begin_submit()?;
        let result = send(&self.endpoint, &fields);
        Some(self.finish(result))
    }
}
