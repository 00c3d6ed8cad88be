use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::api::ApiError;
use crate::model::{PendingFile, Resource};

pub const DEFAULT_SUCCESS_MSG: &str = "Data updated successfully";
pub const DEFAULT_CONFLICT_MSG: &str = "Duplicate Entry";
pub const SUCCESS_CODE: i64 = 200;

/// Pull `{ <kind>: [..] }` out of a collection response. A missing or null
/// key is an empty collection; order is preserved as sent.
pub fn extract_collection<R: Resource>(mut body: Value) -> Result<Vec<R>, ApiError> {
    let key = R::KIND.envelope_key();
    let items = match body.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(items) => items,
    };
    serde_json::from_value(items)
        .map_err(|e| ApiError::InvalidResponse(format!("bad {key} collection: {e}")))
}

/// Pull `{ <kind>: {..} }` out of a single-record response.
pub fn extract_record<R: Resource>(mut body: Value) -> Result<R, ApiError> {
    let key = R::KIND.envelope_key();
    let record = match body.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => {
            return Err(ApiError::InvalidResponse(format!("response has no '{key}' record")))
        }
        Some(record) => record,
    };
    serde_json::from_value(record)
        .map_err(|e| ApiError::InvalidResponse(format!("bad {key} record: {e}")))
}

/// One part of a multipart update body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: PendingFile },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Transport-neutral multipart body, converted to a real form by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateForm {
    parts: Vec<FormPart>,
}

impl UpdateForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every editable text field plus the selected file, if any. Without a
    /// file the image field is left out so the server keeps the old image.
    pub fn from_record<R: Resource>(record: &R, file: Option<&PendingFile>) -> Self {
        let mut form = Self::new();
        for (name, value) in record.text_fields() {
            form.push_text(name, value);
        }
        if let Some(file) = file {
            form.push_file(R::KIND.image_field(), file.clone());
        }
        form
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: PendingFile) {
        self.parts.push(FormPart::File {
            name: name.into(),
            file,
        });
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name() == name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn file(&self, name: &str) -> Option<&PendingFile> {
        self.parts.iter().find_map(|p| match p {
            FormPart::File { name: n, file } if n == name => Some(file),
            _ => None,
        })
    }

    pub fn into_multipart(self) -> Result<reqwest::multipart::Form, ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File { name, file } => {
                    let part = reqwest::multipart::Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(&file.content_type)
                        .map_err(|e| ApiError::Multipart(e.to_string()))?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

/// Raw `{ code, msg }` body returned by update endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UpdateReply {
    #[serde(deserialize_with = "lenient_code")]
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Accepts `200` as well as `"200"`.
fn lenient_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(code) => Ok(code),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("non-numeric code '{text}'"))),
    }
}

/// What a submission turned into, decoded explicitly from the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success(String),
    BusinessConflict(String),
    TransportFailure(ApiError),
}

impl SubmitOutcome {
    pub fn from_reply(reply: UpdateReply) -> Self {
        let msg = reply.msg.filter(|m| !m.trim().is_empty());
        if reply.code == SUCCESS_CODE {
            SubmitOutcome::Success(msg.unwrap_or_else(|| DEFAULT_SUCCESS_MSG.to_string()))
        } else {
            SubmitOutcome::BusinessConflict(msg.unwrap_or_else(|| DEFAULT_CONFLICT_MSG.to_string()))
        }
    }

    pub fn from_result(result: Result<UpdateReply, ApiError>) -> Self {
        match result {
            Ok(reply) => Self::from_reply(reply),
            Err(err) => SubmitOutcome::TransportFailure(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Success(_))
    }
}
