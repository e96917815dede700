use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, ErrorKind};

/// Body of `POST /class/join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(rename = "classCode")]
    pub class_code: String,
}

impl JoinRequest {
    pub fn new(class_code: impl Into<String>) -> Self {
        Self {
            class_code: class_code.into(),
        }
    }
}

/// The `status` field of a join response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JoinStatus {
    Success,
    Error,
    /// Anything the server sends that is neither `"success"` nor `"error"`.
    Other(String),
}

impl JoinStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JoinStatus::Success => "success",
            JoinStatus::Error => "error",
            JoinStatus::Other(s) => s,
        }
    }
}

impl From<String> for JoinStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => JoinStatus::Success,
            "error" => JoinStatus::Error,
            _ => JoinStatus::Other(s),
        }
    }
}

impl From<&str> for JoinStatus {
    fn from(s: &str) -> Self {
        JoinStatus::from(s.to_string())
    }
}

impl From<JoinStatus> for String {
    fn from(status: JoinStatus) -> Self {
        match status {
            JoinStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for JoinStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed reply from the join endpoint.
///
/// The whole JSON object is kept: on success it is the new token record.
/// A missing or non-string `status` parses as `Other("")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct JoinResponse {
    status: JoinStatus,
    payload: Map<String, Value>,
}

impl JoinResponse {
    pub fn status(&self) -> &JoinStatus {
        &self.status
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }
}

impl From<Map<String, Value>> for JoinResponse {
    fn from(payload: Map<String, Value>) -> Self {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .map(JoinStatus::from)
            .unwrap_or_else(|| JoinStatus::Other(String::new()));
        Self { status, payload }
    }
}

impl From<JoinResponse> for Map<String, Value> {
    fn from(response: JoinResponse) -> Self {
        response.payload
    }
}

/// The cached `accessTokenResponse` record shared with the rest of the app.
///
/// Equality is over the full payload, so a record published from a join
/// response compares equal to that response's JSON.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct TokenRecord {
    access_token: String,
    fields: Map<String, Value>,
}

impl TokenRecord {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

// Never print the token itself.
impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"<redacted>")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TryFrom<Map<String, Value>> for TokenRecord {
    type Error = Error;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let access_token = fields
            .get("accessToken")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ErrorKind::MalformedTokenRecord("missing string field `accessToken`".to_string())
            })?
            .to_string();
        Ok(Self {
            access_token,
            fields,
        })
    }
}

impl TryFrom<&JoinResponse> for TokenRecord {
    type Error = Error;

    fn try_from(response: &JoinResponse) -> Result<Self, Self::Error> {
        TokenRecord::try_from(response.payload.clone())
    }
}

impl From<TokenRecord> for Map<String, Value> {
    fn from(record: TokenRecord) -> Self {
        record.fields
    }
}
