//! Airtable list-records response types

use serde::Deserialize;
use serde_json::{Map, Value};

/// `GET /v0/{base}/{table}` response page.
///
/// See: https://airtable.com/developers/web/api/list-records
#[derive(Debug, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<Record>,

    /// Present while more records remain
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Record {
    pub id: String,

    /// Empty cells are omitted by the API
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Non-empty string value of `field`.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// `{"error": {"type": "...", "message": "..."}}`, or a bare string type.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detailed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        message: Option<String>,
    },
    Code(String),
}

impl ErrorBody {
    pub fn describe(&self) -> String {
        match self {
            ErrorBody::Detailed {
                kind,
                message: Some(message),
            } => format!("{}: {}", kind, message),
            ErrorBody::Detailed { kind, message: None } => kind.clone(),
            ErrorBody::Code(code) => code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_text_skips_blank() {
        let page: ListRecordsResponse = serde_json::from_str(
            r#"{"records":[
                {"id":"rec1","createdTime":"2020-01-01T00:00:00.000Z","fields":{"Spotify ID":"t1","Year":1999}},
                {"id":"rec2","fields":{"Spotify ID":"  "}},
                {"id":"rec3","fields":{}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(page.records[0].text("Spotify ID"), Some("t1"));
        assert_eq!(page.records[1].text("Spotify ID"), None);
        assert_eq!(page.records[2].text("Spotify ID"), None);
        assert!(page.offset.is_none());
    }

    #[test]
    fn test_error_shapes() {
        let detailed: ErrorEnvelope = serde_json::from_str(
            r#"{"error":{"type":"INVALID_FILTER_BY_FORMULA","message":"bad formula"}}"#,
        )
        .unwrap();
        assert_eq!(
            detailed.error.describe(),
            "INVALID_FILTER_BY_FORMULA: bad formula"
        );

        let code: ErrorEnvelope = serde_json::from_str(r#"{"error":"NOT_FOUND"}"#).unwrap();
        assert_eq!(code.error.describe(), "NOT_FOUND");
    }
}
