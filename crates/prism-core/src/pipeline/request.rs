//! Request parsing.
//!
//! A pipeline request looks like:
//!
//! ```json
//! {
//!   "bucket_id": "photos",
//!   "object_id": "cat.jpg",
//!   "operations": [["rotate", {"rotation_angle": 90}], ["grayscale", {}]]
//! }
//! ```
//!
//! `bucketname` / `filename` are accepted in place of `bucket_id` /
//! `object_id`. Problems with individual operation entries are not request
//! errors; they surface later as skipped steps.

use serde_json::{Map, Value};

use crate::args::ArgMap;
use crate::error::{PipelineError, PipelineResult};

const BUCKET_FIELDS: &[&str] = &["bucket_id", "bucketname"];
const KEY_FIELDS: &[&str] = &["object_id", "filename"];
const OPERATIONS_FIELD: &str = "operations";

/// One entry of the operation list.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub name: String,
    /// `None` when the entry had no usable argument map
    pub args: Option<ArgMap>,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, args: ArgMap) -> Self {
        Self {
            name: name.into(),
            args: Some(args),
        }
    }

    /// Parse one `[name, arguments]` entry.
    ///
    /// Entries of any other shape are kept with whatever name can be read so
    /// they still occupy their position in the list.
    pub fn from_json(entry: &Value) -> Self {
        match entry {
            Value::Array(items) => Self {
                name: match items.first() {
                    Some(Value::String(name)) => name.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                },
                args: items.get(1).and_then(ArgMap::from_json),
            },
            Value::String(name) => Self {
                name: name.clone(),
                args: None,
            },
            other => Self {
                name: other.to_string(),
                args: None,
            },
        }
    }
}

/// A validated pipeline request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub bucket: String,
    pub key: String,
    pub operations: Vec<OperationSpec>,
}

impl PipelineRequest {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, operations: Vec<OperationSpec>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            operations,
        }
    }

    /// Validate the top-level fields of a JSON request.
    ///
    /// Every missing field is named in one error.
    pub fn from_json(value: &Value) -> PipelineResult<Self> {
        let object = as_object(value)?;

        let bucket = text_field(object, BUCKET_FIELDS);
        let key = text_field(object, KEY_FIELDS);
        let operations = object.get(OPERATIONS_FIELD).filter(|v| !v.is_null());

        let mut missing = Vec::new();
        if bucket.is_none() {
            missing.push(BUCKET_FIELDS[0]);
        }
        if key.is_none() {
            missing.push(KEY_FIELDS[0]);
        }
        if operations.is_none() {
            missing.push(OPERATIONS_FIELD);
        }
        let (Some(bucket), Some(key), Some(operations)) = (bucket, key, operations) else {
            return Err(missing_fields(&missing));
        };

        let operations = operations.as_array().ok_or_else(|| {
            PipelineError::InvalidRequest(
                "'operations' must be a list of [operation_name, arguments] pairs".into(),
            )
        })?;

        Ok(Self {
            bucket,
            key,
            operations: operations.iter().map(OperationSpec::from_json).collect(),
        })
    }
}

pub(crate) fn as_object(value: &Value) -> PipelineResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| PipelineError::InvalidRequest("Request must be a JSON object".into()))
}

/// First non-empty string (or number) among `names`.
pub(crate) fn text_field(object: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match object.get(*name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn missing_fields(names: &[&str]) -> PipelineError {
    PipelineError::InvalidRequest(format!("Missing request parameters: {}", names.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_request() {
        let request = PipelineRequest::from_json(&json!({
            "bucket_id": "photos",
            "object_id": "cat.jpg",
            "operations": [["rotate", {"rotation_angle": 90}], ["details", {}]]
        }))
        .unwrap();

        assert_eq!(request.bucket, "photos");
        assert_eq!(request.key, "cat.jpg");
        assert_eq!(request.operations.len(), 2);
        assert_eq!(request.operations[0].name, "rotate");
        assert_eq!(
            request.operations[0].args,
            Some(ArgMap::new().with("rotation_angle", 90))
        );
        assert_eq!(request.operations[1].args, Some(ArgMap::new()));
    }

    #[test]
    fn test_aliases_accepted() {
        let request = PipelineRequest::from_json(&json!({
            "bucketname": "photos",
            "filename": "cat.jpg",
            "operations": []
        }))
        .unwrap();
        assert_eq!(request.bucket, "photos");
        assert_eq!(request.key, "cat.jpg");
        assert!(request.operations.is_empty());
    }

    #[test]
    fn test_all_missing_fields_reported() {
        let err = PipelineRequest::from_json(&json!({})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing request parameters: bucket_id, object_id, operations"
        );

        let err = PipelineRequest::from_json(&json!({"bucket_id": "b", "operations": null}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing request parameters: object_id, operations");
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let err = PipelineRequest::from_json(&json!({
            "bucket_id": "",
            "object_id": "cat.jpg",
            "operations": []
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing request parameters: bucket_id");
    }

    #[test]
    fn test_operations_must_be_a_list() {
        let err = PipelineRequest::from_json(&json!({
            "bucket_id": "b",
            "object_id": "k",
            "operations": {"rotate": 90}
        }))
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[test]
    fn test_non_object_request() {
        assert!(PipelineRequest::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_malformed_entries_keep_their_position() {
        let request = PipelineRequest::from_json(&json!({
            "bucket_id": "b",
            "object_id": "k",
            "operations": [["rotate"], ["resize", "100x100"], "grayscale", 42, []]
        }))
        .unwrap();
        let specs = &request.operations;
        assert_eq!(specs.len(), 5);
        assert_eq!((specs[0].name.as_str(), specs[0].args.is_none()), ("rotate", true));
        assert_eq!((specs[1].name.as_str(), specs[1].args.is_none()), ("resize", true));
        assert_eq!((specs[2].name.as_str(), specs[2].args.is_none()), ("grayscale", true));
        assert_eq!(specs[3].name, "42");
        assert_eq!(specs[4].name, "");
    }
}
