// packages/engine/src/recording/metadata_filter.rs
//! Metadata filter grammar used by recording lookups
//!
//! A filter maps metadata fields to matchers:
//!
//! | Matcher            | JSON form                         | Matches when                 |
//! |--------------------|-----------------------------------|------------------------------|
//! | `Equals(v)`        | `v` or `{"$eq": v}`               | recorded value == `v`        |
//! | `OneOf([..])`      | `[..]` or `{"$in": [..]}`         | recorded value is in the set |
//! | `Not(m)`           | `{"$not": m}`                     | `m` does not match           |
//! |                    | `{"$ne": v}` / `{"$nin": [..]}`   | shorthand for `Not(..)`      |
//!
//! A field missing from the recording is matched as `null`, so
//! `OneOf([false, null])` accepts both `false` and "never set".

use crate::recording::contract::Metadata;
use crate::utils::errors::{PlaybackError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Matcher applied to a single metadata field
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataMatcher {
    Equals(Value),
    OneOf(Vec<Value>),
    Not(Box<MetadataMatcher>),
}

impl MetadataMatcher {
    /// Whether `recorded` (`None` when the field is absent) satisfies the matcher
    pub fn matches(&self, recorded: Option<&Value>) -> bool {
        let recorded = recorded.unwrap_or(&Value::Null);
        match self {
            MetadataMatcher::Equals(expected) => expected == recorded,
            MetadataMatcher::OneOf(candidates) => candidates.iter().any(|c| c == recorded),
            MetadataMatcher::Not(inner) => !inner.matches(Some(recorded)),
        }
    }

    /// Parse the JSON form of a matcher
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(candidates) => Ok(MetadataMatcher::OneOf(candidates.clone())),
            Value::Object(fields) if fields.len() == 1 => {
                let Some((operator, operand)) = fields.iter().next() else {
                    return Ok(MetadataMatcher::Equals(value.clone()));
                };
                match operator.as_str() {
                    "$eq" => Ok(MetadataMatcher::Equals(operand.clone())),
                    "$in" => Ok(MetadataMatcher::OneOf(Self::operand_list(operator, operand)?)),
                    "$not" => Ok(MetadataMatcher::Not(Box::new(Self::from_json(operand)?))),
                    "$ne" => Ok(MetadataMatcher::Not(Box::new(MetadataMatcher::Equals(
                        operand.clone(),
                    )))),
                    "$nin" => Ok(MetadataMatcher::Not(Box::new(MetadataMatcher::OneOf(
                        Self::operand_list(operator, operand)?,
                    )))),
                    op if op.starts_with('$') => Err(PlaybackError::Storage(format!(
                        "Unknown metadata filter operator '{}'",
                        op
                    ))),
                    _ => Ok(MetadataMatcher::Equals(value.clone())),
                }
            }
            other => Ok(MetadataMatcher::Equals(other.clone())),
        }
    }

    fn operand_list(operator: &str, operand: &Value) -> Result<Vec<Value>> {
        operand.as_array().cloned().ok_or_else(|| {
            PlaybackError::Storage(format!("Operator '{}' expects a list operand", operator))
        })
    }
}

/// Field → matcher map; every field must match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    fields: BTreeMap<String, MetadataMatcher>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the matcher for `field`
    pub fn with(mut self, field: impl Into<String>, matcher: MetadataMatcher) -> Self {
        self.insert(field, matcher);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, matcher: MetadataMatcher) {
        self.fields.insert(field.into(), matcher);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&MetadataMatcher> {
        self.fields.get(field)
    }

    /// Parse a JSON object of field → matcher expressions
    pub fn from_json(value: &Value) -> Result<Self> {
        let fields = value.as_object().ok_or_else(|| {
            PlaybackError::Storage("Metadata filter must be a JSON object".to_string())
        })?;

        let mut filter = Self::new();
        for (field, expression) in fields {
            filter.insert(field.clone(), MetadataMatcher::from_json(expression)?);
        }
        Ok(filter)
    }

    /// Whether `metadata` satisfies every field matcher
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match_against_recorded_metadata(self, metadata)
    }
}

/// Match a filter against a recording's metadata
///
/// Every storage backend filters through this function so lookups behave the
/// same regardless of where recordings live.
pub fn match_against_recorded_metadata(filter: &MetadataFilter, metadata: &Metadata) -> bool {
    filter
        .fields
        .iter()
        .all(|(field, matcher)| matcher.matches(metadata.get(field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_equals() {
        let filter = MetadataFilter::new().with("user", MetadataMatcher::Equals(json!("alice")));
        assert!(filter.matches(&metadata(json!({"user": "alice", "other": 1}))));
        assert!(!filter.matches(&metadata(json!({"user": "bob"}))));
        assert!(!filter.matches(&metadata(json!({}))));
    }

    #[test]
    fn test_one_of_treats_absent_as_null() {
        let filter = MetadataFilter::new().with(
            "incomplete",
            MetadataMatcher::OneOf(vec![json!(false), Value::Null]),
        );
        assert!(filter.matches(&metadata(json!({"incomplete": false}))));
        assert!(filter.matches(&metadata(json!({}))));
        assert!(!filter.matches(&metadata(json!({"incomplete": true}))));
    }

    #[test]
    fn test_not() {
        let filter = MetadataFilter::new().with(
            "region",
            MetadataMatcher::Not(Box::new(MetadataMatcher::Equals(json!("eu")))),
        );
        assert!(filter.matches(&metadata(json!({"region": "us"}))));
        assert!(filter.matches(&metadata(json!({}))));
        assert!(!filter.matches(&metadata(json!({"region": "eu"}))));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(MetadataFilter::new().matches(&metadata(json!({"a": 1}))));
    }

    #[test]
    fn test_parse_json_grammar() {
        let filter = MetadataFilter::from_json(&json!({
            "user": "alice",
            "tier": ["gold", "silver"],
            "region": {"$ne": "eu"},
            "plan": {"$nin": ["free"]},
            "flag": {"$eq": true},
            "kind": {"$not": {"$in": ["a", "b"]}},
            "nested": {"x": 1},
        }))
        .unwrap();

        assert_eq!(filter.get("user"), Some(&MetadataMatcher::Equals(json!("alice"))));
        assert_eq!(
            filter.get("tier"),
            Some(&MetadataMatcher::OneOf(vec![json!("gold"), json!("silver")]))
        );
        assert_eq!(
            filter.get("nested"),
            Some(&MetadataMatcher::Equals(json!({"x": 1})))
        );

        assert!(filter.matches(&metadata(json!({
            "user": "alice",
            "tier": "gold",
            "region": "us",
            "plan": "pro",
            "flag": true,
            "kind": "c",
            "nested": {"x": 1},
        }))));
        assert!(!filter.matches(&metadata(json!({
            "user": "alice",
            "tier": "gold",
            "region": "us",
            "plan": "free",
            "flag": true,
            "kind": "c",
            "nested": {"x": 1},
        }))));
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        assert!(MetadataFilter::from_json(&json!({"a": {"$gt": 1}})).is_err());
        assert!(MetadataFilter::from_json(&json!({"a": {"$in": 1}})).is_err());
        assert!(MetadataFilter::from_json(&json!([1, 2])).is_err());
    }
}
