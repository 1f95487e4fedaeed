//! Positional schemas: the field order and sentinel contract of one
//! flattened record shape.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Field order shared by parent and child blocks.
pub const PARENT_FIELDS: [&str; 13] = [
    "title",
    "sub_title",
    "part_no",
    "part_name",
    "order_no",
    "form",
    "level",
    "vol_no_245",
    "vol_no_490",
    "vol_no_773",
    "vol_no_830",
    "ac_no",
    "id",
];

pub const PARENT_SENTINELS: [&str; 13] = [
    "NoTitle",
    "NoRemainder",
    "NoPartNo",
    "NoPartName",
    "NoOrderNo",
    "NoForm",
    "NoLevel",
    "NoVolNo245",
    "NoVolNo490",
    "NoVolNo773",
    "NoVolNo830",
    "NoAc",
    "NoId",
];

/// Positions appended to the parent layout in child blocks.
pub const CHILD_EXTRA_FIELDS: [&str; 5] = ["edition", "publish_date", "publisher", "place", "format"];

pub const CHILD_EXTRA_SENTINELS: [&str; 5] = [
    "NoEdition",
    "NoPublishDate",
    "NoPublisher",
    "NoPlace",
    "NoFormat",
];

pub const RELATION_FIELDS: [&str; 7] = [
    "relation_label",
    "title",
    "sub_title",
    "part_no",
    "vol_no",
    "ac_no",
    "id",
];

pub const RELATION_SENTINELS: [&str; 7] = [
    "NoLabel",
    "NoTitle",
    "NoRemainder",
    "NoPartNo",
    "NoVolNo",
    "NoAc",
    "NoId",
];

/// Serialized form of a schema, validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionalSchemaDef {
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub sentinels: Vec<String>,
}

/// Layout of one record shape packed into a flat multi-value index field.
///
/// The stride is the number of field names. Position `i` of every block
/// holds the value of `fields[i]`; any value in the sentinel set means the
/// field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PositionalSchemaDef", into = "PositionalSchemaDef")]
pub struct PositionalSchema {
    name: String,
    fields: Arc<[String]>,
    sentinels: HashSet<String>,
}

impl PositionalSchema {
    /// Creates a schema, rejecting empty or duplicate field lists.
    pub fn new<F, S>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = F>,
        sentinels: impl IntoIterator<Item = S>,
    ) -> DomainResult<Self>
    where
        F: Into<String>,
        S: Into<String>,
    {
        let name = name.into();
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();

        if fields.is_empty() {
            return Err(DomainError::InvalidSchema {
                name,
                message: "schema must name at least one field".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.is_empty() || !seen.insert(field.as_str()) {
                return Err(DomainError::InvalidSchema {
                    name,
                    message: format!("field name '{field}' is empty or repeated"),
                });
            }
        }

        Ok(Self {
            name,
            fields: fields.into(),
            sentinels: sentinels.into_iter().map(Into::into).collect(),
        })
    }

    /// Parent-of relation blocks (stride 13).
    pub fn parent() -> Self {
        Self::builtin("parent", PARENT_FIELDS, PARENT_SENTINELS)
    }

    /// Child-of relation blocks (stride 18).
    pub fn child() -> Self {
        Self::builtin(
            "child",
            PARENT_FIELDS.into_iter().chain(CHILD_EXTRA_FIELDS),
            PARENT_SENTINELS.into_iter().chain(CHILD_EXTRA_SENTINELS),
        )
    }

    /// Generic named relation blocks (stride 7).
    pub fn relation() -> Self {
        Self::builtin("relation", RELATION_FIELDS, RELATION_SENTINELS)
    }

    fn builtin(
        name: &str,
        fields: impl IntoIterator<Item = &'static str>,
        sentinels: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        Self {
            name: name.to_string(),
            fields: fields.into_iter().map(str::to_string).collect::<Vec<_>>().into(),
            sentinels: sentinels.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of flat values that make up one block.
    pub fn stride(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub(crate) fn shared_fields(&self) -> Arc<[String]> {
        Arc::clone(&self.fields)
    }

    pub fn is_sentinel(&self, value: &str) -> bool {
        self.sentinels.contains(value)
    }

    /// Maps a raw value to its decoded form: sentinels and empty strings
    /// become `None`.
    pub(crate) fn normalize(&self, value: &str) -> Option<String> {
        if value.is_empty() || self.is_sentinel(value) {
            None
        } else {
            Some(value.to_string())
        }
    }
}

impl TryFrom<PositionalSchemaDef> for PositionalSchema {
    type Error = DomainError;

    fn try_from(def: PositionalSchemaDef) -> Result<Self, Self::Error> {
        PositionalSchema::new(def.name, def.fields, def.sentinels)
    }
}

impl From<PositionalSchema> for PositionalSchemaDef {
    fn from(schema: PositionalSchema) -> Self {
        let mut sentinels: Vec<String> = schema.sentinels.into_iter().collect();
        sentinels.sort();
        Self {
            name: schema.name,
            fields: schema.fields.to_vec(),
            sentinels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_strides() {
        assert_eq!(PositionalSchema::parent().stride(), 13);
        assert_eq!(PositionalSchema::child().stride(), 18);
        assert_eq!(PositionalSchema::relation().stride(), 7);
    }

    #[test]
    fn test_empty_schema_is_rejected() {
        let result = PositionalSchema::new("empty", Vec::<String>::new(), Vec::<String>::new());
        assert!(matches!(result, Err(DomainError::InvalidSchema { .. })));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let result = PositionalSchema::new("dup", ["title", "title"], ["NoTitle"]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_schema_deserializes_with_validation() {
        let schema: PositionalSchema = serde_json::from_str(
            r#"{"name":"series","fields":["title","id"],"sentinels":["NoTitle","NoId"]}"#,
        )
        .unwrap();
        assert_eq!(schema.stride(), 2);
        assert!(schema.is_sentinel("NoId"));

        let invalid = serde_json::from_str::<PositionalSchema>(r#"{"name":"bad","fields":[]}"#);
        assert!(invalid.is_err());
    }

    #[test]
    fn test_normalize_treats_empty_and_sentinels_as_absent() {
        let schema = PositionalSchema::parent();

        assert_eq!(schema.normalize(""), None);
        assert_eq!(schema.normalize("NoTitle"), None);
        assert_eq!(schema.normalize(" "), Some(" ".to_string()));
        assert_eq!(schema.normalize("Host title"), Some("Host title".to_string()));
    }
}
