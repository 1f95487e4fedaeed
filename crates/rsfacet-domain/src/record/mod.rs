//! Related record resolution for search documents.
//!
//! Parent, child and relation records arrive as flat positional index
//! fields and are decoded with [`crate::decoder`]. When a document has no
//! parent field at all, parents are read from the bibliographic record
//! (MARC 773, 830 and 490) instead.

mod marc;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::decoder::{decode, ChildRecord, ParentRecord, PositionalSchema, RelatedRecord};

pub use marc::{InMemoryMarcRecord, MarcDataField, MarcRecord};

/// A flattened search-index document: field name to values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexDocument {
    fields: HashMap<String, Vec<String>>,
}

impl IndexDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<V: Into<String>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.fields
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Values of a field; empty if the field is absent.
    pub fn values(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Index field names holding the positional blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFieldNames {
    pub parent: String,
    pub child: String,
    pub relation: String,
}

impl Default for RecordFieldNames {
    fn default() -> Self {
        Self {
            parent: "parent_multi_str_mv".to_string(),
            child: "child_multi_str_mv".to_string(),
            relation: "relation_multi_str_mv".to_string(),
        }
    }
}

/// Reads parent, child and relation records from search documents.
#[derive(Debug, Clone)]
pub struct RelatedRecordResolver {
    field_names: RecordFieldNames,
    parent_schema: PositionalSchema,
    child_schema: PositionalSchema,
    relation_schema: PositionalSchema,
}

impl Default for RelatedRecordResolver {
    fn default() -> Self {
        Self::new(
            RecordFieldNames::default(),
            PositionalSchema::parent(),
            PositionalSchema::child(),
            PositionalSchema::relation(),
        )
    }
}

impl RelatedRecordResolver {
    pub fn new(
        field_names: RecordFieldNames,
        parent_schema: PositionalSchema,
        child_schema: PositionalSchema,
        relation_schema: PositionalSchema,
    ) -> Self {
        Self {
            field_names,
            parent_schema,
            child_schema,
            relation_schema,
        }
    }

    /// Parent records of a document.
    ///
    /// Falls back to `marc` only when the parent field is absent or empty.
    /// A present but malformed field yields no parents.
    pub fn parents(&self, doc: &IndexDocument, marc: Option<&dyn MarcRecord>) -> Vec<ParentRecord> {
        let flat = doc.values(&self.field_names.parent);
        if flat.is_empty() {
            return marc.map(parents_from_marc).unwrap_or_default();
        }

        decode(flat, &self.parent_schema)
            .iter()
            .map(ParentRecord::from)
            .collect()
    }

    pub fn children(&self, doc: &IndexDocument) -> Vec<ChildRecord> {
        decode(doc.values(&self.field_names.child), &self.child_schema)
            .iter()
            .map(ChildRecord::from)
            .collect()
    }

    pub fn relations(&self, doc: &IndexDocument) -> Vec<RelatedRecord> {
        decode(doc.values(&self.field_names.relation), &self.relation_schema)
            .iter()
            .map(RelatedRecord::from)
            .collect()
    }
}

/// Strips a leading `(ORG)` qualifier from a control number.
fn control_number(value: &str) -> String {
    match value.strip_prefix('(').and_then(|rest| rest.split_once(')')) {
        Some((_, number)) => number.trim().to_string(),
        None => value.to_string(),
    }
}

fn parents_from_marc(marc: &dyn MarcRecord) -> Vec<ParentRecord> {
    let mut parents = Vec::new();

    for field in marc.fields("773") {
        parents.push(ParentRecord {
            title: field.subfield('t').map(str::to_string),
            vol_no_773: field.subfield('g').map(str::to_string),
            id: field.subfield('w').map(control_number),
            ..Default::default()
        });
    }
    for field in marc.fields("830") {
        parents.push(ParentRecord {
            title: field.subfield('a').map(str::to_string),
            vol_no_830: field.subfield('v').map(str::to_string),
            id: field.subfield('w').map(control_number),
            ..Default::default()
        });
    }
    for field in marc.fields("490") {
        parents.push(ParentRecord {
            title: field.subfield('a').map(str::to_string),
            vol_no_490: field.subfield('v').map(str::to_string),
            ..Default::default()
        });
    }

    parents.retain(|p| p.title.is_some() || p.id.is_some());
    parents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::PARENT_SENTINELS;

    fn parent_block(title: &str, id: &str) -> Vec<String> {
        let mut block: Vec<String> = PARENT_SENTINELS.iter().map(|s| s.to_string()).collect();
        block[0] = title.to_string();
        block[12] = id.to_string();
        block
    }

    fn marc() -> InMemoryMarcRecord {
        InMemoryMarcRecord::default()
            .with_field(MarcDataField::new("490").with_subfield('a', "Lecture notes").with_subfield('v', "12"))
            .with_field(
                MarcDataField::new("773")
                    .with_subfield('t', "Journal of Things")
                    .with_subfield('g', "Vol. 3")
                    .with_subfield('w', "(AT-OBV)AC0001"),
            )
            .with_field(
                MarcDataField::new("830")
                    .with_subfield('a', "Series Title")
                    .with_subfield('v', "7")
                    .with_subfield('w', "990123"),
            )
    }

    // ============================================================
    // Section 1: Positional fields
    // ============================================================

    #[test]
    fn test_parents_from_positional_field() {
        let resolver = RelatedRecordResolver::default();
        let mut flat = parent_block("Series A", "1");
        flat.extend(parent_block("Series B", "2"));
        let doc = IndexDocument::new().with_values("parent_multi_str_mv", flat);

        let parents = resolver.parents(&doc, Some(&marc()));

        let titles: Vec<_> = parents.iter().map(|p| p.title.as_deref()).collect();
        assert_eq!(titles, vec![Some("Series A"), Some("Series B")]);
    }

    #[test]
    fn test_children_and_relations() {
        let resolver = RelatedRecordResolver::default();
        let child: Vec<String> = PositionalSchema::child()
            .fields()
            .iter()
            .map(|f| format!("{f}-value"))
            .collect();
        let doc = IndexDocument::new()
            .with_values("child_multi_str_mv", child)
            .with_values(
                "relation_multi_str_mv",
                ["Continued by", "Newer Title", "NoRemainder", "NoPartNo", "NoVolNo", "NoAc", "77"],
            );

        let children = resolver.children(&doc);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].format.as_deref(), Some("format-value"));

        let relations = resolver.relations(&doc);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].relation_label.as_deref(), Some("Continued by"));
        assert_eq!(relations[0].id.as_deref(), Some("77"));
    }

    #[test]
    fn test_missing_fields_yield_no_records() {
        let resolver = RelatedRecordResolver::default();
        let doc = IndexDocument::new();

        assert!(resolver.parents(&doc, None).is_empty());
        assert!(resolver.children(&doc).is_empty());
        assert!(resolver.relations(&doc).is_empty());
    }

    // ============================================================
    // Section 2: MARC fallback
    // ============================================================

    #[test]
    fn test_absent_parent_field_falls_back_to_marc() {
        let resolver = RelatedRecordResolver::default();
        let marc = marc();

        let parents = resolver.parents(&IndexDocument::new(), Some(&marc));

        assert_eq!(parents.len(), 3);
        assert_eq!(parents[0].title.as_deref(), Some("Journal of Things"));
        assert_eq!(parents[0].vol_no_773.as_deref(), Some("Vol. 3"));
        assert_eq!(parents[0].id.as_deref(), Some("AC0001"));
        assert_eq!(parents[1].title.as_deref(), Some("Series Title"));
        assert_eq!(parents[1].id.as_deref(), Some("990123"));
        assert_eq!(parents[2].title.as_deref(), Some("Lecture notes"));
        assert_eq!(parents[2].volume(), Some("12"));
        assert_eq!(parents[2].id, None);
    }

    #[test]
    fn test_malformed_parent_field_does_not_fall_back() {
        let resolver = RelatedRecordResolver::default();
        let doc = IndexDocument::new().with_values("parent_multi_str_mv", ["only", "three", "values"]);

        assert!(resolver.parents(&doc, Some(&marc())).is_empty());
    }

    #[test]
    fn test_custom_field_names_and_schema() {
        let resolver = RelatedRecordResolver::new(
            RecordFieldNames {
                parent: "host_item".to_string(),
                ..Default::default()
            },
            PositionalSchema::new("host", ["title", "id"], ["NoTitle", "NoId"]).unwrap(),
            PositionalSchema::child(),
            PositionalSchema::relation(),
        );
        let doc = IndexDocument::new().with_values("host_item", ["Host", "NoId", "NoTitle", "9"]);

        let parents = resolver.parents(&doc, None);

        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0].title.as_deref(), Some("Host"));
        assert_eq!(parents[0].id, None);
        assert_eq!(parents[1].title, None);
        assert_eq!(parents[1].id.as_deref(), Some("9"));
    }

    #[test]
    fn test_control_number_prefix_is_stripped() {
        assert_eq!(control_number("(DE-600)123"), "123");
        assert_eq!(control_number("123"), "123");
        assert_eq!(control_number("(unterminated"), "(unterminated");
    }
}
