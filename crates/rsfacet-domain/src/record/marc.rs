//! Bibliographic record collaborator.

use serde::{Deserialize, Serialize};

/// A MARC data field with ordered subfields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarcDataField {
    pub tag: String,
    pub subfields: Vec<(char, String)>,
}

impl MarcDataField {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            subfields: Vec::new(),
        }
    }

    pub fn with_subfield(mut self, code: char, value: impl Into<String>) -> Self {
        self.subfields.push((code, value.into()));
        self
    }

    /// First non-blank value of a subfield, trimmed.
    pub fn subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .filter(|(c, _)| *c == code)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }
}

/// Structured access to the bibliographic record behind a search document.
pub trait MarcRecord {
    /// All data fields with `tag`, in record order.
    fn fields(&self, tag: &str) -> Vec<MarcDataField>;
}

/// A MARC record held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryMarcRecord {
    fields: Vec<MarcDataField>,
}

impl InMemoryMarcRecord {
    pub fn new(fields: Vec<MarcDataField>) -> Self {
        Self { fields }
    }

    pub fn with_field(mut self, field: MarcDataField) -> Self {
        self.fields.push(field);
        self
    }
}

impl MarcRecord for InMemoryMarcRecord {
    fn fields(&self, tag: &str) -> Vec<MarcDataField> {
        self.fields.iter().filter(|f| f.tag == tag).cloned().collect()
    }
}
