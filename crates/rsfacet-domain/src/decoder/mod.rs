//! Positional multi-value decoding.
//!
//! The indexer flattens repeating groups (parent, child and relation
//! records) into one multi-valued field: block after block, each block a
//! fixed number of values in a fixed order. Absent values are written as
//! reserved sentinel strings such as `NoTitle`.
//!
//! [`decode`] reverses that: it cuts the flat sequence into stride-sized
//! windows, names each position after the [`PositionalSchema`], and turns
//! sentinels into `None`.
//!
//! # Failure policy
//!
//! A sequence whose length is not a multiple of the stride is a data
//! integrity problem in the index. It is logged and decoded as "no
//! records"; it never surfaces as an error to the caller.

mod records;
mod schema;

use std::sync::Arc;

use tracing::warn;

pub use records::{ChildRecord, ParentRecord, RelatedRecord};
pub use schema::{
    PositionalSchema, PositionalSchemaDef, CHILD_EXTRA_FIELDS, CHILD_EXTRA_SENTINELS,
    PARENT_FIELDS, PARENT_SENTINELS, RELATION_FIELDS, RELATION_SENTINELS,
};

/// One decoded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalRecord {
    names: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl PositionalRecord {
    /// Returns the value of a named field, `None` if absent or unknown.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values[i].as_deref())
    }

    /// Iterates `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }

    /// Whether every position decoded to `None`.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Decodes a flat positional sequence into records.
///
/// Returns an empty vector (and logs) if the length is not a multiple of
/// the schema's stride. Block order is preserved.
pub fn decode<S: AsRef<str>>(flat_values: &[S], schema: &PositionalSchema) -> Vec<PositionalRecord> {
    let stride = schema.stride();

    if flat_values.len() % stride != 0 {
        warn!(
            schema = schema.name(),
            len = flat_values.len(),
            stride,
            "positional field length is not a multiple of the stride, ignoring field"
        );
        return Vec::new();
    }

    let names = schema.shared_fields();
    flat_values
        .chunks_exact(stride)
        .map(|block| PositionalRecord {
            names: Arc::clone(&names),
            values: block.iter().map(|v| schema.normalize(v.as_ref())).collect(),
        })
        .collect()
}
