//! The facet request handed to the search backend client.

use std::collections::BTreeMap;

use serde::Serialize;

use super::settings::{FacetContext, FacetFieldConfig, FacetSort, FieldOverrides};
use crate::model::{FacetField, FacetOperator};

/// Fully initialized facet parameters for one query.
///
/// `per_field` only holds settings that differ from the global values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendFacetRequest {
    pub context: FacetContext,
    /// Name of the configuration section the fields came from.
    pub section: Option<String>,
    pub fields: Vec<FacetFieldConfig>,
    pub limit: i64,
    pub mincount: u32,
    pub sort: FacetSort,
    pub exclude_terms: Option<String>,
    /// Result documents to return; facet queries ask for none.
    pub rows: u32,
    pub per_field: BTreeMap<FacetField, FieldOverrides>,
}

impl BackendFacetRequest {
    /// Combination operator of a field.
    pub fn operator(&self, field: &str) -> FacetOperator {
        self.per_field
            .get(field)
            .and_then(|o| o.operator)
            .unwrap_or_default()
    }

    /// Fields combined with OR semantics.
    pub fn or_fields(&self) -> impl Iterator<Item = &FacetField> {
        self.fields
            .iter()
            .map(|f| &f.field)
            .filter(|f| self.operator(f.as_str()) == FacetOperator::Or)
    }

    /// Renders Solr-style request parameters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("facet".to_string(), "true".to_string()),
            ("rows".to_string(), self.rows.to_string()),
        ];

        for entry in &self.fields {
            let field = entry.field.as_str();
            let value = match self.operator(field) {
                FacetOperator::Or => format!("{{!ex={field}_filter}}{field}"),
                FacetOperator::And => field.to_string(),
            };
            params.push(("facet.field".to_string(), value));
        }

        params.push(("facet.limit".to_string(), self.limit.to_string()));
        params.push(("facet.mincount".to_string(), self.mincount.to_string()));
        params.push(("facet.sort".to_string(), self.sort.as_str().to_string()));
        if let Some(terms) = &self.exclude_terms {
            params.push(("facet.excludeTerms".to_string(), terms.clone()));
        }

        for (field, overrides) in &self.per_field {
            let mut push = |name: &str, value: String| {
                params.push((format!("f.{field}.facet.{name}"), value));
            };
            if let Some(limit) = overrides.limit {
                push("limit", limit.to_string());
            }
            if let Some(mincount) = overrides.mincount {
                push("mincount", mincount.to_string());
            }
            if let Some(terms) = &overrides.exclude_terms {
                push("excludeTerms", terms.clone());
            }
            if let Some(prefix) = &overrides.prefix {
                push("prefix", prefix.clone());
            }
            if let Some(contains) = &overrides.contains {
                push("contains", contains.clone());
            }
            if let Some(sort) = overrides.sort {
                push("sort", sort.as_str().to_string());
            }
        }

        params
    }
}
