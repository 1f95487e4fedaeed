//! Core type definitions for faceted search results.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A facetable attribute of the search index (e.g., "format", "building").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetField(String);

impl FacetField {
    /// Creates a new facet field from its index name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the field name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FacetField {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FacetField {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FacetField {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How a selected value combines with other selected values of the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetOperator {
    /// Every selected value must match.
    #[default]
    And,
    /// Any selected value may match.
    Or,
}

impl FacetOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetOperator::And => "AND",
            FacetOperator::Or => "OR",
        }
    }
}

/// A single candidate value of a facet field.
///
/// Values are produced fresh from each backend response and never mutated
/// afterwards; fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    value: String,
    display_text: String,
    count: u64,
    operator: FacetOperator,
    is_applied: bool,
}

impl FacetValue {
    /// Creates a facet value whose display text equals its raw value.
    pub fn new(value: impl Into<String>, count: u64, operator: FacetOperator, is_applied: bool) -> Self {
        let value = value.into();
        Self {
            display_text: value.clone(),
            value,
            count,
            operator,
            is_applied,
        }
    }

    /// Replaces the display text.
    pub fn with_display_text(mut self, display_text: impl Into<String>) -> Self {
        self.display_text = display_text.into();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn operator(&self) -> FacetOperator {
        self.operator
    }

    /// Whether the current query already filters on this value.
    pub fn is_applied(&self) -> bool {
        self.is_applied
    }
}

/// All values the backend returned for one field, in backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetList {
    field: FacetField,
    label: String,
    values: Vec<FacetValue>,
}

impl FacetList {
    pub fn new(field: FacetField, label: impl Into<String>, values: Vec<FacetValue>) -> Self {
        Self {
            field,
            label: label.into(),
            values,
        }
    }

    pub fn field(&self) -> &FacetField {
        &self.field
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn values(&self) -> &[FacetValue] {
        &self.values
    }
}

/// The unfiltered facet result of one query, in configured field order.
///
/// This is what the facet cache stores. It always holds every value the
/// backend returned, independent of who asked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetData {
    lists: Vec<FacetList>,
}

impl FacetData {
    pub fn new(lists: Vec<FacetList>) -> Self {
        Self { lists }
    }

    /// Looks up the list of a field.
    pub fn get(&self, field: &str) -> Option<&FacetList> {
        self.lists.iter().find(|list| list.field.as_str() == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacetList> {
        self.lists.iter()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// The actor-visible view of a [`FacetList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredFacetList {
    pub field: FacetField,
    pub label: String,
    pub values: Vec<FacetValue>,
    /// Number of values removed by permission filtering.
    pub hidden: usize,
}

impl FilteredFacetList {
    /// Raw values of the visible entries, in order.
    pub fn value_strings(&self) -> Vec<&str> {
        self.values.iter().map(FacetValue::value).collect()
    }
}

/// Filtered facet lists for one request, in configured field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetResults {
    lists: Vec<FilteredFacetList>,
}

impl FacetResults {
    pub fn new(lists: Vec<FilteredFacetList>) -> Self {
        Self { lists }
    }

    pub fn get(&self, field: &str) -> Option<&FilteredFacetList> {
        self.lists.iter().find(|list| list.field.as_str() == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilteredFacetList> {
        self.lists.iter()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl IntoIterator for FacetResults {
    type Item = FilteredFacetList;
    type IntoIter = std::vec::IntoIter<FilteredFacetList>;

    fn into_iter(self) -> Self::IntoIter {
        self.lists.into_iter()
    }
}

/// Identifier of the active search tab (e.g., "library", "articles").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveTab(String);

impl ActiveTab {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// The user-facing shape of a search: query string, selected filters,
/// sort and active tab.
///
/// Filters are held in a sorted map so that equal queries serialize
/// identically regardless of the order filters were selected in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub filters: BTreeMap<FacetField, Vec<String>>,
    pub sort: Option<String>,
    pub tab: Option<ActiveTab>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Adds a selected filter value.
    pub fn with_filter(mut self, field: impl Into<FacetField>, value: impl Into<String>) -> Self {
        let values = self.filters.entry(field.into()).or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
            values.sort();
        }
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_tab(mut self, tab: ActiveTab) -> Self {
        self.tab = Some(tab);
        self
    }

    /// Whether the query already filters on `field:value`.
    pub fn is_applied(&self, field: &str, value: &str) -> bool {
        self.filters
            .get(field)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }
}

/// Facet counts exactly as returned by the search backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFacetData {
    fields: BTreeMap<FacetField, Vec<(String, u64)>>,
}

impl RawFacetData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `(value, count)` pairs of a field, in backend order.
    pub fn insert(&mut self, field: impl Into<FacetField>, counts: Vec<(String, u64)>) {
        self.fields.insert(field.into(), counts);
    }

    pub fn with_field<V: Into<String>>(
        mut self,
        field: impl Into<FacetField>,
        counts: impl IntoIterator<Item = (V, u64)>,
    ) -> Self {
        self.insert(
            field,
            counts.into_iter().map(|(v, c)| (v.into(), c)).collect(),
        );
        self
    }

    pub fn counts(&self, field: &str) -> Option<&[(String, u64)]> {
        self.fields.get(field).map(Vec::as_slice)
    }
}
