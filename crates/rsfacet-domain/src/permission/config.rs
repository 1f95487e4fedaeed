//! Facet value to permission rule associations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::FacetField;

/// Name of a permission rule (e.g., "access.StaffViewSpecial").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleRef(String);

impl RuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One configured association: `value` of `field` requires `rule`.
///
/// Field and value are carried as data rather than map keys so that
/// configuration loaders which normalize key case leave them intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePermission {
    pub field: FacetField,
    pub value: String,
    pub rule: RuleRef,
}

type PermissionTable = Vec<ValuePermission>;

/// Which facet values need which rules.
///
/// A field absent from the table is unrestricted. Within a restricted field,
/// a value with no entry is visible to everyone; several entries for the same
/// value form an ordered list where any single grant suffices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PermissionTable", into = "PermissionTable")]
pub struct PermissionConfig {
    fields: BTreeMap<FacetField, BTreeMap<String, Vec<RuleRef>>>,
}

impl PermissionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `rule` to the rules guarding `field:value`.
    pub fn with_rule(
        mut self,
        field: impl Into<FacetField>,
        value: impl Into<String>,
        rule: impl Into<RuleRef>,
    ) -> Self {
        self.add_rule(field.into(), value.into(), rule.into());
        self
    }

    fn add_rule(&mut self, field: FacetField, value: String, rule: RuleRef) {
        let rules = self.fields.entry(field).or_default().entry(value).or_default();
        if !rules.contains(&rule) {
            rules.push(rule);
        }
    }

    /// Whether any value of `field` is restricted.
    pub fn restricts(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Rules guarding `field:value`, in configured order. Empty if unrestricted.
    pub fn rules_for(&self, field: &str, value: &str) -> &[RuleRef] {
        self.fields
            .get(field)
            .and_then(|values| values.get(value))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every rule name referenced by any entry.
    pub fn referenced_rules(&self) -> impl Iterator<Item = &RuleRef> {
        self.fields.values().flat_map(|values| values.values().flatten())
    }

    /// Number of restricted fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<PermissionTable> for PermissionConfig {
    fn from(table: PermissionTable) -> Self {
        let mut config = PermissionConfig::new();
        for entry in table {
            config.add_rule(entry.field, entry.value, entry.rule);
        }
        config
    }
}

impl From<PermissionConfig> for PermissionTable {
    fn from(config: PermissionConfig) -> Self {
        config
            .fields
            .into_iter()
            .flat_map(|(field, values)| {
                values.into_iter().flat_map(move |(value, rules)| {
                    let field = field.clone();
                    rules.into_iter().map(move |rule| ValuePermission {
                        field: field.clone(),
                        value: value.clone(),
                        rule,
                    })
                })
            })
            .collect()
    }
}
