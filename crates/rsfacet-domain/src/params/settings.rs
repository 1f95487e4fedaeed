//! Typed facet configuration: global defaults, sections and per-field
//! overrides.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::model::{FacetField, FacetOperator};

/// Order in which the backend returns values of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetSort {
    /// Most frequent first.
    #[default]
    Count,
    /// Lexicographic by value.
    Index,
}

impl FacetSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetSort::Count => "count",
            FacetSort::Index => "index",
        }
    }
}

/// Global facet defaults applied to every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetDefaults {
    /// Maximum values per field; -1 means unlimited.
    pub limit: i64,
    /// Minimum count a value needs to be returned.
    pub mincount: u32,
    /// Comma-separated values the backend must leave out.
    pub exclude_terms: String,
    pub sort: FacetSort,
}

impl Default for FacetDefaults {
    fn default() -> Self {
        Self {
            limit: 30,
            mincount: 1,
            exclude_terms: String::new(),
            sort: FacetSort::Count,
        }
    }
}

/// Per-field settings. Every entry is optional; unset means "use the
/// global default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mincount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_terms: Option<String>,
    /// Only return values starting with this prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Only return values containing this substring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<FacetOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<FacetSort>,
}

impl FieldOverrides {
    pub fn is_empty(&self) -> bool {
        *self == FieldOverrides::default()
    }
}

/// A facet field shown in a section, with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetFieldConfig {
    pub field: FacetField,
    pub label: String,
}

impl FacetFieldConfig {
    pub fn new(field: impl Into<FacetField>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
        }
    }
}

/// Per-field overrides as they appear in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FieldOverridesEntry {
    field: FacetField,
    #[serde(flatten)]
    overrides: FieldOverrides,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FacetSectionDef {
    fields: Vec<FacetFieldConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    overrides: Vec<FieldOverridesEntry>,
}

/// One configuration section: which fields to facet on and how.
///
/// Serialized with overrides as a list of `{ field, .. }` entries so field
/// names survive loaders that lowercase map keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FacetSectionDef", into = "FacetSectionDef")]
pub struct FacetSection {
    pub fields: Vec<FacetFieldConfig>,
    pub overrides: BTreeMap<FacetField, FieldOverrides>,
}

impl FacetSection {
    pub fn with_field(mut self, field: impl Into<FacetField>, label: impl Into<String>) -> Self {
        self.fields.push(FacetFieldConfig::new(field, label));
        self
    }

    pub fn with_override(mut self, field: impl Into<FacetField>, overrides: FieldOverrides) -> Self {
        self.overrides.insert(field.into(), overrides);
        self
    }
}

impl TryFrom<FacetSectionDef> for FacetSection {
    type Error = DomainError;

    fn try_from(def: FacetSectionDef) -> DomainResult<Self> {
        let mut overrides = BTreeMap::new();
        for entry in def.overrides {
            if overrides.contains_key(&entry.field) {
                return Err(DomainError::InvalidConfiguration {
                    message: format!("facet field '{}' has overrides listed twice", entry.field),
                });
            }
            overrides.insert(entry.field, entry.overrides);
        }
        Ok(Self {
            fields: def.fields,
            overrides,
        })
    }
}

impl From<FacetSection> for FacetSectionDef {
    fn from(section: FacetSection) -> Self {
        Self {
            fields: section.fields,
            overrides: section
                .overrides
                .into_iter()
                .map(|(field, overrides)| FieldOverridesEntry { field, overrides })
                .collect(),
        }
    }
}

/// Call site that initializes facet parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetContext {
    /// Sidebar facets of a result list.
    Results,
    /// Facet lists on the search home page.
    HomePage,
    /// Facet limits on the advanced search form.
    Advanced,
}

impl FacetContext {
    /// Name of the generic configuration section.
    pub fn section_name(&self) -> &'static str {
        match self {
            FacetContext::Results => "Results",
            FacetContext::HomePage => "HomePage",
            FacetContext::Advanced => "Advanced",
        }
    }

    /// Whether a `{tab}_{section}` section may replace the generic one.
    pub fn is_tab_scoped(&self) -> bool {
        matches!(self, FacetContext::HomePage | FacetContext::Advanced)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NamedSection {
    name: String,
    #[serde(flatten)]
    section: FacetSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FacetSettingsDef {
    defaults: FacetDefaults,
    sections: Vec<NamedSection>,
}

/// All facet configuration: defaults plus named sections.
///
/// Section names are case-sensitive (`Results`, `myTab_Advanced`), so they
/// are serialized as a `name` value in a list of sections, never as map keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FacetSettingsDef", into = "FacetSettingsDef")]
pub struct FacetSettings {
    pub defaults: FacetDefaults,
    pub sections: BTreeMap<String, FacetSection>,
}

impl TryFrom<FacetSettingsDef> for FacetSettings {
    type Error = DomainError;

    fn try_from(def: FacetSettingsDef) -> DomainResult<Self> {
        let mut sections = BTreeMap::new();
        for named in def.sections {
            if sections.contains_key(&named.name) {
                return Err(DomainError::InvalidConfiguration {
                    message: format!("facet section '{}' is defined twice", named.name),
                });
            }
            sections.insert(named.name, named.section);
        }
        Ok(Self {
            defaults: def.defaults,
            sections,
        })
    }
}

impl From<FacetSettings> for FacetSettingsDef {
    fn from(settings: FacetSettings) -> Self {
        Self {
            defaults: settings.defaults,
            sections: settings
                .sections
                .into_iter()
                .map(|(name, section)| NamedSection { name, section })
                .collect(),
        }
    }
}

impl FacetSettings {
    pub fn with_section(mut self, name: impl Into<String>, section: FacetSection) -> Self {
        self.sections.insert(name.into(), section);
        self
    }

    /// Checks that no section lists a field twice.
    pub fn validate(&self) -> DomainResult<()> {
        for (name, section) in &self.sections {
            let mut seen = HashSet::new();
            for entry in &section.fields {
                if !seen.insert(entry.field.as_str()) {
                    return Err(DomainError::InvalidConfiguration {
                        message: format!(
                            "facet field '{}' is listed twice in section '{name}'",
                            entry.field
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
