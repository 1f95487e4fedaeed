//! Facet parameter initialization.
//!
//! [`FacetParamsBuilder`] turns [`FacetSettings`] into the
//! [`BackendFacetRequest`] for one call site:
//!
//! 1. Resolve the section. For tab-scoped contexts with an active tab,
//!    `{tab}_{section}` replaces the generic section when it exists.
//! 2. Start from the global defaults.
//! 3. Emit a per-field override only when it differs from the global value,
//!    so the request never repeats defaults.

mod request;
mod settings;

use std::sync::Arc;

use tracing::debug;

use crate::model::{ActiveTab, FacetOperator};

pub use request::BackendFacetRequest;
pub use settings::{
    FacetContext, FacetDefaults, FacetFieldConfig, FacetSection, FacetSettings, FacetSort,
    FieldOverrides,
};

/// Builds backend facet requests from static configuration.
#[derive(Debug, Clone)]
pub struct FacetParamsBuilder {
    settings: Arc<FacetSettings>,
}

impl FacetParamsBuilder {
    pub fn new(settings: Arc<FacetSettings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FacetSettings {
        &self.settings
    }

    /// Picks the section for a context: tab-specific first, then generic.
    pub fn resolve_section(
        &self,
        context: FacetContext,
        active_tab: Option<&ActiveTab>,
    ) -> Option<(&str, &FacetSection)> {
        let generic = context.section_name();

        if context.is_tab_scoped() {
            if let Some(tab) = active_tab {
                let scoped = format!("{}_{generic}", tab.id());
                if let Some((name, section)) = self.settings.sections.get_key_value(&scoped) {
                    return Some((name.as_str(), section));
                }
            }
        }

        self.settings
            .sections
            .get_key_value(generic)
            .map(|(name, section)| (name.as_str(), section))
    }

    /// Builds the facet request for a context.
    pub fn build(&self, context: FacetContext, active_tab: Option<&ActiveTab>) -> BackendFacetRequest {
        let defaults = &self.settings.defaults;
        let resolved = self.resolve_section(context, active_tab);

        let mut request = BackendFacetRequest {
            context,
            section: resolved.map(|(name, _)| name.to_string()),
            fields: Vec::new(),
            limit: defaults.limit,
            mincount: defaults.mincount,
            sort: defaults.sort,
            exclude_terms: (!defaults.exclude_terms.is_empty())
                .then(|| defaults.exclude_terms.clone()),
            rows: 0,
            per_field: Default::default(),
        };

        let Some((name, section)) = resolved else {
            debug!(section = context.section_name(), "no facet section configured");
            return request;
        };
        debug!(section = name, fields = section.fields.len(), "initializing facet parameters");

        request.fields = section.fields.clone();
        for entry in &section.fields {
            let Some(overrides) = section.overrides.get(&entry.field) else {
                continue;
            };
            let effective = self.effective_overrides(overrides);
            if !effective.is_empty() {
                request.per_field.insert(entry.field.clone(), effective);
            }
        }

        request
    }

    /// Drops every override equal to the global default.
    fn effective_overrides(&self, overrides: &FieldOverrides) -> FieldOverrides {
        let defaults = &self.settings.defaults;
        FieldOverrides {
            limit: overrides.limit.filter(|limit| *limit != defaults.limit),
            mincount: overrides.mincount.filter(|mincount| *mincount != defaults.mincount),
            exclude_terms: overrides
                .exclude_terms
                .clone()
                .filter(|terms| *terms != defaults.exclude_terms),
            prefix: overrides.prefix.clone().filter(|p| !p.is_empty()),
            contains: overrides.contains.clone().filter(|c| !c.is_empty()),
            operator: overrides.operator.filter(|op| *op != FacetOperator::And),
            sort: overrides.sort.filter(|sort| *sort != defaults.sort),
        }
    }
}
