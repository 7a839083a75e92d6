//! Derives the visibility and resolved values a form would show for a set of
//! candidate field values.

use crate::condition::evaluate;
use crate::types::{Configuration, ValueMap};
use serde::Serialize;
use std::collections::HashMap;

/// Resolved state of every configuration field for one example state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimulatedState {
    /// Resolved value per field, in configuration order. Fields with neither
    /// a candidate value nor a default are absent.
    pub values: ValueMap,
    /// Visibility per field name.
    pub visibility: HashMap<String, bool>,
}

impl SimulatedState {
    /// Unknown fields count as visible, matching a field without `showIf`.
    pub fn is_visible(&self, field: &str) -> bool {
        self.visibility.get(field).copied().unwrap_or(true)
    }
}

/// Simulates one pass over the configuration.
///
/// Fields are visited in step order, then field order. Each field's `showIf`
/// sees the candidate values plus the defaults applied so far, so an earlier
/// field's default can gate a later field but never the reverse.
pub fn simulate(configuration: &Configuration, candidates: &ValueMap) -> SimulatedState {
    let mut working = candidates.clone();
    let mut state = SimulatedState::default();

    for field_ref in configuration.fields() {
        let field = field_ref.field;

        let visible = field
            .show_if
            .as_ref()
            .is_none_or(|rule| evaluate(rule, &working));
        // Duplicate names: the first declaration wins, the graph check reports the rest.
        state
            .visibility
            .entry(field.name.clone())
            .or_insert(visible);

        if let Some(candidate) = candidates.get(&field.name) {
            state
                .values
                .entry(field.name.clone())
                .or_insert_with(|| candidate.clone());
        } else if let Some(default) = &field.default_value {
            if !working.contains_key(&field.name) {
                working.insert(field.name.clone(), default.clone());
            }
            state
                .values
                .entry(field.name.clone())
                .or_insert_with(|| default.clone());
        }
    }

    tracing::trace!(
        fields = configuration.field_count(),
        resolved = state.values.len(),
        "simulated state"
    );
    state
}
