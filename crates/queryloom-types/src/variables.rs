//! Variable state consumed when planning query fetches.
//!
//! Queries interpolate dashboard variables into their specs. The engine
//! only needs enough of that state to gate fetches on still-loading
//! variables and to key cached results on the values a query reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current value of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Single(String),
    Many(Vec<String>),
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Single(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Single(value)
    }
}

impl From<Vec<String>> for VariableValue {
    fn from(values: Vec<String>) -> Self {
        VariableValue::Many(values)
    }
}

/// Resolution state of one variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableState {
    pub value: Option<VariableValue>,
    #[serde(default)]
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VariableState {
    pub fn loaded(value: impl Into<VariableValue>) -> Self {
        Self {
            value: Some(value.into()),
            loading: false,
            error: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            value: None,
            loading: true,
            error: None,
        }
    }
}

/// Map of variable name to state.
///
/// Backed by a `BTreeMap` so keys derived from it are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStateMap(BTreeMap<String, VariableState>);

impl VariableStateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, state: VariableState) {
        self.0.insert(name.into(), state);
    }

    pub fn get(&self, name: &str) -> Option<&VariableState> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Subset of the map holding only the named variables.
    ///
    /// `None` keeps the whole map: a plugin that does not declare variable
    /// dependencies is keyed on all of them.
    pub fn filter(&self, names: Option<&[String]>) -> VariableStateMap {
        match names {
            None => self.clone(),
            Some(names) => {
                let mut filtered = BTreeMap::new();
                for name in names {
                    if let Some(state) = self.0.get(name) {
                        filtered.insert(name.clone(), state.clone());
                    }
                }
                VariableStateMap(filtered)
            }
        }
    }

    /// True when any of the named variables is still loading. Unknown
    /// names do not block.
    pub fn names_loading(&self, names: &[String]) -> bool {
        names
            .iter()
            .any(|name| self.0.get(name).is_some_and(|s| s.loading))
    }

    /// Stable key over the variable values, used as cache key material.
    pub fn values_key(&self) -> String {
        self.0
            .values()
            .map(|state| serde_json::to_string(&state.value).unwrap_or_else(|_| "null".to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<(String, VariableState)> for VariableStateMap {
    fn from_iter<I: IntoIterator<Item = (String, VariableState)>>(iter: I) -> Self {
        VariableStateMap(iter.into_iter().collect())
    }
}
