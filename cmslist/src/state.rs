use crate::{FilterDefinition, PaginationMode};

/// A lightweight, serializable snapshot of a list's page state.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageState {
    pub current_page: usize,
    pub total_pages: usize,
    pub items_per_page: Option<usize>,
    pub mode: PaginationMode,
}

/// Item counts of a list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListCounts {
    pub items: usize,
    pub valid: usize,
    pub rendered: usize,
}

/// An immutable snapshot of every filter definition.
///
/// Hosts use it to render tags/summaries and to rehydrate the filters from query params.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FiltersSnapshot {
    pub filters: Vec<FilterDefinition>,
    pub active: bool,
}

impl FiltersSnapshot {
    /// Active values keyed by each filter's first key, as persisted in the query string.
    pub fn query_values(&self) -> std::collections::BTreeMap<String, Vec<String>> {
        self.filters
            .iter()
            .filter(|f| f.is_active())
            .filter_map(|f| {
                let key = f.filter_keys().first()?;
                Some((key.clone(), f.ordered_values()))
            })
            .collect()
    }
}
