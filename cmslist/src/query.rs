//! Query-string contract for shareable list views.
//!
//! Keys are scoped by the list's instance id: `{instance}_page` for the page number and
//! `{instance}_{filter-key}` for a filter's active values (comma-joined).

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::props::normalize_key;

pub fn pages_query_key(instance_id: &str) -> String {
    format!("{instance_id}_page")
}

pub fn filter_query_key(instance_id: &str, filter_key: &str) -> String {
    format!("{instance_id}_{}", normalize_key(filter_key))
}

/// The persisted part of a list view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryState {
    pub page: Option<usize>,
    /// Normalized filter key -> active values.
    pub filters: BTreeMap<String, Vec<String>>,
}

impl QueryState {
    /// Encodes the state as `application/x-www-form-urlencoded` pairs (no leading `?`).
    ///
    /// Page 1 and empty filters are omitted so the default view has an empty query.
    pub fn encode(&self, instance_id: &str) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.page.filter(|&p| p > 1) {
            out.append_pair(&pages_query_key(instance_id), &page.to_string());
        }
        for (key, values) in &self.filters {
            if values.is_empty() {
                continue;
            }
            out.append_pair(&filter_query_key(instance_id, key), &values.join(","));
        }
        out.finish()
    }

    /// Reads the pairs belonging to `instance_id`, ignoring everything else in the query.
    ///
    /// Only the exact keys built from `filter_keys` are read, so `list_2_page` never leaks into
    /// the state of an instance named `list`.
    pub fn decode<'a>(
        query: &str,
        instance_id: &str,
        filter_keys: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let page_key = pages_query_key(instance_id);
        let known: BTreeMap<String, String> = filter_keys
            .into_iter()
            .map(|key| (filter_query_key(instance_id, key), normalize_key(key)))
            .collect();
        let mut state = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key == page_key {
                state.page = value.trim().parse().ok().filter(|&p: &usize| p > 0);
            } else if let Some(filter_key) = known.get(&*key) {
                let values: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_owned)
                    .collect();
                if !values.is_empty() {
                    state.filters.insert(filter_key.clone(), values);
                }
            }
        }
        state
    }
}
