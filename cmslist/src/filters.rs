use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::props::{compare_values, normalize_key, split_keys};
use crate::{FilterMode, FiltersSnapshot, HighlightData, ItemProps, MatchRule, PropEntry, RangeTag};

pub const DEFAULT_HIGHLIGHT_CLASS: &str = "fs-cmsfilter_highlight";

/// The form field type of a filter control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlKind {
    #[default]
    Checkbox,
    Radio,
    Select,
    /// Free text input; matches by case-insensitive substring.
    Text,
}

impl ControlKind {
    /// Checkbox and radio controls carry a fixed value and toggle it on/off.
    pub fn is_toggle(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }

    fn matches(self, active: &str, candidate: &str) -> bool {
        let active = active.trim().to_lowercase();
        let candidate = candidate.trim().to_lowercase();
        match self {
            Self::Text => candidate.contains(&active),
            _ => candidate == active,
        }
    }
}

/// One form control bound to a filter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterControl {
    pub kind: ControlKind,
    /// The fixed value of a toggle, or the current input of a select/text control.
    pub value: String,
    pub checked: bool,
    /// Bound tag for range filters.
    pub range: Option<RangeTag>,
    /// Items that would show if this control were the only change to the current query.
    pub results_count: usize,
    pub hide_empty: bool,
    pub hidden: bool,
}

impl FilterControl {
    pub fn new(kind: ControlKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            checked: false,
            range: None,
            results_count: 0,
            hide_empty: false,
            hidden: false,
        }
    }

    pub fn checkbox(value: impl Into<String>) -> Self {
        Self::new(ControlKind::Checkbox, value)
    }

    pub fn radio(value: impl Into<String>) -> Self {
        Self::new(ControlKind::Radio, value)
    }

    pub fn select() -> Self {
        Self::new(ControlKind::Select, "")
    }

    pub fn text() -> Self {
        Self::new(ControlKind::Text, "")
    }

    /// A text input holding one bound of a range filter.
    pub fn range_input(tag: RangeTag) -> Self {
        Self::text().with_range(tag)
    }

    pub fn with_range(mut self, tag: RangeTag) -> Self {
        self.range = Some(tag);
        self
    }

    pub fn with_hide_empty(mut self, hide_empty: bool) -> Self {
        self.hide_empty = hide_empty;
        self
    }

    pub fn is_active(&self) -> bool {
        if self.kind.is_toggle() {
            self.checked
        } else {
            !self.value.trim().is_empty()
        }
    }

    fn clear(&mut self) {
        if self.kind.is_toggle() {
            self.checked = false;
        } else {
            self.value.clear();
        }
    }
}

/// A user interaction on one control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlInput {
    Checked(bool),
    Value(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagFormat {
    /// Tags read `"{category}: {value}"`.
    Category,
}

/// A display tag for one active filter value.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterTag {
    pub filter_index: usize,
    pub filter_keys: Vec<String>,
    pub value: String,
    pub label: String,
}

/// One logical filter: the keys it inspects, its bound controls and its active values.
///
/// The active values are always derived from the controls; every mutation goes through the
/// controls and re-derives `values`, so the two never disagree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterDefinition {
    original_keys: Vec<String>,
    filter_keys: Vec<String>,
    values: BTreeSet<String>,
    match_rule: MatchRule,
    mode: Option<FilterMode>,
    controls: Vec<FilterControl>,
    highlight: bool,
    highlight_class: Option<String>,
    tag_format: Option<TagFormat>,
    tag_category: Option<String>,
}

impl FilterDefinition {
    /// Creates a filter over a comma-separated key list (`"title, description"`).
    pub fn new(keys: &str) -> Self {
        Self {
            original_keys: keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned)
                .collect(),
            filter_keys: split_keys(keys),
            values: BTreeSet::new(),
            match_rule: MatchRule::Any,
            mode: None,
            controls: Vec::new(),
            highlight: false,
            highlight_class: None,
            tag_format: None,
            tag_category: None,
        }
    }

    pub fn with_match(mut self, match_rule: MatchRule) -> Self {
        self.match_rule = match_rule;
        self
    }

    pub fn with_mode(mut self, mode: Option<FilterMode>) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_control(mut self, control: FilterControl) -> Self {
        self.controls.push(control);
        self.sync_values();
        self
    }

    pub fn with_controls(mut self, controls: impl IntoIterator<Item = FilterControl>) -> Self {
        self.controls.extend(controls);
        self.sync_values();
        self
    }

    pub fn with_highlight(mut self, highlight: bool, class: Option<String>) -> Self {
        self.highlight = highlight;
        self.highlight_class = class;
        self
    }

    pub fn with_tag_format(mut self, tag_format: Option<TagFormat>, category: Option<String>) -> Self {
        self.tag_format = tag_format;
        self.tag_category = category;
        self
    }

    pub fn original_keys(&self) -> &[String] {
        &self.original_keys
    }

    pub fn filter_keys(&self) -> &[String] {
        &self.filter_keys
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    pub fn match_rule(&self) -> MatchRule {
        self.match_rule
    }

    pub fn mode(&self) -> Option<FilterMode> {
        self.mode
    }

    pub fn controls(&self) -> &[FilterControl] {
        &self.controls
    }

    pub fn highlight(&self) -> bool {
        self.highlight
    }

    pub fn highlight_class(&self) -> Option<&str> {
        self.highlight_class.as_deref()
    }

    pub fn tag_format(&self) -> Option<TagFormat> {
        self.tag_format
    }

    pub fn tag_category(&self) -> Option<&str> {
        self.tag_category.as_deref()
    }

    pub fn is_active(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn targets_key(&self, key: &str) -> bool {
        self.filter_keys.iter().any(|k| k == key)
    }

    /// Active values in the order `set_active_values` expects them back: toggles first, then
    /// inputs with the range `from` bound before `to`.
    pub fn ordered_values(&self) -> Vec<String> {
        let mut active: Vec<&FilterControl> = self.controls.iter().filter(|c| c.is_active()).collect();
        active.sort_by_key(|c| match (c.kind.is_toggle(), c.range) {
            (true, _) => 0,
            (false, Some(tag)) => 1 + tag as u8,
            (false, None) => 3,
        });
        active.into_iter().map(|c| c.value.trim().to_owned()).collect()
    }

    fn is_range(&self) -> bool {
        self.mode == Some(FilterMode::Range)
    }

    fn active_values(&self) -> impl Iterator<Item = (&str, &FilterControl)> {
        self.controls
            .iter()
            .filter(|c| c.is_active())
            .map(|c| (c.value.trim(), c))
    }

    fn sync_values(&mut self) -> bool {
        let next: BTreeSet<String> = self
            .active_values()
            .map(|(v, _)| v.to_owned())
            .collect();
        let changed = next != self.values;
        self.values = next;
        changed
    }

    /// Checks the toggles whose value is requested and assigns the remaining values to the
    /// input controls (range `from` first, then `to`, then untagged inputs).
    fn set_values(&mut self, values: Vec<String>) -> bool {
        let mut remaining: Vec<String> = Vec::new();
        for v in values {
            let v = v.trim().to_owned();
            if !v.is_empty() && !remaining.contains(&v) {
                remaining.push(v);
            }
        }

        let mut radio_taken = false;
        for control in self.controls.iter_mut().filter(|c| c.kind.is_toggle()) {
            let wanted = remaining.iter().any(|v| *v == control.value.trim());
            if control.kind == ControlKind::Radio {
                control.checked = wanted && !radio_taken;
                radio_taken |= control.checked;
            } else {
                control.checked = wanted;
            }
        }
        let toggle_values: Vec<String> = self
            .controls
            .iter()
            .filter(|c| c.kind.is_toggle())
            .map(|c| c.value.trim().to_owned())
            .collect();
        remaining.retain(|v| !toggle_values.contains(v));

        let mut inputs: Vec<usize> = (0..self.controls.len())
            .filter(|&i| !self.controls[i].kind.is_toggle())
            .collect();
        inputs.sort_by_key(|&i| self.controls[i].range.map_or(2, |tag| tag as u8));
        let mut rest = remaining.into_iter();
        for i in inputs {
            self.controls[i].value = rest.next().unwrap_or_default();
        }
        let dropped: Vec<String> = rest.collect();
        if !dropped.is_empty() {
            lwarn!(
                keys = ?self.filter_keys,
                ?dropped,
                "FilterDefinition: values without a matching control were ignored"
            );
        }

        self.sync_values()
    }

    fn reset(&mut self, value: Option<&str>) -> bool {
        for control in &mut self.controls {
            if value.is_none_or(|v| control.value.trim() == v.trim()) {
                control.clear();
            }
        }
        self.sync_values()
    }

    fn handle_control(&mut self, index: usize, input: ControlInput) -> bool {
        let Some(kind) = self.controls.get(index).map(|c| c.kind) else {
            return false;
        };
        match input {
            ControlInput::Checked(checked) => {
                if kind == ControlKind::Radio && checked {
                    for (i, c) in self.controls.iter_mut().enumerate() {
                        if c.kind == ControlKind::Radio {
                            c.checked = i == index;
                        }
                    }
                } else if kind.is_toggle() {
                    self.controls[index].checked = checked;
                }
            }
            ControlInput::Value(value) => {
                if !kind.is_toggle() {
                    self.controls[index].value = value;
                }
            }
        }
        self.sync_values()
    }

    fn range_bounds(&self) -> (Option<&str>, Option<&str>) {
        let bound = |tag| {
            self.active_values()
                .find(|(_, c)| c.range == Some(tag))
                .map(|(v, _)| v)
        };
        (bound(RangeTag::From), bound(RangeTag::To))
    }

    /// Whether the item passes this filter. Filters without active values, and items that carry
    /// none of the filter's keys, are unconstrained.
    pub fn accepts(&self, props: &ItemProps) -> bool {
        if self.values.is_empty() {
            return true;
        }
        let entries: Vec<&PropEntry> = props
            .entries_for(&self.filter_keys)
            .map(|(_, e)| e)
            .collect();
        if entries.is_empty() {
            return true;
        }

        if self.is_range() {
            let (from, to) = self.range_bounds();
            if from.is_none() && to.is_none() {
                return true;
            }
            return entries.iter().any(|e| entry_in_range(e, from, to));
        }

        let mut active = self.active_values();
        match self.match_rule {
            MatchRule::Any => active.any(|(v, c)| entries.iter().any(|e| entry_matches(e, v, c))),
            // Each active value may be found under a different key.
            MatchRule::All => {
                active.all(|(v, c)| entries.iter().any(|e| entry_matches(e, v, c)))
            }
        }
    }

    fn collect_highlights(
        &self,
        props: &ItemProps,
        class: &str,
        out: &mut BTreeMap<String, BTreeMap<String, HighlightData>>,
    ) {
        let range = self.is_range().then(|| self.range_bounds());
        for (key, entry) in props.entries_for(&self.filter_keys) {
            for value in &entry.values {
                let filter_value = match range {
                    Some((from, to)) => {
                        if !value_in_range(value, entry, from, to) {
                            continue;
                        }
                        None
                    }
                    None => match self
                        .active_values()
                        .find(|(a, c)| c.kind.matches(a, value))
                    {
                        Some((a, _)) => Some(a.to_owned()),
                        None => continue,
                    },
                };
                out.entry(key.to_owned()).or_default().insert(
                    value.clone(),
                    HighlightData {
                        filter_value,
                        highlight_class: class.to_owned(),
                    },
                );
            }
        }
    }

    fn control_matches(&self, control: &FilterControl, props: &ItemProps) -> bool {
        props
            .entries_for(&self.filter_keys)
            .any(|(_, e)| e.values.iter().any(|v| control.kind.matches(&control.value, v)))
    }

    fn tags(&self, filter_index: usize) -> impl Iterator<Item = FilterTag> + '_ {
        self.active_values().map(move |(value, _)| {
            let label = match self.tag_format {
                Some(TagFormat::Category) => {
                    let category = self
                        .tag_category
                        .clone()
                        .unwrap_or_else(|| self.original_keys.join(", "));
                    format!("{category}: {value}")
                }
                None => value.to_owned(),
            };
            FilterTag {
                filter_index,
                filter_keys: self.filter_keys.clone(),
                value: value.to_owned(),
                label,
            }
        })
    }
}

fn entry_matches(entry: &PropEntry, active: &str, control: &FilterControl) -> bool {
    entry.values.iter().any(|v| control.kind.matches(active, v))
}

fn at_least(value: &str, bound: Option<&str>, entry: &PropEntry) -> bool {
    bound.is_none_or(|b| compare_values(value, b, entry.value_type) != Ordering::Less)
}

fn at_most(value: &str, bound: Option<&str>, entry: &PropEntry) -> bool {
    bound.is_none_or(|b| compare_values(value, b, entry.value_type) != Ordering::Greater)
}

fn value_in_range(value: &str, entry: &PropEntry, from: Option<&str>, to: Option<&str>) -> bool {
    at_least(value, from, entry) && at_most(value, to, entry)
}

fn entry_in_range(entry: &PropEntry, from: Option<&str>, to: Option<&str>) -> bool {
    if entry.range.is_some() {
        // The item itself spans an interval: it matches when the two intervals overlap.
        let Some((lo, hi)) = entry.bounds() else {
            return false;
        };
        return at_most(lo, to, entry) && at_least(hi, from, entry);
    }
    entry
        .values
        .iter()
        .any(|v| value_in_range(v, entry, from, to))
}

/// Owns every filter definition of one filters instance and evaluates item validity.
#[derive(Clone, Debug)]
pub struct FilterRegistry {
    filters: Vec<FilterDefinition>,
    highlight_all: bool,
    highlight_class: String,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            highlight_all: false,
            highlight_class: DEFAULT_HIGHLIGHT_CLASS.to_owned(),
        }
    }

    pub fn with_highlight_all(mut self, highlight_all: bool) -> Self {
        self.highlight_all = highlight_all;
        self
    }

    pub fn with_highlight_class(mut self, class: impl Into<String>) -> Self {
        self.highlight_class = class.into();
        self
    }

    pub fn with_filter(mut self, filter: FilterDefinition) -> Self {
        self.add_filter(filter);
        self
    }

    /// Registers a filter and returns its index.
    pub fn add_filter(&mut self, filter: FilterDefinition) -> usize {
        self.filters.push(filter);
        self.filters.len() - 1
    }

    pub fn filters(&self) -> &[FilterDefinition] {
        &self.filters
    }

    pub fn filter(&self, index: usize) -> Option<&FilterDefinition> {
        self.filters.get(index)
    }

    /// Index of the first filter inspecting `key`.
    pub fn find(&self, key: &str) -> Option<usize> {
        let key = normalize_key(key);
        self.filters.iter().position(|f| f.targets_key(&key))
    }

    pub fn filters_active(&self) -> bool {
        self.filters.iter().any(FilterDefinition::is_active)
    }

    /// Replaces the active values of every filter inspecting `filter_key`.
    ///
    /// Returns `true` when any active value changed. Unknown keys are a no-op.
    pub fn set_active_values<I, S>(&mut self, filter_key: &str, values: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = normalize_key(filter_key);
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let mut matched = false;
        let mut changed = false;
        for filter in self.filters.iter_mut().filter(|f| f.targets_key(&key)) {
            matched = true;
            changed |= filter.set_values(values.clone());
        }
        if !matched {
            lwarn!(filter_key, "FilterRegistry: no filter inspects this key");
        }
        ltrace!(filter_key, changed, "FilterRegistry::set_active_values");
        changed
    }

    /// Clears the given filters (all when `filter_keys` is `None`). With `value`, only that
    /// value is removed. Returns `true` when anything changed.
    pub fn reset_filters(&mut self, filter_keys: Option<&[&str]>, value: Option<&str>) -> bool {
        let keys: Option<Vec<String>> =
            filter_keys.map(|keys| keys.iter().map(|k| normalize_key(k)).collect());
        let mut changed = false;
        for filter in &mut self.filters {
            let targeted = keys
                .as_ref()
                .is_none_or(|keys| keys.iter().any(|k| filter.targets_key(k)));
            if targeted {
                changed |= filter.reset(value);
            }
        }
        ldebug!(changed, "FilterRegistry::reset_filters");
        changed
    }

    /// Applies one control interaction, keeping the filter's values in sync with its controls.
    pub fn handle_control_change(
        &mut self,
        filter_index: usize,
        control_index: usize,
        input: ControlInput,
    ) -> bool {
        match self.filters.get_mut(filter_index) {
            Some(filter) => filter.handle_control(control_index, input),
            None => false,
        }
    }

    /// Appends controls to the first filter inspecting `filter_key`.
    pub fn add_controls(
        &mut self,
        filter_key: &str,
        controls: impl IntoIterator<Item = FilterControl>,
    ) -> bool {
        let key = normalize_key(filter_key);
        let Some(filter) = self.filters.iter_mut().find(|f| f.targets_key(&key)) else {
            return false;
        };
        filter.controls.extend(controls);
        filter.sync_values();
        true
    }

    /// Pure validity predicate over all filters.
    pub fn compute_validity(&self, props: &ItemProps) -> bool {
        self.filters.iter().all(|f| f.accepts(props))
    }

    /// Which property values matched which active filter values, for highlighting.
    ///
    /// Independent of validity: an item failing another filter still gets its matches marked.
    pub fn compute_highlights(
        &self,
        props: &ItemProps,
    ) -> BTreeMap<String, BTreeMap<String, HighlightData>> {
        let mut out = BTreeMap::new();
        for filter in self.filters.iter().filter(|f| f.is_active()) {
            if !(filter.highlight || self.highlight_all) {
                continue;
            }
            let class = filter
                .highlight_class
                .as_deref()
                .unwrap_or(&self.highlight_class);
            filter.collect_highlights(props, class, &mut out);
        }
        out
    }

    /// Refreshes every control's `results_count` (and `hidden` for hide-empty controls).
    ///
    /// Toggle and select controls count the items accepted by all *other* filters that carry
    /// the control's value; text and range inputs count the currently valid items.
    pub fn update_results_counts<'a>(&mut self, items: impl IntoIterator<Item = &'a ItemProps>) {
        let items: Vec<&ItemProps> = items.into_iter().collect();
        let mut counts: Vec<Vec<usize>> = Vec::with_capacity(self.filters.len());
        for (i, filter) in self.filters.iter().enumerate() {
            let others_accept = |p: &ItemProps| {
                self.filters
                    .iter()
                    .enumerate()
                    .all(|(j, f)| j == i || f.accepts(p))
            };
            let per_control = filter
                .controls
                .iter()
                .map(|control| {
                    if control.kind == ControlKind::Text || control.range.is_some() {
                        items.iter().filter(|&&p| self.compute_validity(p)).count()
                    } else {
                        items
                            .iter()
                            .filter(|&&p| others_accept(p) && filter.control_matches(control, p))
                            .count()
                    }
                })
                .collect();
            counts.push(per_control);
        }
        for (filter, counts) in self.filters.iter_mut().zip(counts) {
            for (control, count) in filter.controls.iter_mut().zip(counts) {
                control.results_count = count;
                control.hidden = control.hide_empty && count == 0;
            }
        }
    }

    /// Display tags for every active value.
    pub fn tags(&self) -> Vec<FilterTag> {
        self.filters
            .iter()
            .enumerate()
            .flat_map(|(i, f)| f.tags(i))
            .collect()
    }

    /// An immutable snapshot of every filter's state.
    pub fn store_filters_data(&self) -> FiltersSnapshot {
        FiltersSnapshot {
            filters: self.filters.clone(),
            active: self.filters_active(),
        }
    }
}
