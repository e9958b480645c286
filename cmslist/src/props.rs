use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{RangeTag, ValueType};

/// Normalizes a property/filter key so that authored variants (`"Blog Category"`,
/// `"blog_category"`) resolve to the same entry.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_dash = !out.is_empty();
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Splits a compound key list (`"title, description"`) into normalized keys.
///
/// Empty segments are dropped and duplicates keep their first position.
pub fn split_keys(raw: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let key = normalize_key(part);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Compares two property values under an optional declared type.
///
/// Numbers compare numerically when both sides parse; dates compare as calendar days when both
/// sides parse (see [`parse_date`]); everything else falls back to a case-insensitive lexical
/// comparison.
pub fn compare_values(a: &str, b: &str, value_type: Option<ValueType>) -> Ordering {
    let a = a.trim();
    let b = b.trim();
    match value_type {
        Some(ValueType::Date) => match (parse_date(a), parse_date(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => cmp_lexical(a, b),
        },
        Some(ValueType::Text) => cmp_lexical(a, b),
        _ => match (parse_number(a), parse_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => cmp_lexical(a, b),
        },
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses an authored date value into its calendar day.
///
/// Accepts RFC 3339 timestamps, naive ISO date-times, and plain dates such as `2024-09-15`,
/// `2024-9-15` or `September 15, 2024`. Times are dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        })
}

fn cmp_lexical(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| !matches!(c, ',' | ' ' | '$')).collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One raw value read from an item's markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropField {
    pub key: String,
    pub value: String,
    pub value_type: Option<ValueType>,
    pub range: Option<RangeTag>,
}

impl PropField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            value_type: None,
            range: None,
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn with_range(mut self, range: RangeTag) -> Self {
        self.range = Some(range);
        self
    }
}

/// Marks a property value that matched an active filter value.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightData {
    /// The filter value that matched; `None` for range matches.
    pub filter_value: Option<String>,
    pub highlight_class: String,
}

/// All values collected for one property key of an item.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropEntry {
    pub values: BTreeSet<String>,
    pub value_type: Option<ValueType>,
    /// Set when the values describe an interval (`from`/`to` fields).
    pub range: Option<RangeTag>,
    /// `prop value -> highlight`, rewritten on every filter application.
    pub highlight: BTreeMap<String, HighlightData>,
}

impl PropEntry {
    /// The `(low, high)` bounds of the entry's values under its declared type.
    pub fn bounds(&self) -> Option<(&str, &str)> {
        let mut iter = self.values.iter().map(String::as_str);
        let first = iter.next()?;
        let (mut lo, mut hi) = (first, first);
        for v in iter {
            if compare_values(v, lo, self.value_type) == Ordering::Less {
                lo = v;
            }
            if compare_values(v, hi, self.value_type) == Ordering::Greater {
                hi = v;
            }
        }
        Some((lo, hi))
    }
}

/// The property bag of one item: normalized key -> entry.
///
/// A missing key means the item carries no value for it; filters treat that as "no constraint".
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemProps {
    entries: BTreeMap<String, PropEntry>,
}

impl ItemProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bag from raw fields. Keys are normalized and blank values skipped.
    pub fn from_fields(fields: impl IntoIterator<Item = PropField>) -> Self {
        let mut props = Self::new();
        for field in fields {
            props.insert(field);
        }
        props
    }

    pub fn insert(&mut self, field: PropField) {
        let key = normalize_key(&field.key);
        let value = field.value.trim();
        if key.is_empty() || value.is_empty() {
            return;
        }
        let entry = self.entries.entry(key).or_default();
        entry.values.insert(value.to_owned());
        if field.value_type.is_some() {
            entry.value_type = field.value_type;
        }
        if field.range.is_some() {
            entry.range = field.range;
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries for the given keys, in key order, skipping keys the item does not carry.
    pub fn entries_for<'a>(
        &'a self,
        keys: &'a [String],
    ) -> impl Iterator<Item = (&'a str, &'a PropEntry)> + 'a {
        keys.iter()
            .filter_map(|k| self.entries.get(k).map(|e| (k.as_str(), e)))
    }

    /// Replaces all highlight data with `highlights` (`key -> value -> data`).
    pub fn set_highlights(&mut self, mut highlights: BTreeMap<String, BTreeMap<String, HighlightData>>) {
        for (key, entry) in self.entries.iter_mut() {
            entry.highlight = highlights.remove(key).unwrap_or_default();
        }
    }

    pub fn has_highlights(&self) -> bool {
        self.entries.values().any(|e| !e.highlight.is_empty())
    }
}
