/// Stable identity of an item inside one list instance.
///
/// Ids are assigned by the store in creation order and never reused, so they stay valid keys
/// across sorting, pagination and re-renders.
pub type ItemId = u64;

/// Where a batch of new items is inserted in the canonical order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Placement {
    #[default]
    Append,
    Prepend,
}

/// How the active values of one filter combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchRule {
    /// The item passes when any active value matches.
    #[default]
    Any,
    /// The item passes only when every active value matches.
    All,
}

impl MatchRule {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "any" => Some(Self::Any),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterMode {
    /// Values are compared as a `from`/`to` interval instead of by equality.
    Range,
}

impl FilterMode {
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .eq_ignore_ascii_case("range")
            .then_some(Self::Range)
    }
}

/// Marks a value as the lower or upper bound of an interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeTag {
    From,
    To,
}

impl RangeTag {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "from" => Some(Self::From),
            "to" => Some(Self::To),
            _ => None,
        }
    }
}

/// The declared type of a property value, used for range comparisons and sorting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    #[default]
    Text,
    Number,
    /// Calendar dates (`2024-09-15`, RFC 3339, `September 15, 2024`), compared by day.
    Date,
}

impl ValueType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// How pages are turned into the rendered slice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaginationMode {
    /// Only the current page is rendered.
    #[default]
    Paginate,
    /// Pages `1..=current` are rendered together ("load more").
    LoadMore,
}

impl PaginationMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pagination" | "paginate" => Some(Self::Paginate),
            "more" | "load-more" | "load-under" => Some(Self::LoadMore),
            _ => None,
        }
    }
}

/// The window of the valid sequence that belongs to the current page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageSlice {
    pub start: usize,
    pub end: usize, // exclusive
    pub page: usize,
    pub total_pages: usize,
}

impl PageSlice {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Result of a page switch request after clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageChange {
    pub from: usize,
    pub to: usize,
}

impl PageChange {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}
