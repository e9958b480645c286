//! A headless collection list engine.
//!
//! For async orchestration (serialized operations, DOM reconciliation, animations), see the
//! `cmslist-adapter` crate.
//!
//! This crate focuses on the state that decides what a filterable, paginated list shows:
//! the canonical item store, per-item property bags, the filter predicate, and page math.
//!
//! It is UI-agnostic. A host layer is expected to provide:
//! - element handles (any `E`) and the properties read from their markup
//! - filter definitions and control interactions
//! - a renderer that mounts the ids returned by [`CollectionList::target_ids`]
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

pub mod filters;
mod item;
mod list;
mod options;
pub mod pagination;
mod props;
pub mod query;
mod state;
mod store;
mod types;


pub use filters::{
    ControlInput, ControlKind, FilterControl, FilterDefinition, FilterRegistry, FilterTag,
    TagFormat,
};
pub use item::{Item, NewItem, RenderState};
pub use list::{CollectionList, FilterOutcome};
pub use options::{FieldKeys, FiltersOptions, ListAttributes, ListOptions, RestartFlags, attr};
pub use pagination::Pagination;
pub use props::{
    HighlightData, ItemProps, PropEntry, PropField, compare_values, normalize_key, parse_date,
    split_keys,
};
pub use query::QueryState;
pub use state::{FiltersSnapshot, ListCounts, PageState};
pub use store::ItemStore;
pub use types::{
    FilterMode, ItemId, MatchRule, PageChange, PageSlice, PaginationMode, Placement, RangeTag,
    SortDirection, ValueType,
};
