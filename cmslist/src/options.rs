use std::collections::BTreeMap;

use crate::PaginationMode;

/// Attribute names read from the list wrapper and list elements.
pub mod attr {
    pub const ITEMS_PER_PAGE: &str = "fs-cmsload-items";
    pub const MODE: &str = "fs-cmsload-mode";
    pub const SHOW_QUERY: &str = "fs-cmsload-showquery";
    pub const INSTANCE: &str = "fs-cmsload-instance";
    pub const SCROLL_ANCHOR: &str = "fs-cmsload-scroll";
    pub const RESTART_WEBFLOW: &str = "fs-cmsload-resetix";
    pub const RESTART_IX: &str = "fs-cmsload-restartix";
    pub const RESTART_COMMERCE: &str = "fs-cmsload-restartcommerce";
    pub const RESTART_LIGHTBOX: &str = "fs-cmsload-restartlightbox";
    pub const RESTART_SLIDERS: &str = "fs-cmsload-restartsliders";
    pub const RESTART_TABS: &str = "fs-cmsload-restarttabs";
    pub const FILTER_ELEMENT: &str = "fs-cmsfilter-element";
    pub const FIELD_TYPE: &str = "fs-cmsfilter-type";
    pub const FIELD_RANGE: &str = "fs-cmsfilter-range";
}

/// The attributes present on a list's wrapper/list elements, as read by the host.
///
/// Read-only: queries never mutate list state and are safe to call at any time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListAttributes {
    values: BTreeMap<String, String>,
}

impl ListAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn flag(&self, key: &str) -> bool {
        self.get_attribute(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// The instance number encoded in an attribute value: `list-2` -> `Some(2)`.
    pub fn get_instance_index(&self, key: &str) -> Option<usize> {
        let value = self.get_attribute(key)?;
        let (_, suffix) = value.trim().rsplit_once('-')?;
        suffix.parse().ok()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ListAttributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Host modules that must be restarted after new items are mounted.
///
/// The engine only forwards these; it never interprets them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestartFlags {
    pub webflow: bool,
    pub ix: bool,
    pub commerce: bool,
    pub lightbox: bool,
    pub sliders: bool,
    pub tabs: bool,
}

impl RestartFlags {
    pub fn any(&self) -> bool {
        self.webflow || self.ix || self.commerce || self.lightbox || self.sliders || self.tabs
    }

    /// A full restart implies every module.
    pub fn resolved(self) -> Self {
        if self.webflow {
            Self {
                webflow: true,
                ix: true,
                commerce: true,
                lightbox: true,
                sliders: true,
                tabs: true,
            }
        } else {
            self
        }
    }
}

/// Attribute keys used to collect item properties from markup.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldKeys {
    pub field_key: String,
    pub type_key: Option<String>,
    pub range_key: Option<String>,
}

impl Default for FieldKeys {
    fn default() -> Self {
        Self {
            field_key: "fs-cmsfilter-field".to_owned(),
            type_key: Some("fs-cmsfilter-type".to_owned()),
            range_key: Some("fs-cmsfilter-range".to_owned()),
        }
    }
}

/// Configuration for one list instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListOptions {
    /// Scopes query-param keys; unique per list on a page.
    pub instance_id: String,
    /// `None` disables pagination.
    pub items_per_page: Option<usize>,
    pub pagination_mode: PaginationMode,
    pub show_pagination_query: bool,
    /// Scroll to the anchor element after a page switch settles.
    pub scroll_on_page_change: bool,
    pub restart: RestartFlags,
    pub field_keys: FieldKeys,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::new("list")
    }
}

impl ListOptions {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            items_per_page: None,
            pagination_mode: PaginationMode::Paginate,
            show_pagination_query: false,
            scroll_on_page_change: false,
            restart: RestartFlags::default(),
            field_keys: FieldKeys::default(),
        }
    }

    /// Reads the `fs-cmsload-*` attributes; unknown or malformed values keep the defaults.
    pub fn from_attributes(attributes: &ListAttributes) -> Self {
        let instance_id = attributes
            .get_attribute(attr::INSTANCE)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("list");
        let mut options = Self::new(instance_id);
        options.items_per_page = attributes
            .get_attribute(attr::ITEMS_PER_PAGE)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0);
        if let Some(mode) = attributes
            .get_attribute(attr::MODE)
            .and_then(PaginationMode::parse)
        {
            options.pagination_mode = mode;
        }
        options.show_pagination_query = attributes.flag(attr::SHOW_QUERY);
        options.scroll_on_page_change = attributes.flag(attr::SCROLL_ANCHOR);
        options.restart = RestartFlags {
            webflow: attributes.flag(attr::RESTART_WEBFLOW),
            ix: attributes.flag(attr::RESTART_IX),
            commerce: attributes.flag(attr::RESTART_COMMERCE),
            lightbox: attributes.flag(attr::RESTART_LIGHTBOX),
            sliders: attributes.flag(attr::RESTART_SLIDERS),
            tabs: attributes.flag(attr::RESTART_TABS),
        };
        options
    }

    pub fn with_items_per_page(mut self, items_per_page: Option<usize>) -> Self {
        self.items_per_page = items_per_page;
        self
    }

    pub fn with_pagination_mode(mut self, mode: PaginationMode) -> Self {
        self.pagination_mode = mode;
        self
    }

    pub fn with_show_pagination_query(mut self, show: bool) -> Self {
        self.show_pagination_query = show;
        self
    }

    pub fn with_scroll_on_page_change(mut self, scroll: bool) -> Self {
        self.scroll_on_page_change = scroll;
        self
    }

    pub fn with_restart(mut self, restart: RestartFlags) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_field_keys(mut self, field_keys: FieldKeys) -> Self {
        self.field_keys = field_keys;
        self
    }
}

/// Configuration for one filters instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FiltersOptions {
    pub highlight_all: bool,
    pub highlight_class: String,
    pub active_class: String,
    pub show_query_params: bool,
}

impl Default for FiltersOptions {
    fn default() -> Self {
        Self {
            highlight_all: false,
            highlight_class: crate::filters::DEFAULT_HIGHLIGHT_CLASS.to_owned(),
            active_class: "fs-cmsfilter_active".to_owned(),
            show_query_params: false,
        }
    }
}

impl FiltersOptions {
    pub fn with_highlight_all(mut self, highlight_all: bool) -> Self {
        self.highlight_all = highlight_all;
        self
    }

    pub fn with_highlight_class(mut self, class: impl Into<String>) -> Self {
        self.highlight_class = class.into();
        self
    }

    pub fn with_active_class(mut self, class: impl Into<String>) -> Self {
        self.active_class = class.into();
        self
    }

    pub fn with_show_query_params(mut self, show: bool) -> Self {
        self.show_query_params = show;
        self
    }
}
