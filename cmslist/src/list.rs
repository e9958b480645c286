use std::collections::{HashMap, HashSet};

use crate::{
    FilterRegistry, Item, ItemId, ItemStore, ListAttributes, ListCounts, ListOptions, NewItem,
    PageChange, PageSlice, PageState, Pagination, Placement, SortDirection,
};

/// What a filter application changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Items whose validity flipped.
    pub changed: usize,
    pub valid: usize,
}

/// The headless state of one collection list: store, validity and pagination.
///
/// This type is intentionally UI-agnostic:
/// - It never touches the DOM; it only answers "which items belong on screen, in which order".
/// - Mutations are synchronous. Serializing them against rendering is the adapter's job.
/// - Filters are evaluated through a borrowed [`FilterRegistry`]; the list never owns them.
#[derive(Clone, Debug)]
pub struct CollectionList<E> {
    options: ListOptions,
    attributes: ListAttributes,
    store: ItemStore<E>,
    pagination: Pagination,
    filters_active: bool,
}

impl<E> CollectionList<E> {
    pub fn new(options: ListOptions) -> Self {
        Self::with_attributes(options, ListAttributes::new())
    }

    /// Builds the list from the host element's attributes (see [`ListOptions::from_attributes`]).
    pub fn from_attributes(attributes: ListAttributes) -> Self {
        let options = ListOptions::from_attributes(&attributes);
        Self::with_attributes(options, attributes)
    }

    pub fn with_attributes(options: ListOptions, attributes: ListAttributes) -> Self {
        ldebug!(
            instance = %options.instance_id,
            items_per_page = ?options.items_per_page,
            mode = ?options.pagination_mode,
            "CollectionList::new"
        );
        Self {
            pagination: Pagination::new(options.items_per_page, options.pagination_mode),
            options,
            attributes,
            store: ItemStore::new(),
            filters_active: false,
        }
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    pub fn store(&self) -> &ItemStore<E> {
        &self.store
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get_attribute(key)
    }

    pub fn get_instance_index(&self, key: &str) -> Option<usize> {
        self.attributes.get_instance_index(key)
    }

    /// Items in working order.
    pub fn items(&self) -> &[Item<E>] {
        self.store.items()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item<E>> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn valid_ids(&self) -> Vec<ItemId> {
        self.store.valid_ids()
    }

    pub fn valid_count(&self) -> usize {
        self.store.valid_count()
    }

    pub fn filters_active(&self) -> bool {
        self.filters_active
    }

    /// Stores a batch and refreshes validity (when filters are attached) and page totals.
    pub fn add_items(
        &mut self,
        batch: Vec<NewItem<E>>,
        placement: Placement,
        filters: Option<&FilterRegistry>,
    ) -> Vec<ItemId> {
        let ids = self.store.add_items(batch, placement);
        match filters {
            Some(filters) => {
                self.apply_filters(filters);
            }
            None => self.pagination.update_total(self.store.valid_count()),
        }
        ids
    }

    /// Empties the list and resets the page state to its baseline (page 1 of 0).
    pub fn clear_items(&mut self) -> Vec<Item<E>> {
        let removed = self.store.clear();
        self.pagination.reset();
        removed
    }

    pub fn restore_items_order(&mut self) {
        self.store.restore_original_order();
    }

    pub fn sort_items(&mut self, key: &str, direction: SortDirection) {
        self.store
            .sort_by_prop(&crate::props::normalize_key(key), direction);
    }

    /// Recomputes validity and highlights for every item, then page totals.
    pub fn apply_filters(&mut self, filters: &FilterRegistry) -> FilterOutcome {
        let changed = self
            .store
            .recompute_validity(|props| filters.compute_validity(props));
        for item in self.store.iter_mut() {
            let highlights = filters.compute_highlights(&item.props);
            item.props.set_highlights(highlights);
        }
        self.filters_active = filters.filters_active();
        let valid = self.store.valid_count();
        self.pagination.update_total(valid);
        ldebug!(
            changed,
            valid,
            total = self.store.len(),
            "CollectionList::apply_filters"
        );
        FilterOutcome { changed, valid }
    }

    pub fn page_slice(&self) -> PageSlice {
        self.pagination.slice(self.store.valid_count())
    }

    /// The ids that belong on screen, in render order: valid items of the working order,
    /// restricted to the current page slice.
    pub fn target_ids(&self) -> Vec<ItemId> {
        let valid = self.store.valid_ids();
        let slice = self.pagination.slice(valid.len());
        valid[slice.start..slice.end].to_vec()
    }

    pub fn switch_page(&mut self, target: usize) -> PageChange {
        self.pagination.update_total(self.store.valid_count());
        self.pagination.switch_page(target)
    }

    /// Records the rendered sequence: `current_index` for rendered items, `None` for the rest.
    /// Rendered items no longer need a host restart.
    pub fn set_rendered(&mut self, rendered: &[ItemId]) {
        let positions: HashMap<ItemId, usize> =
            rendered.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        for item in self.store.iter_mut() {
            item.current_index = positions.get(&item.id).copied();
            if item.current_index.is_some() {
                item.needs_restart = false;
            }
        }
    }

    pub fn page_state(&self) -> PageState {
        PageState {
            current_page: self.pagination.current_page(),
            total_pages: self.pagination.total_pages(),
            items_per_page: self.pagination.items_per_page(),
            mode: self.pagination.mode(),
        }
    }

    pub fn counts(&self) -> ListCounts {
        ListCounts {
            items: self.store.len(),
            valid: self.store.valid_count(),
            rendered: self
                .store
                .items()
                .iter()
                .filter(|i| i.current_index.is_some())
                .count(),
        }
    }

    /// Checks `rendered ⊆ valid ⊆ all` by item identity.
    pub fn is_consistent(&self, rendered: &[ItemId]) -> bool {
        let valid: HashSet<ItemId> = self.store.valid_ids().into_iter().collect();
        rendered.iter().all(|id| valid.contains(id))
            && valid.iter().all(|&id| self.store.get(id).is_some())
    }
}
