use std::collections::BTreeSet;
use std::sync::Arc;

use cmslist::{
    ControlInput, FilterControl, FilterRegistry, FilterTag, FiltersOptions, FiltersSnapshot,
    ItemProps, QueryState, query,
};
use parking_lot::RwLock;

use crate::{Animator, FiltersDom, ListController, ListDom};

struct FiltersInner<D: ListDom, A, F> {
    list: ListController<D, A>,
    registry: Arc<RwLock<FilterRegistry>>,
    dom: F,
    options: FiltersOptions,
}

/// Drives one [`FilterRegistry`] against exactly one list.
///
/// Every operation that changes active values enters the list's queue, so a filter change
/// never interleaves with an add, clear or page switch on the same list.
pub struct FiltersController<D: ListDom, A, F = ()> {
    inner: Arc<FiltersInner<D, A, F>>,
}

impl<D: ListDom, A, F> Clone for FiltersController<D, A, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D, A, F> FiltersController<D, A, F>
where
    D: ListDom,
    A: Animator<D::Element>,
    F: FiltersDom,
{
    /// Attaches `registry` to `list`. Items added to the list from now on are filtered on entry.
    pub fn new(
        list: ListController<D, A>,
        registry: FilterRegistry,
        dom: F,
        options: FiltersOptions,
    ) -> Self {
        let registry = Arc::new(RwLock::new(
            registry
                .with_highlight_all(options.highlight_all)
                .with_highlight_class(options.highlight_class.clone()),
        ));
        list.attach_filters(Arc::clone(&registry));
        Self {
            inner: Arc::new(FiltersInner {
                list,
                registry,
                dom,
                options,
            }),
        }
    }

    pub fn list(&self) -> &ListController<D, A> {
        &self.inner.list
    }

    pub fn dom(&self) -> &F {
        &self.inner.dom
    }

    pub fn options(&self) -> &FiltersOptions {
        &self.inner.options
    }

    /// Runs `f` against the registry.
    pub fn read<R>(&self, f: impl FnOnce(&FilterRegistry) -> R) -> R {
        f(&self.inner.registry.read())
    }

    pub fn filters_active(&self) -> bool {
        self.read(FilterRegistry::filters_active)
    }

    /// An immutable snapshot of every filter; later changes do not affect it.
    pub fn store_filters_data(&self) -> FiltersSnapshot {
        self.read(FilterRegistry::store_filters_data)
    }

    pub fn tags(&self) -> Vec<FilterTag> {
        self.read(FilterRegistry::tags)
    }

    /// Replaces the active values of every filter inspecting `filter_key`, then applies.
    ///
    /// Returns `false` (and renders nothing) for unknown keys or unchanged values.
    pub async fn set_active_values<I, S>(&self, filter_key: &str, values: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.inner
            .list
            .queue()
            .run("set_active_values", async {
                let changed = self
                    .inner
                    .registry
                    .write()
                    .set_active_values(filter_key, values);
                if changed {
                    self.apply_unqueued(false, true).await;
                }
                changed
            })
            .await
    }

    /// Applies one control interaction and re-filters when it changed anything.
    pub async fn handle_control_change(
        &self,
        filter_index: usize,
        control_index: usize,
        input: ControlInput,
    ) -> bool {
        self.inner
            .list
            .queue()
            .run("handle_control_change", async {
                let changed = self.inner.registry.write().handle_control_change(
                    filter_index,
                    control_index,
                    input,
                );
                if changed {
                    self.apply_unqueued(false, true).await;
                }
                changed
            })
            .await
    }

    /// Clears the given filters (all with `None`); with `value`, only that value.
    pub async fn reset_filters(&self, filter_keys: Option<&[&str]>, value: Option<&str>) -> bool {
        self.inner
            .list
            .queue()
            .run("reset_filters", async {
                let changed = self.inner.registry.write().reset_filters(filter_keys, value);
                if changed {
                    self.apply_unqueued(false, true).await;
                }
                changed
            })
            .await
    }

    /// Recomputes validity for every item and renders.
    ///
    /// With `adding_items`, the page is kept and rendering is left to the caller that is
    /// adding items.
    pub async fn apply_filters(&self, adding_items: bool, sync_tags: bool) {
        self.inner
            .list
            .queue()
            .run("apply_filters", self.apply_unqueued(adding_items, sync_tags))
            .await
    }

    /// Appends controls (e.g. one checkbox per feed category) to the filter inspecting
    /// `filter_key` and syncs the form.
    pub async fn add_controls(
        &self,
        filter_key: &str,
        controls: impl IntoIterator<Item = FilterControl>,
    ) -> bool {
        let controls: Vec<FilterControl> = controls.into_iter().collect();
        self.inner
            .list
            .queue()
            .run("add_controls", async {
                let added = self.inner.registry.write().add_controls(filter_key, controls);
                if added {
                    self.refresh_counts();
                    self.sync_form(false);
                } else {
                    lwarn!(filter_key, "FiltersController: no filter to attach controls to");
                }
                added
            })
            .await
    }

    /// The current page and active values as a query state.
    pub fn query_state(&self) -> QueryState {
        QueryState {
            page: Some(self.inner.list.page_state().current_page),
            filters: self.store_filters_data().query_values(),
        }
    }

    /// Restores active values and page from a query string written by this list.
    pub async fn apply_query(&self, raw_query: &str) {
        let instance = self.inner.list.instance_id();
        self.inner
            .list
            .queue()
            .run("apply_query", async {
                let state = {
                    let registry = self.inner.registry.read();
                    let keys = registry
                        .filters()
                        .iter()
                        .flat_map(|filter| filter.filter_keys())
                        .map(String::as_str);
                    QueryState::decode(raw_query, &instance, keys)
                };
                ldebug!(
                    filters = state.filters.len(),
                    page = ?state.page,
                    "FiltersController::apply_query"
                );
                let mut changed = false;
                {
                    let mut registry = self.inner.registry.write();
                    for (key, values) in &state.filters {
                        changed |= registry.set_active_values(key, values.iter().cloned());
                    }
                }
                if changed {
                    self.apply_unqueued(false, true).await;
                }
                if let Some(page) = state.page {
                    let change = self.inner.list.write(|list| list.switch_page(page));
                    if change.changed() {
                        self.inner.list.write_page_query(change.to);
                        self.inner.list.render_unqueued(true, false).await;
                    }
                }
            })
            .await
    }

    async fn apply_unqueued(&self, adding_items: bool, sync_tags: bool) {
        let list = &self.inner.list;
        let outcome = {
            let registry = self.inner.registry.read();
            list.write(|state| {
                let outcome = state.apply_filters(&registry);
                if !adding_items {
                    state.switch_page(1);
                }
                outcome
            })
        };
        self.refresh_counts();
        self.sync_form(sync_tags);
        self.inner.dom.set_results_count(outcome.valid);
        if self.inner.options.show_query_params {
            self.write_filter_query();
            if !adding_items {
                list.write_page_query(1);
            }
        }
        ldebug!(
            changed = outcome.changed,
            valid = outcome.valid,
            adding_items,
            "FiltersController: filters applied"
        );
        if !adding_items {
            list.render_unqueued(true, false).await;
        }
    }

    fn refresh_counts(&self) {
        let props: Vec<ItemProps> = self.inner.list.read(|list| {
            list.items().iter().map(|item| item.props().clone()).collect()
        });
        self.inner
            .registry
            .write()
            .update_results_counts(props.iter());
    }

    fn sync_form(&self, sync_tags: bool) {
        let registry = self.inner.registry.read();
        let dom = &self.inner.dom;
        for (filter_index, filter) in registry.filters().iter().enumerate() {
            for (control_index, control) in filter.controls().iter().enumerate() {
                dom.sync_control(
                    filter_index,
                    control_index,
                    control,
                    &self.inner.options.active_class,
                );
            }
        }
        if sync_tags {
            dom.sync_tags(&registry.tags());
        }
    }

    fn write_filter_query(&self) {
        let instance = self.inner.list.instance_id();
        let snapshot = self.store_filters_data();
        let values = snapshot.query_values();
        let keys: BTreeSet<&String> = snapshot
            .filters
            .iter()
            .filter_map(|f| f.filter_keys().first())
            .collect();
        let dom = self.inner.list.dom();
        for key in keys {
            let joined = values.get(key).map(|v| v.join(","));
            dom.write_query_param(
                &query::filter_query_key(&instance, key),
                joined.as_deref().filter(|v| !v.is_empty()),
            );
        }
    }
}
