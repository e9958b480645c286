use std::sync::Arc;

use cmslist::{
    CollectionList, FilterRegistry, Item, ItemId, ItemProps, ListCounts, NewItem, PageState,
    Placement, RenderState, SortDirection, query,
};
use parking_lot::{Mutex, RwLock};

use crate::{AnimationOptions, Animator, ListDom, NoAnimation, OpQueue, RenderTracker};

pub(crate) struct ListState<E> {
    pub(crate) list: CollectionList<E>,
    pub(crate) tracker: RenderTracker,
}

pub(crate) struct ListInner<D: ListDom, A> {
    pub(crate) dom: D,
    pub(crate) animator: A,
    pub(crate) animation: AnimationOptions,
    pub(crate) state: Mutex<ListState<D::Element>>,
    pub(crate) filters: Mutex<Option<Arc<RwLock<FilterRegistry>>>>,
    pub(crate) queue: OpQueue,
}

/// A framework-neutral controller that owns one [`CollectionList`] and the DOM subtree it
/// renders into.
///
/// Every state-mutating operation enters the list's [`OpQueue`] and resolves only after its
/// render (animations included) settled. Queries are synchronous snapshots and never wait.
///
/// Cloning is cheap; clones share the same list.
pub struct ListController<D: ListDom, A = NoAnimation> {
    pub(crate) inner: Arc<ListInner<D, A>>,
}

impl<D: ListDom, A> Clone for ListController<D, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: ListDom> ListController<D, NoAnimation> {
    /// A controller that renders without animations.
    pub fn without_animations(dom: D, list: CollectionList<D::Element>) -> Self {
        Self::new(dom, NoAnimation, AnimationOptions::disabled(), list)
    }
}

impl<D: ListDom, A: Animator<D::Element>> ListController<D, A> {
    pub fn new(
        dom: D,
        animator: A,
        animation: AnimationOptions,
        list: CollectionList<D::Element>,
    ) -> Self {
        Self {
            inner: Arc::new(ListInner {
                dom,
                animator,
                animation,
                state: Mutex::new(ListState {
                    list,
                    tracker: RenderTracker::default(),
                }),
                filters: Mutex::new(None),
                queue: OpQueue::new(),
            }),
        }
    }

    pub fn dom(&self) -> &D {
        &self.inner.dom
    }

    pub fn queue(&self) -> &OpQueue {
        &self.inner.queue
    }

    pub(crate) fn attach_filters(&self, registry: Arc<RwLock<FilterRegistry>>) {
        *self.inner.filters.lock() = Some(registry);
    }

    pub(crate) fn filters(&self) -> Option<Arc<RwLock<FilterRegistry>>> {
        self.inner.filters.lock().clone()
    }

    /// Runs `f` against the current list state.
    ///
    /// The state lock is held for the duration of `f`; do not call back into the controller.
    pub fn read<R>(&self, f: impl FnOnce(&CollectionList<D::Element>) -> R) -> R {
        f(&self.inner.state.lock().list)
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut CollectionList<D::Element>) -> R) -> R {
        f(&mut self.inner.state.lock().list)
    }

    pub fn get_attribute(&self, key: &str) -> Option<String> {
        self.read(|list| list.get_attribute(key).map(str::to_owned))
    }

    pub fn get_instance_index(&self, key: &str) -> Option<usize> {
        self.read(|list| list.get_instance_index(key))
    }

    pub fn instance_id(&self) -> String {
        self.read(|list| list.options().instance_id.clone())
    }

    /// Items in working order.
    pub fn items(&self) -> Vec<Item<D::Element>> {
        self.read(|list| list.items().to_vec())
    }

    /// Valid items in working order.
    pub fn valid_items(&self) -> Vec<Item<D::Element>> {
        self.read(|list| list.store().valid_items().cloned().collect())
    }

    pub fn page_state(&self) -> PageState {
        self.read(CollectionList::page_state)
    }

    pub fn counts(&self) -> ListCounts {
        self.read(CollectionList::counts)
    }

    /// The mounted sequence left by the last settled render.
    pub fn rendered_ids(&self) -> Vec<ItemId> {
        self.inner.state.lock().tracker.mounted().to_vec()
    }

    pub fn render_state(&self, id: ItemId) -> RenderState {
        self.inner.state.lock().tracker.state(id)
    }

    /// Wraps `elements`, collects their properties, stores them and renders.
    ///
    /// Elements whose markup cannot be read are stored with empty properties.
    pub async fn add_items(&self, elements: Vec<D::Element>, placement: Placement) -> Vec<ItemId> {
        self.inner
            .queue
            .run("add_items", async {
                let ids = self.add_items_unqueued(elements, placement);
                self.render_unqueued(true, false).await;
                ids
            })
            .await
    }

    fn add_items_unqueued(&self, elements: Vec<D::Element>, placement: Placement) -> Vec<ItemId> {
        let dom = &self.inner.dom;
        let keys = self.read(|list| list.options().field_keys.clone());
        let batch: Vec<NewItem<D::Element>> = elements
            .into_iter()
            .map(|element| {
                let props = match dom.collect_props(&element, &keys) {
                    Ok(fields) => ItemProps::from_fields(fields),
                    Err(err) => {
                        lwarn!(error = %err, "ListController: unreadable item markup");
                        ItemProps::new()
                    }
                };
                let href = dom.item_href(&element);
                let mut item = NewItem::new(element, props);
                item.href = href;
                item
            })
            .collect();

        let filters = self.filters();
        let registry = filters.as_ref().map(|f| f.read());
        let ids = self.write(|list| list.add_items(batch, placement, registry.as_deref()));
        drop(registry);

        if let Some(filters) = filters {
            let props: Vec<ItemProps> = self.read(|list| {
                list.items().iter().map(|item| item.props().clone()).collect()
            });
            filters.write().update_results_counts(props.iter());
        }
        ldebug!(added = ids.len(), ?placement, "ListController::add_items");
        ids
    }

    /// Empties the list. With `remove_from_dom`, every stored element is detached too.
    pub async fn clear_items(&self, remove_from_dom: bool) {
        self.inner
            .queue
            .run("clear_items", async {
                self.clear_items_unqueued(remove_from_dom);
                self.sync_ui();
            })
            .await
    }

    fn clear_items_unqueued(&self, remove_from_dom: bool) {
        let removed = {
            let mut state = self.inner.state.lock();
            state.tracker.clear();
            state.list.clear_items()
        };
        if remove_from_dom {
            for item in &removed {
                self.inner.dom.unmount(item.element());
            }
        }
        ldebug!(removed = removed.len(), remove_from_dom, "ListController::clear_items");
    }

    /// Detaches every item and appends the elements `build` derives from them, as one queued
    /// operation. Returns no ids and leaves the list untouched when `build` yields `None`.
    pub async fn replace_items<F>(&self, build: F) -> Vec<ItemId>
    where
        F: FnOnce(&[Item<D::Element>]) -> Option<Vec<D::Element>>,
    {
        self.inner
            .queue
            .run("replace_items", async {
                let Some(elements) = self.read(|list| build(list.items())) else {
                    return Vec::new();
                };
                self.clear_items_unqueued(true);
                let ids = self.add_items_unqueued(elements, Placement::Append);
                self.render_unqueued(true, false).await;
                ids
            })
            .await
    }

    /// Working order := canonical order. Does not render.
    pub async fn restore_items_order(&self) {
        self.inner
            .queue
            .run("restore_items_order", async {
                self.write(CollectionList::restore_items_order);
            })
            .await
    }

    /// Sorts the working order by a property and renders.
    pub async fn sort_items(&self, key: &str, direction: SortDirection) {
        self.inner
            .queue
            .run("sort_items", async {
                self.write(|list| list.sort_items(key, direction));
                self.render_unqueued(true, false).await;
            })
            .await
    }

    /// Reconciles the DOM with the current state. Resolves once every animation settled.
    pub async fn render_items(&self, animate_items: bool, animate_list: bool) -> crate::RenderCycle {
        self.inner
            .queue
            .run("render_items", self.render_unqueued(animate_items, animate_list))
            .await
    }

    /// Switches to `target` (clamped). With `rerender`, resolves after the render settled;
    /// switching to the current page is then a no-op.
    pub async fn switch_page(&self, target: usize, rerender: bool) {
        self.switch_page_with("switch_page", |_| target, rerender).await
    }

    /// Moves one page forward. The target is resolved once the queue reaches this call, so
    /// repeated clicks behind a pending operation each advance a page.
    pub async fn next_page(&self) {
        self.switch_page_with("next_page", |current| current + 1, true).await
    }

    pub async fn previous_page(&self) {
        self.switch_page_with(
            "previous_page",
            |current| current.saturating_sub(1).max(1),
            true,
        )
        .await
    }

    async fn switch_page_with(
        &self,
        name: &'static str,
        resolve: impl FnOnce(usize) -> usize,
        rerender: bool,
    ) {
        self.inner
            .queue
            .run(name, async {
                let change = self.write(|list| {
                    let target = resolve(list.page_state().current_page);
                    list.switch_page(target)
                });
                if !change.changed() {
                    ltrace!(page = change.to, "ListController::switch_page: unchanged");
                    return;
                }
                self.write_page_query(change.to);
                if rerender {
                    self.render_unqueued(true, false).await;
                    if self.read(|list| list.options().scroll_on_page_change) {
                        self.inner.dom.scroll_to_anchor();
                    }
                }
            })
            .await
    }

    /// Scrolls to the list's anchor once every queued operation settled.
    pub async fn scroll_to_anchor(&self) {
        self.inner.queue.settled().await;
        self.inner.dom.scroll_to_anchor();
    }

    /// Resolves once every operation queued so far has settled.
    pub async fn settled(&self) {
        self.inner.queue.settled().await;
    }

    pub(crate) fn write_page_query(&self, page: usize) {
        let (show, instance) = self.read(|list| {
            (
                list.options().show_pagination_query,
                list.options().instance_id.clone(),
            )
        });
        if !show {
            return;
        }
        let key = query::pages_query_key(&instance);
        let value = (page > 1).then(|| page.to_string());
        self.inner.dom.write_query_param(&key, value.as_deref());
    }
}
