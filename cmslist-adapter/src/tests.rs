use crate::*;

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use cmslist::{
    CollectionList, ControlInput, FieldKeys, FilterControl, FilterDefinition, FilterMode,
    FilterRegistry, FiltersOptions, ItemId, ListOptions, PaginationMode, Placement, PropField,
    RangeTag, RenderState, RestartFlags, SortDirection, ValueType,
};
use parking_lot::Mutex;

use crate::feed::{
    collect_categories, fetch_or_empty, parse_products, populate_category_filters,
    populate_from_feed,
};

#[derive(Clone, Debug, PartialEq, Eq)]
struct El {
    name: String,
    fields: Vec<(String, String)>,
    broken: bool,
}

fn el(name: &str, fields: &[(&str, &str)]) -> El {
    El {
        name: name.to_owned(),
        fields: fields
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
        broken: false,
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Event {
    Mount(String, usize),
    Unmount(String),
    Display(DisplayKey, bool),
    Text(TextKey, String),
    AnimStart(String, Phase),
    AnimEnd(String, Phase),
    Opacity(f32),
    Query(String, Option<String>),
    Restart(RestartFlags),
    Scroll,
    Control(usize, usize, bool),
    ResultsCount(usize),
    Tags(Vec<String>),
}

#[derive(Default)]
struct MockDom {
    elements: HashSet<DisplayKey>,
    log: Mutex<Vec<Event>>,
}

impl MockDom {
    fn with_elements(keys: &[DisplayKey]) -> Arc<Self> {
        Arc::new(Self {
            elements: keys.iter().copied().collect(),
            log: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, event: Event) {
        self.log.lock().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.log.lock().clone()
    }

    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.log.lock())
    }

    fn last_text(&self, key: TextKey) -> Option<String> {
        self.log.lock().iter().rev().find_map(|e| match e {
            Event::Text(k, text) if *k == key => Some(text.clone()),
            _ => None,
        })
    }

    fn last_display(&self, key: DisplayKey) -> Option<bool> {
        self.log.lock().iter().rev().find_map(|e| match e {
            Event::Display(k, show) if *k == key => Some(*show),
            _ => None,
        })
    }
}

impl ListDom for MockDom {
    type Element = El;

    fn collect_props(&self, element: &El, _keys: &FieldKeys) -> Result<Vec<PropField>, MarkupError> {
        if element.broken {
            return Err(MarkupError::MissingMarker("fs-cmsfilter-field".to_owned()));
        }
        // `key:type` carries a field type, as `fs-cmsfilter-type` would.
        element
            .fields
            .iter()
            .map(|(k, v)| match k.split_once(':') {
                Some((key, ty)) => read_field(key, v, Some(ty), None),
                None => Ok(PropField::new(k.clone(), v.clone())),
            })
            .collect()
    }

    fn mount(&self, element: &El, index: usize) {
        self.push(Event::Mount(element.name.clone(), index));
    }

    fn unmount(&self, element: &El) {
        self.push(Event::Unmount(element.name.clone()));
    }

    fn has_element(&self, key: DisplayKey) -> bool {
        self.elements.contains(&key)
    }

    fn set_display(&self, key: DisplayKey, show: bool) {
        self.push(Event::Display(key, show));
    }

    fn set_text(&self, key: TextKey, text: &str) {
        self.push(Event::Text(key, text.to_owned()));
    }

    fn set_opacity(&self, _target: AnimationTarget<'_, El>, opacity: f32) {
        self.push(Event::Opacity(opacity));
    }

    fn scroll_to_anchor(&self) {
        self.push(Event::Scroll);
    }

    fn write_query_param(&self, key: &str, value: Option<&str>) {
        self.push(Event::Query(key.to_owned(), value.map(str::to_owned)));
    }

    fn restart_modules(&self, flags: RestartFlags) {
        self.push(Event::Restart(flags));
    }
}

impl FiltersDom for MockDom {
    fn sync_control(&self, filter_index: usize, control_index: usize, control: &FilterControl, _active_class: &str) {
        self.push(Event::Control(filter_index, control_index, control.is_active()));
    }

    fn set_results_count(&self, count: usize) {
        self.push(Event::ResultsCount(count));
    }

    fn sync_tags(&self, tags: &[cmslist::FilterTag]) {
        self.push(Event::Tags(tags.iter().map(|t| t.value.clone()).collect()));
    }
}

impl TemplateDom for MockDom {
    fn instantiate(&self, _template: &El, product: &Product) -> El {
        el(&product.title, &[("category", product.category.as_str())])
    }
}

/// Yields a few times per animation so queued work gets a chance to interleave.
struct YieldingAnimator {
    dom: Arc<MockDom>,
    yields: usize,
}

impl Animator<El> for YieldingAnimator {
    async fn animate(&self, target: AnimationTarget<'_, El>, phase: Phase, _transition: Transition) {
        let label = match target {
            AnimationTarget::Item(element) => element.name.clone(),
            AnimationTarget::Element(key) => format!("{key:?}"),
        };
        self.dom.push(Event::AnimStart(label.clone(), phase));
        for _ in 0..self.yields {
            tokio::task::yield_now().await;
        }
        self.dom.push(Event::AnimEnd(label, phase));
    }
}

type Dom = Arc<MockDom>;

fn animated(dom: &Dom, options: ListOptions) -> ListController<Dom, YieldingAnimator> {
    ListController::new(
        Arc::clone(dom),
        YieldingAnimator {
            dom: Arc::clone(dom),
            yields: 3,
        },
        AnimationOptions::default(),
        CollectionList::new(options),
    )
}

fn plain(dom: &Dom, options: ListOptions) -> ListController<Dom> {
    ListController::without_animations(Arc::clone(dom), CollectionList::new(options))
}

fn category_registry() -> FilterRegistry {
    FilterRegistry::new().with_filter(
        FilterDefinition::new("category")
            .with_controls([FilterControl::checkbox("x"), FilterControl::checkbox("y")]),
    )
}

fn names<D: ListDom<Element = El>, A>(list: &ListController<D, A>, ids: &[ItemId]) -> Vec<String>
where
    A: Animator<El>,
{
    list.read(|l| {
        ids.iter()
            .filter_map(|&id| l.item(id).map(|item| item.element().name.clone()))
            .collect()
    })
}

fn five_items() -> Vec<El> {
    ["a", "b", "c", "d", "e"]
        .into_iter()
        .map(|n| el(n, &[("title", n)]))
        .collect()
}

#[tokio::test]
async fn add_items_renders_and_updates_counters() {
    let dom = MockDom::with_elements(&[DisplayKey::EmptyElement]);
    let list = plain(&dom, ListOptions::new("list"));

    let ids = list
        .add_items(vec![el("a", &[]), el("b", &[]), el("c", &[])], Placement::Append)
        .await;

    assert_eq!(ids.len(), 3);
    assert_eq!(list.rendered_ids(), ids);
    assert_eq!(dom.last_text(TextKey::ItemsCount).as_deref(), Some("3"));
    assert_eq!(dom.last_text(TextKey::VisibleCount).as_deref(), Some("3"));
    assert_eq!(dom.last_display(DisplayKey::EmptyElement), Some(false));
    assert_eq!(dom.last_display(DisplayKey::List), Some(true));
    assert!(ids.iter().all(|&id| list.render_state(id) == RenderState::Mounted));
    assert!(list.read(|l| l.items().iter().all(|i| !i.needs_restart())));
}

#[tokio::test]
async fn prepended_batch_renders_first() {
    let dom = MockDom::with_elements(&[]);
    let list = plain(&dom, ListOptions::new("list"));
    list.add_items(vec![el("a", &[]), el("b", &[])], Placement::Append)
        .await;
    list.add_items(vec![el("c", &[]), el("d", &[])], Placement::Prepend)
        .await;

    assert_eq!(names(&list, &list.rendered_ids()), ["c", "d", "a", "b"]);
}

#[tokio::test]
async fn queued_operations_never_interleave() {
    let dom = MockDom::with_elements(&[]);
    let list = animated(&dom, ListOptions::new("list"));
    list.add_items(
        vec![el("a", &[("category", "x")]), el("b", &[("category", "y")])],
        Placement::Append,
    )
    .await;
    let filters = FiltersController::new(
        list.clone(),
        category_registry(),
        Arc::clone(&dom),
        FiltersOptions::default(),
    );
    dom.take();

    let (ids, changed) = futures_util::join!(
        list.add_items(
            vec![el("c", &[("category", "x")]), el("d", &[("category", "y")])],
            Placement::Append,
        ),
        filters.set_active_values("category", ["x"]),
    );
    assert_eq!(ids.len(), 2);
    assert!(changed);

    // The add settles (entrances included) before the filter starts removing items.
    let events = dom.events();
    let last_enter = events
        .iter()
        .rposition(|e| matches!(e, Event::AnimEnd(_, Phase::Enter)))
        .unwrap();
    let first_exit = events
        .iter()
        .position(|e| matches!(e, Event::AnimStart(_, Phase::Exit)))
        .unwrap();
    assert!(last_enter < first_exit);

    assert_eq!(names(&list, &list.rendered_ids()), ["a", "c"]);
    let rendered = list.rendered_ids();
    assert!(list.read(|l| l.is_consistent(&rendered)));
    assert!(list.queue().is_idle());
}

#[tokio::test]
async fn filtered_out_items_unmount_and_counts_follow() {
    let dom = MockDom::with_elements(&[]);
    let list = plain(&dom, ListOptions::new("list"));
    let filters = FiltersController::new(
        list.clone(),
        category_registry(),
        Arc::clone(&dom),
        FiltersOptions::default(),
    );
    let ids = list
        .add_items(
            vec![
                el("a", &[("category", "x")]),
                el("b", &[("category", "y")]),
                el("c", &[("category", "x")]),
            ],
            Placement::Append,
        )
        .await;

    assert!(filters.set_active_values("category", ["x"]).await);
    assert_eq!(list.render_state(ids[0]), RenderState::Mounted);
    assert_eq!(list.render_state(ids[1]), RenderState::Unmounted);
    assert!(dom.events().contains(&Event::Unmount("b".to_owned())));
    assert!(dom.events().contains(&Event::ResultsCount(2)));
    assert!(dom.events().contains(&Event::Control(0, 0, true)));
    assert!(dom.events().contains(&Event::Tags(vec!["x".to_owned()])));
    assert_eq!(dom.last_text(TextKey::VisibleCount).as_deref(), Some("2"));

    // Same values again: nothing to do.
    assert!(!filters.set_active_values("category", ["x"]).await);
    // Unknown key: no-op.
    assert!(!filters.set_active_values("colour", ["red"]).await);

    let counts = filters.read(|r| {
        r.filter(0)
            .unwrap()
            .controls()
            .iter()
            .map(|c| c.results_count)
            .collect::<Vec<_>>()
    });
    assert_eq!(counts, [2, 1]);
}

#[tokio::test]
async fn reset_filters_restores_every_item() {
    let dom = MockDom::with_elements(&[]);
    let list = plain(&dom, ListOptions::new("list"));
    let filters = FiltersController::new(list.clone(), category_registry(), (), FiltersOptions::default());
    list.add_items(
        vec![el("a", &[("category", "x")]), el("b", &[("category", "y")])],
        Placement::Append,
    )
    .await;

    filters.set_active_values("category", ["y"]).await;
    assert_eq!(names(&list, &list.rendered_ids()), ["b"]);
    assert!(filters.filters_active());

    assert!(filters.reset_filters(None, None).await);
    assert_eq!(names(&list, &list.rendered_ids()), ["a", "b"]);
    assert!(!filters.filters_active());
    assert!(!filters.reset_filters(None, None).await);
}

#[tokio::test]
async fn control_changes_drive_the_list() {
    let dom = MockDom::with_elements(&[]);
    let list = plain(&dom, ListOptions::new("list"));
    let filters = FiltersController::new(list.clone(), category_registry(), (), FiltersOptions::default());
    list.add_items(
        vec![el("a", &[("category", "x")]), el("b", &[("category", "y")])],
        Placement::Append,
    )
    .await;

    assert!(filters.handle_control_change(0, 1, ControlInput::Checked(true)).await);
    assert_eq!(names(&list, &list.rendered_ids()), ["b"]);
    assert_eq!(filters.tags().len(), 1);

    let snapshot = filters.store_filters_data();
    filters.handle_control_change(0, 1, ControlInput::Checked(false)).await;
    assert!(snapshot.active);
    assert!(!filters.filters_active());
}

#[tokio::test]
async fn empty_state_shows_when_nothing_matches() {
    let dom = MockDom::with_elements(&[DisplayKey::EmptyElement, DisplayKey::InitialElement]);
    let list = plain(&dom, ListOptions::new("list"));
    let registry = FilterRegistry::new()
        .with_filter(FilterDefinition::new("title").with_control(FilterControl::text()));
    let filters = FiltersController::new(list.clone(), registry, (), FiltersOptions::default());
    list.add_items(
        vec![el("a", &[("title", "Alpha")]), el("b", &[("title", "Beta")])],
        Placement::Append,
    )
    .await;
    assert_eq!(dom.last_display(DisplayKey::InitialElement), Some(true));

    filters.set_active_values("title", ["zzz"]).await;
    assert!(list.rendered_ids().is_empty());
    assert_eq!(dom.last_display(DisplayKey::EmptyElement), Some(true));
    assert_eq!(dom.last_display(DisplayKey::List), Some(false));
    assert_eq!(dom.last_display(DisplayKey::InitialElement), Some(false));

    filters.set_active_values("title", ["alp"]).await;
    assert_eq!(names(&list, &list.rendered_ids()), ["a"]);
    assert_eq!(dom.last_display(DisplayKey::EmptyElement), Some(false));
}

#[tokio::test]
async fn malformed_markup_is_stored_with_empty_props() {
    let dom = MockDom::with_elements(&[]);
    let list = plain(&dom, ListOptions::new("list"));
    let filters = FiltersController::new(list.clone(), category_registry(), (), FiltersOptions::default());
    let mut broken = el("broken", &[("category", "y")]);
    broken.broken = true;

    let ids = list
        .add_items(vec![el("a", &[("category", "y")]), broken], Placement::Append)
        .await;
    assert_eq!(ids.len(), 2);
    assert!(list.read(|l| l.item(ids[1]).unwrap().props().is_empty()));

    filters.set_active_values("category", ["x"]).await;
    assert_eq!(names(&list, &list.rendered_ids()), ["broken"]);
}

#[tokio::test]
async fn typed_fields_drive_date_ranges() {
    let dom = MockDom::with_elements(&[]);
    let list = plain(&dom, ListOptions::new("list"));
    let registry = FilterRegistry::new().with_filter(
        FilterDefinition::new("published")
            .with_mode(Some(FilterMode::Range))
            .with_controls([
                FilterControl::range_input(RangeTag::From),
                FilterControl::range_input(RangeTag::To),
            ]),
    );
    let filters = FiltersController::new(list.clone(), registry, (), FiltersOptions::default());

    let ids = list
        .add_items(
            vec![
                el("unpadded", &[("published:date", "2024-9-15")]),
                el("long", &[("published:date", "September 20, 2024")]),
                el("later", &[("published:date", "2024-10-02")]),
                el("typo", &[("published:dated", "2024-09-15")]),
            ],
            Placement::Append,
        )
        .await;
    let typed = list.read(|l| {
        l.item(ids[0]).unwrap().props().get("published").unwrap().value_type
    });
    assert_eq!(typed, Some(ValueType::Date));
    // An unknown type is reported and the item keeps no props.
    assert!(list.read(|l| l.item(ids[3]).unwrap().props().is_empty()));

    filters
        .set_active_values("published", ["2024-09-01", "2024-09-30"])
        .await;
    assert_eq!(names(&list, &list.rendered_ids()), ["unpadded", "long", "typo"]);

    assert_eq!(
        read_field("published", "x", Some("dated"), None),
        Err(MarkupError::InvalidValue {
            attribute: "fs-cmsfilter-type".to_owned(),
            value: "dated".to_owned(),
        })
    );
    let bound = read_field("price", "10", Some("number"), Some("from")).unwrap();
    assert_eq!(bound.range, Some(RangeTag::From));
}

#[tokio::test]
async fn switch_page_renders_the_new_slice() {
    let dom = MockDom::with_elements(&[DisplayKey::PaginationPrevious, DisplayKey::PaginationNext]);
    let options = ListOptions::new("list")
        .with_items_per_page(Some(2))
        .with_show_pagination_query(true)
        .with_scroll_on_page_change(true);
    let list = plain(&dom, options);
    list.add_items(five_items(), Placement::Append).await;
    assert_eq!(names(&list, &list.rendered_ids()), ["a", "b"]);
    assert_eq!(dom.last_display(DisplayKey::PaginationPrevious), Some(false));
    dom.take();

    // Same page: resolves without rendering.
    list.switch_page(1, true).await;
    assert!(dom.events().is_empty());

    list.switch_page(2, true).await;
    assert_eq!(names(&list, &list.rendered_ids()), ["c", "d"]);
    let events = dom.events();
    assert!(events.contains(&Event::Query("list_page".to_owned(), Some("2".to_owned()))));
    assert!(events.contains(&Event::Mount("c".to_owned(), 0)));
    assert!(events.contains(&Event::Unmount("a".to_owned())));
    assert_eq!(events.last(), Some(&Event::Scroll));
    assert_eq!(dom.last_text(TextKey::PaginationCount).as_deref(), Some("2 / 3"));
    assert_eq!(dom.last_display(DisplayKey::PaginationPrevious), Some(true));

    // Past the end clamps to the last page.
    list.switch_page(9, true).await;
    assert_eq!(list.page_state().current_page, 3);
    assert_eq!(names(&list, &list.rendered_ids()), ["e"]);
    assert_eq!(dom.last_display(DisplayKey::PaginationNext), Some(false));

    list.previous_page().await;
    assert_eq!(list.page_state().current_page, 2);
}

#[tokio::test]
async fn switch_page_without_rerender_leaves_rendering_to_the_caller() {
    let dom = MockDom::with_elements(&[]);
    let list = plain(&dom, ListOptions::new("list").with_items_per_page(Some(2)));
    list.add_items(five_items(), Placement::Append).await;

    list.switch_page(2, false).await;
    assert_eq!(list.page_state().current_page, 2);
    assert_eq!(names(&list, &list.rendered_ids()), ["a", "b"]);

    let cycle = list.render_items(false, false).await;
    assert_eq!(names(&list, &cycle.rendered), ["c", "d"]);
    assert_eq!(names(&list, &cycle.exited), ["a", "b"]);
}

#[tokio::test]
async fn load_more_accumulates_pages() {
    let dom = MockDom::with_elements(&[DisplayKey::PaginationPrevious, DisplayKey::PaginationNext]);
    let options = ListOptions::new("list")
        .with_items_per_page(Some(2))
        .with_pagination_mode(PaginationMode::LoadMore);
    let list = plain(&dom, options);
    list.add_items(five_items(), Placement::Append).await;

    list.next_page().await;
    assert_eq!(names(&list, &list.rendered_ids()), ["a", "b", "c", "d"]);
    assert_eq!(dom.last_display(DisplayKey::PaginationPrevious), Some(false));
    assert_eq!(dom.last_display(DisplayKey::PaginationNext), Some(true));
}

#[tokio::test]
async fn page_steps_resolve_against_the_queued_state() {
    let dom = MockDom::with_elements(&[]);
    let list = animated(&dom, ListOptions::new("list").with_items_per_page(Some(2)));
    list.add_items(five_items(), Placement::Append).await;

    futures_util::join!(
        list.sort_items("title", SortDirection::Descending),
        list.next_page(),
        list.next_page(),
    );
    assert_eq!(list.page_state().current_page, 3);
    assert_eq!(names(&list, &list.rendered_ids()), ["a"]);

    futures_util::join!(list.previous_page(), list.previous_page(), list.previous_page());
    assert_eq!(list.page_state().current_page, 1);
    assert_eq!(names(&list, &list.rendered_ids()), ["e", "d"]);
}

#[tokio::test]
async fn clear_items_detaches_and_resets() {
    let dom = MockDom::with_elements(&[DisplayKey::EmptyElement]);
    let list = plain(&dom, ListOptions::new("list").with_items_per_page(Some(2)));
    list.add_items(five_items(), Placement::Append).await;
    list.switch_page(2, true).await;
    dom.take();

    list.clear_items(true).await;
    let unmounted = dom
        .events()
        .iter()
        .filter(|e| matches!(e, Event::Unmount(_)))
        .count();
    assert_eq!(unmounted, 5);
    assert!(list.items().is_empty());
    assert!(list.rendered_ids().is_empty());
    let page = list.page_state();
    assert_eq!((page.current_page, page.total_pages), (1, 0));
    assert_eq!(dom.last_display(DisplayKey::EmptyElement), Some(true));

    // Clearing an empty list is fine.
    list.clear_items(false).await;
    assert_eq!(list.counts().items, 0);
}

#[tokio::test]
async fn sort_reorders_kept_items_without_animating() {
    let dom = MockDom::with_elements(&[]);
    let list = animated(&dom, ListOptions::new("list"));
    list.add_items(
        vec![
            el("a", &[("price", "30")]),
            el("b", &[("price", "4")]),
            el("c", &[("price", "12")]),
        ],
        Placement::Append,
    )
    .await;
    dom.take();

    list.sort_items("price", SortDirection::Ascending).await;
    let events = dom.events();
    assert!(!events.iter().any(|e| matches!(e, Event::AnimStart(..) | Event::Unmount(_))));
    let mounts: Vec<Event> = events
        .into_iter()
        .filter(|e| matches!(e, Event::Mount(..)))
        .collect();
    assert_eq!(
        mounts,
        [
            Event::Mount("b".to_owned(), 0),
            Event::Mount("c".to_owned(), 1),
            Event::Mount("a".to_owned(), 2),
        ]
    );

    list.restore_items_order().await;
    let cycle = list.render_items(true, false).await;
    assert_eq!(names(&list, &cycle.rendered), ["a", "b", "c"]);
    assert!(cycle.entered.is_empty() && cycle.exited.is_empty());
}

#[tokio::test]
async fn list_transition_wraps_changing_renders_only() {
    let dom = MockDom::with_elements(&[]);
    let list = ListController::new(
        Arc::clone(&dom),
        YieldingAnimator {
            dom: Arc::clone(&dom),
            yields: 1,
        },
        AnimationOptions::disabled().with_list(Some(Transition::default())),
        CollectionList::new(ListOptions::new("list").with_items_per_page(Some(1))),
    );
    list.add_items(vec![el("a", &[]), el("b", &[])], Placement::Append)
        .await;
    dom.take();

    list.render_items(true, true).await;
    assert!(dom.events().iter().all(|e| !matches!(e, Event::AnimStart(..))));

    list.switch_page(2, false).await;
    dom.take();
    list.render_items(true, true).await;
    let events = dom.events();
    assert_eq!(
        events.first(),
        Some(&Event::AnimStart("List".to_owned(), Phase::Exit))
    );
    assert!(events.contains(&Event::AnimEnd("List".to_owned(), Phase::Enter)));
}

fn restart_count(dom: &MockDom) -> usize {
    dom.events()
        .iter()
        .filter(|e| matches!(e, Event::Restart(_)))
        .count()
}

#[tokio::test]
async fn restart_signal_fires_only_for_new_items() {
    let dom = MockDom::with_elements(&[]);
    let restart = RestartFlags {
        webflow: true,
        ..RestartFlags::default()
    };
    let list = plain(&dom, ListOptions::new("list").with_restart(restart));

    list.add_items(vec![el("a", &[]), el("b", &[])], Placement::Append)
        .await;
    assert_eq!(restart_count(&dom), 1);
    assert!(dom.events().contains(&Event::Restart(restart.resolved())));

    list.render_items(true, false).await;
    assert_eq!(restart_count(&dom), 1);

    list.add_items(vec![el("c", &[])], Placement::Append).await;
    assert_eq!(restart_count(&dom), 2);
}

#[tokio::test]
async fn display_element_skips_missing_elements() {
    let dom = MockDom::with_elements(&[DisplayKey::Loader]);
    let list = plain(&dom, ListOptions::new("list"));

    list.display_element(DisplayKey::Wrapper, true, true).await;
    assert!(dom.events().is_empty());

    list.display_element(DisplayKey::Loader, true, true).await;
    list.display_element(DisplayKey::Loader, false, false).await;
    assert_eq!(
        dom.events(),
        [
            Event::Display(DisplayKey::Loader, true),
            Event::Display(DisplayKey::Loader, false),
        ]
    );
}

#[tokio::test]
async fn scroll_to_anchor_waits_for_pending_work() {
    let dom = MockDom::with_elements(&[]);
    let list = animated(&dom, ListOptions::new("list"));

    futures_util::join!(
        list.add_items(vec![el("a", &[])], Placement::Append),
        list.scroll_to_anchor(),
    );
    let events = dom.events();
    let end = events
        .iter()
        .position(|e| matches!(e, Event::AnimEnd(..)))
        .unwrap();
    let scroll = events.iter().position(|e| *e == Event::Scroll).unwrap();
    assert!(end < scroll);
}

#[tokio::test]
async fn query_state_round_trips_through_apply_query() {
    let dom = MockDom::with_elements(&[]);
    let list = plain(
        &dom,
        ListOptions::new("list")
            .with_items_per_page(Some(1))
            .with_show_pagination_query(true),
    );
    let filters = FiltersController::new(
        list.clone(),
        category_registry(),
        (),
        FiltersOptions::default().with_show_query_params(true),
    );
    list.add_items(
        vec![
            el("a", &[("category", "x")]),
            el("b", &[("category", "y")]),
            el("c", &[("category", "x")]),
        ],
        Placement::Append,
    )
    .await;

    filters.apply_query("?list_category=x&list_page=2&other=1").await;
    assert_eq!(names(&list, &list.rendered_ids()), ["c"]);
    assert_eq!(filters.query_state().encode("list"), "list_page=2&list_category=x");
    let events = dom.events();
    assert!(events.contains(&Event::Query("list_category".to_owned(), Some("x".to_owned()))));
    assert!(events.contains(&Event::Query("list_page".to_owned(), Some("2".to_owned()))));
}

#[test]
fn attributes_are_readable_synchronously() {
    let attributes = cmslist::ListAttributes::new()
        .with(cmslist::attr::FILTER_ELEMENT, "list-2")
        .with(cmslist::attr::ITEMS_PER_PAGE, "3");
    let dom = MockDom::with_elements(&[]);
    let list = ListController::without_animations(
        Arc::clone(&dom),
        CollectionList::from_attributes(attributes),
    );

    assert_eq!(list.get_instance_index(cmslist::attr::FILTER_ELEMENT), Some(2));
    assert_eq!(list.get_attribute(cmslist::attr::ITEMS_PER_PAGE).as_deref(), Some("3"));
    assert_eq!(list.page_state().items_per_page, Some(3));
}

#[test]
fn render_plan_keeps_items_present_on_both_sides() {
    let plan = RenderPlan::diff(&[1, 2, 3], &[3, 1, 4]);
    assert_eq!(plan.enter, [4]);
    assert_eq!(plan.exit, [2]);
    assert!(!plan.is_noop(&[1, 2, 3]));

    let moved = RenderPlan::diff(&[1, 2], &[2, 1]);
    assert!(moved.enter.is_empty() && moved.exit.is_empty());
    assert!(!moved.is_noop(&[1, 2]));
    assert!(RenderPlan::diff(&[1, 2], &[1, 2]).is_noop(&[1, 2]));
}

async fn logged_op(queue: &OpQueue, log: &RefCell<Vec<String>>, n: u32) {
    queue
        .run("op", async {
            log.borrow_mut().push(format!("start{n}"));
            tokio::task::yield_now().await;
            log.borrow_mut().push(format!("end{n}"));
        })
        .await
}

#[tokio::test]
async fn op_queue_runs_in_arrival_order() {
    let queue = OpQueue::new();
    let log = RefCell::new(Vec::new());

    futures_util::join!(
        logged_op(&queue, &log, 1),
        logged_op(&queue, &log, 2),
        logged_op(&queue, &log, 3),
    );

    assert_eq!(*log.borrow(), ["start1", "end1", "start2", "end2", "start3", "end3"]);
    assert!(queue.is_idle());
    assert_eq!(queue.started(), 3);
}

#[tokio::test(start_paused = true)]
async fn tween_animator_fades_to_full_opacity() {
    let dom = MockDom::with_elements(&[]);
    let animator = TweenAnimator::new(Arc::clone(&dom)).with_frame_ms(10);
    let element = el("a", &[]);

    animator
        .animate(
            AnimationTarget::Item(&element),
            Phase::Enter,
            Transition::new(50, Easing::Linear),
        )
        .await;

    let opacities: Vec<f32> = dom
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Opacity(o) => Some(o),
            _ => None,
        })
        .collect();
    assert_eq!(opacities.first(), Some(&0.0));
    assert_eq!(opacities.last(), Some(&1.0));
    assert!(opacities.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn transitions_fade_in_and_out() {
    let t = Transition::new(100, Easing::Linear);
    let enter = t.tween(Phase::Enter, 0);
    let exit = t.tween(Phase::Exit, 0);
    assert_eq!(enter.sample(0), 0.0);
    assert_eq!(enter.sample(50), 0.5);
    assert_eq!(exit.sample(50), 0.5);
    assert_eq!(exit.sample(200), 0.0);
    assert!(exit.is_done(100));

    assert_eq!(Easing::parse("ease-in-out"), Some(Easing::EaseInOutCubic));
    assert_eq!(Easing::parse("bounce"), None);
}

#[tokio::test]
async fn registry_runs_callbacks_in_registration_order() {
    let registry: AttributesRegistry<u32, &'static str> = AttributesRegistry::new();
    let log = Rc::new(RefCell::new(Vec::<String>::new()));

    for n in 0..2 {
        let log = Rc::clone(&log);
        registry
            .push(Feature::CmsLoad, move |lists: Vec<u32>| async move {
                log.borrow_mut().push(format!("load{n}:{lists:?}"));
            })
            .await;
    }
    {
        let log = Rc::clone(&log);
        registry
            .push(Feature::CmsSort, move |_| async move {
                log.borrow_mut().push("sort".to_owned());
            })
            .await;
    }
    assert!(log.borrow().is_empty());

    registry.publish_lists(Feature::CmsLoad, vec![1, 2]).await;
    assert_eq!(*log.borrow(), ["load0:[1, 2]", "load1:[1, 2]"]);
    assert!(registry.is_published(Feature::CmsLoad));
    assert!(!registry.is_published(Feature::CmsSort));

    {
        let log = Rc::clone(&log);
        registry
            .push(Feature::CmsLoad, move |lists: Vec<u32>| async move {
                log.borrow_mut().push(format!("late:{}", lists.len()));
            })
            .await;
    }
    assert_eq!(log.borrow().last().map(String::as_str), Some("late:2"));

    {
        let log = Rc::clone(&log);
        registry
            .push_filters(move |filters: Vec<&'static str>| async move {
                log.borrow_mut().push(format!("filters:{}", filters.join(",")));
            })
            .await;
    }
    registry.publish_filters(vec!["f1"]).await;
    assert_eq!(log.borrow().last().map(String::as_str), Some("filters:f1"));
    assert!(!log.borrow().iter().any(|l| l == "sort"));

    assert_eq!(Feature::parse("CMSFilter"), Some(Feature::CmsFilter));
    assert_eq!(Feature::parse("cmsmagic"), None);
}

#[tokio::test]
async fn callbacks_pushed_during_a_publish_wait_their_turn() {
    let registry: Rc<AttributesRegistry<u32, ()>> = Rc::new(AttributesRegistry::new());
    let log = Rc::new(RefCell::new(Vec::<&'static str>::new()));

    let outer = Rc::clone(&registry);
    let first_log = Rc::clone(&log);
    registry
        .push(Feature::CmsLoad, move |_| async move {
            first_log.borrow_mut().push("first");
            let late_log = Rc::clone(&first_log);
            outer
                .push(Feature::CmsLoad, move |_| async move {
                    late_log.borrow_mut().push("late");
                })
                .await;
            tokio::task::yield_now().await;
            first_log.borrow_mut().push("first done");
        })
        .await;
    let second_log = Rc::clone(&log);
    registry
        .push(Feature::CmsLoad, move |_| async move {
            second_log.borrow_mut().push("second");
        })
        .await;

    registry.publish_lists(Feature::CmsLoad, vec![1]).await;
    assert_eq!(*log.borrow(), ["first", "first done", "second", "late"]);

    // Once the publish drained, late pushes run immediately again.
    let after_log = Rc::clone(&log);
    registry
        .push(Feature::CmsLoad, move |_| async move {
            after_log.borrow_mut().push("after");
        })
        .await;
    assert_eq!(log.borrow().last(), Some(&"after"));
}

struct StaticFeed(Vec<Product>);

impl ProductFeed for StaticFeed {
    async fn fetch(&self) -> Result<Vec<Product>, FeedError> {
        Ok(self.0.clone())
    }
}

struct FailingFeed;

impl ProductFeed for FailingFeed {
    async fn fetch(&self) -> Result<Vec<Product>, FeedError> {
        Err(FeedError::Status(503))
    }
}

fn product(title: &str, category: &str) -> Product {
    Product {
        title: title.to_owned(),
        category: category.to_owned(),
        ..Product::default()
    }
}

#[test]
fn products_decode_and_ignore_unknown_fields() {
    let payload = br#"[
        {"id": 1, "title": "Backpack", "price": 109.95, "category": "bags",
         "description": "Fits 15 inch laptops", "image": "https://img/1.jpg",
         "rating": {"rate": 3.9, "count": 120}},
        {"id": 2, "title": "Tee", "category": "clothing"}
    ]"#;
    let products = parse_products(payload).unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].slot_value(feed::Slot::Image), "https://img/1.jpg");
    assert_eq!(products[1].description, "");

    assert!(matches!(parse_products(b"<html>"), Err(FeedError::Json(_))));
    assert_eq!(feed::Slot::parse("category"), Some(feed::Slot::Category));
}

#[test]
fn categories_keep_first_seen_order() {
    let products = [
        product("a", "bags"),
        product("b", " clothing "),
        product("c", "bags"),
        product("d", ""),
    ];
    assert_eq!(collect_categories(&products), ["bags", "clothing"]);
}

/// Yields before answering so other work can queue up while the fetch is pending.
struct SlowFeed(Vec<Product>);

impl ProductFeed for SlowFeed {
    async fn fetch(&self) -> Result<Vec<Product>, FeedError> {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn failing_feed_yields_no_products() {
    assert!(fetch_or_empty(&FailingFeed).await.is_empty());
}

#[tokio::test]
async fn populate_from_feed_replaces_the_template() {
    let dom = MockDom::with_elements(&[DisplayKey::EmptyElement]);
    let list = plain(&dom, ListOptions::new("list"));
    list.add_items(vec![el("template", &[])], Placement::Append)
        .await;

    let feed = StaticFeed(vec![product("Backpack", "bags"), product("Tee", "clothing")]);
    let ids = populate_from_feed(&list, &feed).await;
    assert_eq!(names(&list, &ids), ["Backpack", "Tee"]);
    assert_eq!(names(&list, &list.rendered_ids()), ["Backpack", "Tee"]);
    assert!(dom.events().contains(&Event::Unmount("template".to_owned())));

    let filters = FiltersController::new(
        list.clone(),
        FilterRegistry::new().with_filter(FilterDefinition::new("category")),
        (),
        FiltersOptions::default(),
    );
    assert!(populate_category_filters(&filters, "category", &feed.0).await);
    assert_eq!(filters.read(|r| r.filter(0).unwrap().controls().len()), 2);
    filters.set_active_values("category", ["clothing"]).await;
    assert_eq!(names(&list, &list.rendered_ids()), ["Tee"]);

    // A failed fetch leaves the list empty.
    populate_from_feed(&list, &FailingFeed).await;
    assert!(list.items().is_empty());
    assert_eq!(dom.last_display(DisplayKey::EmptyElement), Some(true));
}

#[tokio::test]
async fn feed_swap_runs_as_one_queued_operation() {
    let dom = MockDom::with_elements(&[DisplayKey::Loader]);
    let list = plain(&dom, ListOptions::new("list"));
    list.add_items(vec![el("template", &[])], Placement::Append)
        .await;
    let started = list.queue().started();

    let feed = SlowFeed(vec![product("Backpack", "bags"), product("Tee", "clothing")]);
    let (ids, _) = futures_util::join!(
        populate_from_feed(&list, &feed),
        list.add_items(vec![el("extra", &[])], Placement::Append),
    );

    // The add ran while the feed was pending; the swap then replaced everything at once.
    assert_eq!(list.queue().started() - started, 2);
    assert_eq!(names(&list, &ids), ["Backpack", "Tee"]);
    assert_eq!(names(&list, &list.rendered_ids()), ["Backpack", "Tee"]);
    assert!(dom.events().contains(&Event::Unmount("extra".to_owned())));
    assert_eq!(dom.last_display(DisplayKey::Loader), Some(false));

    // Without a template item there is nothing to populate.
    list.clear_items(true).await;
    assert!(populate_from_feed(&list, &feed).await.is_empty());
    let none = list.replace_items(|items| items.first().map(|_| Vec::new())).await;
    assert!(none.is_empty());
}
