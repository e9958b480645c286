use std::collections::{HashMap, HashSet};

use cmslist::{ItemId, ItemProps, RenderState};
use futures_util::future::join_all;

use crate::{AnimationTarget, Animator, DisplayKey, ListController, ListDom, Phase, TextKey};

/// The mount/unmount delta between the mounted sequence and the target sequence.
///
/// Ids present on both sides are kept, so an item that would leave and re-enter in the same
/// cycle only moves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderPlan {
    pub target: Vec<ItemId>,
    pub enter: Vec<ItemId>,
    pub exit: Vec<ItemId>,
}

impl RenderPlan {
    pub fn diff(mounted: &[ItemId], target: &[ItemId]) -> Self {
        let target_set: HashSet<ItemId> = target.iter().copied().collect();
        let mounted_set: HashSet<ItemId> = mounted.iter().copied().collect();
        Self {
            target: target.to_vec(),
            enter: target
                .iter()
                .copied()
                .filter(|id| !mounted_set.contains(id))
                .collect(),
            exit: mounted
                .iter()
                .copied()
                .filter(|id| !target_set.contains(id))
                .collect(),
        }
    }

    /// No element enters, leaves or moves.
    pub fn is_noop(&self, mounted: &[ItemId]) -> bool {
        self.enter.is_empty() && self.exit.is_empty() && self.target == mounted
    }
}

/// What one settled render did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderCycle {
    /// Monotonic per list, starting at 1.
    pub cycle: u64,
    pub rendered: Vec<ItemId>,
    pub entered: Vec<ItemId>,
    pub exited: Vec<ItemId>,
}

/// Mounted sequence and per-item render state of one list.
#[derive(Clone, Debug, Default)]
pub struct RenderTracker {
    mounted: Vec<ItemId>,
    states: HashMap<ItemId, RenderState>,
    cycles: u64,
}

impl RenderTracker {
    pub fn mounted(&self) -> &[ItemId] {
        &self.mounted
    }

    pub fn state(&self, id: ItemId) -> RenderState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    pub(crate) fn transition(&mut self, id: ItemId, next: RenderState) {
        let current = self.state(id);
        if !current.can_transition(next) {
            lwarn!(id, ?current, ?next, "RenderTracker: illegal render state transition");
        }
        if next == RenderState::Unmounted {
            self.states.remove(&id);
        } else {
            self.states.insert(id, next);
        }
    }

    pub(crate) fn finish(&mut self, rendered: Vec<ItemId>) -> u64 {
        self.mounted = rendered;
        self.cycles += 1;
        self.cycles
    }

    /// Forgets every mounted item without animating; used when the store is cleared.
    pub(crate) fn clear(&mut self) {
        self.mounted.clear();
        self.states.clear();
    }
}

impl<D: ListDom, A: Animator<D::Element>> ListController<D, A> {
    /// One render cycle. Must run inside the list's queue.
    ///
    /// The state lock is never held across an `.await`: each step snapshots what it needs.
    pub(crate) async fn render_unqueued(&self, animate_items: bool, animate_list: bool) -> RenderCycle {
        let inner = &self.inner;
        let (plan, exiting, noop) = {
            let mut state = inner.state.lock();
            let target = state.list.target_ids();
            let plan = RenderPlan::diff(state.tracker.mounted(), &target);
            let noop = plan.is_noop(state.tracker.mounted());
            for &id in &plan.exit {
                state.tracker.transition(id, RenderState::Unmounting);
            }
            let exiting: Vec<D::Element> = plan
                .exit
                .iter()
                .filter_map(|&id| state.list.item(id).map(|item| item.element().clone()))
                .collect();
            (plan, exiting, noop)
        };

        let items_transition = inner.animation.items.filter(|_| animate_items);
        let list_transition = inner.animation.list.filter(|_| animate_list && !noop);

        if let Some(transition) = list_transition {
            inner
                .animator
                .animate(AnimationTarget::Element(DisplayKey::List), Phase::Exit, transition)
                .await;
        }
        if let Some(transition) = items_transition.filter(|_| !exiting.is_empty()) {
            join_all(exiting.iter().map(|element| {
                inner
                    .animator
                    .animate(AnimationTarget::Item(element), Phase::Exit, transition)
            }))
            .await;
        }
        for element in &exiting {
            inner.dom.unmount(element);
        }

        let entering: HashSet<ItemId> = plan.enter.iter().copied().collect();
        let (mounting, needs_restart, restart) = {
            let mut state = inner.state.lock();
            for &id in &plan.exit {
                state.tracker.transition(id, RenderState::Unmounted);
            }
            for &id in &plan.enter {
                state.tracker.transition(id, RenderState::Mounting);
            }
            let mounting: Vec<(ItemId, D::Element, ItemProps)> = plan
                .target
                .iter()
                .filter_map(|&id| {
                    let item = state.list.item(id)?;
                    Some((id, item.element().clone(), item.props().clone()))
                })
                .collect();
            let needs_restart = plan
                .enter
                .iter()
                .any(|&id| state.list.item(id).is_some_and(|item| item.needs_restart()));
            (mounting, needs_restart, state.list.options().restart)
        };

        for (index, (_, element, props)) in mounting.iter().enumerate() {
            inner.dom.mount(element, index);
            inner.dom.apply_highlights(element, props);
        }
        if let Some(transition) = items_transition.filter(|_| !entering.is_empty()) {
            join_all(
                mounting
                    .iter()
                    .filter(|(id, ..)| entering.contains(id))
                    .map(|(_, element, _)| {
                        inner
                            .animator
                            .animate(AnimationTarget::Item(element), Phase::Enter, transition)
                    }),
            )
            .await;
        }
        if let Some(transition) = list_transition {
            inner
                .animator
                .animate(AnimationTarget::Element(DisplayKey::List), Phase::Enter, transition)
                .await;
        }

        let cycle = {
            let mut state = inner.state.lock();
            for &id in &plan.enter {
                state.tracker.transition(id, RenderState::Mounted);
            }
            state.list.set_rendered(&plan.target);
            state.tracker.finish(plan.target.clone())
        };
        self.sync_ui();
        if needs_restart && restart.any() {
            inner.dom.restart_modules(restart.resolved());
        }

        ldebug!(
            cycle,
            rendered = plan.target.len(),
            entered = plan.enter.len(),
            exited = plan.exit.len(),
            "ListController: render settled"
        );
        RenderCycle {
            cycle,
            rendered: plan.target,
            entered: plan.enter,
            exited: plan.exit,
        }
    }

    /// Refreshes counters, empty/initial state, arrows and page count.
    pub(crate) fn sync_ui(&self) {
        let (counts, page, has_previous, has_next, paginated, filters_active) = {
            let state = self.inner.state.lock();
            let list = &state.list;
            (
                list.counts(),
                list.page_state(),
                list.pagination().has_previous(),
                list.pagination().has_next(),
                list.pagination().active(),
                list.filters_active(),
            )
        };
        let dom = &self.inner.dom;

        dom.set_text(TextKey::ItemsCount, &counts.items.to_string());
        dom.set_text(TextKey::VisibleCount, &counts.valid.to_string());

        if dom.has_element(DisplayKey::EmptyElement) {
            let empty = counts.valid == 0;
            dom.set_display(DisplayKey::EmptyElement, empty);
            dom.set_display(DisplayKey::List, !empty);
        }
        if dom.has_element(DisplayKey::InitialElement) {
            dom.set_display(DisplayKey::InitialElement, !filters_active);
        }

        if paginated {
            dom.set_text(
                TextKey::PaginationCount,
                &format!("{} / {}", page.current_page, page.total_pages),
            );
            let show_previous = has_previous && page.mode == cmslist::PaginationMode::Paginate;
            if dom.has_element(DisplayKey::PaginationPrevious) {
                dom.set_display(DisplayKey::PaginationPrevious, show_previous);
            }
            if dom.has_element(DisplayKey::PaginationNext) {
                dom.set_display(DisplayKey::PaginationNext, has_next);
            }
        }
    }

    /// Shows or hides one auxiliary element. Missing elements are a no-op.
    ///
    /// Not queued: loaders are toggled while other operations are still pending.
    pub async fn display_element(&self, key: DisplayKey, show: bool, animate: bool) {
        let inner = &self.inner;
        if !inner.dom.has_element(key) {
            return;
        }
        let transition = inner.animation.list.or(inner.animation.items).filter(|_| animate);
        let Some(transition) = transition else {
            inner.dom.set_display(key, show);
            return;
        };
        if show {
            inner.dom.set_display(key, true);
            inner
                .animator
                .animate(AnimationTarget::Element(key), Phase::Enter, transition)
                .await;
        } else {
            inner
                .animator
                .animate(AnimationTarget::Element(key), Phase::Exit, transition)
                .await;
            inner.dom.set_display(key, false);
        }
    }
}
