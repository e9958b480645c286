use std::collections::HashMap;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use parking_lot::Mutex;

/// Features a host script can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feature {
    CmsLoad,
    CmsNest,
    CmsCombine,
    CmsPrevNext,
    CmsSlider,
    CmsSort,
    CmsTabs,
    CmsFilter,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Self::CmsLoad,
        Self::CmsNest,
        Self::CmsCombine,
        Self::CmsPrevNext,
        Self::CmsSlider,
        Self::CmsSort,
        Self::CmsTabs,
        Self::CmsFilter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CmsLoad => "cmsload",
            Self::CmsNest => "cmsnest",
            Self::CmsCombine => "cmscombine",
            Self::CmsPrevNext => "cmsprevnext",
            Self::CmsSlider => "cmsslider",
            Self::CmsSort => "cmssort",
            Self::CmsTabs => "cmstabs",
            Self::CmsFilter => "cmsfilter",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(raw))
    }
}

type Callback<T> = Box<dyn FnOnce(Vec<T>) -> LocalBoxFuture<'static, ()>>;

fn boxed<T, C, Fut>(callback: C) -> Callback<T>
where
    C: FnOnce(Vec<T>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Box::new(move |instances| callback(instances).boxed_local())
}

/// Callbacks not run yet, plus whether a publish is still working through them.
struct Pending<T> {
    callbacks: Vec<Callback<T>>,
    draining: bool,
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
            draining: false,
        }
    }
}

/// The host-script registration list: callbacks keyed by feature, run once the feature's
/// instances are published.
///
/// Callbacks run in registration order. A callback pushed after its feature was published
/// runs immediately with the published instances, unless the publish is still running earlier
/// callbacks: it then runs after them. No lock is held while a callback runs, so callbacks may
/// push further callbacks.
pub struct AttributesRegistry<L, F> {
    pending_lists: Mutex<HashMap<Feature, Pending<L>>>,
    pending_filters: Mutex<Pending<F>>,
    lists: Mutex<HashMap<Feature, Vec<L>>>,
    filters: Mutex<Option<Vec<F>>>,
}

impl<L, F> Default for AttributesRegistry<L, F> {
    fn default() -> Self {
        Self {
            pending_lists: Mutex::new(HashMap::new()),
            pending_filters: Mutex::new(Pending::default()),
            lists: Mutex::new(HashMap::new()),
            filters: Mutex::new(None),
        }
    }
}

impl<L: Clone + 'static, F: Clone + 'static> AttributesRegistry<L, F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for a list feature. `Feature::CmsFilter` goes through
    /// [`push_filters`](Self::push_filters) and is ignored here.
    pub async fn push<C, Fut>(&self, feature: Feature, callback: C)
    where
        C: FnOnce(Vec<L>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        if feature == Feature::CmsFilter {
            lwarn!("AttributesRegistry: cmsfilter callbacks receive filters; use push_filters");
            return;
        }
        let published = {
            let mut pending = self.pending_lists.lock();
            let entry = pending.entry(feature).or_default();
            let published = self.lists.lock().get(&feature).cloned();
            match published {
                Some(instances) if !entry.draining => instances,
                _ => {
                    entry.callbacks.push(boxed(callback));
                    return;
                }
            }
        };
        ltrace!(feature = feature.as_str(), "AttributesRegistry: late push runs now");
        callback(published).await;
    }

    pub async fn push_filters<C, Fut>(&self, callback: C)
    where
        C: FnOnce(Vec<F>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let published = {
            let mut pending = self.pending_filters.lock();
            let published = self.filters.lock().clone();
            match published {
                Some(instances) if !pending.draining => instances,
                _ => {
                    pending.callbacks.push(boxed(callback));
                    return;
                }
            }
        };
        callback(published).await;
    }

    /// Publishes a feature's list instances and runs its pending callbacks in order, including
    /// the ones pushed while earlier callbacks run.
    pub async fn publish_lists(&self, feature: Feature, instances: Vec<L>) {
        self.lists.lock().insert(feature, instances.clone());
        self.pending_lists.lock().entry(feature).or_default().draining = true;
        let mut ran = 0usize;
        loop {
            let next = {
                let mut pending = self.pending_lists.lock();
                let entry = pending.entry(feature).or_default();
                next_callback(entry)
            };
            let Some(callback) = next else { break };
            callback(instances.clone()).await;
            ran += 1;
        }
        ldebug!(
            feature = feature.as_str(),
            instances = instances.len(),
            callbacks = ran,
            "AttributesRegistry::publish_lists"
        );
    }

    pub async fn publish_filters(&self, instances: Vec<F>) {
        *self.filters.lock() = Some(instances.clone());
        self.pending_filters.lock().draining = true;
        let mut ran = 0usize;
        loop {
            let next = next_callback(&mut *self.pending_filters.lock());
            let Some(callback) = next else { break };
            callback(instances.clone()).await;
            ran += 1;
        }
        ldebug!(
            instances = instances.len(),
            callbacks = ran,
            "AttributesRegistry::publish_filters"
        );
    }

    pub fn lists(&self, feature: Feature) -> Option<Vec<L>> {
        self.lists.lock().get(&feature).cloned()
    }

    pub fn filters(&self) -> Option<Vec<F>> {
        self.filters.lock().clone()
    }

    pub fn is_published(&self, feature: Feature) -> bool {
        match feature {
            Feature::CmsFilter => self.filters.lock().is_some(),
            _ => self.lists.lock().contains_key(&feature),
        }
    }
}

/// Takes the oldest pending callback, or ends the drain when none is left.
fn next_callback<T>(pending: &mut Pending<T>) -> Option<Callback<T>> {
    if pending.callbacks.is_empty() {
        pending.draining = false;
        return None;
    }
    Some(pending.callbacks.remove(0))
}
