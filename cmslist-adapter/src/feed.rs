//! Product feed boundary: fetch, decode, and turn products into list items.
//!
//! Failures never escape this module's async helpers: a feed that cannot be read yields an
//! empty product set and the list renders its empty state.

use std::future::Future;
use std::sync::Arc;

use cmslist::{ControlKind, FilterControl, ItemId};

use crate::{Animator, DisplayKey, FeedError, FiltersController, FiltersDom, ListController, ListDom};

/// The attribute naming a template slot inside an item element.
pub const SLOT_ATTRIBUTE: &str = "data-element";

/// One product of the feed. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Product {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl Product {
    pub fn slot_value(&self, slot: Slot) -> &str {
        match slot {
            Slot::Title => &self.title,
            Slot::Category => &self.category,
            Slot::Description => &self.description,
            Slot::Image => &self.image,
        }
    }
}

/// Template slots populated from a [`Product`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Title,
    Category,
    Description,
    Image,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Self::Title, Self::Category, Self::Description, Self::Image];

    /// The [`SLOT_ATTRIBUTE`] value marking this slot.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Category => "category",
            Self::Description => "description",
            Self::Image => "image",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw.trim())
    }
}

pub fn parse_products(payload: &[u8]) -> Result<Vec<Product>, FeedError> {
    Ok(serde_json::from_slice(payload)?)
}

/// A source of products (an HTTP endpoint in production, a fixture in tests).
pub trait ProductFeed {
    fn fetch(&self) -> impl Future<Output = Result<Vec<Product>, FeedError>>;
}

/// Fetches the feed, logging and absorbing any failure into an empty result.
pub async fn fetch_or_empty<P: ProductFeed>(feed: &P) -> Vec<Product> {
    match feed.fetch().await {
        Ok(products) => {
            ldebug!(products = products.len(), "feed: fetched");
            products
        }
        Err(err) => {
            lwarn!(error = %err, "feed: unavailable, continuing with no products");
            Vec::new()
        }
    }
}

/// Distinct categories in first-seen order. Blank categories are skipped.
pub fn collect_categories(products: &[Product]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for product in products {
        let category = product.category.trim();
        if !category.is_empty() && !categories.iter().any(|c| c == category) {
            categories.push(category.to_owned());
        }
    }
    categories
}

/// A list DOM that can clone its item template and fill the slots from a product.
///
/// Slots missing from the template stay unpopulated.
pub trait TemplateDom: ListDom {
    fn instantiate(&self, template: &Self::Element, product: &Product) -> Self::Element;
}

impl<T: TemplateDom + ?Sized> TemplateDom for Arc<T> {
    fn instantiate(&self, template: &Self::Element, product: &Product) -> Self::Element {
        (**self).instantiate(template, product)
    }
}

/// Replaces the list's items with one item per feed product.
///
/// The first stored item is the template. Without one, nothing happens. The loader element
/// shows while the feed is fetched. Once fetched, the swap runs as a single queued operation
/// so nothing queued meanwhile lands between the clear and the add.
pub async fn populate_from_feed<D, A, P>(list: &ListController<D, A>, feed: &P) -> Vec<ItemId>
where
    D: TemplateDom,
    A: Animator<D::Element>,
    P: ProductFeed,
{
    if list.read(|l| l.items().is_empty()) {
        lwarn!("feed: the list has no template item");
        return Vec::new();
    }
    list.display_element(DisplayKey::Loader, true, false).await;
    let products = fetch_or_empty(feed).await;
    list.display_element(DisplayKey::Loader, false, false).await;

    let dom = list.dom();
    list.replace_items(|items| {
        let template = items.first()?.element();
        Some(
            products
                .iter()
                .map(|product| dom.instantiate(template, product))
                .collect(),
        )
    })
    .await
}

/// Adds one checkbox per category to the filter inspecting `filter_key`.
pub async fn populate_category_filters<D, A, F>(
    filters: &FiltersController<D, A, F>,
    filter_key: &str,
    products: &[Product],
) -> bool
where
    D: ListDom,
    A: Animator<D::Element>,
    F: FiltersDom,
{
    let controls: Vec<FilterControl> = collect_categories(products)
        .into_iter()
        .map(|category| FilterControl::new(ControlKind::Checkbox, category))
        .collect();
    if controls.is_empty() {
        return false;
    }
    filters.add_controls(filter_key, controls).await
}
