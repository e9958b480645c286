use std::cell::RefCell;

use cmslist::{
    CollectionList, FieldKeys, FilterDefinition, FilterRegistry, FiltersOptions, ListOptions,
    Placement, PropField,
};
use cmslist_adapter::feed::{parse_products, populate_category_filters, populate_from_feed};
use cmslist_adapter::{
    DisplayKey, FeedError, FiltersController, ListController, ListDom, MarkupError, Product,
    ProductFeed, TemplateDom,
};

/// Prints every DOM mutation instead of touching a page.
#[derive(Default)]
struct ConsoleDom {
    mounted: RefCell<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
struct Card {
    title: String,
    category: String,
}

impl ListDom for ConsoleDom {
    type Element = Card;

    fn collect_props(&self, card: &Card, _keys: &FieldKeys) -> Result<Vec<PropField>, MarkupError> {
        Ok(vec![
            PropField::new("title", card.title.clone()),
            PropField::new("category", card.category.clone()),
        ])
    }

    fn mount(&self, card: &Card, index: usize) {
        let mut mounted = self.mounted.borrow_mut();
        mounted.retain(|t| *t != card.title);
        let len = mounted.len();
        mounted.insert(index.min(len), card.title.clone());
    }

    fn unmount(&self, card: &Card) {
        self.mounted.borrow_mut().retain(|t| *t != card.title);
    }

    fn has_element(&self, key: DisplayKey) -> bool {
        key == DisplayKey::EmptyElement
    }

    fn set_display(&self, key: DisplayKey, show: bool) {
        println!("  display {key:?} = {show}");
    }
}

impl TemplateDom for ConsoleDom {
    fn instantiate(&self, _template: &Card, product: &Product) -> Card {
        Card {
            title: product.title.clone(),
            category: product.category.clone(),
        }
    }
}

struct FixtureFeed;

impl ProductFeed for FixtureFeed {
    async fn fetch(&self) -> Result<Vec<Product>, FeedError> {
        parse_products(
            br#"[
                {"title": "Backpack", "category": "bags"},
                {"title": "Tee", "category": "clothing"},
                {"title": "Jacket", "category": "clothing"}
            ]"#,
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let list = ListController::without_animations(
        ConsoleDom::default(),
        CollectionList::new(ListOptions::new("shop")),
    );
    let template = Card {
        title: "template".to_owned(),
        category: String::new(),
    };
    list.add_items(vec![template], Placement::Append).await;

    populate_from_feed(&list, &FixtureFeed).await;
    println!("after feed: {:?}", list.dom().mounted.borrow());

    let filters = FiltersController::new(
        list.clone(),
        FilterRegistry::new().with_filter(FilterDefinition::new("category")),
        (),
        FiltersOptions::default(),
    );
    let products = FixtureFeed.fetch().await.unwrap_or_default();
    populate_category_filters(&filters, "category", &products).await;

    filters.set_active_values("category", ["clothing"]).await;
    println!("clothing: {:?}", list.dom().mounted.borrow());

    filters.reset_filters(None, None).await;
    println!("reset: {:?}", list.dom().mounted.borrow());
}
