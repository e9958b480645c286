// Example: headless filtering and pagination over plain string handles.
use cmslist::{
    CollectionList, FilterControl, FilterDefinition, FilterMode, FilterRegistry, ItemProps,
    ListOptions, NewItem, Placement, PropField, RangeTag,
};

fn main() {
    let mut list = CollectionList::new(ListOptions::new("shop").with_items_per_page(Some(2)));

    let catalog = [
        ("backpack", "bags", "109"),
        ("tote", "bags", "24"),
        ("tee", "clothing", "15"),
        ("jacket", "clothing", "56"),
        ("ring", "jewelery", "9"),
    ];
    let batch = catalog
        .iter()
        .map(|(name, category, price)| {
            let props = ItemProps::from_fields([
                PropField::new("category", *category),
                PropField::new("price", *price),
            ]);
            NewItem::new(*name, props)
        })
        .collect();
    list.add_items(batch, Placement::Append, None);

    let mut filters = FilterRegistry::new()
        .with_filter(
            FilterDefinition::new("category")
                .with_controls([FilterControl::checkbox("bags"), FilterControl::checkbox("clothing")]),
        )
        .with_filter(
            FilterDefinition::new("price")
                .with_mode(Some(FilterMode::Range))
                .with_controls([
                    FilterControl::range_input(RangeTag::From),
                    FilterControl::range_input(RangeTag::To),
                ]),
        );
    filters.set_active_values("category", ["bags", "clothing"]);
    filters.set_active_values("price", ["10", "60"]);

    let outcome = list.apply_filters(&filters);
    println!("valid={} changed={}", outcome.valid, outcome.changed);

    for page in 1..=list.page_state().total_pages {
        list.switch_page(page);
        let names: Vec<&str> = list
            .target_ids()
            .into_iter()
            .filter_map(|id| list.item(id).map(|item| *item.element()))
            .collect();
        println!("page {page}: {names:?}");
    }
}
