use std::cmp::Ordering;
use std::collections::HashMap;

use crate::props::compare_values;
use crate::{Item, ItemId, ItemProps, NewItem, Placement, SortDirection};

/// The canonical collection of items.
///
/// Two orders are kept: the canonical insertion order (`original_order`) and the working order
/// (`items`), which sorting rearranges. Validity flags live on the items themselves.
#[derive(Clone, Debug)]
pub struct ItemStore<E> {
    items: Vec<Item<E>>,
    original_order: Vec<ItemId>,
    next_id: ItemId,
}

impl<E> Default for ItemStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ItemStore<E> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            original_order: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in working order.
    pub fn items(&self) -> &[Item<E>] {
        &self.items
    }

    /// Item ids in canonical insertion order.
    pub fn original_order(&self) -> &[ItemId] {
        &self.original_order
    }

    pub fn working_order(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.id).collect()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item<E>> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item<E>> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Item<E>> {
        self.items.iter_mut()
    }

    pub fn valid_items(&self) -> impl Iterator<Item = &Item<E>> {
        self.items.iter().filter(|i| i.valid)
    }

    /// Valid item ids in working order.
    pub fn valid_ids(&self) -> Vec<ItemId> {
        self.valid_items().map(|i| i.id).collect()
    }

    pub fn valid_count(&self) -> usize {
        self.items.iter().filter(|i| i.valid).count()
    }

    /// Stores a batch of items. New items start valid; callers recompute validity afterwards.
    ///
    /// Prepending keeps the batch's own order: `[C, D]` prepended to `[A, B]` gives
    /// `[C, D, A, B]`.
    pub fn add_items(&mut self, batch: Vec<NewItem<E>>, placement: Placement) -> Vec<ItemId> {
        let mut created = Vec::with_capacity(batch.len());
        let mut new_items = Vec::with_capacity(batch.len());
        for new in batch {
            let id = self.next_id;
            self.next_id += 1;
            created.push(id);
            new_items.push(Item {
                id,
                element: new.element,
                props: new.props,
                href: new.href,
                valid: true,
                order_index: 0,
                current_index: None,
                needs_restart: true,
            });
        }

        match placement {
            Placement::Append => {
                self.original_order.extend(created.iter().copied());
                self.items.extend(new_items);
            }
            Placement::Prepend => {
                self.original_order.splice(0..0, created.iter().copied());
                self.items.splice(0..0, new_items);
            }
        }
        self.reindex();
        ldebug!(
            added = created.len(),
            total = self.items.len(),
            ?placement,
            "ItemStore::add_items"
        );
        created
    }

    /// Empties the store and hands the items back so the caller can detach their elements.
    pub fn clear(&mut self) -> Vec<Item<E>> {
        self.original_order.clear();
        ldebug!(removed = self.items.len(), "ItemStore::clear");
        core::mem::take(&mut self.items)
    }

    /// Resets the working order to the canonical insertion order. Idempotent.
    pub fn restore_original_order(&mut self) {
        self.items.sort_by_key(|i| i.order_index);
    }

    /// Sorts the working order by the first value of `key`. Items without the key go last in
    /// either direction; ties keep their current relative order.
    pub fn sort_by_prop(&mut self, key: &str, direction: SortDirection) {
        self.items.sort_by(|a, b| {
            let av = first_value(&a.props, key);
            let bv = first_value(&b.props, key);
            match (av, bv) {
                (Some((x, ty)), Some((y, _))) => {
                    let ord = compare_values(x, y, ty);
                    match direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    /// Recomputes every item's validity flag. Returns how many flags changed.
    pub fn recompute_validity(&mut self, mut is_valid: impl FnMut(&ItemProps) -> bool) -> usize {
        let mut changed = 0;
        for item in &mut self.items {
            let next = is_valid(&item.props);
            if next != item.valid {
                item.valid = next;
                changed += 1;
            }
        }
        changed
    }

    fn reindex(&mut self) {
        let positions: HashMap<ItemId, usize> = self
            .original_order
            .iter()
            .enumerate()
            .map(|(pos, &id)| (id, pos))
            .collect();
        for item in &mut self.items {
            if let Some(&pos) = positions.get(&item.id) {
                item.order_index = pos;
            }
        }
    }
}

fn first_value<'a>(
    props: &'a ItemProps,
    key: &str,
) -> Option<(&'a str, Option<crate::ValueType>)> {
    let entry = props.get(key)?;
    let value = entry.values.iter().next()?;
    Some((value.as_str(), entry.value_type))
}
