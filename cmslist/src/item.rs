use crate::{ItemId, ItemProps};

/// One unit of the collection: an element handle plus its property bag.
///
/// `E` is the host's element handle (a DOM node reference, a widget id, ...). The store owns the
/// handle for the item's lifetime; renderers clone it to mount the element.
#[derive(Clone, Debug)]
pub struct Item<E> {
    pub(crate) id: ItemId,
    pub(crate) element: E,
    pub(crate) props: ItemProps,
    pub(crate) href: Option<String>,
    pub(crate) valid: bool,
    pub(crate) order_index: usize,
    pub(crate) current_index: Option<usize>,
    pub(crate) needs_restart: bool,
}

impl<E> Item<E> {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn props(&self) -> &ItemProps {
        &self.props
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Position in the canonical (insertion) order.
    pub fn order_index(&self) -> usize {
        self.order_index
    }

    /// Position in the rendered sequence, `None` while not rendered.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Whether the host modules must be restarted once this item is mounted.
    pub fn needs_restart(&self) -> bool {
        self.needs_restart
    }
}

/// Input for [`crate::ItemStore::add_items`].
#[derive(Clone, Debug)]
pub struct NewItem<E> {
    pub element: E,
    pub props: ItemProps,
    pub href: Option<String>,
}

impl<E> NewItem<E> {
    pub fn new(element: E, props: ItemProps) -> Self {
        Self {
            element,
            props,
            href: None,
        }
    }

    /// An item whose markup could not be read: stored uncategorized and always valid.
    pub fn bare(element: E) -> Self {
        Self::new(element, ItemProps::new())
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// Rendering lifecycle of one item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderState {
    #[default]
    Unmounted,
    Mounting,
    Mounted,
    Unmounting,
}

impl RenderState {
    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition(self, next: RenderState) -> bool {
        use RenderState::*;
        matches!(
            (self, next),
            (Unmounted, Mounting)
                | (Mounting, Mounted)
                | (Mounted, Unmounting)
                | (Unmounting, Unmounted)
                | (Mounted, Mounted)
        )
    }
}
