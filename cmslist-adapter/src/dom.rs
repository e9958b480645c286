use std::fmt;
use std::sync::Arc;

use cmslist::{
    FieldKeys, FilterControl, FilterTag, ItemProps, PropField, RangeTag, RestartFlags, ValueType,
    attr,
};

use crate::MarkupError;

/// Auxiliary elements a list can show or hide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayKey {
    Wrapper,
    List,
    EmptyElement,
    InitialElement,
    PaginationNext,
    PaginationPrevious,
    Loader,
}

/// Text elements refreshed after every render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextKey {
    /// All stored items.
    ItemsCount,
    /// Valid items.
    VisibleCount,
    /// `"{current} / {total}"`.
    PaginationCount,
}

/// What an animation runs on.
#[derive(Debug)]
pub enum AnimationTarget<'a, E> {
    Item(&'a E),
    Element(DisplayKey),
}

impl<E> Clone for AnimationTarget<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for AnimationTarget<'_, E> {}

/// Builds one field from the raw attributes of a field element.
///
/// `value_type` and `range` are the optional `fs-cmsfilter-type` / `fs-cmsfilter-range` values.
/// Unknown values are reported rather than ignored, so a typo does not silently change how the
/// field compares.
pub fn read_field(
    key: &str,
    value: &str,
    value_type: Option<&str>,
    range: Option<&str>,
) -> Result<PropField, MarkupError> {
    let invalid = |attribute: &str, raw: &str| MarkupError::InvalidValue {
        attribute: attribute.to_owned(),
        value: raw.to_owned(),
    };
    let mut field = PropField::new(key, value);
    if let Some(raw) = value_type {
        let value_type = ValueType::parse(raw).ok_or_else(|| invalid(attr::FIELD_TYPE, raw))?;
        field = field.with_type(value_type);
    }
    if let Some(raw) = range {
        let range = RangeTag::parse(raw).ok_or_else(|| invalid(attr::FIELD_RANGE, raw))?;
        field = field.with_range(range);
    }
    Ok(field)
}

/// The DOM subtree owned by one list instance.
///
/// Only the list's render orchestrator calls the mutating methods, always from inside the
/// list's operation queue. Optional hooks default to no-ops.
pub trait ListDom {
    type Element: Clone + PartialEq + fmt::Debug;

    /// Reads an item's filterable fields from its markup.
    fn collect_props(
        &self,
        element: &Self::Element,
        keys: &FieldKeys,
    ) -> Result<Vec<PropField>, MarkupError>;

    /// The item's template-page URL, if the markup links one.
    fn item_href(&self, _element: &Self::Element) -> Option<String> {
        None
    }

    /// Inserts (or moves) `element` to position `index` of the list element.
    fn mount(&self, element: &Self::Element, index: usize);

    fn unmount(&self, element: &Self::Element);

    fn has_element(&self, key: DisplayKey) -> bool;

    fn set_display(&self, key: DisplayKey, show: bool);

    fn set_text(&self, _key: TextKey, _text: &str) {}

    fn set_opacity(&self, _target: AnimationTarget<'_, Self::Element>, _opacity: f32) {}

    fn apply_highlights(&self, _element: &Self::Element, _props: &ItemProps) {}

    fn scroll_to_anchor(&self) {}

    /// Sets (`Some`) or removes (`None`) one query parameter of the page URL.
    fn write_query_param(&self, _key: &str, _value: Option<&str>) {}

    /// Pass-through signal asking the host to reinitialize its own modules.
    fn restart_modules(&self, _flags: RestartFlags) {}
}

impl<T: ListDom + ?Sized> ListDom for Arc<T> {
    type Element = T::Element;

    fn collect_props(
        &self,
        element: &Self::Element,
        keys: &FieldKeys,
    ) -> Result<Vec<PropField>, MarkupError> {
        (**self).collect_props(element, keys)
    }

    fn item_href(&self, element: &Self::Element) -> Option<String> {
        (**self).item_href(element)
    }

    fn mount(&self, element: &Self::Element, index: usize) {
        (**self).mount(element, index)
    }

    fn unmount(&self, element: &Self::Element) {
        (**self).unmount(element)
    }

    fn has_element(&self, key: DisplayKey) -> bool {
        (**self).has_element(key)
    }

    fn set_display(&self, key: DisplayKey, show: bool) {
        (**self).set_display(key, show)
    }

    fn set_text(&self, key: TextKey, text: &str) {
        (**self).set_text(key, text)
    }

    fn set_opacity(&self, target: AnimationTarget<'_, Self::Element>, opacity: f32) {
        (**self).set_opacity(target, opacity)
    }

    fn apply_highlights(&self, element: &Self::Element, props: &ItemProps) {
        (**self).apply_highlights(element, props)
    }

    fn scroll_to_anchor(&self) {
        (**self).scroll_to_anchor()
    }

    fn write_query_param(&self, key: &str, value: Option<&str>) {
        (**self).write_query_param(key, value)
    }

    fn restart_modules(&self, flags: RestartFlags) {
        (**self).restart_modules(flags)
    }
}

/// The filters form. Every hook is optional.
pub trait FiltersDom {
    /// Mirrors one control's state (checked/value, hidden, results count, active class).
    fn sync_control(
        &self,
        _filter_index: usize,
        _control_index: usize,
        _control: &FilterControl,
        _active_class: &str,
    ) {
    }

    fn set_results_count(&self, _count: usize) {}

    fn sync_tags(&self, _tags: &[FilterTag]) {}
}

impl FiltersDom for () {}

impl<T: FiltersDom + ?Sized> FiltersDom for Arc<T> {
    fn sync_control(
        &self,
        filter_index: usize,
        control_index: usize,
        control: &FilterControl,
        active_class: &str,
    ) {
        (**self).sync_control(filter_index, control_index, control, active_class)
    }

    fn set_results_count(&self, count: usize) {
        (**self).set_results_count(count)
    }

    fn sync_tags(&self, tags: &[FilterTag]) {
        (**self).sync_tags(tags)
    }
}
