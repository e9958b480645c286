use crate::{PageChange, PageSlice, PaginationMode};

/// `ceil(count / per_page)`; a zero page size yields zero pages.
pub fn total_pages(count: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    count.div_ceil(per_page)
}

/// Clamps `page` into `[1, max(1, total_pages)]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// The items of `page` (1-indexed, clamped first) out of `valid`.
pub fn get_page_slice<T>(valid: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 {
        return valid;
    }
    let page = clamp_page(page, total_pages(valid.len(), page_size));
    let start = (page - 1).saturating_mul(page_size).min(valid.len());
    let end = start.saturating_add(page_size).min(valid.len());
    &valid[start..end]
}

/// Page state of one list.
///
/// `total_pages` follows the valid item count; `current_page` is kept in
/// `[1, max(1, total_pages)]` on every update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    mode: PaginationMode,
    items_per_page: Option<usize>,
    original_items_per_page: Option<usize>,
    current_page: usize,
    total_pages: usize,
}

impl Pagination {
    /// `items_per_page = None` (or zero) disables pagination: every valid item is rendered.
    pub fn new(items_per_page: Option<usize>, mode: PaginationMode) -> Self {
        let items_per_page = items_per_page.filter(|&n| n > 0);
        Self {
            mode,
            items_per_page,
            original_items_per_page: items_per_page,
            current_page: 1,
            total_pages: 0,
        }
    }

    pub fn active(&self) -> bool {
        self.items_per_page.is_some()
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    pub fn items_per_page(&self) -> Option<usize> {
        self.items_per_page
    }

    pub fn original_items_per_page(&self) -> Option<usize> {
        self.original_items_per_page
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Recomputes `total_pages` for `valid_count` items and clamps the current page.
    pub fn update_total(&mut self, valid_count: usize) {
        self.total_pages = match self.items_per_page {
            Some(per_page) => total_pages(valid_count, per_page),
            None => usize::from(valid_count > 0),
        };
        let clamped = clamp_page(self.current_page, self.total_pages);
        if clamped != self.current_page {
            ltrace!(
                from = self.current_page,
                to = clamped,
                total_pages = self.total_pages,
                "Pagination: current page clamped"
            );
            self.current_page = clamped;
        }
    }

    /// Moves to `target`, clamped into the valid range.
    pub fn switch_page(&mut self, target: usize) -> PageChange {
        let from = self.current_page;
        self.current_page = clamp_page(target, self.total_pages);
        PageChange {
            from,
            to: self.current_page,
        }
    }

    /// Back to the empty baseline: page 1 of 0.
    pub fn reset(&mut self) {
        self.current_page = 1;
        self.total_pages = 0;
        self.items_per_page = self.original_items_per_page;
    }

    /// The window of the valid sequence to render.
    pub fn slice(&self, valid_count: usize) -> PageSlice {
        let (start, end) = match self.items_per_page {
            None => (0, valid_count),
            Some(per_page) => {
                let page = clamp_page(self.current_page, total_pages(valid_count, per_page));
                let end = page.saturating_mul(per_page).min(valid_count);
                let start = match self.mode {
                    PaginationMode::Paginate => (page - 1).saturating_mul(per_page).min(end),
                    PaginationMode::LoadMore => 0,
                };
                (start, end)
            }
        };
        PageSlice {
            start,
            end,
            page: self.current_page,
            total_pages: self.total_pages,
        }
    }
}
