use crate::{Entity, Result};

use std::ops::Deref;

/// One page of a paginated query.
#[derive(Debug)]
pub struct Page<T = Entity> {
    /// Items in this page
    pub items: Vec<T>,

    /// Rows matched by the query across all pages
    pub total: u64,

    pub per_page: u64,

    /// 1-based page number
    pub current_page: u64,

    /// Last page number, zero when nothing matched
    pub last_page: u64,

    /// 1-based position of the first item overall, zero when the page is
    /// empty
    pub from: u64,

    /// Position of the last item overall, zero when the page is empty
    pub to: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, total: u64, per_page: u64, current_page: u64) -> Self {
        let last_page = total.div_ceil(per_page);
        let offset = current_page.saturating_sub(1).checked_mul(per_page);
        let (from, to) = match offset {
            Some(offset) if !items.is_empty() => (offset + 1, offset + items.len() as u64),
            _ => (0, 0),
        };

        Self {
            items,
            total,
            per_page,
            current_page,
            last_page,
            from,
            to,
        }
    }

    /// Returns true if there is a next page available
    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Returns true if there is a previous page available
    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    /// Converts every item, keeping the page bounds.
    pub fn try_map<U>(self, f: impl FnMut(T) -> Result<U>) -> Result<Page<U>> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_>>()?,
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        })
    }
}

impl<T> Deref for Page<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}
