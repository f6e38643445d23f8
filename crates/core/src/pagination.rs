//! Fixed-size pagination for admin listings.

/// Rows per page in the admin product list.
pub const ADMIN_PAGE_SIZE: usize = 10;

/// A page of a list, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Current page, always within `1..=total_pages`.
    pub number: usize,
    /// At least 1, even for an empty list.
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl Page {
    /// Clamp `requested` into range for a list of `total_items`.
    #[must_use]
    pub fn new(requested: usize, total_items: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);
        Self {
            number: requested.clamp(1, total_pages),
            total_pages,
            total_items,
            page_size,
        }
    }

    /// Index range of the current page's items.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.number - 1) * self.page_size;
        start.min(self.total_items)..(start + self.page_size).min(self.total_items)
    }

    /// The current page's slice of `items`.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        items.get(self.range()).unwrap_or_default()
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// Page numbers for the pager, `1..=total_pages`.
    #[must_use]
    pub fn numbers(&self) -> Vec<usize> {
        (1..=self.total_pages).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_has_one_page() {
        let page = Page::new(3, 0, ADMIN_PAGE_SIZE);
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.slice::<u8>(&[]).is_empty());
    }

    #[test]
    fn test_page_is_clamped() {
        assert_eq!(Page::new(0, 25, 10).number, 1);
        assert_eq!(Page::new(9, 25, 10).number, 3);
    }

    #[test]
    fn test_last_page_is_partial() {
        let items: Vec<u32> = (0..25).collect();
        let page = Page::new(3, items.len(), 10);

        assert_eq!(page.slice(&items), &[20, 21, 22, 23, 24]);
        assert!(page.has_previous());
        assert!(!page.has_next());
        assert_eq!(page.numbers(), vec![1, 2, 3]);
    }

    #[test]
    fn test_exact_multiple() {
        let page = Page::new(2, 20, 10);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.range(), 10..20);
    }
}
