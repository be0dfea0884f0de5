/// Entries shown per history page.
pub const PAGE_SIZE: usize = 5;

/// Pagination window over the stored swap history. A pure function of the
/// list length, the page size and the requested page; it never touches the
/// underlying list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub page_count: usize,
    pub start: usize,
    pub end: usize,
    page_size: usize,
    len: usize,
}

impl PageWindow {
    pub fn new(len: usize, page_size: usize, requested_page: usize) -> Self {
        let page_size = page_size.max(1);
        let page_count = if len == 0 {
            1
        } else {
            (len + page_size - 1) / page_size
        };
        let page = requested_page.clamp(1, page_count);
        let start = (page - 1) * page_size;
        let end = usize::min(start + page_size, len);
        Self {
            page,
            page_count,
            start,
            end,
            page_size,
            len,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page * self.page_size < self.len
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.start..self.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_is_a_single_disabled_page() {
        let window = PageWindow::new(0, PAGE_SIZE, 1);
        assert_eq!(window.page_count, 1);
        assert_eq!(window.slice(&[] as &[u8]), &[] as &[u8]);
        assert!(!window.has_prev());
        assert!(!window.has_next());
    }

    #[test]
    fn last_page_holds_the_remainder() {
        // 13 entries at page size 5: pages of 5, 5 and 3
        let window = PageWindow::new(13, 5, 3);
        assert_eq!(window.page_count, 3);
        assert_eq!(window.end - window.start, 3);
        assert!(window.has_prev());
        assert!(!window.has_next());
    }

    #[test]
    fn evenly_divisible_history_fills_the_last_page() {
        let window = PageWindow::new(10, 5, 2);
        assert_eq!(window.page_count, 2);
        assert_eq!(window.end - window.start, 5);
        assert!(!window.has_next());
    }

    #[test]
    fn prev_is_disabled_exactly_on_page_one() {
        assert!(!PageWindow::new(13, 5, 1).has_prev());
        assert!(PageWindow::new(13, 5, 2).has_prev());
    }

    #[test]
    fn next_is_disabled_exactly_when_end_reaches_len() {
        assert!(PageWindow::new(13, 5, 1).has_next());
        assert!(PageWindow::new(13, 5, 2).has_next());
        assert!(!PageWindow::new(13, 5, 3).has_next());
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        let window = PageWindow::new(13, 5, 99);
        assert_eq!(window.page, 3);
        let window = PageWindow::new(13, 5, 0);
        assert_eq!(window.page, 1);
    }

    #[test]
    fn slicing_never_mutates_and_matches_the_window() {
        let items: Vec<usize> = (0..13).collect();
        let window = PageWindow::new(items.len(), 5, 2);
        assert_eq!(window.slice(&items), &[5, 6, 7, 8, 9]);
        assert_eq!(items.len(), 13);
    }
}
