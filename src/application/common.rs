use serde::Serialize;

use crate::pipeline::ValidationFailures;

pub const TITLE_MAX_LENGTH: usize = 200;

/// One page of results plus the paging facts the client needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub page_number: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> PaginatedList<T> {
    pub fn new(items: Vec<T>, total_count: i64, page_number: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            total_count / page_size + i64::from(total_count % page_size != 0)
        } else {
            0
        };

        Self {
            items,
            page_number,
            total_pages,
            total_count,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
        }
    }

    /// Rows to skip to reach the page, saturating for pages far past the end
    pub fn offset(page_number: i64, page_size: i64) -> i64 {
        page_number.saturating_sub(1).max(0).saturating_mul(page_size.max(0))
    }
}

/// Title must be present and at most 200 characters. Returns true when both hold.
pub fn validate_title(failures: &mut ValidationFailures, title: Option<&str>) -> bool {
    let present = failures.not_empty("Title", title);
    let short_enough = failures.max_length("Title", title, TITLE_MAX_LENGTH);
    present && short_enough
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_facts() {
        let page: PaginatedList<i32> = PaginatedList::new(vec![1, 2], 12, 2, 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous_page);
        assert!(page.has_next_page);

        let last: PaginatedList<i32> = PaginatedList::new(vec![], 10, 2, 5);
        assert_eq!(last.total_pages, 2);
        assert!(!last.has_next_page);

        let empty: PaginatedList<i32> = PaginatedList::new(vec![], 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_previous_page);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn offsets() {
        assert_eq!(PaginatedList::<()>::offset(1, 10), 0);
        assert_eq!(PaginatedList::<()>::offset(3, 10), 20);
    }

    #[test]
    fn extreme_page_sizes_do_not_overflow() {
        let page: PaginatedList<i32> = PaginatedList::new(vec![1], 1, 1, i64::MAX);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next_page);

        let far: PaginatedList<i32> = PaginatedList::new(vec![], 3, i64::MAX, 2);
        assert_eq!(far.total_pages, 2);
        assert!(far.has_previous_page);
        assert!(!far.has_next_page);

        assert_eq!(PaginatedList::<()>::offset(i64::MAX, 10), i64::MAX);
        assert_eq!(PaginatedList::<()>::offset(2, i64::MAX), i64::MAX);
    }
}
