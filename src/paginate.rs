/// Splits an ordered listing into fixed-size pages.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: i64,
}

/// Where a resolved page sits in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub number: i64,
    pub num_pages: i64,
    per_page: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
}

impl Paginator {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: i64::from(per_page.max(1)),
        }
    }

    /// Resolves the raw `page` parameter against a listing of `total` items.
    /// Missing or unparsable input means the first page; numbers outside the
    /// listing clamp to the first or last page. An empty listing still has
    /// one (empty) page.
    pub fn window(&self, requested: Option<&str>, total: i64) -> Window {
        let num_pages = ((total.max(0) + self.per_page - 1) / self.per_page).max(1);
        let number = requested
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, num_pages);

        Window {
            number,
            num_pages,
            per_page: self.per_page,
        }
    }

    /// Pages through an in-memory slice without touching it.
    pub fn paginate<T: Clone>(&self, requested: Option<&str>, items: &[T]) -> Page<T> {
        let window = self.window(requested, items.len() as i64);
        let start = (window.offset() as usize).min(items.len());
        let end = (start + window.limit() as usize).min(items.len());
        window.fill(items[start..end].to_vec())
    }
}

impl Window {
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn fill<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
        }
    }
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thirteen() -> Vec<u32> {
        (1..=13).collect()
    }

    #[test]
    fn first_page_is_full() {
        let page = Paginator::new(10).paginate(None, &thirteen());
        assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 2);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn second_page_has_the_rest() {
        let page = Paginator::new(10).paginate(Some("2"), &thirteen());
        assert_eq!(page.items, vec![11, 12, 13]);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn past_the_end_clamps_to_last_page() {
        let page = Paginator::new(10).paginate(Some("3"), &thirteen());
        assert_eq!(page.number, 2);
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn junk_and_low_numbers_mean_first_page() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.window(Some("abc"), 13).number, 1);
        assert_eq!(paginator.window(Some("0"), 13).number, 1);
        assert_eq!(paginator.window(Some("-4"), 13).number, 1);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let page = Paginator::new(10).paginate::<u32>(Some("5"), &[]);
        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
    }

    #[test]
    fn window_offsets() {
        let window = Paginator::new(10).window(Some("2"), 13);
        assert_eq!(window.offset(), 10);
        assert_eq!(window.limit(), 10);
    }
}
