//! Page windows over an ordered sequence.
use serde::Serialize;

/// Splits a sequence of `count` items into pages of `per_page` items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    /// Create a new `Paginator`. A zero page size is treated as one.
    #[must_use]
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    /// Number of pages needed for `count` items. An empty sequence still has one page.
    #[must_use]
    pub fn num_pages(&self, count: usize) -> usize {
        count.div_ceil(self.per_page).max(1)
    }

    /// Resolves a raw `page` query value to a page window.
    ///
    /// A missing or non-integer value selects the first page, an integer
    /// below one or past the end selects the last page.
    #[must_use]
    pub fn page(&self, count: usize, requested: Option<&str>) -> Page {
        let num_pages = self.num_pages(count);
        let number = match requested.map(str::trim) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 1 => num_pages,
                Ok(n) => usize::try_from(n).map_or(num_pages, |n| n.min(num_pages)),
                // Integers too large for `i64` are still past the end.
                Err(_) if is_integer(raw) => num_pages,
                Err(_) => 1,
            },
        };
        self.window(count, number)
    }

    /// The window of page `number`, which must already be within `1..=num_pages`.
    fn window(&self, count: usize, number: usize) -> Page {
        let offset = (number - 1) * self.per_page;
        Page {
            number,
            num_pages: self.num_pages(count),
            count,
            offset,
            limit: self.per_page.min(count.saturating_sub(offset)),
        }
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(crate::POSTS_PER_PAGE)
    }
}

/// A resolved page window plus the metadata templates need.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    /// Total number of pages, at least one.
    pub num_pages: usize,
    /// Total number of items across all pages.
    pub count: usize,
    /// Index of the first item on this page.
    pub offset: usize,
    /// Number of items on this page.
    pub limit: usize,
}

impl Page {
    /// Whether a page precedes this one.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
    /// Whether a page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
    /// Whether there is more than one page.
    #[must_use]
    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }
    /// Number of the previous page, if any.
    #[must_use]
    pub fn previous_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }
    /// Number of the next page, if any.
    #[must_use]
    pub fn next_number(&self) -> Option<usize> {
        self.has_next().then(|| self.number + 1)
    }
}
