use serde::Serialize;

/// Splits a counted result set into fixed-size, 1-indexed pages.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
}

/// Resolved position of a page inside a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<u64>,
    pub next_page_number: Option<u64>,
}

impl Paginator {
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// An empty result set still has one (empty) page.
    pub fn num_pages(&self, count: u64) -> u64 {
        if count == 0 {
            1
        } else {
            count.div_ceil(self.per_page)
        }
    }

    /// Picks the page for a raw `?page=` value.
    /// Garbage or a missing value means page 1, out-of-range numbers are clamped.
    pub fn window(&self, requested: Option<&str>, count: u64) -> PageWindow {
        let num_pages = self.num_pages(count);
        let number = match requested.map(parse_page) {
            Some(RequestedPage::Number(n)) if n < 1 => 1,
            Some(RequestedPage::Number(n)) => (n as u64).min(num_pages),
            Some(RequestedPage::TooLarge) => num_pages,
            Some(RequestedPage::Invalid) | None => 1,
        };
        PageWindow {
            number,
            num_pages,
            count,
            limit: self.per_page,
            offset: (number - 1) * self.per_page,
        }
    }
}

enum RequestedPage {
    Number(i64),
    /// All digits, but past `i64::MAX`
    TooLarge,
    Invalid,
}

fn parse_page(raw: &str) -> RequestedPage {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return RequestedPage::Number(n);
    }
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        RequestedPage::TooLarge
    } else {
        // a huge negative number is still below page 1
        match raw.strip_prefix('-') {
            Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => {
                RequestedPage::Number(0)
            }
            _ => RequestedPage::Invalid,
        }
    }
}

impl PageWindow {
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        let has_previous = self.number > 1;
        let has_next = self.number < self.num_pages;
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_previous,
            has_next,
            previous_page_number: has_previous.then(|| self.number - 1),
            next_page_number: has_next.then(|| self.number + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_garbage_page_is_first() {
        let p = Paginator::new(10);
        assert_eq!(p.window(None, 13).number, 1);
        assert_eq!(p.window(Some("abc"), 13).number, 1);
        assert_eq!(p.window(Some(""), 13).number, 1);
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        let p = Paginator::new(10);
        assert_eq!(p.window(Some("0"), 13).number, 1);
        assert_eq!(p.window(Some("-4"), 13).number, 1);
        let last = p.window(Some("99"), 13);
        assert_eq!(last.number, 2);
        assert_eq!(last.offset, 10);
    }

    #[test]
    fn numbers_past_i64_go_to_the_last_page() {
        let p = Paginator::new(10);
        assert_eq!(p.window(Some("99999999999999999999"), 13).number, 2);
        assert_eq!(p.window(Some("+99999999999999999999"), 13).number, 2);
        assert_eq!(p.window(Some("-99999999999999999999"), 13).number, 1);
        assert_eq!(p.window(Some("9999999999999999999x"), 13).number, 1);
    }

    #[test]
    fn second_page_holds_the_remainder() {
        let p = Paginator::new(10);
        let w = p.window(Some("2"), 13);
        assert_eq!((w.limit, w.offset, w.num_pages), (10, 10, 2));

        let page = w.into_page(vec![1, 2, 3]);
        assert!(page.has_previous);
        assert!(!page.has_next);
        assert_eq!(page.previous_page_number, Some(1));
        assert_eq!(page.next_page_number, None);
    }

    #[test]
    fn empty_set_has_one_page() {
        let p = Paginator::new(10);
        let w = p.window(Some("3"), 0);
        assert_eq!((w.number, w.num_pages, w.offset), (1, 1, 0));
        let page = w.into_page(Vec::<u8>::new());
        assert!(!page.has_next && !page.has_previous);
    }

    #[test]
    fn zero_page_size_is_bumped_to_one() {
        assert_eq!(Paginator::new(0).per_page(), 1);
    }
}
