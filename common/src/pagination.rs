use serde::Serialize;
use url::Url;

use crate::error::{AppError, Res};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page-number pagination window parsed from `?page=` and `?page_size=`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// A missing or unparsable `page_size` falls back to the default and is capped at
    /// [`MAX_PAGE_SIZE`]. A non-numeric or non-positive `page`, or one whose offset
    /// does not fit an `i64`, is a 404.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Res<Self> {
        let invalid_page = || AppError::NotFound("Invalid page.".to_string());
        let page = match page {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(invalid_page)?,
        };
        let page_size = page_size
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|size| *size >= 1)
            .map(|size| size.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        (page - 1).checked_mul(page_size).ok_or_else(invalid_page)?;
        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Builds the envelope; `url` is the absolute request URL used to derive navigation links.
    /// Requesting a page past the end of a non-empty result set is a 404.
    pub fn new(results: Vec<T>, count: i64, req: PageRequest, url: &Url) -> Res<Self> {
        let last_page = ((count + req.page_size - 1) / req.page_size).max(1);
        if req.page > last_page {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }
        let next = (req.page < last_page).then(|| page_link(url, Some(req.page + 1)));
        let previous = (req.page > 1).then(|| {
            // page 1 is addressed without the parameter
            page_link(url, (req.page > 2).then_some(req.page - 1))
        });
        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}

fn page_link(url: &Url, page: Option<i64>) -> String {
    let mut link = url.clone();
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    {
        let mut pairs = link.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        if let Some(page) = page {
            pairs.append_pair("page", &page.to_string());
        }
    }
    if link.query() == Some("") {
        link.set_query(None);
    }
    link.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_window() {
        let req = PageRequest::parse(None, None).unwrap();
        assert_eq!(req, PageRequest { page: 1, page_size: 10 });
        assert_eq!(req.offset(), 0);

        let req = PageRequest::parse(Some("3"), Some("5")).unwrap();
        assert_eq!(req.offset(), 10);
        assert_eq!(req.limit(), 5);

        let capped = PageRequest::parse(None, Some("1000")).unwrap();
        assert_eq!(capped.page_size, MAX_PAGE_SIZE);

        let fallback = PageRequest::parse(None, Some("abc")).unwrap();
        assert_eq!(fallback.page_size, DEFAULT_PAGE_SIZE);

        assert!(PageRequest::parse(Some("0"), None).is_err());
        assert!(PageRequest::parse(Some("x"), None).is_err());
    }

    #[test]
    fn huge_page_is_not_found_instead_of_overflowing() {
        assert!(matches!(
            PageRequest::parse(Some("9223372036854775807"), None),
            Err(AppError::NotFound(ref m)) if m == "Invalid page."
        ));
        assert!(matches!(
            PageRequest::parse(Some("92233720368547760"), Some("100")),
            Err(AppError::NotFound(_))
        ));

        let far = PageRequest::parse(Some("922337203685477580"), Some("10")).unwrap();
        assert_eq!(far.offset(), 9_223_372_036_854_775_790);

        let literal = PageRequest {
            page: i64::MAX,
            page_size: MAX_PAGE_SIZE,
        };
        assert_eq!(literal.offset(), i64::MAX);
    }

    #[test]
    fn builds_navigation_links() {
        let url = Url::parse("http://localhost:8080/api/offers/?search=logo&page=2&page_size=1")
            .unwrap();
        let req = PageRequest::parse(Some("2"), Some("1")).unwrap();
        let page = Page::new(vec![1], 3, req, &url).unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(
            page.next.as_deref(),
            Some("http://localhost:8080/api/offers/?search=logo&page_size=1&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://localhost:8080/api/offers/?search=logo&page_size=1")
        );
    }

    #[test]
    fn single_page_has_no_links_and_overflow_is_rejected() {
        let url = Url::parse("http://localhost/api/offers/").unwrap();
        let first = Page::<i32>::new(vec![], 0, PageRequest::parse(None, None).unwrap(), &url)
            .unwrap();
        assert!(first.next.is_none());
        assert!(first.previous.is_none());

        let beyond = Page::<i32>::new(vec![], 4, PageRequest::parse(Some("2"), None).unwrap(), &url);
        assert!(matches!(beyond, Err(AppError::NotFound(_))));
    }
}
