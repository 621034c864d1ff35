//! Paged results.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use url::form_urlencoded;

/// Default query-string key carrying the page number.
pub const DEFAULT_PAGE_NAME: &str = "page";

/// Which page to fetch.
///
/// The page number is 1-based; 0 is clamped to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_name: String,
}

impl PageRequest {
    pub fn new(page: u64) -> Self {
        Self::named(DEFAULT_PAGE_NAME, page)
    }

    /// A request whose page number travels under `name` in query strings.
    pub fn named(name: impl Into<String>, page: u64) -> Self {
        Self {
            page: page.max(1),
            page_name: name.into(),
        }
    }

    /// Read the page number from a URL query string such as `a=1&page=3`.
    ///
    /// Keys and values are form-decoded (`%XX`, `+` as space). A leading `?`
    /// is ignored. An absent, empty or non-numeric value gives page 1; the
    /// first occurrence of `name` wins.
    pub fn from_query(query: &str, name: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let page = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.trim().parse::<u64>().ok())
            .unwrap_or(1);
        Self::named(name, page)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_name(&self) -> &str {
        &self.page_name
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

impl From<u64> for PageRequest {
    fn from(page: u64) -> Self {
        Self::new(page)
    }
}

/// One page of results plus the metadata needed to render page links.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginator<T> {
    items: Vec<T>,
    total: u64,
    per_page: u64,
    current_page: u64,
    page_name: String,
}

impl<T> Paginator<T> {
    pub fn new(
        items: Vec<T>,
        total: u64,
        per_page: u64,
        current_page: u64,
        page_name: impl Into<String>,
    ) -> Self {
        Self {
            items,
            total,
            per_page,
            current_page,
            page_name: page_name.into(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Total rows across all pages.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    /// `ceil(total / per_page)`, or a single page when `per_page` is 0.
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return u64::from(self.total > 0);
        }
        self.total.div_ceil(self.per_page)
    }

    pub fn has_pages(&self) -> bool {
        self.last_page() > 1
    }

    pub fn on_first_page(&self) -> bool {
        self.current_page == 1
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }
}

impl<T> IntoIterator for Paginator<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Paginator<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for Paginator<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Paginator", 6)?;
        s.serialize_field("data", &self.items)?;
        s.serialize_field("total", &self.total)?;
        s.serialize_field("per_page", &self.per_page)?;
        s.serialize_field("current_page", &self.current_page)?;
        s.serialize_field("last_page", &self.last_page())?;
        s.serialize_field("page_name", &self.page_name)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_metadata() {
        let first = Paginator::new(vec![1, 2], 5, 2, 1, "page");
        assert_eq!(first.last_page(), 3);
        assert!(first.has_pages());
        assert!(first.on_first_page());
        assert!(first.has_more_pages());

        let last = Paginator::new(vec![5], 5, 2, 3, "page");
        assert!(!last.on_first_page());
        assert!(!last.has_more_pages());
    }

    #[test]
    fn single_and_empty_pages() {
        let single = Paginator::new(vec!["a"], 1, 10, 1, "page");
        assert_eq!(single.last_page(), 1);
        assert!(!single.has_pages());
        assert!(!single.has_more_pages());

        let empty: Paginator<i32> = Paginator::new(vec![], 0, 10, 1, "page");
        assert_eq!(empty.last_page(), 0);
        assert!(!empty.has_more_pages());
    }

    #[test]
    fn zero_per_page_is_one_page() {
        let p = Paginator::new(vec![1, 2, 3], 3, 0, 1, "page");
        assert_eq!(p.last_page(), 1);
        let empty: Paginator<i32> = Paginator::new(vec![], 0, 0, 1, "page");
        assert_eq!(empty.last_page(), 0);
    }

    #[test]
    fn iterates_by_ref_and_value() {
        let p = Paginator::new(vec![1, 2, 3], 3, 3, 1, "page");
        let sum: i32 = (&p).into_iter().sum();
        assert_eq!(sum, 6);
        let owned: Vec<i32> = p.into_iter().collect();
        assert_eq!(owned, vec![1, 2, 3]);
    }

    #[test]
    fn serializes_with_last_page() {
        let p = Paginator::new(vec!["x"], 7, 3, 2, "p");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["data"], serde_json::json!(["x"]));
        assert_eq!(json["total"], 7);
        assert_eq!(json["last_page"], 3);
        assert_eq!(json["current_page"], 2);
        assert_eq!(json["page_name"], "p");
    }

    #[test]
    fn page_request_from_query() {
        assert_eq!(PageRequest::from_query("a=1&page=3", "page").page(), 3);
        assert_eq!(PageRequest::from_query("?p=4", "p").page(), 4);
        assert_eq!(PageRequest::from_query("page=abc", "page").page(), 1);
        assert_eq!(PageRequest::from_query("other=2", "page").page(), 1);
        assert_eq!(PageRequest::from_query("", "page").page(), 1);
        assert_eq!(PageRequest::from_query("page", "page").page(), 1);
        assert_eq!(PageRequest::from_query("page=0", "page").page(), 1);
        assert_eq!(PageRequest::from_query("p=2", "p").page_name(), "p");
    }

    #[test]
    fn page_request_decodes_percent_and_plus() {
        assert_eq!(PageRequest::from_query("page=%33", "page").page(), 3);
        assert_eq!(PageRequest::from_query("my+page=4", "my page").page(), 4);
        assert_eq!(PageRequest::from_query("my%20page=5&x=1", "my page").page(), 5);
        assert_eq!(PageRequest::from_query("page=+7+", "page").page(), 7);
        assert_eq!(PageRequest::from_query("page=2&page=9", "page").page(), 2);
    }

    #[test]
    fn page_zero_is_clamped() {
        assert_eq!(PageRequest::new(0).page(), 1);
        assert_eq!(PageRequest::from(0).page(), 1);
        assert_eq!(PageRequest::default().page_name(), DEFAULT_PAGE_NAME);
    }
}
