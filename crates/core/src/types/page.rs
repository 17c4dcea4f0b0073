//! Offset pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// A page request as received from `?page=&size=` query parameters.
///
/// Pages are zero-based. Missing values fall back to the defaults and sizes
/// are clamped to [`PageRequest::MAX_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    size: Option<u32>,
}

impl PageRequest {
    /// Page size used when the client does not send one.
    pub const DEFAULT_SIZE: u32 = 10;
    /// Largest page a client may request.
    pub const MAX_SIZE: u32 = 100;

    /// Build a page request directly.
    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    /// Zero-based page index.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(0)
    }

    /// Effective page size, between 1 and [`Self::MAX_SIZE`].
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size_or(Self::DEFAULT_SIZE)
    }

    /// Effective page size using `default` when none was requested.
    #[must_use]
    pub fn size_or(&self, default: u32) -> u32 {
        self.size.unwrap_or(default).clamp(1, Self::MAX_SIZE)
    }

    /// SQL `LIMIT` for this page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.size())
    }

    /// SQL `OFFSET` for this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page()) * i64::from(self.size())
    }

    /// Same page index with a different default size.
    #[must_use]
    pub fn with_default_size(self, default: u32) -> Self {
        Self {
            page: self.page,
            size: Some(self.size_or(default)),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// One page of results plus totals, serialized in camelCase for the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    /// Requested page size.
    pub size: u32,
    /// Total matching items across all pages.
    pub total_elements: i64,
    /// Number of pages needed for `total_elements`.
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Assemble a page from its content and the total row count.
    #[must_use]
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let size = i64::from(request.size());
        let total_pages = if total_elements <= 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };

        Self {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages,
        }
    }

    /// Transform every item while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page(), 0);
        assert_eq!(req.size(), PageRequest::DEFAULT_SIZE);

        let req = PageRequest::new(2, 500);
        assert_eq!(req.size(), PageRequest::MAX_SIZE);
        assert_eq!(req.offset(), 200);

        let req = PageRequest::new(0, 0);
        assert_eq!(req.size(), 1);
    }

    #[test]
    fn test_with_default_size_keeps_explicit_size() {
        let req: PageRequest = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert_eq!(req.with_default_size(12).size(), 12);

        let req = PageRequest::new(1, 5);
        assert_eq!(req.with_default_size(12).size(), 5);
    }

    #[test]
    fn test_total_pages() {
        let req = PageRequest::new(0, 10);
        assert_eq!(Page::<u8>::new(vec![], req, 0).total_pages, 0);
        assert_eq!(Page::<u8>::new(vec![], req, 10).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], req, 11).total_pages, 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let page = Page::new(vec![1, 2], PageRequest::new(0, 2), 3).map(|n| n * 10);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["content"], serde_json::json!([10, 20]));
        assert_eq!(json["totalElements"], 3);
        assert_eq!(json["totalPages"], 2);
    }
}
