use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page size any listing returns.
pub const MAX_PAGE_SIZE: usize = 200;

/// Clamps a caller-supplied page size into `[1, MAX_PAGE_SIZE]`.
///
/// Missing or non-positive values fall back to [`DEFAULT_PAGE_SIZE`].
#[must_use]
pub fn clamp_page_size(requested: Option<i64>) -> usize {
    match requested {
        Some(size) if size > 0 => usize::try_from(size)
            .unwrap_or(MAX_PAGE_SIZE)
            .min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    }
}

/// Page size and opaque cursor for a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of items.
    pub page_size: usize,
    /// Cursor returned by the previous page.
    pub page_token: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_token: None,
        }
    }
}

impl PageRequest {
    /// Creates a request with a clamped size.
    #[must_use]
    pub fn new(page_size: Option<i64>, page_token: Option<String>) -> Self {
        Self {
            page_size: clamp_page_size(page_size),
            page_token: page_token.filter(|token| !token.trim().is_empty()),
        }
    }
}

/// One page of results plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Cursor for the next page; absent on the last page.
    pub next_page_token: Option<String>,
}

impl<T> CursorPage<T> {
    /// Builds a page.
    #[must_use]
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }

    /// Converts every item while keeping the cursor.
    #[must_use]
    pub fn map<U>(self, transform: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(transform).collect(),
            next_page_token: self.next_page_token,
        }
    }
}

impl<T> Default for CursorPage<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CursorPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, clamp_page_size};

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(0)), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(-3)), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(10)), 10);
        assert_eq!(clamp_page_size(Some(5_000)), MAX_PAGE_SIZE);
    }

    #[test]
    fn blank_tokens_are_dropped() {
        assert_eq!(PageRequest::new(None, Some("  ".to_owned())).page_token, None);
    }

    #[test]
    fn map_keeps_cursor() {
        let page = CursorPage::new(vec![1, 2], Some("next".to_owned())).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.next_page_token.as_deref(), Some("next"));
    }
}
