// Use 3rd party
use serde::{Deserialize, Serialize};

/// Paged list envelope returned by the list endpoints:
/// `{"items": [...], "total": 47, "skip": 40, "limit": 10}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            skip: 0,
            limit: 0,
        }
    }
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Always false for a zero `limit`, which could never advance.
    pub fn has_next(&self) -> bool {
        self.limit > 0 && self.skip.saturating_add(self.limit) < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.skip > 0
    }

    pub fn next_skip(&self) -> Option<u64> {
        if self.has_next() {
            Some(self.skip.saturating_add(self.limit))
        } else {
            None
        }
    }

    pub fn previous_skip(&self) -> Option<u64> {
        if self.has_previous() {
            Some(self.skip.saturating_sub(self.limit))
        } else {
            None
        }
    }

    /// One-based page number of this window.
    pub fn page_number(&self) -> u64 {
        if self.limit == 0 {
            return 1;
        }
        self.skip / self.limit + 1
    }

    pub fn page_count(&self) -> u64 {
        if self.limit == 0 || self.total == 0 {
            return 1;
        }
        self.total / self.limit + u64::from(self.total % self.limit != 0)
    }

    pub fn first(self) -> Option<T> {
        self.items.into_iter().next()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total: u64, skip: u64, limit: u64, len: usize) -> Page<u32> {
        Page {
            items: (0..len as u32).collect(),
            total,
            skip,
            limit,
        }
    }

    #[test]
    fn last_window() {
        let last = page(47, 40, 10, 7);
        assert!(!last.has_next());
        assert_eq!(last.next_skip(), None);
        assert_eq!(last.previous_skip(), Some(30));
        assert_eq!(last.page_number(), 5);
        assert_eq!(last.page_count(), 5);
    }

    #[test]
    fn middle_window() {
        let middle = page(47, 10, 10, 10);
        assert!(middle.has_next());
        assert!(middle.has_previous());
        assert_eq!(middle.next_skip(), Some(20));
        assert_eq!(middle.page_number(), 2);
    }

    #[test]
    fn exact_fit_has_no_next() {
        let full = page(20, 10, 10, 10);
        assert!(!full.has_next());
    }

    #[test]
    fn zero_limit_never_has_next() {
        let unbounded = page(47, 0, 0, 47);
        assert!(!unbounded.has_next());
        assert_eq!(unbounded.next_skip(), None);
        assert_eq!(unbounded.page_count(), 1);
    }

    #[test]
    fn huge_server_values_do_not_overflow() {
        let window = page(u64::MAX, u64::MAX - 5, 10, 0);
        assert!(!window.has_next());
        assert_eq!(window.page_count(), u64::MAX / 10 + 1);

        let early = page(u64::MAX, 0, u64::MAX, 0);
        assert!(!early.has_next());
        assert_eq!(early.page_count(), 1);
    }

    #[test]
    fn deserialize_envelope() {
        let page: Page<serde_json::Value> =
            serde_json::from_str(r#"{"items": [{"_id": "a"}], "total": 1, "skip": 0, "limit": 50}"#).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 1);
        assert_eq!(page.limit, 50);
    }
}
